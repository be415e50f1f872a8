//! Fluent find and aggregate operations.
//!
//! Builders move through stages encoded in their type. Each stage only
//! exposes the calls that are legal next:
//!
//! - find: `query` → `in_collection`? → `return_results_as`? → terminal
//! - aggregate: `aggregate_and_return` → `in_collection`? → terminal
//!
//! ## Usage
//!
//! ```rust,ignore
//! let jedi = db
//!     .query::<Person>()
//!     .in_collection("star-wars")?
//!     .return_results_as::<Jedi>()
//!     .find_by(&Query::new(doc! { "firstname": "luke" }))
//!     .await?;
//! ```

mod aggregate;
mod find;
mod stream;

pub use aggregate::{AggregateBuilder, AggregationOperation, DoAggregate};
pub use find::{FindBuilder, FindOperation, FindWithCollection, FindWithProjection};
pub use stream::ResultStream;

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::database::Template;
use crate::entity::Entity;

/// Stage markers.
pub mod stage {
    /// Fresh builder, nothing overridden yet.
    #[derive(Debug, Clone, Copy)]
    pub struct Initial;

    /// Collection overridden.
    #[derive(Debug, Clone, Copy)]
    pub struct InCollection;

    /// Result type overridden.
    #[derive(Debug, Clone, Copy)]
    pub struct Projected;

    mod sealed {
        pub trait Sealed {}
        impl Sealed for super::Initial {}
        impl Sealed for super::InCollection {}
    }

    /// Stages from which the result type may still be overridden.
    pub trait Projectable: sealed::Sealed {}
    impl Projectable for Initial {}
    impl Projectable for InCollection {}
}

/// Types terminal operations can map documents to.
pub trait ResultType: DeserializeOwned + Send + Unpin + 'static {}

impl<T> ResultType for T where T: DeserializeOwned + Send + Unpin + 'static {}

/// Entry point for fluent find operations.
pub trait FindOperationBuilder {
    /// Start a find operation for the domain type `D`.
    fn query<D: Entity>(&self) -> FindOperation<D>;
}

/// Entry point for fluent aggregations.
pub trait AggregateOperationBuilder {
    /// Start an aggregation returning results mapped to `D`.
    ///
    /// Use [`crate::aggregation::Aggregation::typed`] to declare a different
    /// input type for the pipeline.
    fn aggregate_and_return<D: Entity>(&self) -> AggregationOperation<D>;
}

/// [`FindOperationBuilder`] over any template.
#[derive(Clone)]
pub struct FindOperationSupport {
    template: Arc<dyn Template>,
}

impl FindOperationSupport {
    pub fn new(template: Arc<dyn Template>) -> Self {
        Self { template }
    }
}

impl FindOperationBuilder for FindOperationSupport {
    fn query<D: Entity>(&self) -> FindOperation<D> {
        FindBuilder::new(Arc::clone(&self.template))
    }
}

/// [`AggregateOperationBuilder`] over any template.
#[derive(Clone)]
pub struct AggregationOperationSupport {
    template: Arc<dyn Template>,
}

impl AggregationOperationSupport {
    pub fn new(template: Arc<dyn Template>) -> Self {
        Self { template }
    }
}

impl AggregateOperationBuilder for AggregationOperationSupport {
    fn aggregate_and_return<D: Entity>(&self) -> AggregationOperation<D> {
        AggregateBuilder::new(Arc::clone(&self.template))
    }
}
