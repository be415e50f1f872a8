//! Fluent aggregations.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::stage::{InCollection, Initial};
use super::stream::{map_document, ResultStream};
use crate::aggregation::{Aggregation, AggregationResults};
use crate::collection::{require_collection, CollectionSource};
use crate::database::Template;
use crate::entity::{Entity, EntityType};
use crate::error::Result;

/// Aggregation builder returning `D`, at stage `S`.
pub struct AggregateBuilder<D, S> {
    template: Arc<dyn Template>,
    collection: Option<String>,
    _marker: PhantomData<fn() -> (D, S)>,
}

/// Freshly started aggregation.
pub type AggregationOperation<D> = AggregateBuilder<D, Initial>;

/// Aggregation ready to run, collection fixed.
pub type DoAggregate<D> = AggregateBuilder<D, InCollection>;

impl<D: Entity> AggregateBuilder<D, Initial> {
    pub(crate) fn new(template: Arc<dyn Template>) -> Self {
        Self {
            template,
            collection: None,
            _marker: PhantomData,
        }
    }

    /// Run against `collection` instead of the derived one.
    ///
    /// # Errors
    /// Returns [`crate::OperationError::InvalidArgument`] for a blank name.
    pub fn in_collection(&self, collection: impl Into<String>) -> Result<DoAggregate<D>> {
        Ok(AggregateBuilder {
            template: Arc::clone(&self.template),
            collection: Some(require_collection(collection)?),
            _marker: PhantomData,
        })
    }
}

impl<D: Entity, S> AggregateBuilder<D, S> {
    /// Run the pipeline and collect results mapped to `D`.
    pub async fn process(&self, aggregation: &Aggregation) -> Result<AggregationResults<D>> {
        let collection = self.collection_name(aggregation);
        debug!(
            "Aggregating {} stages on {}",
            aggregation.stages().len(),
            collection
        );

        let mapped = self
            .template
            .aggregate(aggregation, &collection)
            .await?
            .into_iter()
            .map(map_document)
            .collect::<Result<Vec<D>>>()?;

        Ok(AggregationResults::new(mapped, collection))
    }

    /// Run the pipeline, returning a cursor over results mapped to `D`.
    pub async fn stream_process(&self, aggregation: &Aggregation) -> Result<ResultStream<D>> {
        let collection = self.collection_name(aggregation);
        debug!(
            "Streaming aggregation of {} stages on {}",
            aggregation.stages().len(),
            collection
        );

        let documents = self.template.aggregate_stream(aggregation, &collection).await?;
        Ok(ResultStream::new(documents, collection))
    }

    fn collection_name(&self, aggregation: &Aggregation) -> String {
        CollectionSource::select(
            self.collection.as_deref(),
            aggregation.input_type(),
            EntityType::of::<D>(),
        )
        .resolve(self.template.as_ref())
    }
}

// Manual Clone implementation that doesn't require D: Clone
impl<D, S> Clone for AggregateBuilder<D, S> {
    fn clone(&self) -> Self {
        Self {
            template: Arc::clone(&self.template),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D, S> std::fmt::Debug for AggregateBuilder<D, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AggregateBuilder")
            .field("domain_type", &std::any::type_name::<D>())
            .field("collection", &self.collection)
            .finish()
    }
}
