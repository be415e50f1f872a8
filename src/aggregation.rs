//! Aggregation pipelines and their results.

use mongodb::bson::Document;
use mongodb::options::AggregateOptions;

use crate::entity::{Entity, EntityType};
use crate::error::{OperationError, Result};

/// An aggregation pipeline.
///
/// A *typed* aggregation also declares the entity type its input documents
/// belong to, which supplies the collection name when no explicit
/// collection is set.
///
/// # Example
///
/// ```rust
/// use mongo_fluent::aggregation::Aggregation;
/// use mongodb::bson::doc;
///
/// let aggregation = Aggregation::new(vec![
///     doc! { "$match": { "status": "A" } },
///     doc! { "$group": { "_id": "$cust_id", "total": { "$sum": "$amount" } } },
/// ]);
/// assert!(aggregation.input_type().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    stages: Vec<Document>,
    input_type: Option<EntityType>,
    allow_disk_use: bool,
}

impl Aggregation {
    /// Untyped aggregation over the given stages.
    pub fn new(stages: Vec<Document>) -> Self {
        Self {
            stages,
            input_type: None,
            allow_disk_use: false,
        }
    }

    /// Aggregation whose input documents are of entity type `I`.
    pub fn typed<I: Entity>(stages: Vec<Document>) -> Self {
        Self {
            input_type: Some(EntityType::of::<I>()),
            ..Self::new(stages)
        }
    }

    /// Append a stage.
    #[must_use]
    pub fn stage(mut self, stage: Document) -> Self {
        self.stages.push(stage);
        self
    }

    /// Let the server spill to temporary files for large pipelines.
    #[must_use]
    pub fn allow_disk_use(mut self, allow: bool) -> Self {
        self.allow_disk_use = allow;
        self
    }

    pub fn stages(&self) -> &[Document] {
        &self.stages
    }

    pub fn input_type(&self) -> Option<EntityType> {
        self.input_type
    }

    /// Driver options for this pipeline.
    pub fn aggregate_options(&self) -> AggregateOptions {
        let mut options = AggregateOptions::default();
        if self.allow_disk_use {
            options.allow_disk_use = Some(true);
        }
        options
    }
}

/// Bounded results of an aggregation, mapped to the output type.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResults<T> {
    mapped: Vec<T>,
    collection: String,
}

impl<T> AggregationResults<T> {
    pub fn new(mapped: Vec<T>, collection: impl Into<String>) -> Self {
        Self {
            mapped,
            collection: collection.into(),
        }
    }

    pub fn mapped_results(&self) -> &[T] {
        &self.mapped
    }

    /// Collection the pipeline ran against.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The single result, `None` when empty.
    ///
    /// # Errors
    /// Returns [`OperationError::IncorrectResultSize`] when there is more
    /// than one result.
    pub fn unique_mapped_result(&self) -> Result<Option<&T>> {
        match self.mapped.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(single)),
            many => Err(OperationError::IncorrectResultSize {
                expected: 1,
                found: many.len(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.mapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapped.is_empty()
    }

    pub fn into_mapped_results(self) -> Vec<T> {
        self.mapped
    }
}

impl<T> IntoIterator for AggregationResults<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.mapped.into_iter()
    }
}
