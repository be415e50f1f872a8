//! The template every fluent operation delegates to.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::Document;
use mongodb::Collection;
use tracing::debug;

use crate::aggregation::Aggregation;
use crate::entity::EntityType;
use crate::error::{OperationError, Result};
use crate::query::{NearQuery, Query};

/// Lazily produced documents backed by a server-side cursor.
pub type DocumentStream = BoxStream<'static, Result<Document>>;

/// Executes operations assembled by the fluent builders.
///
/// Works on raw documents; mapping to domain types happens in the builders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Template: Send + Sync {
    /// Default collection name for an entity type.
    fn collection_name(&self, entity: EntityType) -> String;

    /// Run `query` against `collection` and collect every match.
    async fn find(&self, query: &Query, collection: &str) -> Result<Vec<Document>>;

    /// Run `query` against `collection`, returning the open cursor.
    async fn stream(&self, query: &Query, collection: &str) -> Result<DocumentStream>;

    /// Run a `$geoNear` search. Each document carries its distance in the
    /// [`crate::query::DISTANCE_FIELD`] field.
    async fn geo_near(&self, near: &NearQuery, collection: &str) -> Result<Vec<Document>>;

    /// Run an aggregation pipeline and collect its output.
    async fn aggregate(
        &self,
        aggregation: &Aggregation,
        collection: &str,
    ) -> Result<Vec<Document>>;

    /// Run an aggregation pipeline, returning the open cursor.
    async fn aggregate_stream(
        &self,
        aggregation: &Aggregation,
        collection: &str,
    ) -> Result<DocumentStream>;
}

/// [`Template`] backed by a MongoDB database handle.
#[derive(Debug, Clone)]
pub struct MongoTemplate {
    db: mongodb::Database,
}

impl MongoTemplate {
    pub fn new(db: mongodb::Database) -> Self {
        Self { db }
    }

    /// Wrap into the shared handle the builders hold.
    pub fn into_shared(self) -> Arc<dyn Template> {
        Arc::new(self)
    }

    fn raw_collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

#[async_trait]
impl Template for MongoTemplate {
    fn collection_name(&self, entity: EntityType) -> String {
        entity.default_collection().into_owned()
    }

    async fn find(&self, query: &Query, collection: &str) -> Result<Vec<Document>> {
        let cursor = self
            .raw_collection(collection)
            .find(query.filter_document().clone())
            .with_options(query.find_options())
            .await?;

        let documents: Vec<Document> = cursor.try_collect().await?;
        debug!("find on {} returned {} documents", collection, documents.len());
        Ok(documents)
    }

    async fn stream(&self, query: &Query, collection: &str) -> Result<DocumentStream> {
        let cursor = self
            .raw_collection(collection)
            .find(query.filter_document().clone())
            .with_options(query.find_options())
            .await?;

        debug!("Opened find cursor on {}", collection);
        Ok(cursor.map_err(OperationError::from).boxed())
    }

    async fn geo_near(&self, near: &NearQuery, collection: &str) -> Result<Vec<Document>> {
        let cursor = self
            .raw_collection(collection)
            .aggregate(near.to_pipeline())
            .await?;

        let documents: Vec<Document> = cursor.try_collect().await?;
        debug!("geoNear on {} returned {} documents", collection, documents.len());
        Ok(documents)
    }

    async fn aggregate(
        &self,
        aggregation: &Aggregation,
        collection: &str,
    ) -> Result<Vec<Document>> {
        let cursor = self
            .raw_collection(collection)
            .aggregate(aggregation.stages().to_vec())
            .with_options(aggregation.aggregate_options())
            .await?;

        let documents: Vec<Document> = cursor.try_collect().await?;
        debug!(
            "Aggregation on {} returned {} documents",
            collection,
            documents.len()
        );
        Ok(documents)
    }

    async fn aggregate_stream(
        &self,
        aggregation: &Aggregation,
        collection: &str,
    ) -> Result<DocumentStream> {
        let cursor = self
            .raw_collection(collection)
            .aggregate(aggregation.stages().to_vec())
            .with_options(aggregation.aggregate_options())
            .await?;

        debug!("Opened aggregation cursor on {}", collection);
        Ok(cursor.map_err(OperationError::from).boxed())
    }
}
