//! MongoDB database wrapper.

use std::sync::Arc;

use mongodb::{options::ClientOptions, Client};
use tracing::info;

use super::template::{MongoTemplate, Template};
use crate::entity::Entity;
use crate::error::Result;
use crate::operations::{
    AggregateOperationBuilder, AggregationOperation, AggregationOperationSupport,
    FindOperation, FindOperationBuilder, FindOperationSupport,
};

/// Connected database exposing the fluent find and aggregate builders.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db: mongodb::Database,
    template: Arc<dyn Template>,
}

impl Database {
    /// Connect to MongoDB with the given URI and database name.
    ///
    /// # Arguments
    /// * `uri` - MongoDB connection string
    /// * `db_name` - Database name to use
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self> {
        let options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(options)?;

        // Ping the database to verify connection
        client
            .database("admin")
            .run_command(mongodb::bson::doc! { "ping": 1 })
            .await?;

        info!("Successfully connected to MongoDB");

        let db = client.database(db_name);
        let template = MongoTemplate::new(db.clone()).into_shared();

        Ok(Self { client, db, template })
    }

    /// Get a reference to the underlying MongoDB client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a reference to the database.
    pub fn db(&self) -> &mongodb::Database {
        &self.db
    }

    /// The template fluent operations delegate to.
    pub fn template(&self) -> Arc<dyn Template> {
        Arc::clone(&self.template)
    }

    /// Close the client, killing any open cursors.
    pub async fn shutdown(self) {
        self.client.shutdown().await;
        info!("MongoDB client shut down");
    }
}

impl FindOperationBuilder for Database {
    fn query<D: Entity>(&self) -> FindOperation<D> {
        FindOperationSupport::new(self.template()).query()
    }
}

impl AggregateOperationBuilder for Database {
    fn aggregate_and_return<D: Entity>(&self) -> AggregationOperation<D> {
        AggregationOperationSupport::new(self.template()).aggregate_and_return()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.db.name())
            .finish()
    }
}
