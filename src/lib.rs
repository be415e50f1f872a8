//! mongo-fluent - Staged fluent builders for MongoDB
//!
//! Build find and aggregate operations through method chains instead of
//! hand-assembled driver calls.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB connection and the template operations run on
//! - `entity` - Domain types and their default collection names
//! - `collection` - Collection name derivation and resolution
//! - `query` - Find and near query descriptors
//! - `aggregation` - Aggregation pipelines and results
//! - `operations` - The fluent find and aggregate builders
//!
//! ## Usage
//!
//! ```rust,ignore
//! let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
//!
//! let luke = db
//!     .query::<Person>()
//!     .find_by(&Query::new(doc! { "firstname": "luke" }))
//!     .await?;
//!
//! let totals = db
//!     .aggregate_and_return::<TagCount>()
//!     .process(&Aggregation::typed::<Post>(pipeline))
//!     .await?;
//! ```

pub mod aggregation;
pub mod collection;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod operations;
pub mod query;

pub use aggregation::{Aggregation, AggregationResults};
pub use config::Config;
pub use database::{Database, MongoTemplate, Template};
pub use entity::{Entity, EntityType};
pub use error::{OperationError, Result};
pub use operations::{AggregateOperationBuilder, FindOperationBuilder, ResultStream};
pub use query::{Distance, GeoResults, Metric, NearQuery, Query};
