//! Query descriptors passed through the builders to the template.
//!
//! - `Query` - filter, sort, projection and paging for find operations
//! - `NearQuery` - `$geoNear` proximity search
//! - `GeoResults` - distance-annotated results of a near search

mod geo;
mod near;

pub use geo::{GeoResult, GeoResults};
pub use near::{Distance, Metric, NearQuery, DISTANCE_FIELD};

use mongodb::bson::Document;
use mongodb::options::FindOptions;

/// A find query.
///
/// # Example
///
/// ```rust
/// use mongo_fluent::query::Query;
/// use mongodb::bson::doc;
///
/// let query = Query::new(doc! { "firstname": "luke" })
///     .sort(doc! { "lastname": 1 })
///     .limit(10);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filter: Document,
    sort: Option<Document>,
    projection: Option<Document>,
    skip: Option<u64>,
    limit: Option<i64>,
}

impl Query {
    /// Create a query with the given filter document.
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }

    /// A query matching every document in the collection.
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the sort document.
    #[must_use]
    pub fn sort(mut self, sort: Document) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the projection document.
    #[must_use]
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Skip the first `skip` matches.
    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Return at most `limit` matches.
    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn filter_document(&self) -> &Document {
        &self.filter
    }

    pub fn sort_document(&self) -> Option<&Document> {
        self.sort.as_ref()
    }

    pub fn projection_document(&self) -> Option<&Document> {
        self.projection.as_ref()
    }

    pub fn get_skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }

    /// Whether this query matches every document.
    pub fn is_unrestricted(&self) -> bool {
        self.filter.is_empty() && self.skip.is_none() && self.limit.is_none()
    }

    /// Driver options for this query.
    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::default();
        options.sort = self.sort.clone();
        options.projection = self.projection.clone();
        options.skip = self.skip;
        options.limit = self.limit;
        options
    }
}
