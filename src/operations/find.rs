//! Fluent find operations.

use std::marker::PhantomData;
use std::sync::Arc;

use mongodb::bson::{Bson, Document};
use tracing::debug;

use super::stage::{InCollection, Initial, Projectable, Projected};
use super::stream::{map_document, ResultStream};
use super::ResultType;
use crate::collection::{require_collection, CollectionSource};
use crate::database::Template;
use crate::entity::{Entity, EntityType};
use crate::error::{OperationError, Result};
use crate::query::{Distance, GeoResult, GeoResults, NearQuery, Query, DISTANCE_FIELD};

/// Find builder for domain type `D` returning `R`, at stage `S`.
///
/// Every stage call returns a new builder; intermediate stages can be kept
/// and used for several terminal operations.
pub struct FindBuilder<D, R, S> {
    template: Arc<dyn Template>,
    collection: Option<String>,
    _marker: PhantomData<fn() -> (D, R, S)>,
}

/// Freshly started find operation.
pub type FindOperation<D> = FindBuilder<D, D, Initial>;

/// Find operation with an explicit collection.
pub type FindWithCollection<D> = FindBuilder<D, D, InCollection>;

/// Find operation mapping results to `R`.
pub type FindWithProjection<D, R> = FindBuilder<D, R, Projected>;

impl<D: Entity> FindBuilder<D, D, Initial> {
    pub(crate) fn new(template: Arc<dyn Template>) -> Self {
        Self {
            template,
            collection: None,
            _marker: PhantomData,
        }
    }

    /// Run against `collection` instead of the one derived from `D`.
    ///
    /// # Errors
    /// Returns [`OperationError::InvalidArgument`] for a blank name.
    pub fn in_collection(&self, collection: impl Into<String>) -> Result<FindWithCollection<D>> {
        Ok(FindBuilder {
            template: Arc::clone(&self.template),
            collection: Some(require_collection(collection)?),
            _marker: PhantomData,
        })
    }
}

impl<D: Entity, S: Projectable> FindBuilder<D, D, S> {
    /// Map results to `R`. The collection is still derived from `D`.
    pub fn return_results_as<R: ResultType>(&self) -> FindWithProjection<D, R> {
        FindBuilder {
            template: Arc::clone(&self.template),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D: Entity, R: ResultType, S> FindBuilder<D, R, S> {
    /// All documents matching `query`. Empty when nothing matches.
    pub async fn find_all_by(&self, query: &Query) -> Result<Vec<R>> {
        let collection = self.collection_name();
        debug!("find_all_by on {}", collection);

        self.template
            .find(query, &collection)
            .await?
            .into_iter()
            .map(map_document)
            .collect()
    }

    /// Exactly one document matching `query`.
    ///
    /// # Errors
    /// Returns [`OperationError::IncorrectResultSize`] when more than one
    /// document matches.
    pub async fn find_by(&self, query: &Query) -> Result<Option<R>> {
        let collection = self.collection_name();
        debug!("find_by on {}", collection);

        let limited = query.clone().limit(2);
        let mut documents = self.template.find(&limited, &collection).await?;

        if documents.len() > 1 {
            return Err(OperationError::IncorrectResultSize {
                expected: 1,
                found: documents.len(),
            });
        }
        documents.pop().map(map_document).transpose()
    }

    /// First document matching `query`, ignoring any further matches.
    pub async fn find_first_by(&self, query: &Query) -> Result<Option<R>> {
        let collection = self.collection_name();
        debug!("find_first_by on {}", collection);

        let limited = query.clone().limit(1);
        let documents = self.template.find(&limited, &collection).await?;
        documents.into_iter().next().map(map_document).transpose()
    }

    /// Every document in the collection.
    pub async fn find_all(&self) -> Result<Vec<R>> {
        self.find_all_by(&Query::all()).await
    }

    /// Cursor over all documents matching `query`.
    pub async fn stream_all_by(&self, query: &Query) -> Result<ResultStream<R>> {
        let collection = self.collection_name();
        debug!("stream_all_by on {}", collection);

        let documents = self.template.stream(query, &collection).await?;
        Ok(ResultStream::new(documents, collection))
    }

    /// Cursor over every document in the collection.
    pub async fn stream_all(&self) -> Result<ResultStream<R>> {
        self.stream_all_by(&Query::all()).await
    }

    /// Documents near the point of `near`, with their distances.
    pub async fn find_all_near_by(&self, near: &NearQuery) -> Result<GeoResults<R>> {
        let collection = self.collection_name();
        debug!("find_all_near_by on {}", collection);

        let metric = near.metric();
        let results = self
            .template
            .geo_near(near, &collection)
            .await?
            .into_iter()
            .map(|mut document| {
                let distance = take_distance(&mut document);
                Ok(GeoResult::new(
                    map_document(document)?,
                    Distance::new(distance, metric),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(GeoResults::new(results, metric))
    }

    fn collection_name(&self) -> String {
        CollectionSource::select(self.collection.as_deref(), None, EntityType::of::<D>())
            .resolve(self.template.as_ref())
    }
}

fn take_distance(document: &mut Document) -> f64 {
    match document.remove(DISTANCE_FIELD) {
        Some(Bson::Double(value)) => value,
        Some(Bson::Int32(value)) => f64::from(value),
        Some(Bson::Int64(value)) => value as f64,
        _ => 0.0,
    }
}

// Manual Clone implementation that doesn't require D: Clone, R: Clone
impl<D, R, S> Clone for FindBuilder<D, R, S> {
    fn clone(&self) -> Self {
        Self {
            template: Arc::clone(&self.template),
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D, R, S> std::fmt::Debug for FindBuilder<D, R, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FindBuilder")
            .field("domain_type", &std::any::type_name::<D>())
            .field("result_type", &std::any::type_name::<R>())
            .field("collection", &self.collection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::TryStreamExt;
    use mongodb::bson::doc;
    use rstest::rstest;
    use serde::Deserialize;

    use super::*;
    use crate::database::MockTemplate;
    use crate::operations::{FindOperationBuilder, FindOperationSupport};
    use crate::query::Metric;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        firstname: String,
    }

    impl Entity for Person {}

    #[derive(Debug, Deserialize, PartialEq)]
    struct Jedi {
        #[serde(rename = "firstname")]
        name: String,
    }

    impl Entity for Jedi {}

    fn person(name: &str) -> Document {
        doc! { "firstname": name }
    }

    fn with_default_names(mock: &mut MockTemplate) {
        mock.expect_collection_name()
            .returning(|entity| entity.default_collection().into_owned());
    }

    fn operations(mock: MockTemplate) -> FindOperationSupport {
        FindOperationSupport::new(Arc::new(mock))
    }

    #[tokio::test]
    async fn test_explicit_collection_wins() {
        let mut mock = MockTemplate::new();
        mock.expect_collection_name().never();
        mock.expect_find()
            .withf(|_, collection| collection == "star-wars")
            .times(1)
            .returning(|_, _| Ok(vec![person("luke")]));

        let result = operations(mock)
            .query::<Person>()
            .in_collection("star-wars")
            .unwrap()
            .find_all_by(&Query::all())
            .await
            .unwrap();

        assert_eq!(result, vec![Person { firstname: "luke".to_string() }]);
    }

    #[tokio::test]
    async fn test_collection_derived_from_domain_type_not_result_type() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_find()
            .withf(|_, collection| collection == "person")
            .times(1)
            .returning(|_, _| Ok(vec![person("luke")]));

        let result = operations(mock)
            .query::<Person>()
            .return_results_as::<Jedi>()
            .find_all_by(&Query::new(doc! { "firstname": "luke" }))
            .await
            .unwrap();

        assert_eq!(result, vec![Jedi { name: "luke".to_string() }]);
    }

    #[tokio::test]
    async fn test_find_all_by_returns_empty_vec() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_find().returning(|_, _| Ok(vec![]));

        let result = operations(mock)
            .query::<Person>()
            .find_all_by(&Query::new(doc! { "firstname": "yoda" }))
            .await
            .unwrap();

        assert!(result.is_empty());
    }

    #[rstest]
    #[case(0, None)]
    #[case(1, Some("luke"))]
    #[tokio::test]
    async fn test_find_by_zero_or_one(#[case] matches: usize, #[case] expected: Option<&str>) {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_find()
            .withf(|query, _| query.get_limit() == Some(2))
            .returning(move |_, _| Ok(vec![person("luke"); matches]));

        let result = operations(mock)
            .query::<Person>()
            .find_by(&Query::new(doc! { "firstname": "luke" }))
            .await
            .unwrap();

        assert_eq!(result.map(|p| p.firstname), expected.map(str::to_string));
    }

    #[tokio::test]
    async fn test_find_by_more_than_one_is_cardinality_error() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_find()
            .returning(|_, _| Ok(vec![person("luke"), person("leia")]));

        let err = operations(mock)
            .query::<Person>()
            .find_by(&Query::all())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OperationError::IncorrectResultSize { expected: 1, found: 2 }
        ));
    }

    #[tokio::test]
    async fn test_find_first_by_takes_first_of_many() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_find()
            .withf(|query, _| query.get_limit() == Some(1))
            .returning(|_, _| Ok(vec![person("luke"), person("leia"), person("han")]));

        let result = operations(mock)
            .query::<Person>()
            .find_first_by(&Query::all())
            .await
            .unwrap();

        assert_eq!(result, Some(Person { firstname: "luke".to_string() }));
    }

    #[tokio::test]
    async fn test_find_all_matches_find_all_by_unrestricted() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_find()
            .withf(|query, _| query.is_unrestricted())
            .times(2)
            .returning(|_, _| Ok(vec![person("luke"), person("han")]));

        let find = operations(mock).query::<Person>();
        let all = find.find_all().await.unwrap();
        let all_by = find.find_all_by(&Query::all()).await.unwrap();

        assert_eq!(all, all_by);
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_stream_all_yields_mapped_results() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_stream()
            .withf(|query, collection| query.is_unrestricted() && collection == "person")
            .returning(|_, _| {
                let documents = vec![Ok(person("luke")), Ok(person("han"))];
                Ok(futures::StreamExt::boxed(futures::stream::iter(documents)))
            });

        let stream = operations(mock).query::<Person>().stream_all().await.unwrap();
        assert_eq!(stream.collection(), "person");

        let people: Vec<Person> = stream.try_collect().await.unwrap();
        assert_eq!(people.len(), 2);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_blank_collection_never_delegates(#[case] collection: &str) {
        let mut mock = MockTemplate::new();
        mock.expect_collection_name().never();
        mock.expect_find().never();
        mock.expect_stream().never();
        mock.expect_geo_near().never();

        let err = operations(mock)
            .query::<Person>()
            .in_collection(collection)
            .unwrap_err();

        assert!(matches!(err, OperationError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_find_all_near_by_maps_distances() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_geo_near()
            .withf(|near, collection| near.metric() == Metric::Kilometers && collection == "person")
            .returning(|_, _| {
                Ok(vec![
                    doc! { "firstname": "luke", DISTANCE_FIELD: 1.0 },
                    doc! { "firstname": "han", DISTANCE_FIELD: 3.0 },
                ])
            });

        let near = NearQuery::near(0.0, 0.0).max_distance(Distance::kilometers(10.0));
        let results = operations(mock)
            .query::<Person>()
            .find_all_near_by(&near)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.results()[0].content().firstname, "luke");
        assert_eq!(results.results()[1].distance(), Distance::kilometers(3.0));
        assert_eq!(results.average_distance(), Distance::kilometers(2.0));
    }

    #[tokio::test]
    async fn test_find_all_near_by_keeps_own_dis_field() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Sensor {
            name: String,
            dis: f64,
        }

        impl Entity for Sensor {}

        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_geo_near()
            .withf(|near, collection| {
                let stage = &near.to_pipeline()[0];
                let field = stage.get_document("$geoNear").unwrap().get_str("distanceField");
                matches!(field, Ok(field) if field == DISTANCE_FIELD) && collection == "sensor"
            })
            .returning(|_, _| Ok(vec![doc! { "name": "s1", "dis": 7.5, DISTANCE_FIELD: 4.0 }]));

        let results = operations(mock)
            .query::<Sensor>()
            .find_all_near_by(&NearQuery::near(0.0, 0.0))
            .await
            .unwrap();

        assert_eq!(
            results.results()[0].content(),
            &Sensor { name: "s1".to_string(), dis: 7.5 }
        );
        assert_eq!(results.results()[0].distance().value(), 4.0);
    }

    #[tokio::test]
    async fn test_stream_all_matches_stream_all_by_unrestricted() {
        let mut mock = MockTemplate::new();
        with_default_names(&mut mock);
        mock.expect_stream()
            .withf(|query, _| query.is_unrestricted())
            .times(2)
            .returning(|_, _| {
                let documents = vec![Ok(person("luke")), Ok(person("han"))];
                Ok(futures::StreamExt::boxed(futures::stream::iter(documents)))
            });

        let find = operations(mock).query::<Person>();
        let all: Vec<Person> = find.stream_all().await.unwrap().try_collect().await.unwrap();
        let all_by: Vec<Person> = find
            .stream_all_by(&Query::all())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(all, all_by);
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_intermediate_stage_is_reusable() {
        let mut mock = MockTemplate::new();
        mock.expect_find()
            .withf(|_, collection| collection == "star-wars")
            .times(2)
            .returning(|_, _| Ok(vec![person("luke")]));

        let in_collection = operations(mock)
            .query::<Person>()
            .in_collection("star-wars")
            .unwrap();

        let people = in_collection.find_all().await.unwrap();
        let jedi = in_collection
            .return_results_as::<Jedi>()
            .find_first_by(&Query::all())
            .await
            .unwrap();

        assert_eq!(people[0].firstname, "luke");
        assert_eq!(jedi, Some(Jedi { name: "luke".to_string() }));
    }

    #[test]
    fn test_builders_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<FindOperation<Person>>();
        assert_send_sync::<FindWithCollection<Person>>();
        assert_send_sync::<FindWithProjection<Person, Jedi>>();
    }
}
