//! Releasable result streams.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use mongodb::bson::{self, Document};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::database::DocumentStream;
use crate::error::Result;

/// Map a raw document to `T`.
pub(crate) fn map_document<T: DeserializeOwned>(document: Document) -> Result<T> {
    Ok(bson::from_document(document)?)
}

/// Forward-only stream of mapped results over a live server cursor.
///
/// The cursor is released when the stream is dropped, on every exit path.
/// Call [`ResultStream::close`] to release it at a specific point.
pub struct ResultStream<T> {
    inner: BoxStream<'static, Result<T>>,
    collection: String,
}

impl<T> ResultStream<T>
where
    T: DeserializeOwned + Send + 'static,
{
    pub(crate) fn new(documents: DocumentStream, collection: impl Into<String>) -> Self {
        Self {
            inner: documents
                .map(|document| document.and_then(map_document))
                .boxed(),
            collection: collection.into(),
        }
    }
}

impl<T> ResultStream<T> {
    /// Collection the cursor reads from.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Release the underlying cursor.
    pub fn close(self) {
        debug!("Closing result stream on {}", self.collection);
    }
}

impl<T> Stream for ResultStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> std::fmt::Debug for ResultStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream")
            .field("collection", &self.collection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;
    use futures::TryStreamExt;
    use mongodb::bson::doc;
    use serde::Deserialize;

    use super::*;
    use crate::error::OperationError;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Person {
        name: String,
    }

    fn documents(docs: Vec<Document>) -> DocumentStream {
        stream::iter(docs.into_iter().map(Ok)).boxed()
    }

    #[tokio::test]
    async fn test_maps_documents() {
        let stream: ResultStream<Person> = ResultStream::new(
            documents(vec![doc! { "name": "luke" }, doc! { "name": "han" }]),
            "person",
        );

        let people: Vec<Person> = stream.try_collect().await.unwrap();
        assert_eq!(
            people,
            vec![
                Person { name: "luke".to_string() },
                Person { name: "han".to_string() },
            ]
        );
    }

    #[tokio::test]
    async fn test_mapping_error_is_reported() {
        let mut stream: ResultStream<Person> =
            ResultStream::new(documents(vec![doc! { "age": 19 }]), "person");

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, OperationError::Mapping(_)));
    }

    #[tokio::test]
    async fn test_close_releases_before_exhaustion() {
        let mut stream: ResultStream<Person> = ResultStream::new(
            documents(vec![doc! { "name": "luke" }, doc! { "name": "han" }]),
            "person",
        );

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.name, "luke");
        assert_eq!(stream.collection(), "person");
        stream.close();
    }
}
