//! Domain types mapped to MongoDB collections.

use std::borrow::Cow;
use std::fmt;

use mongodb::bson::Document;
use serde::de::DeserializeOwned;

use crate::collection::derive_collection_name;

/// Implemented by domain types that live in a collection.
///
/// The default collection name is derived from the type name
/// (`app::model::JediInfo` maps to `jediInfo`). Override
/// [`Entity::collection_name`] to pin it explicitly.
///
/// ```ignore
/// #[derive(Deserialize)]
/// struct Person { name: String }
///
/// impl Entity for Person {}
/// ```
pub trait Entity: DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Name of the collection this type is stored in.
    fn collection_name() -> Cow<'static, str> {
        derive_collection_name(std::any::type_name::<Self>())
    }
}

/// Raw documents have no natural collection and resolve to `document`.
impl Entity for Document {}

/// Runtime handle to an [`Entity`] type.
///
/// Carried by typed aggregations as their input type and handed to the
/// template when a default collection name has to be resolved.
#[derive(Clone, Copy)]
pub struct EntityType {
    type_name: &'static str,
    collection: fn() -> Cow<'static, str>,
}

impl EntityType {
    /// Capture the entity type `T`.
    pub fn of<T: Entity>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            collection: T::collection_name,
        }
    }

    /// Fully qualified Rust type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Collection name the type declares.
    pub fn default_collection(&self) -> Cow<'static, str> {
        (self.collection)()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for EntityType {}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("type_name", &self.type_name)
            .finish()
    }
}
