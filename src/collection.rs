//! Collection name derivation and resolution.

use std::borrow::Cow;

use crate::database::Template;
use crate::entity::EntityType;
use crate::error::{OperationError, Result};

/// Derive a collection name from a Rust type name.
///
/// Strips the module path and any generic arguments, then lower-cases the
/// first character: `app::model::JediInfo` becomes `jediInfo`.
pub fn derive_collection_name(type_name: &str) -> Cow<'static, str> {
    let base = type_name.split('<').next().unwrap_or(type_name);
    let simple = base.rsplit("::").next().unwrap_or(base);

    let mut chars = simple.chars();
    match chars.next() {
        Some(first) => Cow::Owned(first.to_lowercase().chain(chars).collect()),
        None => Cow::Borrowed(""),
    }
}

/// Validate an explicit collection override.
///
/// Blank names (empty or whitespace only) are rejected.
pub fn require_collection(collection: impl Into<String>) -> Result<String> {
    let collection = collection.into();
    if collection.trim().is_empty() {
        return Err(OperationError::InvalidArgument(
            "Collection must not be null nor empty",
        ));
    }
    Ok(collection)
}

/// Where a resolved collection name came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionSource {
    /// Set with `in_collection`.
    Explicit(String),
    /// Declared input type of a typed aggregation.
    InputType(EntityType),
    /// Domain type the builder was started with.
    DomainType(EntityType),
}

impl CollectionSource {
    /// Pick the source for a call: explicit override, then input type, then
    /// domain type.
    pub fn select(
        explicit: Option<&str>,
        input_type: Option<EntityType>,
        domain_type: EntityType,
    ) -> Self {
        if let Some(name) = explicit.filter(|name| !name.trim().is_empty()) {
            return Self::Explicit(name.to_owned());
        }

        match input_type {
            Some(input) => Self::InputType(input),
            None => Self::DomainType(domain_type),
        }
    }

    /// Turn the source into a concrete name, asking the template for the
    /// default name of type-based sources.
    pub fn resolve(self, template: &dyn Template) -> String {
        match self {
            Self::Explicit(name) => name,
            Self::InputType(entity) | Self::DomainType(entity) => template.collection_name(entity),
        }
    }
}
