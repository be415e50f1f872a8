//! Error types for fluent operations.

use thiserror::Error;

/// Result alias used by all builder and template operations.
pub type Result<T> = std::result::Result<T, OperationError>;

/// Errors raised by the fluent builders and the template they delegate to.
#[derive(Debug, Error)]
pub enum OperationError {
    /// A required argument was missing or blank.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// More documents matched than the operation allows.
    ///
    /// `found` is a lower bound: single-result lookups stop reading after
    /// the first surplus document.
    #[error("Incorrect result size: expected {expected}, found {found}")]
    IncorrectResultSize { expected: usize, found: usize },

    /// Error raised by the MongoDB driver while executing an operation.
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// A returned document could not be mapped to the requested type.
    #[error("Failed to map document: {0}")]
    Mapping(#[from] mongodb::bson::de::Error),
}

impl OperationError {
    /// Whether this error signals a cardinality violation.
    pub fn is_incorrect_result_size(&self) -> bool {
        matches!(self, Self::IncorrectResultSize { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incorrect_result_size_message() {
        let err = OperationError::IncorrectResultSize { expected: 1, found: 2 };

        assert!(err.is_incorrect_result_size());
        assert_eq!(err.to_string(), "Incorrect result size: expected 1, found 2");
    }

    #[test]
    fn test_invalid_argument_is_not_cardinality() {
        let err = OperationError::InvalidArgument("Collection must not be empty");
        assert!(!err.is_incorrect_result_size());
    }
}
