//! Search error types.

use std::fmt;

use thiserror::Error;

use crate::store::StoreError;

/// Caller-input errors, raised before any store call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A filter was given with an empty value.
    #[error("filter '{0}' has an empty value")]
    EmptyValue(&'static str),

    /// The operator is not supported for the attribute.
    #[error("operator '{operator}' is not supported on '{attribute}'")]
    UnsupportedOperator {
        /// Attribute name.
        attribute: &'static str,
        /// Operator given.
        operator: String,
    },

    /// The value has the wrong type for the attribute.
    #[error("filter '{attribute}' expects a {expected} value")]
    WrongValueType {
        /// Attribute name.
        attribute: &'static str,
        /// Expected value kind.
        expected: &'static str,
    },

    /// Page size outside `1..=max`.
    #[error("limit {limit} is outside 1..={max}")]
    InvalidLimit {
        /// Limit requested.
        limit: usize,
        /// Largest allowed limit.
        max: usize,
    },

    /// Free-text query is blank.
    #[error("text query is empty")]
    EmptyTextQuery,

    /// Pagination cursor could not be decoded.
    #[error("malformed cursor: {0}")]
    MalformedCursor(String),

    /// Pagination cursor decodes but was issued by a different query.
    #[error("cursor does not belong to this query: {0}")]
    CursorMismatch(String),
}

/// Store operation attempted when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    /// Point read.
    Get,
    /// Insert or replace.
    Put,
    /// Update expression.
    Update,
    /// Delete.
    Delete,
    /// Key-condition query.
    Query,
    /// Full scan.
    Scan,
}

impl StoreOperation {
    /// Operation name as logged and reported.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Get => "get",
            StoreOperation::Put => "put",
            StoreOperation::Update => "update",
            StoreOperation::Delete => "delete",
            StoreOperation::Query => "query",
            StoreOperation::Scan => "scan",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid caller input.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Store call failed.
    #[error("store {operation} on {target} failed: {source}")]
    Store {
        /// Operation attempted.
        operation: StoreOperation,
        /// Index name, or "scan" for full scans.
        target: String,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

impl Error {
    /// Wrap a store error with the operation and target it came from.
    pub fn store(operation: StoreOperation, target: impl Into<String>, source: StoreError) -> Self {
        Error::Store {
            operation,
            target: target.into(),
            source,
        }
    }

    /// Check if this is a caller-input error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result alias for search operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_context() {
        let err = Error::store(
            StoreOperation::Query,
            "category-cohort",
            StoreError::UnknownIndex("category-cohort".into()),
        );
        let message = err.to_string();
        assert!(message.contains("query"));
        assert!(message.contains("category-cohort"));
        assert!(!err.is_validation());
    }

    #[test]
    fn test_validation_from() {
        let err: Error = ValidationError::EmptyTextQuery.into();
        assert!(err.is_validation());
    }
}
