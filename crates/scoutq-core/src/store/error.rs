//! Store error types.

use thiserror::Error;

/// Errors raised by a store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage engine failure.
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),

    /// An update's condition did not hold for the current item.
    #[error("conditional check failed")]
    ConditionalCheckFailed,

    /// A query named an index the table does not have.
    #[error("unknown index '{0}'")]
    UnknownIndex(String),

    /// Key attributes missing or not usable as a key.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Key condition, filter or update expression is inconsistent.
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),
}
