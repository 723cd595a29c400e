//! Error types shared by the expression builders, the model registry and the operations.

/// Errors raised while defining models or building expressions.
///
/// None of these are transient: each one points at a programming mistake in the
/// calling code, so nothing in this crate retries or swallows them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A model definition or a model instance does not match its declared attributes.
    #[error("definition error: {0}")]
    Definition(String),
    /// A literal cannot be represented as a DynamoDB attribute value.
    #[error("unsupported value: {0}")]
    UnsupportedValue(String),
    /// A condition was passed where DynamoDB cannot accept it.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),
    /// A primary key does not match the keys declared on the model.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// A typed model could not be converted to or from a DynamoDB item.
    #[error(transparent)]
    Serialization(#[from] serde_dynamo::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
