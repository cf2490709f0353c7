use serde_json::{Map, Value};

/// Errors from backend dispatch operations.
///
/// Backend-native failures are translated into these kinds at the dispatch
/// boundary; no backend-specific error type crosses into application code.
/// Nothing here is ever retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `find_one`-style lookup matched nothing. A plural `find` matching
    /// nothing returns an empty list instead of this error.
    #[error("no document found in {collection}")]
    NotFound { collection: String },

    /// Insert or unique index violated uniqueness. Carries the offending
    /// key/value pairs for diagnostics.
    #[error("duplicate key in {collection}: {dup_keys:?}")]
    DuplicateKey {
        collection: String,
        dup_keys: Vec<Map<String, Value>>,
    },

    /// The operation or one of its arguments is malformed for this backend.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backend does not implement this operation.
    #[error("{backend} backend does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
