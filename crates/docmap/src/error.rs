use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocmapError {
    /// A filter, update, projection, or distinct key names a field the
    /// model's schema does not declare.
    #[error("unknown field `{path}` on model {model}")]
    UnknownField { model: String, path: String },

    /// An update touches a field the identity is derived from. Allowing it
    /// would desynchronize the stored `_id` from the document's content.
    #[error("field `{path}` on model {model} is hashable and cannot be updated")]
    ImmutableField { model: String, path: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("schema error: {0}")]
    Schema(#[from] docmap_schema::SchemaError),

    #[error("store error: {0}")]
    Store(#[from] docmap_store::StoreError),

    #[error("type error: {0}")]
    Type(#[from] docmap_types::TypeError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DocmapError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type DocmapResult<T> = Result<T, DocmapError>;
