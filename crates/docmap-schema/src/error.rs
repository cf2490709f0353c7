use thiserror::Error;

/// Errors from schema declaration and field-path resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// A path segment does not exist on the (possibly unwrapped) model type.
    #[error("field not found: {model} has no field `{field}`")]
    FieldNotFound { model: String, field: String },

    /// A path tried to descend through a type that has no fields.
    #[error("cannot descend into `{segment}`: {kind} has no fields")]
    NotTraversable { segment: String, kind: String },

    /// Identity was requested for a model that declares no hashable fields.
    #[error("model {model} declares no hashable fields, cannot compute identity")]
    NoHashableFields { model: String },

    /// A dotted path string is structurally invalid (empty, empty segment).
    #[error("invalid path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    /// A first-element marker was applied to a non-collection segment.
    #[error("segment `{segment}` is not a collection, cannot take first element")]
    NotACollection { segment: String },
}

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;
