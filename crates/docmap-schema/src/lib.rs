//! Model schemas and the content-addressable identity core of docmap.
//!
//! Three pieces live here:
//!
//! - **Field-path resolution** ([`FieldCursor`] / [`FieldPath`]): an explicit
//!   builder that walks into nested model fields, unwraps
//!   optional/union/collection type wrappers in a fixed order, and produces
//!   both a dotted storage path and a runtime extraction chain.
//! - **Hash identity** ([`compute_identity`], [`identity_for`]): the
//!   deterministic, order-sensitive digest over a model's declared hashable
//!   fields that becomes the document's primary key.
//! - **Projection planning** ([`infer_return_shape`]): decides whether a
//!   projected retrieval can be decoded as the full model or must degrade to
//!   an untyped mapping.
//!
//! Models declare their shape with [`ModelSchema::builder`]; the [`Model`]
//! trait ties a serde record type to its schema.

pub mod cursor;
pub mod error;
pub mod identity;
pub mod kind;
pub mod model;
pub mod projection;

#[cfg(test)]
pub(crate) mod test_fixtures;

// Re-export primary types at crate root for ergonomic imports.
pub use cursor::{dotted_lookup, FieldCursor, FieldPath, PathSegment};
pub use error::{SchemaError, SchemaResult};
pub use identity::{compute_identity, compute_identity_raw, identity_for, HashSource};
pub use kind::{FieldDef, FieldKind};
pub use model::{Model, ModelSchema, ModelSchemaBuilder};
pub use projection::{infer_return_shape, ReturnShape};
