//! Foundation types for docmap.
//!
//! This crate defines the vocabulary every other docmap crate speaks:
//!
//! - [`Identity`] -- the content-derived primary key of a document
//! - [`canonical_string`] -- byte-stable value rendering for hash input
//! - [`Filter`] / [`Update`] / [`Sort`] / [`Projection`] -- the canonical
//!   operation representations each backend translates into native calls
//! - [`IndexModel`] -- single-field or compound index declarations
//!
//! Nothing here touches storage; these are pure data types plus the
//! normalization rules the rest of the stack relies on (identity default in
//! projections, canonical float/timestamp rendering for determinism).

pub mod error;
pub mod filter;
pub mod identity;
pub mod index;
pub mod projection;
pub mod sort;
pub mod update;
pub mod value;

/// Backend-native primary-key field name. Application code always sees the
/// identity as `id`; storage always uses this name. The translation happens
/// once, at the document serialize/deserialize boundary.
pub const ID_FIELD: &str = "_id";

/// Storage field holding the creation timestamp (RFC 3339, milliseconds).
pub const CREATED_AT_FIELD: &str = "created_at";

/// Storage field holding the last-modification timestamp.
pub const UPDATED_AT_FIELD: &str = "updated_at";

// Re-export primary types at crate root for ergonomic imports.
pub use error::TypeError;
pub use filter::{CompareOp, Condition, Filter};
pub use identity::Identity;
pub use index::IndexModel;
pub use projection::{NormalizedProjection, Projection};
pub use sort::{Direction, Sort};
pub use update::{Update, SET_OPERATOR};
pub use value::{canonical_datetime, canonical_json, canonical_string, dotted_get};
