//! Flat-file JSON storage backend.
//!
//! Layout: one file per document per collection folder, named by the
//! document's identity digest:
//!
//! ```text
//! <root>/<database>/<collection>/<identity-digest>.json
//! ```
//!
//! Deliberate scope reductions relative to the document-database adapter:
//!
//! - Filters are interpreted as flat equality only; operator conditions are
//!   rejected with [`docmap_store::StoreError::Unsupported`] rather than
//!   silently treated
//!   as equality.
//! - No index support: `create_index` reports `false`.
//! - Writes are unsynchronized read-modify-write on individual files.
//!   Concurrent writers targeting the same identity race, last write wins.
//!   This limitation is intentional; upgrading it (e.g. advisory file
//!   locks) is a deliberate design change, not a bug fix.

pub mod backend;

pub use backend::FileBackend;
