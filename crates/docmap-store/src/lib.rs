//! Backend dispatch layer for docmap.
//!
//! Defines the [`Backend`] trait -- the uniform operation set every storage
//! backend implements -- along with the canonical operation/result types and
//! the shared filter/sort/projection evaluator. Ships the in-memory
//! document-database adapter ([`MemoryBackend`]), the reference
//! implementation of the contract.
//!
//! # Dispatch rules
//!
//! 1. Filter/update arguments are validated *above* this layer (in the
//!    document façade); backends assume well-formed canonical inputs.
//! 2. Backend-native failures are translated into [`StoreError`] kinds at
//!    this boundary; nothing backend-specific leaks upward.
//! 3. No operation retries internally.
//! 4. Each call is a single synchronous request/response; concurrency safety
//!    is whatever the underlying store provides.

pub mod error;
pub mod eval;
pub mod memory;
pub mod ops;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::MemoryBackend;
pub use ops::{
    document_id, BulkOutcome, FindOptions, Namespace, RawDocument, UpdateOutcome, WriteOp,
};
pub use traits::Backend;
