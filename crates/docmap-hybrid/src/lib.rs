//! Hybrid relational+vector backend.
//!
//! [`HybridBackend`] stores each document in two halves. Scalar fields go
//! into an internal record store; fields declared as vector-bearing for the
//! collection go into an embedding table keyed by the document identity.
//! Filters are split the same way, each half is dispatched to its store, and
//! results are re-joined on read, so callers see whole documents and never
//! observe the split.
//!
//! Vector fields are declared per collection at construction time via
//! [`VectorLayout`]; an undeclared collection is all-scalar and behaves like
//! the plain record store.

pub mod backend;
pub mod layout;

pub use backend::HybridBackend;
pub use layout::VectorLayout;
