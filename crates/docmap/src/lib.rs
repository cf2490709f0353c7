//! Content-addressed object-document mapping over interchangeable backends.
//!
//! Applications declare a model (a serde record plus a [`ModelSchema`]),
//! wrap instances in [`Document`], and run CRUD operations through a
//! [`Session`] bound to one of three backends: an in-memory document
//! database, a flat-file JSON store, or a hybrid relational+vector store.
//! A document's primary key is a digest over its declared hashable fields,
//! so identity travels with content rather than with any one backend.
//!
//! ```no_run
//! use docmap::{Config, Document, Session};
//! # use docmap::DocmapResult;
//! # use serde::{Deserialize, Serialize};
//! # use std::sync::LazyLock;
//! # #[derive(Serialize, Deserialize)]
//! # struct Cat { name: String, breed: String }
//! # static SCHEMA: LazyLock<docmap::ModelSchema> = LazyLock::new(|| {
//! #     docmap::ModelSchema::builder("Cat")
//! #         .field("name", docmap::FieldKind::String)
//! #         .field("breed", docmap::FieldKind::String)
//! #         .hashable(["name", "breed"])
//! #         .build()
//! #         .unwrap()
//! # });
//! # impl docmap::Model for Cat {
//! #     fn schema() -> &'static docmap::ModelSchema { &SCHEMA }
//! # }
//! # fn main() -> DocmapResult<()> {
//! let session = Session::open(Config::memory("appdb"))?;
//! let cats = session.collection::<Cat>();
//! let kitty = Document::new(Cat { name: "Kitty".into(), breed: "Tabby".into() })?;
//! cats.insert_one(&kitty)?;
//! let fetched = cats.get(kitty.id())?;
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod document;
pub mod error;
pub mod session;

#[cfg(test)]
pub(crate) mod test_models;

pub use collection::{Collection, Query, Retrieved};
pub use document::Document;
pub use error::{DocmapError, DocmapResult};
pub use session::{BackendConfig, Config, Session};

// Re-export key types
pub use docmap_schema::{
    FieldCursor, FieldKind, FieldPath, Model, ModelSchema, ModelSchemaBuilder, ReturnShape,
};
pub use docmap_store::{
    Backend, BulkOutcome, FindOptions, MemoryBackend, Namespace, RawDocument, StoreError,
    UpdateOutcome, WriteOp,
};
pub use docmap_types::{
    CompareOp, Direction, Filter, Identity, IndexModel, Projection, Sort, Update,
};
pub use docmap_filestore::FileBackend;
pub use docmap_hybrid::{HybridBackend, VectorLayout};
