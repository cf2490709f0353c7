use serde_json::Value;

use docmap_types::{Filter, Identity, IndexModel, Update};

use crate::error::{StoreError, StoreResult};
use crate::ops::{BulkOutcome, FindOptions, Namespace, RawDocument, UpdateOutcome, WriteOp};

/// The uniform backend dispatch contract.
///
/// One implementation per storage backend; every implementation exposes the
/// identical operation set with identical result semantics, so `Document`
/// operations run unmodified against structurally different stores.
///
/// Shared semantics all implementations must satisfy:
/// - Documents are raw mappings keyed by `_id` (a hex identity digest).
/// - `find` returns backend-native order unless a sort is given; `skip` and
///   `limit` apply after filtering and sorting, before projection.
/// - `find_one` matching nothing fails with [`StoreError::NotFound`]; a
///   plural `find` matching nothing returns an empty list.
/// - Inserting an existing identity (or violating a unique index) fails with
///   [`StoreError::DuplicateKey`].
/// - No operation retries internally; retry policy belongs to the caller.
pub trait Backend: Send + Sync {
    /// Short backend name, used in diagnostics and `Unsupported` errors.
    fn name(&self) -> &'static str;

    /// Find all documents matching `filter`, shaped by `options`.
    fn find(
        &self,
        ns: &Namespace,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<RawDocument>>;

    /// Find a single matching document, or fail with `NotFound`.
    ///
    /// Default implementation: `find` with `limit = 1` past the requested
    /// skip. Backends may override to avoid materializing more than one
    /// document.
    fn find_one(
        &self,
        ns: &Namespace,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<RawDocument> {
        let mut options = options.clone();
        options.limit = Some(1);
        let mut found = self.find(ns, filter, &options)?;
        match found.pop() {
            Some(doc) => Ok(doc),
            None => Err(StoreError::NotFound {
                collection: ns.collection.clone(),
            }),
        }
    }

    /// Unique observed values at a dotted path among matching documents.
    fn distinct(&self, ns: &Namespace, key: &str, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// Number of documents matching `filter`.
    fn count_documents(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64>;

    /// Insert one document; returns its identity.
    fn insert_one(&self, ns: &Namespace, document: RawDocument) -> StoreResult<Identity>;

    /// Insert several documents; returns their identities in input order.
    ///
    /// Default implementation inserts one at a time and stops at the first
    /// failure. Backends may override for atomicity or fewer round trips.
    fn insert_many(
        &self,
        ns: &Namespace,
        documents: Vec<RawDocument>,
    ) -> StoreResult<Vec<Identity>> {
        documents
            .into_iter()
            .map(|doc| self.insert_one(ns, doc))
            .collect()
    }

    /// Replace the first matching document wholesale.
    ///
    /// The replacement's identity may differ from the matched document's; in
    /// that case the old record is removed and a new one created.
    fn replace_one(
        &self,
        ns: &Namespace,
        filter: &Filter,
        replacement: RawDocument,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome>;

    /// Partially update the first matching document.
    fn update_one(
        &self,
        ns: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome>;

    /// Partially update every matching document.
    fn update_many(
        &self,
        ns: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome>;

    /// Delete the first matching document; returns the deleted count (0/1).
    fn delete_one(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64>;

    /// Delete every matching document; returns the deleted count.
    fn delete_many(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64>;

    /// Batched heterogeneous write. Only the document-database backend
    /// supports this meaningfully; the default reports `Unsupported`.
    fn bulk_write(&self, ns: &Namespace, operations: Vec<WriteOp>) -> StoreResult<BulkOutcome> {
        let _ = (ns, operations);
        Err(StoreError::Unsupported {
            backend: self.name(),
            operation: "bulk_write",
        })
    }

    /// Best-effort index creation. Failures are reported as `false`, never
    /// as an error: index creation is idempotent and advisory.
    fn create_index(&self, ns: &Namespace, index: &IndexModel) -> bool;
}
