//! In-memory document-database adapter.
//!
//! The full-featured reference backend: operator filters, sorts, unique
//! index enforcement, upserts, and batched writes. Collections are held in
//! `BTreeMap`s behind a single `RwLock`; iteration order (and therefore
//! backend-native result order) is identity order.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use docmap_types::{Filter, Identity, IndexModel, Update, ID_FIELD};

use crate::error::{StoreError, StoreResult};
use crate::eval::{apply_projection, apply_update, matches, set_dotted, sort_documents};
use crate::ops::{
    document_id, BulkOutcome, FindOptions, Namespace, RawDocument, UpdateOutcome, WriteOp,
};
use crate::traits::Backend;

#[derive(Default)]
struct CollectionData {
    documents: BTreeMap<String, RawDocument>,
    indexes: Vec<IndexModel>,
}

/// In-memory backend implementing the full dispatch contract.
pub struct MemoryBackend {
    collections: RwLock<HashMap<Namespace, CollectionData>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents in a collection (0 if it does not exist).
    pub fn collection_len(&self, ns: &Namespace) -> usize {
        let map = self.collections.read().expect("lock poisoned");
        map.get(ns).map_or(0, |c| c.documents.len())
    }

    /// Drop every collection.
    pub fn clear(&self) {
        self.collections.write().expect("lock poisoned").clear();
    }

    fn matching_docs(&self, ns: &Namespace, filter: &Filter) -> Vec<RawDocument> {
        let map = self.collections.read().expect("lock poisoned");
        match map.get(ns) {
            Some(collection) => collection
                .documents
                .values()
                .filter(|doc| matches(doc, filter))
                .cloned()
                .collect(),
            None => Vec::new(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Keys of `candidate` at the index's paths, for duplicate diagnostics.
fn index_key_values(index: &IndexModel, document: &RawDocument) -> Map<String, Value> {
    let mut keys = Map::new();
    for path in index.paths() {
        let value = docmap_types::dotted_get(document, path)
            .cloned()
            .unwrap_or(Value::Null);
        keys.insert(path.to_string(), value);
    }
    keys
}

/// Check `candidate` against every unique index in the collection,
/// ignoring the document stored under `exclude_key` (for replacements).
fn check_unique_indexes(
    ns: &Namespace,
    collection: &CollectionData,
    candidate: &RawDocument,
    exclude_key: Option<&str>,
) -> StoreResult<()> {
    for index in collection.indexes.iter().filter(|i| i.unique) {
        let candidate_keys = index_key_values(index, candidate);
        for (key, existing) in &collection.documents {
            if exclude_key == Some(key.as_str()) {
                continue;
            }
            if index_key_values(index, existing) == candidate_keys {
                return Err(StoreError::DuplicateKey {
                    collection: ns.collection.clone(),
                    dup_keys: vec![candidate_keys],
                });
            }
        }
    }
    Ok(())
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn find(
        &self,
        ns: &Namespace,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<RawDocument>> {
        let mut docs = self.matching_docs(ns, filter);
        sort_documents(&mut docs, &options.sort)?;
        let docs: Vec<RawDocument> = docs
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|doc| apply_projection(&doc, options.projection.as_ref()))
            .collect();
        debug!(ns = %ns, matched = docs.len(), "find");
        Ok(docs)
    }

    fn distinct(&self, ns: &Namespace, key: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        let mut seen: Vec<Value> = Vec::new();
        for doc in self.matching_docs(ns, filter) {
            let value = docmap_types::dotted_get(&doc, key)
                .cloned()
                .unwrap_or(Value::Null);
            if !seen.contains(&value) {
                seen.push(value);
            }
        }
        Ok(seen)
    }

    fn count_documents(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64> {
        Ok(self.matching_docs(ns, filter).len() as u64)
    }

    fn insert_one(&self, ns: &Namespace, document: RawDocument) -> StoreResult<Identity> {
        let (identity, key) = document_id(&document)?;
        let mut map = self.collections.write().expect("lock poisoned");
        let collection = map.entry(ns.clone()).or_default();
        if collection.documents.contains_key(&key) {
            let mut dup = Map::new();
            dup.insert(ID_FIELD.to_string(), Value::String(key));
            return Err(StoreError::DuplicateKey {
                collection: ns.collection.clone(),
                dup_keys: vec![dup],
            });
        }
        check_unique_indexes(ns, collection, &document, None)?;
        collection.documents.insert(key, document);
        debug!(ns = %ns, id = %identity, "insert_one");
        Ok(identity)
    }

    fn replace_one(
        &self,
        ns: &Namespace,
        filter: &Filter,
        replacement: RawDocument,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let (new_identity, new_key) = document_id(&replacement)?;
        let mut map = self.collections.write().expect("lock poisoned");
        let collection = map.entry(ns.clone()).or_default();
        let matched_key = collection
            .documents
            .iter()
            .find(|(_, doc)| matches(doc, filter))
            .map(|(key, _)| key.clone());
        match matched_key {
            Some(old_key) => {
                check_unique_indexes(ns, collection, &replacement, Some(&old_key))?;
                let old = collection
                    .documents
                    .remove(&old_key)
                    .unwrap_or_default();
                let modified = u64::from(old != replacement);
                // Identity may differ from the matched document's: the old
                // record is gone, a new one exists under the new key.
                collection.documents.insert(new_key, replacement);
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: modified,
                    upserted_id: None,
                })
            }
            None if upsert => {
                check_unique_indexes(ns, collection, &replacement, None)?;
                collection.documents.insert(new_key, replacement);
                debug!(ns = %ns, id = %new_identity, "replace_one upserted");
                Ok(UpdateOutcome {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: Some(new_identity),
                })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    fn update_one(
        &self,
        ns: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let mut map = self.collections.write().expect("lock poisoned");
        let collection = map.entry(ns.clone()).or_default();
        let matched_key = collection
            .documents
            .iter()
            .find(|(_, doc)| matches(doc, filter))
            .map(|(key, _)| key.clone());
        match matched_key {
            Some(key) => {
                let mut doc = collection.documents.get(&key).cloned().unwrap_or_default();
                let modified = apply_update(&mut doc, update)?;
                collection.documents.insert(key, doc);
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_id: None,
                })
            }
            None if upsert => {
                let mut doc = Map::new();
                for (path, condition) in filter.iter() {
                    if let docmap_types::Condition::Equals(value) = condition {
                        set_dotted(&mut doc, path, value.clone());
                    }
                }
                apply_update(&mut doc, update)?;
                let (identity, key) = document_id(&doc)?;
                check_unique_indexes(ns, collection, &doc, None)?;
                collection.documents.insert(key, doc);
                Ok(UpdateOutcome {
                    matched_count: 0,
                    modified_count: 0,
                    upserted_id: Some(identity),
                })
            }
            None => Ok(UpdateOutcome::default()),
        }
    }

    fn update_many(
        &self,
        ns: &Namespace,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> StoreResult<UpdateOutcome> {
        let mut map = self.collections.write().expect("lock poisoned");
        let collection = map.entry(ns.clone()).or_default();
        let matched_keys: Vec<String> = collection
            .documents
            .iter()
            .filter(|(_, doc)| matches(doc, filter))
            .map(|(key, _)| key.clone())
            .collect();
        if matched_keys.is_empty() {
            drop(map);
            // Same upsert path as update_one: at most one document appears.
            return self.update_one(ns, filter, update, upsert);
        }
        let mut modified = 0;
        for key in &matched_keys {
            let mut doc = collection.documents.get(key).cloned().unwrap_or_default();
            if apply_update(&mut doc, update)? {
                modified += 1;
            }
            collection.documents.insert(key.clone(), doc);
        }
        Ok(UpdateOutcome {
            matched_count: matched_keys.len() as u64,
            modified_count: modified,
            upserted_id: None,
        })
    }

    fn delete_one(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64> {
        let mut map = self.collections.write().expect("lock poisoned");
        let Some(collection) = map.get_mut(ns) else {
            return Ok(0);
        };
        let matched_key = collection
            .documents
            .iter()
            .find(|(_, doc)| matches(doc, filter))
            .map(|(key, _)| key.clone());
        match matched_key {
            Some(key) => {
                collection.documents.remove(&key);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_many(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64> {
        let mut map = self.collections.write().expect("lock poisoned");
        let Some(collection) = map.get_mut(ns) else {
            return Ok(0);
        };
        let before = collection.documents.len();
        collection.documents.retain(|_, doc| !matches(doc, filter));
        Ok((before - collection.documents.len()) as u64)
    }

    fn bulk_write(&self, ns: &Namespace, operations: Vec<WriteOp>) -> StoreResult<BulkOutcome> {
        let mut outcome = BulkOutcome::default();
        for op in operations {
            match op {
                WriteOp::InsertOne(doc) => {
                    self.insert_one(ns, doc)?;
                    outcome.inserted_count += 1;
                }
                WriteOp::UpdateOne {
                    filter,
                    update,
                    upsert,
                } => {
                    let r = self.update_one(ns, &filter, &update, upsert)?;
                    outcome.matched_count += r.matched_count;
                    outcome.modified_count += r.modified_count;
                    outcome.upserted_count += u64::from(r.upserted_id.is_some());
                }
                WriteOp::UpdateMany {
                    filter,
                    update,
                    upsert,
                } => {
                    let r = self.update_many(ns, &filter, &update, upsert)?;
                    outcome.matched_count += r.matched_count;
                    outcome.modified_count += r.modified_count;
                    outcome.upserted_count += u64::from(r.upserted_id.is_some());
                }
                WriteOp::ReplaceOne {
                    filter,
                    replacement,
                    upsert,
                } => {
                    let r = self.replace_one(ns, &filter, replacement, upsert)?;
                    outcome.matched_count += r.matched_count;
                    outcome.modified_count += r.modified_count;
                    outcome.upserted_count += u64::from(r.upserted_id.is_some());
                }
                WriteOp::DeleteOne(filter) => {
                    outcome.deleted_count += self.delete_one(ns, &filter)?;
                }
                WriteOp::DeleteMany(filter) => {
                    outcome.deleted_count += self.delete_many(ns, &filter)?;
                }
            }
        }
        Ok(outcome)
    }

    fn create_index(&self, ns: &Namespace, index: &IndexModel) -> bool {
        let mut map = self.collections.write().expect("lock poisoned");
        let collection = map.entry(ns.clone()).or_default();
        if collection.indexes.contains(index) {
            return true;
        }
        if index.unique {
            // Refuse (as a boolean, not an error) if existing data already
            // violates the uniqueness the index would enforce.
            let docs: Vec<&RawDocument> = collection.documents.values().collect();
            for (i, a) in docs.iter().enumerate() {
                for b in &docs[i + 1..] {
                    if index_key_values(index, a) == index_key_values(index, b) {
                        warn!(ns = %ns, "unique index violates existing data, not created");
                        return false;
                    }
                }
            }
        }
        collection.indexes.push(index.clone());
        true
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.collections.read().expect("lock poisoned");
        f.debug_struct("MemoryBackend")
            .field("collections", &map.len())
            .finish()
    }
}
