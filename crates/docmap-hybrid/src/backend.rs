use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use docmap_store::error::StoreResult;
use docmap_store::eval::{apply_projection, apply_update, matches, set_dotted, sort_documents};
use docmap_store::ops::{document_id, FindOptions, Namespace, RawDocument, UpdateOutcome};
use docmap_store::{Backend, MemoryBackend};
use docmap_types::{Condition, Filter, Identity, IndexModel, Update, ID_FIELD};

use crate::layout::VectorLayout;

/// Map of vector field name to value for one document.
type VectorRow = Map<String, Value>;

/// Hybrid backend: scalar fields in an internal record store, vector fields
/// in an embedding table keyed by identity. The split is invisible to
/// callers; every operation re-joins before returning.
pub struct HybridBackend {
    records: MemoryBackend,
    vectors: RwLock<HashMap<Namespace, BTreeMap<String, VectorRow>>>,
    layout: VectorLayout,
}

impl HybridBackend {
    pub fn new(layout: VectorLayout) -> Self {
        Self {
            records: MemoryBackend::new(),
            vectors: RwLock::new(HashMap::new()),
            layout,
        }
    }

    /// The stored vector half of a document, if any. Mainly useful for
    /// inspecting the split.
    pub fn vector_half(&self, ns: &Namespace, identity: &Identity) -> Option<VectorRow> {
        let vectors = self.vectors.read().expect("lock poisoned");
        vectors.get(ns)?.get(&identity.to_hex()).cloned()
    }

    fn split_document(&self, ns: &Namespace, document: RawDocument) -> (RawDocument, VectorRow) {
        let mut scalar = Map::new();
        let mut vector = Map::new();
        for (key, value) in document {
            if self.layout.is_vector_path(&ns.collection, &key) {
                vector.insert(key, value);
            } else {
                scalar.insert(key, value);
            }
        }
        (scalar, vector)
    }

    fn split_filter(&self, ns: &Namespace, filter: &Filter) -> (Filter, Filter) {
        filter
            .clone()
            .partition(|path| self.layout.is_vector_path(&ns.collection, path))
    }

    fn store_vector(&self, ns: &Namespace, key: &str, row: VectorRow) {
        if row.is_empty() {
            return;
        }
        let mut vectors = self.vectors.write().expect("lock poisoned");
        vectors
            .entry(ns.clone())
            .or_default()
            .insert(key.to_string(), row);
    }

    fn remove_vector(&self, ns: &Namespace, key: &str) {
        let mut vectors = self.vectors.write().expect("lock poisoned");
        if let Some(table) = vectors.get_mut(ns) {
            table.remove(key);
        }
    }

    /// Matching documents with both halves joined, paired with their `_id`.
    fn joined_matches(
        &self,
        ns: &Namespace,
        filter: &Filter,
    ) -> StoreResult<Vec<(String, RawDocument)>> {
        let (vector_filter, scalar_filter) = self.split_filter(ns, filter);
        let scalar_docs = self.records.find(ns, &scalar_filter, &FindOptions::new())?;
        let vectors = self.vectors.read().expect("lock poisoned");
        let table = vectors.get(ns);
        let mut joined = Vec::with_capacity(scalar_docs.len());
        for mut doc in scalar_docs {
            let Some(key) = doc.get(ID_FIELD).and_then(Value::as_str).map(String::from) else {
                continue;
            };
            if let Some(row) = table.and_then(|t| t.get(&key)) {
                for (field, value) in row {
                    doc.insert(field.clone(), value.clone());
                }
            }
            if matches(&doc, &vector_filter) {
                joined.push((key, doc));
            }
        }
        Ok(joined)
    }

    fn id_filter(key: &str) -> Filter {
        Filter::new().eq(ID_FIELD, key)
    }

    /// Persist an already-joined document, splitting it back into halves.
    /// The record under `key` must exist.
    fn rewrite(&self, ns: &Namespace, key: &str, joined: RawDocument) -> StoreResult<()> {
        let (scalar, vector) = self.split_document(ns, joined);
        self.records
            .replace_one(ns, &Self::id_filter(key), scalar, false)?;
        self.remove_vector(ns, key);
        self.store_vector(ns, key, vector);
        Ok(())
    }
}

impl Backend for HybridBackend {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn find(
        &self,
        ns: &Namespace,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<RawDocument>> {
        let mut docs: Vec<RawDocument> = self
            .joined_matches(ns, filter)?
            .into_iter()
            .map(|(_, d)| d)
            .collect();
        sort_documents(&mut docs, &options.sort)?;
        Ok(docs
            .into_iter()
            .skip(options.skip)
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|doc| apply_projection(&doc, options.projection.as_ref()))
            .collect())
    }

    fn distinct(&self, ns: &Namespace, key: &str, filter: &Filter) -> StoreResult<Vec<Value>> {
        let mut seen: Vec<Value> = Vec::new();
        for (_, doc) in self.joined_matches(ns, filter)? {
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
        Ok(self.joined_matches(ns, filter)?.len() as u64)
    }

    fn insert_one(&self, ns: &Namespace, document: RawDocument) -> StoreResult<Identity> {
        let (_, key) = document_id(&document)?;
        let (scalar, vector) = self.split_document(ns, document);
        let identity = self.records.insert_one(ns, scalar)?;
        self.store_vector(ns, &key, vector);
        debug!(ns = %ns, id = %identity, "insert_one split");
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
        match self.joined_matches(ns, filter)?.into_iter().next() {
            Some((old_key, old_doc)) => {
                let modified = u64::from(old_doc != replacement);
                let (scalar, vector) = self.split_document(ns, replacement);
                self.records
                    .replace_one(ns, &Self::id_filter(&old_key), scalar, false)?;
                self.remove_vector(ns, &old_key);
                self.store_vector(ns, &new_key, vector);
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: modified,
                    upserted_id: None,
                })
            }
            None if upsert => {
                self.insert_one(ns, replacement)?;
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
        match self.joined_matches(ns, filter)?.into_iter().next() {
            Some((key, mut doc)) => {
                let modified = apply_update(&mut doc, update)?;
                self.rewrite(ns, &key, doc)?;
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_id: None,
                })
            }
            None if upsert => {
                let mut doc = Map::new();
                for (path, condition) in filter.iter() {
                    if let Condition::Equals(value) = condition {
                        set_dotted(&mut doc, path, value.clone());
                    }
                }
                apply_update(&mut doc, update)?;
                let identity = self.insert_one(ns, doc)?;
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
        let matched = self.joined_matches(ns, filter)?;
        if matched.is_empty() {
            return self.update_one(ns, filter, update, upsert);
        }
        let matched_count = matched.len() as u64;
        let mut modified = 0;
        for (key, mut doc) in matched {
            if apply_update(&mut doc, update)? {
                modified += 1;
            }
            self.rewrite(ns, &key, doc)?;
        }
        Ok(UpdateOutcome {
            matched_count,
            modified_count: modified,
            upserted_id: None,
        })
    }

    fn delete_one(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64> {
        match self.joined_matches(ns, filter)?.into_iter().next() {
            Some((key, _)) => {
                self.records.delete_one(ns, &Self::id_filter(&key))?;
                self.remove_vector(ns, &key);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_many(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64> {
        let matched = self.joined_matches(ns, filter)?;
        let count = matched.len() as u64;
        for (key, _) in matched {
            self.records.delete_one(ns, &Self::id_filter(&key))?;
            self.remove_vector(ns, &key);
        }
        Ok(count)
    }

    fn create_index(&self, ns: &Namespace, index: &IndexModel) -> bool {
        if index
            .paths()
            .any(|p| self.layout.is_vector_path(&ns.collection, p))
        {
            warn!(ns = %ns, "index over vector fields not supported");
            return false;
        }
        self.records.create_index(ns, index)
    }
}

impl std::fmt::Debug for HybridBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let vectors = self.vectors.read().expect("lock poisoned");
        f.debug_struct("HybridBackend")
            .field("vector_tables", &vectors.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_store::StoreError;
    use docmap_types::CompareOp;
    use serde_json::json;

    fn ns() -> Namespace {
        Namespace::new("appdb", "cats")
    }

    fn backend() -> HybridBackend {
        HybridBackend::new(VectorLayout::new().vector_fields("cats", ["embedding"]))
    }

    fn cat(seed: u8, name: &str, age: i64, embedding: Vec<f64>) -> RawDocument {
        let mut doc = Map::new();
        doc.insert(
            ID_FIELD.to_string(),
            Value::String(Identity::from_digest([seed; 32]).to_hex()),
        );
        doc.insert("name".to_string(), json!(name));
        doc.insert("age".to_string(), json!(age));
        doc.insert("embedding".to_string(), json!(embedding));
        doc
    }

    #[test]
    fn insert_splits_and_find_rejoins() {
        let b = backend();
        let id = b.insert_one(&ns(), cat(1, "Kitty", 3, vec![0.1, 0.2])).unwrap();

        // Vector half lives in its own table...
        let row = b.vector_half(&ns(), &id).unwrap();
        assert_eq!(row.get("embedding"), Some(&json!([0.1, 0.2])));

        // ...but reads see the whole document.
        let found = b
            .find_one(
                &ns(),
                &Filter::new().eq(ID_FIELD, id.to_hex()),
                &FindOptions::new(),
            )
            .unwrap();
        assert_eq!(found.get("name"), Some(&json!("Kitty")));
        assert_eq!(found.get("embedding"), Some(&json!([0.1, 0.2])));
    }

    #[test]
    fn mixed_filter_is_split_across_halves() {
        let b = backend();
        b.insert_one(&ns(), cat(1, "a", 2, vec![1.0])).unwrap();
        b.insert_one(&ns(), cat(2, "b", 5, vec![1.0])).unwrap();
        b.insert_one(&ns(), cat(3, "c", 9, vec![2.0])).unwrap();

        let filter = Filter::new()
            .op("age", CompareOp::Gt, 3)
            .eq("embedding", json!([1.0]));
        let found = b.find(&ns(), &filter, &FindOptions::new()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some(&json!("b")));
    }

    #[test]
    fn update_touching_vector_field_persists_in_the_table() {
        let b = backend();
        let id = b.insert_one(&ns(), cat(1, "Kitty", 3, vec![0.1])).unwrap();
        let outcome = b
            .update_one(
                &ns(),
                &Filter::new().eq("name", "Kitty"),
                &Update::set_field("embedding", json!([0.9])),
                false,
            )
            .unwrap();
        assert_eq!(outcome.modified_count, 1);

        let row = b.vector_half(&ns(), &id).unwrap();
        assert_eq!(row.get("embedding"), Some(&json!([0.9])));
    }

    #[test]
    fn scalar_update_leaves_vector_half_intact() {
        let b = backend();
        let id = b.insert_one(&ns(), cat(1, "Kitty", 3, vec![0.1])).unwrap();
        b.update_one(
            &ns(),
            &Filter::new().eq("name", "Kitty"),
            &Update::set_field("age", 4),
            false,
        )
        .unwrap();
        let row = b.vector_half(&ns(), &id).unwrap();
        assert_eq!(row.get("embedding"), Some(&json!([0.1])));
    }

    #[test]
    fn delete_removes_both_halves() {
        let b = backend();
        let id = b.insert_one(&ns(), cat(1, "Kitty", 3, vec![0.1])).unwrap();
        assert_eq!(b.delete_one(&ns(), &Filter::new().eq("name", "Kitty")).unwrap(), 1);
        assert!(b.vector_half(&ns(), &id).is_none());
        assert_eq!(b.count_documents(&ns(), &Filter::new()).unwrap(), 0);
    }

    #[test]
    fn replace_with_new_identity_moves_the_vector_row() {
        let b = backend();
        let old_id = b.insert_one(&ns(), cat(1, "Old", 3, vec![0.1])).unwrap();
        let outcome = b
            .replace_one(
                &ns(),
                &Filter::new().eq("name", "Old"),
                cat(2, "New", 3, vec![0.5]),
                false,
            )
            .unwrap();
        assert_eq!(outcome.matched_count, 1);
        assert!(b.vector_half(&ns(), &old_id).is_none());
        let new_id = Identity::from_digest([2; 32]);
        assert_eq!(
            b.vector_half(&ns(), &new_id).unwrap().get("embedding"),
            Some(&json!([0.5]))
        );
    }

    #[test]
    fn distinct_reads_the_joined_view() {
        let b = backend();
        b.insert_one(&ns(), cat(1, "a", 2, vec![1.0])).unwrap();
        b.insert_one(&ns(), cat(2, "b", 5, vec![1.0])).unwrap();
        let values = b.distinct(&ns(), "embedding", &Filter::new()).unwrap();
        assert_eq!(values, vec![json!([1.0])]);
    }

    #[test]
    fn bulk_write_is_unsupported() {
        let b = backend();
        let err = b.bulk_write(&ns(), Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Unsupported {
                backend: "hybrid",
                ..
            }
        ));
    }

    #[test]
    fn index_over_vector_fields_is_refused() {
        let b = backend();
        assert!(!b.create_index(&ns(), &IndexModel::on("embedding")));
        assert!(b.create_index(&ns(), &IndexModel::on("name")));
    }

    #[test]
    fn find_one_missing_is_not_found() {
        let b = backend();
        let err = b
            .find_one(&ns(), &Filter::new().eq("name", "ghost"), &FindOptions::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn upsert_via_update_splits_the_built_document() {
        let b = backend();
        let mut fields = Map::new();
        fields.insert("embedding".to_string(), json!([0.3]));
        let seed_id = Identity::from_digest([9; 32]).to_hex();
        let outcome = b
            .update_one(
                &ns(),
                &Filter::new().eq(ID_FIELD, seed_id.clone()).eq("name", "Ghost"),
                &Update::set(fields),
                true,
            )
            .unwrap();
        let id = outcome.upserted_id.unwrap();
        assert_eq!(id.to_hex(), seed_id);
        assert_eq!(
            b.vector_half(&ns(), &id).unwrap().get("embedding"),
            Some(&json!([0.3]))
        );
    }
}
