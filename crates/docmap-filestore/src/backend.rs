use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use docmap_store::error::{StoreError, StoreResult};
use docmap_store::eval::{apply_projection, apply_update, matches, sort_documents};
use docmap_store::ops::{document_id, FindOptions, Namespace, RawDocument, UpdateOutcome};
use docmap_store::Backend;
use docmap_types::{Filter, Identity, IndexModel, Update};

/// One-file-per-document JSON backend.
pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at the given client folder. Folders are
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The client root folder.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_dir(&self, ns: &Namespace) -> PathBuf {
        self.root.join(&ns.database).join(&ns.collection)
    }

    fn document_path(&self, ns: &Namespace, key: &str) -> PathBuf {
        self.collection_dir(ns).join(format!("{key}.json"))
    }

    fn read_document(path: &Path) -> StoreResult<RawDocument> {
        let data = fs::read(path)?;
        let value: Value = serde_json::from_slice(&data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(StoreError::Serialization(format!(
                "{} does not contain a JSON object",
                path.display()
            ))),
        }
    }

    fn write_document(&self, ns: &Namespace, key: &str, document: &RawDocument) -> StoreResult<()> {
        fs::create_dir_all(self.collection_dir(ns))?;
        let data = serde_json::to_vec_pretty(&Value::Object(document.clone()))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        fs::write(self.document_path(ns, key), data)?;
        Ok(())
    }

    /// All documents in a collection, in file-listing order sorted by name
    /// (identity order), so backend-native order is deterministic.
    fn load_collection(&self, ns: &Namespace) -> StoreResult<Vec<(String, RawDocument)>> {
        let dir = self.collection_dir(ns);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(".json") {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names
            .into_iter()
            .map(|key| {
                let doc = Self::read_document(&self.document_path(ns, &key))?;
                Ok((key, doc))
            })
            .collect()
    }

    fn matching(&self, ns: &Namespace, filter: &Filter) -> StoreResult<Vec<(String, RawDocument)>> {
        require_equality_only(filter)?;
        Ok(self
            .load_collection(ns)?
            .into_iter()
            .filter(|(_, doc)| matches(doc, filter))
            .collect())
    }
}

fn require_equality_only(filter: &Filter) -> StoreResult<()> {
    if filter.is_equality_only() {
        Ok(())
    } else {
        Err(StoreError::Unsupported {
            backend: "file",
            operation: "operator filters",
        })
    }
}

impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn find(
        &self,
        ns: &Namespace,
        filter: &Filter,
        options: &FindOptions,
    ) -> StoreResult<Vec<RawDocument>> {
        let mut docs: Vec<RawDocument> =
            self.matching(ns, filter)?.into_iter().map(|(_, d)| d).collect();
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
        for (_, doc) in self.matching(ns, filter)? {
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
        Ok(self.matching(ns, filter)?.len() as u64)
    }

    fn insert_one(&self, ns: &Namespace, document: RawDocument) -> StoreResult<Identity> {
        let (identity, key) = document_id(&document)?;
        let path = self.document_path(ns, &key);
        if path.exists() {
            let mut dup = serde_json::Map::new();
            dup.insert(
                docmap_types::ID_FIELD.to_string(),
                Value::String(key.clone()),
            );
            return Err(StoreError::DuplicateKey {
                collection: ns.collection.clone(),
                dup_keys: vec![dup],
            });
        }
        self.write_document(ns, &key, &document)?;
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
        let matched = self.matching(ns, filter)?.into_iter().next();
        match matched {
            Some((old_key, old_doc)) => {
                // Replacement identity may differ: the old file is removed
                // and a new one created under the new digest.
                if old_key != new_key {
                    fs::remove_file(self.document_path(ns, &old_key))?;
                }
                let modified = u64::from(old_doc != replacement);
                self.write_document(ns, &new_key, &replacement)?;
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: modified,
                    upserted_id: None,
                })
            }
            None if upsert => {
                self.write_document(ns, &new_key, &replacement)?;
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
        let matched = self.matching(ns, filter)?.into_iter().next();
        match matched {
            Some((key, mut doc)) => {
                let modified = apply_update(&mut doc, update)?;
                self.write_document(ns, &key, &doc)?;
                Ok(UpdateOutcome {
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_id: None,
                })
            }
            None if upsert => {
                let mut doc = serde_json::Map::new();
                for (path, condition) in filter.iter() {
                    if let docmap_types::Condition::Equals(value) = condition {
                        docmap_store::eval::set_dotted(&mut doc, path, value.clone());
                    }
                }
                apply_update(&mut doc, update)?;
                let (identity, key) = document_id(&doc)?;
                self.write_document(ns, &key, &doc)?;
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
        let matched = self.matching(ns, filter)?;
        if matched.is_empty() {
            return self.update_one(ns, filter, update, upsert);
        }
        let mut modified = 0;
        let matched_count = matched.len() as u64;
        for (key, mut doc) in matched {
            if apply_update(&mut doc, update)? {
                modified += 1;
            }
            self.write_document(ns, &key, &doc)?;
        }
        Ok(UpdateOutcome {
            matched_count,
            modified_count: modified,
            upserted_id: None,
        })
    }

    fn delete_one(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64> {
        match self.matching(ns, filter)?.into_iter().next() {
            Some((key, _)) => {
                fs::remove_file(self.document_path(ns, &key))?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_many(&self, ns: &Namespace, filter: &Filter) -> StoreResult<u64> {
        let matched = self.matching(ns, filter)?;
        let count = matched.len() as u64;
        for (key, _) in matched {
            fs::remove_file(self.document_path(ns, &key))?;
        }
        Ok(count)
    }

    fn create_index(&self, ns: &Namespace, index: &IndexModel) -> bool {
        // The flat file layout has no index structures; report best-effort
        // failure instead of erroring.
        debug!(ns = %ns, index = ?index.name, "create_index unsupported on file backend");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_types::{CompareOp, ID_FIELD};
    use serde_json::{json, Map};
    use tempfile::TempDir;

    fn ns() -> Namespace {
        Namespace::new("appdb", "cats")
    }

    fn cat(seed: u8, name: &str, breed: &str) -> RawDocument {
        let mut doc = Map::new();
        doc.insert(
            ID_FIELD.to_string(),
            Value::String(Identity::from_digest([seed; 32]).to_hex()),
        );
        doc.insert("name".to_string(), json!(name));
        doc.insert("breed".to_string(), json!(breed));
        doc
    }

    #[test]
    fn insert_then_find_one_roundtrips_field_for_field() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let doc = cat(1, "Kitty", "Domestic Shorthair");
        let id = backend.insert_one(&ns(), doc.clone()).unwrap();

        let found = backend
            .find_one(
                &ns(),
                &Filter::new().eq(ID_FIELD, id.to_hex()),
                &FindOptions::new(),
            )
            .unwrap();
        assert_eq!(found, doc);
    }

    #[test]
    fn documents_land_in_identity_named_files() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let id = backend.insert_one(&ns(), cat(7, "Kitty", "Tabby")).unwrap();
        let expected = dir
            .path()
            .join("appdb")
            .join("cats")
            .join(format!("{}.json", id.to_hex()));
        assert!(expected.is_file());
    }

    #[test]
    fn duplicate_insert_fails_with_duplicate_key() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.insert_one(&ns(), cat(1, "Kitty", "Tabby")).unwrap();
        let err = backend
            .insert_one(&ns(), cat(1, "Kitty", "Tabby"))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { collection, .. } if collection == "cats"));
    }

    #[test]
    fn operator_filters_are_rejected() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let err = backend
            .find(
                &ns(),
                &Filter::new().op("age", CompareOp::Gt, 3),
                &FindOptions::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Unsupported {
                backend: "file",
                ..
            }
        ));
    }

    #[test]
    fn find_one_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let err = backend
            .find_one(&ns(), &Filter::new().eq("name", "ghost"), &FindOptions::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn replace_with_different_identity_swaps_files() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let old_id = backend.insert_one(&ns(), cat(1, "Old", "Tabby")).unwrap();
        let outcome = backend
            .replace_one(
                &ns(),
                &Filter::new().eq("name", "Old"),
                cat(2, "New", "Tabby"),
                false,
            )
            .unwrap();
        assert_eq!(outcome.matched_count, 1);

        let old_path = dir
            .path()
            .join("appdb")
            .join("cats")
            .join(format!("{}.json", old_id.to_hex()));
        assert!(!old_path.exists());
        assert_eq!(backend.count_documents(&ns(), &Filter::new()).unwrap(), 1);
    }

    #[test]
    fn replace_upsert_reports_upserted_id() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let replacement = cat(5, "Ghost", "Unknown");
        let outcome = backend
            .replace_one(&ns(), &Filter::new().eq("name", "nobody"), replacement, true)
            .unwrap();
        assert_eq!(outcome.matched_count, 0);
        assert_eq!(outcome.modified_count, 0);
        assert_eq!(outcome.upserted_id, Some(Identity::from_digest([5; 32])));
    }

    #[test]
    fn update_rewrites_the_file_in_place() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let id = backend.insert_one(&ns(), cat(1, "Kitty", "Tabby")).unwrap();
        let outcome = backend
            .update_one(
                &ns(),
                &Filter::new().eq("name", "Kitty"),
                &Update::set_field("breed", "Maine Coon"),
                false,
            )
            .unwrap();
        assert_eq!(outcome.modified_count, 1);

        let found = backend
            .find_one(
                &ns(),
                &Filter::new().eq(ID_FIELD, id.to_hex()),
                &FindOptions::new(),
            )
            .unwrap();
        assert_eq!(found.get("breed"), Some(&json!("Maine Coon")));
    }

    #[test]
    fn delete_many_removes_matching_files() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.insert_one(&ns(), cat(1, "a", "Tabby")).unwrap();
        backend.insert_one(&ns(), cat(2, "b", "Tabby")).unwrap();
        backend.insert_one(&ns(), cat(3, "c", "Siamese")).unwrap();
        let deleted = backend
            .delete_many(&ns(), &Filter::new().eq("breed", "Tabby"))
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(backend.count_documents(&ns(), &Filter::new()).unwrap(), 1);
    }

    #[test]
    fn distinct_over_files() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        backend.insert_one(&ns(), cat(1, "a", "Tabby")).unwrap();
        backend.insert_one(&ns(), cat(2, "b", "Tabby")).unwrap();
        let breeds = backend.distinct(&ns(), "breed", &Filter::new()).unwrap();
        assert_eq!(breeds, vec![json!("Tabby")]);
    }

    #[test]
    fn create_index_is_best_effort_false() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        assert!(!backend.create_index(&ns(), &IndexModel::on("name").unique()));
    }

    #[test]
    fn bulk_write_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let err = backend.bulk_write(&ns(), Vec::new()).unwrap_err();
        assert!(matches!(err, StoreError::Unsupported { .. }));
    }

    #[test]
    fn empty_collection_find_returns_empty_list() {
        let dir = TempDir::new().unwrap();
        let backend = FileBackend::new(dir.path());
        let docs = backend
            .find(&ns(), &Filter::new(), &FindOptions::new())
            .unwrap();
        assert!(docs.is_empty());
    }
}
