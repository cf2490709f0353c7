use std::marker::PhantomData;

use serde_json::Value;
use tracing::debug;

use docmap_schema::{infer_return_shape, Model, ReturnShape, SchemaError};
use docmap_store::{
    Backend, BulkOutcome, FindOptions, Namespace, RawDocument, UpdateOutcome, WriteOp,
};
use docmap_types::{
    Filter, Identity, NormalizedProjection, Projection, Sort, Update, CREATED_AT_FIELD, ID_FIELD,
    UPDATED_AT_FIELD,
};

use crate::document::Document;
use crate::error::{DocmapError, DocmapResult};

/// Result of a projected retrieval.
///
/// The projection planner decides the variant up front: if every required
/// model field survives the projection the raw record decodes as a typed
/// [`Document`]; otherwise the partial record passes through untyped.
#[derive(Clone, Debug)]
pub enum Retrieved<M: Model> {
    Document(Document<M>),
    Mapping(RawDocument),
}

impl<M: Model> Retrieved<M> {
    /// The typed document, if the planner produced one.
    pub fn into_document(self) -> Option<Document<M>> {
        match self {
            Self::Document(doc) => Some(doc),
            Self::Mapping(_) => None,
        }
    }

    /// The untyped mapping, if the planner degraded to one.
    pub fn into_mapping(self) -> Option<RawDocument> {
        match self {
            Self::Document(_) => None,
            Self::Mapping(map) => Some(map),
        }
    }
}

/// Retrieval options: projection, sort, pagination.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub projection: Option<Projection>,
    pub sort: Sort,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A typed handle to one model's collection on one backend.
///
/// Validates filter/update arguments against the model schema before
/// anything reaches the backend: unknown fields and updates touching
/// hashable (identity-bearing) paths fail here, with the backend untouched.
pub struct Collection<'a, M: Model> {
    backend: &'a dyn Backend,
    ns: Namespace,
    _model: PhantomData<fn() -> M>,
}

impl<'a, M: Model> Collection<'a, M> {
    pub fn new(backend: &'a dyn Backend, ns: Namespace) -> Self {
        Self {
            backend,
            ns,
            _model: PhantomData,
        }
    }

    /// The namespace this handle operates on.
    pub fn namespace(&self) -> &Namespace {
        &self.ns
    }

    /// Declare the schema's indexes on the backend. Best-effort: returns how
    /// many the backend accepted.
    pub fn ensure_indexes(&self) -> usize {
        M::schema()
            .indexes()
            .iter()
            .filter(|index| self.backend.create_index(&self.ns, index))
            .count()
    }

    // ---- Retrieval ----

    pub fn find(&self, filter: &Filter, query: &Query) -> DocmapResult<Vec<Retrieved<M>>> {
        self.validate_filter(filter)?;
        self.validate_sort(&query.sort)?;
        let (shape, options) = self.plan(query)?;
        let raw = self.backend.find(&self.ns, filter, &options)?;
        debug!(ns = %self.ns, count = raw.len(), shape = ?shape, "find");
        raw.into_iter().map(|doc| decode(shape, doc)).collect()
    }

    pub fn find_one(&self, filter: &Filter, query: &Query) -> DocmapResult<Retrieved<M>> {
        self.validate_filter(filter)?;
        self.validate_sort(&query.sort)?;
        let (shape, options) = self.plan(query)?;
        let raw = self.backend.find_one(&self.ns, filter, &options)?;
        decode(shape, raw)
    }

    /// Fetch one document by identity as the full model.
    pub fn get(&self, id: Identity) -> DocmapResult<Document<M>> {
        let raw = self.backend.find_one(
            &self.ns,
            &Filter::new().eq(ID_FIELD, id.to_hex()),
            &FindOptions::new(),
        )?;
        Document::from_raw(raw)
    }

    pub fn distinct(&self, key: &str, filter: &Filter) -> DocmapResult<Vec<Value>> {
        self.validate_path(key)?;
        self.validate_filter(filter)?;
        Ok(self.backend.distinct(&self.ns, key, filter)?)
    }

    pub fn count(&self, filter: &Filter) -> DocmapResult<u64> {
        self.validate_filter(filter)?;
        Ok(self.backend.count_documents(&self.ns, filter)?)
    }

    // ---- Writes ----

    pub fn insert_one(&self, document: &Document<M>) -> DocmapResult<Identity> {
        Ok(self.backend.insert_one(&self.ns, document.to_raw()?)?)
    }

    pub fn insert_many(&self, documents: &[Document<M>]) -> DocmapResult<Vec<Identity>> {
        let raw: Vec<RawDocument> = documents
            .iter()
            .map(Document::to_raw)
            .collect::<DocmapResult<_>>()?;
        Ok(self.backend.insert_many(&self.ns, raw)?)
    }

    pub fn replace_one(
        &self,
        filter: &Filter,
        replacement: &Document<M>,
        upsert: bool,
    ) -> DocmapResult<UpdateOutcome> {
        self.validate_filter(filter)?;
        Ok(self
            .backend
            .replace_one(&self.ns, filter, replacement.to_raw()?, upsert)?)
    }

    pub fn update_one(
        &self,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> DocmapResult<UpdateOutcome> {
        self.validate_filter(filter)?;
        self.validate_update(update)?;
        Ok(self.backend.update_one(&self.ns, filter, update, upsert)?)
    }

    pub fn update_many(
        &self,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> DocmapResult<UpdateOutcome> {
        self.validate_filter(filter)?;
        self.validate_update(update)?;
        Ok(self.backend.update_many(&self.ns, filter, update, upsert)?)
    }

    pub fn delete_one(&self, filter: &Filter) -> DocmapResult<u64> {
        self.validate_filter(filter)?;
        Ok(self.backend.delete_one(&self.ns, filter)?)
    }

    pub fn delete_many(&self, filter: &Filter) -> DocmapResult<u64> {
        self.validate_filter(filter)?;
        Ok(self.backend.delete_many(&self.ns, filter)?)
    }

    pub fn bulk_write(&self, operations: Vec<WriteOp>) -> DocmapResult<BulkOutcome> {
        Ok(self.backend.bulk_write(&self.ns, operations)?)
    }

    // ---- Planning and validation ----

    /// Normalize the projection, infer the return shape, and build the
    /// backend options. When the shape is the full model, the dispatched
    /// projection force-includes `_id` and the timestamps so the typed
    /// document can be reconstructed.
    fn plan(&self, query: &Query) -> DocmapResult<(ReturnShape, FindOptions)> {
        let normalized = match &query.projection {
            Some(projection) => {
                self.validate_projection(projection)?;
                Some(projection.normalize())
            }
            None => None,
        };
        let shape = infer_return_shape(M::schema(), normalized.as_ref());
        let dispatched = match (&normalized, shape) {
            (Some(projection), ReturnShape::Model) => Some(with_meta_fields(projection)),
            (Some(projection), ReturnShape::Mapping) => Some((*projection).clone()),
            (None, _) => None,
        };
        let mut options = FindOptions::new()
            .sort(query.sort.clone())
            .skip(query.skip);
        if let Some(limit) = query.limit {
            options = options.limit(limit);
        }
        options.projection = dispatched;
        Ok((shape, options))
    }

    fn validate_filter(&self, filter: &Filter) -> DocmapResult<()> {
        for path in filter.paths() {
            self.validate_path(path)?;
        }
        Ok(())
    }

    fn validate_sort(&self, sort: &Sort) -> DocmapResult<()> {
        for (path, _) in sort.keys() {
            self.validate_path(path)?;
        }
        Ok(())
    }

    fn validate_projection(&self, projection: &Projection) -> DocmapResult<()> {
        let names: Vec<&str> = match projection {
            Projection::Names(names) => names.iter().map(String::as_str).collect(),
            Projection::Flags(flags) => flags.iter().map(|(n, _)| n.as_str()).collect(),
        };
        for name in names {
            self.validate_path(name)?;
        }
        Ok(())
    }

    /// Updates may not touch hashable paths: the stored `_id` is a digest
    /// over them, so changing one would strand the document under a stale
    /// identity.
    fn validate_update(&self, update: &Update) -> DocmapResult<()> {
        for path in update.paths() {
            self.validate_path(path)?;
            for hashable in M::schema().hashable() {
                if paths_overlap(path, hashable) {
                    return Err(DocmapError::ImmutableField {
                        model: M::schema().name().to_string(),
                        path: path.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_path(&self, path: &str) -> DocmapResult<()> {
        if matches!(path, ID_FIELD | CREATED_AT_FIELD | UPDATED_AT_FIELD) {
            return Ok(());
        }
        match M::schema().resolve(path) {
            Ok(_) => Ok(()),
            Err(SchemaError::FieldNotFound { .. } | SchemaError::NotTraversable { .. }) => {
                Err(DocmapError::UnknownField {
                    model: M::schema().name().to_string(),
                    path: path.to_string(),
                })
            }
            Err(other) => Err(other.into()),
        }
    }
}

fn decode<M: Model>(shape: ReturnShape, raw: RawDocument) -> DocmapResult<Retrieved<M>> {
    match shape {
        ReturnShape::Model => Ok(Retrieved::Document(Document::from_raw(raw)?)),
        ReturnShape::Mapping => Ok(Retrieved::Mapping(raw)),
    }
}

/// Force the identity and timestamp fields to survive a projection.
///
/// Inclusion projections get explicit `true` flags for the meta fields.
/// Exclusion projections must not: a non-identity `true` flag would flip
/// the whole projection into inclusion mode and strip every unnamed field,
/// so there any flag naming a meta field is dropped instead and the fields
/// survive by the exclusion-mode default.
fn with_meta_fields(projection: &NormalizedProjection) -> NormalizedProjection {
    let meta = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];
    let mut flags: Vec<(String, bool)> = projection
        .fields()
        .iter()
        .filter(|(name, _)| !meta.contains(&name.as_str()))
        .map(|(name, include)| (name.clone(), *include))
        .collect();
    if projection.is_inclusion() {
        for name in meta {
            flags.push((name.to_string(), true));
        }
    }
    Projection::Flags(flags).normalize()
}

fn paths_overlap(a: &str, b: &str) -> bool {
    a == b
        || a.strip_prefix(b).is_some_and(|rest| rest.starts_with('.'))
        || b.strip_prefix(a).is_some_and(|rest| rest.starts_with('.'))
}
