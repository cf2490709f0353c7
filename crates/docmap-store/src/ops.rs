use serde_json::{Map, Value};

use docmap_types::{Filter, Identity, NormalizedProjection, Sort, Update, ID_FIELD};

use crate::error::{StoreError, StoreResult};

/// A document as backends see it: a flat key-value mapping with the identity
/// stored under `_id`.
pub type RawDocument = Map<String, Value>;

/// Fully-qualified collection address.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Options for `find` / `find_one`.
///
/// `skip` and `limit` apply after filtering and sorting, before projection.
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    pub projection: Option<NormalizedProjection>,
    pub sort: Sort,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn projection(mut self, projection: NormalizedProjection) -> Self {
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

/// Pull the identity out of a raw document's `_id` field.
pub fn document_id(document: &RawDocument) -> StoreResult<(Identity, String)> {
    let raw = document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            StoreError::InvalidArgument(format!("document is missing a string `{ID_FIELD}`"))
        })?;
    let identity = Identity::from_hex(raw)
        .map_err(|e| StoreError::InvalidArgument(format!("bad {ID_FIELD}: {e}")))?;
    Ok((identity, raw.to_string()))
}

/// Outcome of a replace/update operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Documents matched by the filter.
    pub matched_count: u64,
    /// Documents actually changed.
    pub modified_count: u64,
    /// Identity of the document inserted by an upsert, if one happened.
    pub upserted_id: Option<Identity>,
}

/// One operation in a heterogeneous batched write.
#[derive(Clone, Debug)]
pub enum WriteOp {
    InsertOne(RawDocument),
    UpdateOne {
        filter: Filter,
        update: Update,
        upsert: bool,
    },
    UpdateMany {
        filter: Filter,
        update: Update,
        upsert: bool,
    },
    ReplaceOne {
        filter: Filter,
        replacement: RawDocument,
        upsert: bool,
    },
    DeleteOne(Filter),
    DeleteMany(Filter),
}

/// Aggregate outcome of a `bulk_write`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub inserted_count: u64,
    pub matched_count: u64,
    pub modified_count: u64,
    pub deleted_count: u64,
    pub upserted_count: u64,
}
