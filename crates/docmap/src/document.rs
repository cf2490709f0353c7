use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

use docmap_schema::{identity_for, HashSource, Model};
use docmap_store::RawDocument;
use docmap_types::{
    canonical_datetime, Identity, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};

use crate::error::{DocmapError, DocmapResult};

/// A stored instance of a model: content-derived identity, bookkeeping
/// timestamps, and the model body.
///
/// The identity is computed once, at construction, from the schema's
/// declared hashable paths. Mutating non-hashable body fields afterwards
/// leaves the identity untouched; hashable fields are guarded against
/// updates at the collection layer instead.
#[derive(Clone, Debug, PartialEq)]
pub struct Document<M: Model> {
    id: Identity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pub body: M,
}

impl<M: Model> Document<M> {
    /// Wrap a model body, deriving its identity from the schema's hashable
    /// paths. Fails when the schema declares no hashable fields.
    pub fn new(body: M) -> DocmapResult<Self> {
        let map = serialize_body(&body)?;
        let id = identity_for(M::schema(), HashSource::Instance(&map))?;
        let now = now_millis();
        Ok(Self {
            id,
            created_at: now,
            updated_at: now,
            body,
        })
    }

    /// Wrap a model body under a caller-chosen identity, skipping the hash
    /// computation.
    pub fn with_id(id: Identity, body: M) -> Self {
        let now = now_millis();
        Self {
            id,
            created_at: now,
            updated_at: now,
            body,
        }
    }

    pub fn id(&self) -> Identity {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    /// Storage form: body fields flattened beside `_id`, `created_at`, and
    /// `updated_at`. The identity is spelled `id` in code and `_id` in
    /// storage; this is the only place the translation happens.
    pub fn to_raw(&self) -> DocmapResult<RawDocument> {
        let body = serialize_body(&self.body)?;
        let mut raw = Map::new();
        raw.insert(ID_FIELD.to_string(), Value::String(self.id.to_hex()));
        raw.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(canonical_datetime(self.created_at)),
        );
        raw.insert(
            UPDATED_AT_FIELD.to_string(),
            Value::String(canonical_datetime(self.updated_at)),
        );
        for (key, value) in body {
            raw.insert(key, value);
        }
        Ok(raw)
    }

    /// Rebuild a document from its storage form.
    pub fn from_raw(mut raw: RawDocument) -> DocmapResult<Self> {
        let id = match raw.remove(ID_FIELD) {
            Some(Value::String(hex)) => Identity::from_hex(&hex)?,
            _ => {
                return Err(DocmapError::Serialization(format!(
                    "document is missing a string `{ID_FIELD}`"
                )))
            }
        };
        let created_at = take_timestamp(&mut raw, CREATED_AT_FIELD)?;
        let updated_at = take_timestamp(&mut raw, UPDATED_AT_FIELD)?;
        let body: M = serde_json::from_value(Value::Object(raw))?;
        Ok(Self {
            id,
            created_at,
            updated_at,
            body,
        })
    }
}

fn serialize_body<M: Model>(body: &M) -> DocmapResult<Map<String, Value>> {
    match serde_json::to_value(body)? {
        Value::Object(map) => Ok(map),
        other => Err(DocmapError::Serialization(format!(
            "model {} serialized to non-object JSON ({})",
            M::schema().name(),
            match other {
                Value::Null => "null",
                Value::Bool(_) => "bool",
                Value::Number(_) => "number",
                Value::String(_) => "string",
                Value::Array(_) => "array",
                Value::Object(_) => unreachable!(),
            }
        ))),
    }
}

fn take_timestamp(raw: &mut RawDocument, field: &str) -> DocmapResult<DateTime<Utc>> {
    match raw.remove(field) {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DocmapError::Serialization(format!("bad {field}: {e}"))),
        Some(_) => Err(DocmapError::Serialization(format!(
            "{field} is not an RFC 3339 string"
        ))),
        None => Err(DocmapError::Serialization(format!("missing {field}"))),
    }
}

/// Now, truncated to millisecond precision so the in-memory value and its
/// canonical storage rendering always agree.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.timestamp_millis_opt(now.timestamp_millis())
        .single()
        .unwrap_or(now)
}
