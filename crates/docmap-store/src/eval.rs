//! Filter, sort, and projection evaluation over raw documents.
//!
//! Backends that hold documents as JSON mappings (the in-memory adapter, the
//! flat-file store, the record half of the hybrid store) share this
//! evaluator instead of reimplementing comparison semantics.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use docmap_types::{dotted_get, CompareOp, Condition, Filter, NormalizedProjection, Sort};

use crate::error::{StoreError, StoreResult};
use crate::ops::RawDocument;

/// Does `document` satisfy every condition in `filter`?
///
/// Absent paths evaluate as `Null`, so `{"x": null}` matches documents
/// missing `x` entirely (mirroring how identity hashing treats absence).
pub fn matches(document: &RawDocument, filter: &Filter) -> bool {
    filter.iter().all(|(path, condition)| {
        let resolved = dotted_get(document, path).unwrap_or(&Value::Null);
        matches_condition(resolved, condition)
    })
}

fn matches_condition(value: &Value, condition: &Condition) -> bool {
    match condition {
        Condition::Equals(expected) => value == expected,
        Condition::Ops(ops) => ops.iter().all(|(op, operand)| apply_op(value, *op, operand)),
    }
}

fn apply_op(value: &Value, op: CompareOp, operand: &Value) -> bool {
    match op {
        CompareOp::Eq => value == operand,
        CompareOp::Ne => value != operand,
        CompareOp::Gt => compare_values(value, operand) == Some(Ordering::Greater),
        CompareOp::Gte => matches!(
            compare_values(value, operand),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        CompareOp::Lt => compare_values(value, operand) == Some(Ordering::Less),
        CompareOp::Lte => matches!(
            compare_values(value, operand),
            Some(Ordering::Less | Ordering::Equal)
        ),
        CompareOp::In => operand
            .as_array()
            .is_some_and(|candidates| candidates.contains(value)),
        CompareOp::Nin => operand
            .as_array()
            .map_or(true, |candidates| !candidates.contains(value)),
    }
}

/// Ordering between two values, when one exists.
///
/// Numbers compare numerically across integer/float representations;
/// strings and booleans compare naturally; `Null` sorts before everything.
/// Values of incomparable shapes have no ordering.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Null, _) => Some(Ordering::Less),
        (_, Value::Null) => Some(Ordering::Greater),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64()?;
            let y = y.as_f64()?;
            x.partial_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Stable-sort documents by the given sort keys.
///
/// Fails if any key uses a non-ordinal direction; those are index hints, not
/// sort orders.
pub fn sort_documents(documents: &mut [RawDocument], sort: &Sort) -> StoreResult<()> {
    if sort.is_empty() {
        return Ok(());
    }
    if !sort.is_ordinal() {
        return Err(StoreError::InvalidArgument(
            "sort directions must be ascending or descending".to_string(),
        ));
    }
    documents.sort_by(|a, b| {
        for (path, direction) in sort.keys() {
            let va = dotted_get(a, path).unwrap_or(&Value::Null);
            let vb = dotted_get(b, path).unwrap_or(&Value::Null);
            let ordering = compare_values(va, vb).unwrap_or(Ordering::Equal);
            let ordering = if direction.as_int() == Some(-1) {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

/// Set a value at a dotted path, creating intermediate objects as needed.
pub fn set_dotted(document: &mut RawDocument, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let last = segments.pop().unwrap_or(path);
    let mut current = document;
    for segment in segments {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = entry.as_object_mut().expect("just ensured object");
    }
    current.insert(last.to_string(), value);
}

/// Apply an update's fields to a document, returning whether it changed.
///
/// Only replace-these-fields semantics are supported; a raw (unwrapped)
/// update behaves identically to `$set`. Mutating `_id` is rejected here so
/// no backend can desynchronize a stored identity.
pub fn apply_update(document: &mut RawDocument, update: &docmap_types::Update) -> StoreResult<bool> {
    match update.operator() {
        Some(docmap_types::SET_OPERATOR) | None => {}
        Some(other) => {
            return Err(StoreError::InvalidArgument(format!(
                "unsupported update operator: {other}"
            )));
        }
    }
    if update.paths().any(|p| p == docmap_types::ID_FIELD) {
        return Err(StoreError::InvalidArgument(format!(
            "cannot update `{}`",
            docmap_types::ID_FIELD
        )));
    }
    let before = document.clone();
    for (path, value) in update.fields() {
        set_dotted(document, path, value.clone());
    }
    Ok(*document != before)
}

/// Apply a normalized projection to one document.
pub fn apply_projection(
    document: &RawDocument,
    projection: Option<&NormalizedProjection>,
) -> RawDocument {
    let Some(projection) = projection else {
        return document.clone();
    };
    let mut out = Map::new();
    for (key, value) in document {
        if projection.includes(key) {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmap_types::Projection;
    use serde_json::json;

    fn doc(value: Value) -> RawDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn equality_matches_flat_and_nested_paths() {
        let d = doc(json!({"name": "Kitty", "owner": {"city": "Osaka"}}));
        assert!(matches(&d, &Filter::new().eq("name", "Kitty")));
        assert!(matches(&d, &Filter::new().eq("owner.city", "Osaka")));
        assert!(!matches(&d, &Filter::new().eq("name", "Rex")));
    }

    #[test]
    fn absent_path_matches_null_equality() {
        let d = doc(json!({"name": "Kitty"}));
        assert!(matches(&d, &Filter::new().eq("nickname", Value::Null)));
    }

    #[test]
    fn range_operators_compare_numerically() {
        let d = doc(json!({"age": 7}));
        assert!(matches(&d, &Filter::new().op("age", CompareOp::Gt, 5)));
        assert!(matches(&d, &Filter::new().op("age", CompareOp::Lte, 7)));
        assert!(!matches(&d, &Filter::new().op("age", CompareOp::Lt, 7)));
        // Integer document value against a float operand.
        assert!(matches(&d, &Filter::new().op("age", CompareOp::Gt, 6.5)));
    }

    #[test]
    fn membership_operators() {
        let d = doc(json!({"breed": "Tabby"}));
        let included = Filter::new().op("breed", CompareOp::In, json!(["Tabby", "Siamese"]));
        let excluded = Filter::new().op("breed", CompareOp::Nin, json!(["Sphynx"]));
        assert!(matches(&d, &included));
        assert!(matches(&d, &excluded));
        let not_in = Filter::new().op("breed", CompareOp::In, json!(["Sphynx"]));
        assert!(!matches(&d, &not_in));
    }

    #[test]
    fn multiple_ops_on_one_path_all_apply() {
        let d = doc(json!({"age": 7}));
        let band = Filter::new()
            .op("age", CompareOp::Gte, 5)
            .op("age", CompareOp::Lt, 10);
        assert!(matches(&d, &band));
        let outside = Filter::new()
            .op("age", CompareOp::Gte, 8)
            .op("age", CompareOp::Lt, 10);
        assert!(!matches(&d, &outside));
    }

    #[test]
    fn sort_orders_documents_with_nulls_first() {
        let mut docs = vec![
            doc(json!({"name": "b", "age": 3})),
            doc(json!({"name": "a"})),
            doc(json!({"name": "c", "age": 1})),
        ];
        sort_documents(&mut docs, &Sort::new().asc("age")).unwrap();
        let names: Vec<&str> = docs
            .iter()
            .map(|d| d.get("name").and_then(Value::as_str).unwrap())
            .collect();
        assert_eq!(names, vec!["a", "c", "b"]);
    }

    #[test]
    fn sort_descending_and_secondary_key() {
        let mut docs = vec![
            doc(json!({"name": "a", "age": 1})),
            doc(json!({"name": "b", "age": 2})),
            doc(json!({"name": "c", "age": 2})),
        ];
        sort_documents(&mut docs, &Sort::new().desc("age").asc("name")).unwrap();
        let names: Vec<&str> = docs
            .iter()
            .map(|d| d.get("name").and_then(Value::as_str).unwrap())
            .collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn non_ordinal_sort_is_rejected() {
        let mut docs = vec![doc(json!({"x": 1}))];
        let sort = Sort::new().by("x", docmap_types::Direction::Hashed);
        assert!(matches!(
            sort_documents(&mut docs, &sort),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn projection_inclusion_drops_everything_else() {
        let d = doc(json!({"_id": "x", "name": "Kitty", "breed": "Tabby"}));
        let p = Projection::names(["name"]).normalize();
        let projected = apply_projection(&d, Some(&p));
        assert_eq!(projected.len(), 1);
        assert!(projected.contains_key("name"));
        assert!(!projected.contains_key("_id"));
    }

    #[test]
    fn projection_exclusion_keeps_identity() {
        let d = doc(json!({"_id": "x", "name": "Kitty", "breed": "Tabby"}));
        let p = Projection::Flags(vec![("breed".into(), false)]).normalize();
        let projected = apply_projection(&d, Some(&p));
        assert!(projected.contains_key("_id"));
        assert!(projected.contains_key("name"));
        assert!(!projected.contains_key("breed"));
    }
}
