//! The hash identity engine.
//!
//! A document's identity is a digest over the values of its declared
//! hashable fields, extracted in declared path order, rendered canonically,
//! and joined with a fixed delimiter. Identity is therefore a pure function
//! of the hashable subset: two instances with identical hashable values get
//! identical identities no matter how their other fields differ.

use serde_json::{Map, Value};

use docmap_hash::IdentityHasher;
use docmap_types::{canonical_string, Identity};

use crate::cursor::{dotted_lookup, FieldPath};
use crate::error::{SchemaError, SchemaResult};
use crate::model::ModelSchema;

/// Where hashable values are read from.
#[derive(Clone, Copy)]
pub enum HashSource<'a> {
    /// A serialized model instance. Values are extracted by resolved segment
    /// chains, honoring first-element collection markers.
    Instance(&'a Map<String, Value>),
    /// A raw key-value mapping. Values are read by dotted-path lookup only.
    Mapping(&'a Map<String, Value>),
}

/// Compute an identity from an ordered path list and a source.
///
/// Fails fast when `paths` is empty: hashing an empty string would produce a
/// valid digest with no collision resistance between distinct records.
pub fn compute_identity(
    model: &str,
    paths: &[FieldPath],
    source: HashSource<'_>,
) -> SchemaResult<Identity> {
    if paths.is_empty() {
        return Err(SchemaError::NoHashableFields {
            model: model.to_string(),
        });
    }
    let values: Vec<String> = paths
        .iter()
        .map(|path| {
            let value = match source {
                HashSource::Instance(map) => path.extract(map),
                HashSource::Mapping(map) => dotted_lookup(map, &path.dotted()),
            };
            canonical_string(&value)
        })
        .collect();
    Ok(IdentityHasher::DOCUMENT.hash_values(&values))
}

/// Compute an identity for a model's declared hashable paths.
pub fn identity_for(schema: &ModelSchema, source: HashSource<'_>) -> SchemaResult<Identity> {
    let paths = schema.hashable_paths()?;
    compute_identity(schema.name(), &paths, source)
}

/// Raw-data-fields mode: hash a mapping's own top-level keys, in mapping
/// iteration order, instead of any declared path list.
pub fn compute_identity_raw(model: &str, mapping: &Map<String, Value>) -> SchemaResult<Identity> {
    if mapping.is_empty() {
        return Err(SchemaError::NoHashableFields {
            model: model.to_string(),
        });
    }
    let values: Vec<String> = mapping.values().map(canonical_string).collect();
    Ok(IdentityHasher::DOCUMENT.hash_values(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{cat_schema, owner_schema};
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn identity_is_deterministic() {
        let cat = as_map(json!({"name": "Kitty", "breed": "Domestic Shorthair"}));
        let id1 = identity_for(cat_schema(), HashSource::Instance(&cat)).unwrap();
        let id2 = identity_for(cat_schema(), HashSource::Instance(&cat)).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn identity_ignores_non_hashable_fields() {
        let a = as_map(json!({"name": "Kitty", "breed": "Tabby", "age": 3}));
        let b = as_map(json!({"name": "Kitty", "breed": "Tabby", "age": 12}));
        let id_a = identity_for(cat_schema(), HashSource::Instance(&a)).unwrap();
        let id_b = identity_for(cat_schema(), HashSource::Instance(&b)).unwrap();
        assert_eq!(id_a, id_b);
    }

    #[test]
    fn path_order_is_significant() {
        // Same value set, opposite declared order: digests must differ.
        // Asymmetric values so an accidental symmetry cannot mask a failure.
        let source = as_map(json!({"a": "X", "b": "Y"}));
        let schema = crate::model::ModelSchema::builder("Pair")
            .field("a", crate::kind::FieldKind::String)
            .field("b", crate::kind::FieldKind::String)
            .hashable(["a", "b"])
            .build()
            .unwrap();
        let reversed = crate::model::ModelSchema::builder("Pair")
            .field("a", crate::kind::FieldKind::String)
            .field("b", crate::kind::FieldKind::String)
            .hashable(["b", "a"])
            .build()
            .unwrap();
        let forward = identity_for(&schema, HashSource::Instance(&source)).unwrap();
        let backward = identity_for(&reversed, HashSource::Instance(&source)).unwrap();
        assert_ne!(forward, backward);
    }

    #[test]
    fn instance_and_mapping_sources_agree_on_flat_paths() {
        let cat = as_map(json!({"name": "Kitty", "breed": "Tabby"}));
        let from_instance = identity_for(cat_schema(), HashSource::Instance(&cat)).unwrap();
        let from_mapping = identity_for(cat_schema(), HashSource::Mapping(&cat)).unwrap();
        assert_eq!(from_instance, from_mapping);
    }

    #[test]
    fn nested_hashable_path_reads_into_sub_object() {
        let owner = as_map(json!({
            "name": "Sam",
            "pet": {"name": "Kitty", "breed": "Tabby"}
        }));
        let same_pet_name = as_map(json!({
            "name": "Sam",
            "pet": {"name": "Kitty", "breed": "Maine Coon"}
        }));
        let id1 = identity_for(owner_schema(), HashSource::Instance(&owner)).unwrap();
        let id2 = identity_for(owner_schema(), HashSource::Instance(&same_pet_name)).unwrap();
        // Only Owner.name and Owner.pet.name are hashable; breed is not.
        assert_eq!(id1, id2);
    }

    #[test]
    fn missing_values_hash_as_null() {
        let sparse = as_map(json!({"name": "Kitty"}));
        let explicit = as_map(json!({"name": "Kitty", "breed": null}));
        let id1 = identity_for(cat_schema(), HashSource::Instance(&sparse)).unwrap();
        let id2 = identity_for(cat_schema(), HashSource::Instance(&explicit)).unwrap();
        assert_eq!(id1, id2);
    }

    #[test]
    fn empty_path_list_fails_fast() {
        let schema = crate::model::ModelSchema::builder("NoHash")
            .field("x", crate::kind::FieldKind::Int)
            .build()
            .unwrap();
        let map = as_map(json!({"x": 1}));
        let err = identity_for(&schema, HashSource::Instance(&map)).unwrap_err();
        assert_eq!(
            err,
            SchemaError::NoHashableFields {
                model: "NoHash".to_string()
            }
        );
    }

    #[test]
    fn raw_mode_hashes_mapping_keys_in_iteration_order() {
        let mut a = Map::new();
        a.insert("first".into(), json!("X"));
        a.insert("second".into(), json!("Y"));
        let mut b = Map::new();
        b.insert("second".into(), json!("Y"));
        b.insert("first".into(), json!("X"));
        let id_a = compute_identity_raw("Raw", &a).unwrap();
        let id_b = compute_identity_raw("Raw", &b).unwrap();
        // Iteration order differs, so the assembled string differs.
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn raw_mode_rejects_empty_mapping() {
        let err = compute_identity_raw("Raw", &Map::new()).unwrap_err();
        assert!(matches!(err, SchemaError::NoHashableFields { .. }));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn identity_is_pure_over_arbitrary_values(
                name in "\\PC{0,24}",
                breed in "\\PC{0,24}",
            ) {
                let cat = as_map(json!({"name": name, "breed": breed}));
                let id1 = identity_for(cat_schema(), HashSource::Instance(&cat)).unwrap();
                let id2 = identity_for(cat_schema(), HashSource::Instance(&cat)).unwrap();
                prop_assert_eq!(id1, id2);
            }

            #[test]
            fn non_hashable_noise_never_moves_the_identity(
                name in "\\PC{1,24}",
                age_a in 0i64..30,
                age_b in 0i64..30,
            ) {
                let a = as_map(json!({"name": &name, "breed": "Tabby", "age": age_a}));
                let b = as_map(json!({"name": &name, "breed": "Tabby", "age": age_b}));
                let id_a = identity_for(cat_schema(), HashSource::Instance(&a)).unwrap();
                let id_b = identity_for(cat_schema(), HashSource::Instance(&b)).unwrap();
                prop_assert_eq!(id_a, id_b);
            }
        }
    }
}
