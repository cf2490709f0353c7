//! Return-shape inference for projected retrievals.
//!
//! A projection can drop fields the model requires; decoding such a partial
//! record as the full model would fail validation. The planner decides up
//! front whether a retrieval can be typed as the full model or must degrade
//! to an untyped mapping.

use docmap_types::NormalizedProjection;

use crate::model::ModelSchema;

/// Whether a projected retrieval can reconstruct the full model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnShape {
    /// Every required field survives the projection; decode as the model.
    Model,
    /// At least one required field is dropped; return the raw mapping.
    Mapping,
}

/// Infer the return shape of a retrieval under a projection.
///
/// No projection always yields [`ReturnShape::Model`]. With a projection,
/// the model survives only if every required, non-identity field is
/// explicitly satisfied: present among the included names for an
/// inclusion-style projection, and not explicitly excluded for an
/// exclusion-style one.
pub fn infer_return_shape(
    schema: &ModelSchema,
    projection: Option<&NormalizedProjection>,
) -> ReturnShape {
    let Some(projection) = projection else {
        return ReturnShape::Model;
    };
    for field in schema.required_fields() {
        if !projection.includes(field.name()) {
            return ReturnShape::Mapping;
        }
    }
    ReturnShape::Model
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::cat_schema;
    use docmap_types::Projection;

    // Cat requires `name` and `breed`; `age` is optional.

    #[test]
    fn no_projection_yields_full_model() {
        assert_eq!(infer_return_shape(cat_schema(), None), ReturnShape::Model);
    }

    #[test]
    fn projection_covering_required_fields_yields_model() {
        let p = Projection::names(["name", "breed"]).normalize();
        assert_eq!(
            infer_return_shape(cat_schema(), Some(&p)),
            ReturnShape::Model
        );
    }

    #[test]
    fn superset_of_required_fields_yields_model() {
        let p = Projection::names(["name", "breed", "age"]).normalize();
        assert_eq!(
            infer_return_shape(cat_schema(), Some(&p)),
            ReturnShape::Model
        );
    }

    #[test]
    fn missing_one_required_field_degrades_to_mapping() {
        let p = Projection::names(["name"]).normalize();
        assert_eq!(
            infer_return_shape(cat_schema(), Some(&p)),
            ReturnShape::Mapping
        );
    }

    #[test]
    fn excluding_a_required_field_degrades_to_mapping() {
        let p = Projection::Flags(vec![("breed".into(), false)]).normalize();
        assert_eq!(
            infer_return_shape(cat_schema(), Some(&p)),
            ReturnShape::Mapping
        );
    }

    #[test]
    fn excluding_only_optional_fields_yields_model() {
        let p = Projection::Flags(vec![("age".into(), false)]).normalize();
        assert_eq!(
            infer_return_shape(cat_schema(), Some(&p)),
            ReturnShape::Model
        );
    }
}
