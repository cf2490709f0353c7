//! Field-path resolution.
//!
//! A [`FieldCursor`] walks a model schema one attribute hop at a time.
//! Before each hop the current type shape is unwrapped in a fixed,
//! non-configurable order: **optional, then union branches in declared
//! order, then the collection element type, then unions again** (so an
//! "optional list of union of models" still exposes model fields). The
//! recursion below implements exactly that order; changing it changes which
//! concrete type's fields are visible at the next hop.
//!
//! Descending through a collection wrapper records a first-element marker on
//! the segment being descended from: at extraction time that attribute is
//! read as a collection and the walk continues on its first element. An
//! explicit [`FieldCursor::first`] call sets the same marker by hand.
//!
//! Resolution failures (`FieldNotFound`) surface only after every unwrap
//! strategy has been exhausted, and always at resolution time -- never when
//! an identity is later hashed.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaResult};
use crate::kind::FieldKind;
use crate::model::ModelSchema;

/// One hop of a resolved path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSegment {
    name: String,
    first_element: bool,
}

impl PathSegment {
    /// The attribute name at this hop.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether extraction reads this attribute as a collection and continues
    /// on its first element.
    pub fn is_first_element(&self) -> bool {
        self.first_element
    }
}

/// Where the cursor currently stands: on the root model itself, or on the
/// type shape of the last resolved segment.
#[derive(Debug)]
enum Position<'a> {
    Root(&'a ModelSchema),
    Kind(FieldKind),
}

/// Incremental field-path builder over a model schema.
#[derive(Debug)]
pub struct FieldCursor<'a> {
    position: Position<'a>,
    segments: Vec<PathSegment>,
}

impl<'a> FieldCursor<'a> {
    /// Start a cursor at the given model's root.
    pub fn root(schema: &'a ModelSchema) -> Self {
        Self {
            position: Position::Root(schema),
            segments: Vec::new(),
        }
    }

    /// Descend into the named field of the current (unwrapped) type.
    pub fn field(mut self, name: &str) -> SchemaResult<Self> {
        let (kind, coerced) = match &self.position {
            Position::Root(schema) => lookup_on_model(schema, name)?,
            Position::Kind(kind) => lookup(kind, name)?,
        };
        if coerced {
            // The collection sits at the previous hop; extraction must take
            // its first element before continuing.
            if let Some(last) = self.segments.last_mut() {
                last.first_element = true;
            }
        }
        self.segments.push(PathSegment {
            name: name.to_string(),
            first_element: false,
        });
        self.position = Position::Kind(kind);
        Ok(self)
    }

    /// Mark the most recent segment as collection-coerced and stand on the
    /// element type. Fails if the current shape cannot reach a collection.
    pub fn first(mut self) -> SchemaResult<Self> {
        let segment = match self.segments.last() {
            Some(s) => s.name.clone(),
            None => {
                return Err(SchemaError::NotACollection {
                    segment: "<root>".to_string(),
                })
            }
        };
        let element = match &self.position {
            Position::Kind(kind) => collection_element(kind),
            Position::Root(_) => None,
        };
        match element {
            Some(kind) => {
                if let Some(last) = self.segments.last_mut() {
                    last.first_element = true;
                }
                self.position = Position::Kind(kind);
                Ok(self)
            }
            None => Err(SchemaError::NotACollection { segment }),
        }
    }

    /// Finish, keeping the raw segment chain (markers included).
    pub fn into_path(self) -> FieldPath {
        FieldPath {
            segments: self.segments,
        }
    }
}

/// Field lookup on a (possibly wrapped) type shape.
///
/// Returns the resolved field's kind and whether a collection wrapper was
/// traversed on the way. The unwrap order is the module-level policy.
fn lookup(kind: &FieldKind, name: &str) -> SchemaResult<(FieldKind, bool)> {
    match kind {
        FieldKind::Model(schema) => lookup_on_model(schema, name),
        FieldKind::Optional(inner) => lookup(inner, name),
        FieldKind::Union(branches) => {
            let mut not_found = None;
            for branch in branches {
                match lookup(branch, name) {
                    Ok(found) => return Ok(found),
                    Err(err @ SchemaError::FieldNotFound { .. }) => {
                        not_found.get_or_insert(err);
                    }
                    Err(_) => {}
                }
            }
            Err(not_found.unwrap_or_else(|| SchemaError::NotTraversable {
                segment: name.to_string(),
                kind: kind.type_name(),
            }))
        }
        FieldKind::List(element) | FieldKind::Set(element) => {
            lookup(element, name).map(|(kind, _)| (kind, true))
        }
        scalar => Err(SchemaError::NotTraversable {
            segment: name.to_string(),
            kind: scalar.type_name(),
        }),
    }
}

fn lookup_on_model(schema: &ModelSchema, name: &str) -> SchemaResult<(FieldKind, bool)> {
    match schema.field(name) {
        Some(def) => Ok((def.kind().clone(), false)),
        None => Err(SchemaError::FieldNotFound {
            model: schema.name().to_string(),
            field: name.to_string(),
        }),
    }
}

/// Unwrap optionals and unions until a collection element type is exposed.
fn collection_element(kind: &FieldKind) -> Option<FieldKind> {
    match kind {
        FieldKind::List(element) | FieldKind::Set(element) => Some((**element).clone()),
        FieldKind::Optional(inner) => collection_element(inner),
        FieldKind::Union(branches) => branches.iter().find_map(collection_element),
        _ => None,
    }
}

/// A resolved, immutable field path.
///
/// Usable both as a dotted storage path (markers stripped) and as a runtime
/// extraction chain (markers honored).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The raw segment chain.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Join segment names with the given separator (markers stripped).
    pub fn join(&self, separator: &str) -> String {
        self.segments
            .iter()
            .map(PathSegment::name)
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// The dotted storage path.
    pub fn dotted(&self) -> String {
        self.join(".")
    }

    /// Extract the value at this path from a serialized instance.
    ///
    /// First-element markers index into the named collection and continue on
    /// its first element; an empty or absent collection short-circuits the
    /// whole resolution to `Null`.
    pub fn extract(&self, source: &Map<String, Value>) -> Value {
        let mut current = Value::Object(source.clone());
        for segment in &self.segments {
            let next = match current.as_object().and_then(|o| o.get(segment.name())) {
                Some(v) => v.clone(),
                None => return Value::Null,
            };
            current = if segment.is_first_element() {
                match next.as_array().and_then(|a| a.first()) {
                    Some(first) => first.clone(),
                    None => return Value::Null,
                }
            } else {
                next
            };
        }
        current
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

/// Dotted-path lookup on a raw mapping (no coercion markers). Absent paths
/// resolve to `Null`, matching how instance extraction treats absence.
pub fn dotted_lookup(source: &Map<String, Value>, dotted: &str) -> Value {
    docmap_types::dotted_get(source, dotted)
        .cloned()
        .unwrap_or(Value::Null)
}
