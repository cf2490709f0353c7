use crate::model::ModelSchema;

/// Declared type shape of a model field.
///
/// This is the surface the field-path resolver walks: scalars terminate a
/// path, wrappers are unwrapped in a fixed order, and `Model` exposes the
/// nested schema's fields for the next hop.
#[derive(Clone, Debug)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    String,
    /// RFC 3339 timestamp, stored as a string.
    Timestamp,
    /// A value that may be absent.
    Optional(Box<FieldKind>),
    /// One of several alternative shapes, tried in declared order.
    Union(Vec<FieldKind>),
    /// Ordered collection; traversal coerces to the first element.
    List(Box<FieldKind>),
    /// Unordered collection; traversal coerces to the first element.
    Set(Box<FieldKind>),
    /// A nested model with its own fields.
    Model(&'static ModelSchema),
}

impl FieldKind {
    /// Shorthand for `Optional(Box::new(kind))`.
    pub fn optional(kind: FieldKind) -> Self {
        Self::Optional(Box::new(kind))
    }

    /// Shorthand for `List(Box::new(kind))`.
    pub fn list(kind: FieldKind) -> Self {
        Self::List(Box::new(kind))
    }

    /// Shorthand for `Set(Box::new(kind))`.
    pub fn set(kind: FieldKind) -> Self {
        Self::Set(Box::new(kind))
    }

    /// Human-readable name of the shape, for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            Self::Bool => "bool".into(),
            Self::Int => "int".into(),
            Self::Float => "float".into(),
            Self::String => "string".into(),
            Self::Timestamp => "timestamp".into(),
            Self::Optional(inner) => format!("optional<{}>", inner.type_name()),
            Self::Union(branches) => {
                let names: Vec<String> = branches.iter().map(FieldKind::type_name).collect();
                format!("union<{}>", names.join(", "))
            }
            Self::List(inner) => format!("list<{}>", inner.type_name()),
            Self::Set(inner) => format!("set<{}>", inner.type_name()),
            Self::Model(schema) => schema.name().to_string(),
        }
    }

    /// Returns `true` if the shape, after unwrapping optionals and unions,
    /// can reach a collection wrapper.
    pub fn is_collection_like(&self) -> bool {
        match self {
            Self::List(_) | Self::Set(_) => true,
            Self::Optional(inner) => inner.is_collection_like(),
            Self::Union(branches) => branches.iter().any(FieldKind::is_collection_like),
            _ => false,
        }
    }
}

/// One declared field of a model.
#[derive(Clone, Debug)]
pub struct FieldDef {
    name: String,
    kind: FieldKind,
    required: bool,
}

impl FieldDef {
    /// Declare a field. Fields are required unless their kind is optional.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let required = !matches!(kind, FieldKind::Optional(_));
        Self {
            name: name.into(),
            kind,
            required,
        }
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type shape.
    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    /// Whether the field must be present to reconstruct the model.
    pub fn is_required(&self) -> bool {
        self.required
    }
}
