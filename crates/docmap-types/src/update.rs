use serde_json::{Map, Value};

/// Default update operator: replace the named fields, leave the rest.
pub const SET_OPERATOR: &str = "$set";

/// Canonical partial-update representation.
///
/// A mapping of dotted field paths to new values, wrapped under a single
/// operator key (default [`SET_OPERATOR`]). Callers may override the
/// operator, or drop it entirely for backends that expect the raw mapping
/// unwrapped.
#[derive(Clone, Debug, PartialEq)]
pub struct Update {
    operator: Option<String>,
    fields: Map<String, Value>,
}

impl Update {
    /// A `$set`-style update of the given fields.
    pub fn set(fields: Map<String, Value>) -> Self {
        Self {
            operator: Some(SET_OPERATOR.to_string()),
            fields,
        }
    }

    /// An update wrapped under a caller-chosen operator.
    pub fn with_operator(operator: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            operator: Some(operator.into()),
            fields,
        }
    }

    /// An unwrapped update: the raw mapping is sent as-is.
    pub fn raw(fields: Map<String, Value>) -> Self {
        Self {
            operator: None,
            fields,
        }
    }

    /// Convenience: a `$set` update of a single field.
    pub fn set_field(path: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert(path.into(), value.into());
        Self::set(fields)
    }

    /// The wrapping operator, if any.
    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    /// The fields being updated.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The dotted paths touched by this update.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Wire form: `{operator: fields}` when wrapped, the bare fields map
    /// otherwise.
    pub fn to_wire(&self) -> Value {
        match &self.operator {
            Some(op) => {
                let mut outer = Map::new();
                outer.insert(op.clone(), Value::Object(self.fields.clone()));
                Value::Object(outer)
            }
            None => Value::Object(self.fields.clone()),
        }
    }
}
