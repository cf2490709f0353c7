use std::collections::HashMap;

/// Per-collection declaration of which fields carry vector data.
///
/// A dotted path belongs to the vector half when its first segment names a
/// declared vector field. Collections with no declaration are all-scalar.
#[derive(Clone, Debug, Default)]
pub struct VectorLayout {
    fields: HashMap<String, Vec<String>>,
}

impl VectorLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the vector-bearing fields of a collection.
    pub fn vector_fields(
        mut self,
        collection: impl Into<String>,
        fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.fields
            .entry(collection.into())
            .or_default()
            .extend(fields.into_iter().map(Into::into));
        self
    }

    /// Whether a dotted path routes to the vector half of `collection`.
    pub fn is_vector_path(&self, collection: &str, path: &str) -> bool {
        let Some(declared) = self.fields.get(collection) else {
            return false;
        };
        let head = path.split('.').next().unwrap_or(path);
        declared.iter().any(|f| f == head)
    }

    /// Declared vector fields of a collection, if any.
    pub fn fields_for(&self, collection: &str) -> &[String] {
        self.fields.get(collection).map_or(&[], Vec::as_slice)
    }
}
