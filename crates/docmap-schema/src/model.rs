use serde::de::DeserializeOwned;
use serde::Serialize;

use docmap_types::IndexModel;

use crate::cursor::{FieldCursor, FieldPath};
use crate::error::{SchemaError, SchemaResult};
use crate::kind::{FieldDef, FieldKind};

/// A user model that can be stored as documents.
///
/// Implementations pair a serde-serializable record type with its declared
/// [`ModelSchema`]. The schema is built once (typically in a `LazyLock`) and
/// handed out by reference for the process lifetime.
pub trait Model: Serialize + DeserializeOwned {
    /// The declared schema for this model type.
    fn schema() -> &'static ModelSchema;

    /// Storage collection name: the declared override, or the type name
    /// case-folded.
    fn collection_name() -> String {
        Self::schema().collection_name().to_string()
    }
}

/// Declared shape of a model: named fields, hashable-path list, indexes,
/// and an optional collection-name override.
#[derive(Clone, Debug)]
pub struct ModelSchema {
    name: String,
    collection: String,
    fields: Vec<FieldDef>,
    hashable: Vec<String>,
    indexes: Vec<IndexModel>,
}

impl ModelSchema {
    /// Start declaring a schema for the named model type.
    pub fn builder(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            name: name.into(),
            collection: None,
            fields: Vec::new(),
            hashable: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// The model type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage collection name (override, or type name case-folded).
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// The declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Fields that must be present to reconstruct the model.
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_required())
    }

    /// The declared hashable paths, in declared order (dotted form).
    pub fn hashable(&self) -> &[String] {
        &self.hashable
    }

    /// Declared index models.
    pub fn indexes(&self) -> &[IndexModel] {
        &self.indexes
    }

    /// Resolve a dotted path string into a [`FieldPath`] through this schema.
    ///
    /// Fails at resolution time if any segment does not exist on the
    /// (unwrapped) type at that hop.
    pub fn resolve(&self, dotted: &str) -> SchemaResult<FieldPath> {
        if dotted.is_empty() {
            return Err(SchemaError::InvalidPath {
                path: dotted.to_string(),
                reason: "empty path".to_string(),
            });
        }
        let mut cursor = FieldCursor::root(self);
        for segment in dotted.split('.') {
            if segment.is_empty() {
                return Err(SchemaError::InvalidPath {
                    path: dotted.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            cursor = cursor.field(segment)?;
        }
        Ok(cursor.into_path())
    }

    /// Resolve the declared hashable paths, in declared order.
    ///
    /// The resolved list is what identity hashing consumes; it is a pure
    /// function of the schema, independent of any instance.
    pub fn hashable_paths(&self) -> SchemaResult<Vec<FieldPath>> {
        self.hashable.iter().map(|p| self.resolve(p)).collect()
    }
}

/// Builder for [`ModelSchema`]. `build` validates every declared hashable
/// path and index key, so bad declarations fail at schema construction
/// rather than at first use.
pub struct ModelSchemaBuilder {
    name: String,
    collection: Option<String>,
    fields: Vec<FieldDef>,
    hashable: Vec<String>,
    indexes: Vec<IndexModel>,
}

impl ModelSchemaBuilder {
    /// Override the storage collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.collection = Some(name.into());
        self
    }

    /// Declare a field. Fields wrapped in `Optional` are not required.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDef::new(name, kind));
        self
    }

    /// Declare the ordered hashable-path list (dotted form).
    pub fn hashable<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashable = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Declare an index.
    pub fn index(mut self, index: IndexModel) -> Self {
        self.indexes.push(index);
        self
    }

    /// Finish the declaration, validating hashable and index paths.
    pub fn build(self) -> SchemaResult<ModelSchema> {
        let collection = self
            .collection
            .unwrap_or_else(|| self.name.to_lowercase());
        let schema = ModelSchema {
            name: self.name,
            collection,
            fields: self.fields,
            hashable: self.hashable,
            indexes: self.indexes,
        };
        for path in &schema.hashable {
            schema.resolve(path)?;
        }
        for index in &schema.indexes {
            for path in index.paths() {
                schema.resolve(path)?;
            }
        }
        Ok(schema)
    }
}
