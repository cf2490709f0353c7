use serde::{Deserialize, Serialize};

use crate::sort::Direction;

/// A single-field or compound index declaration.
///
/// Index creation is best-effort everywhere: backends report success as a
/// boolean instead of failing the calling operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexModel {
    /// Ordered `(dotted path, direction)` keys.
    pub keys: Vec<(String, Direction)>,
    /// Whether the index enforces uniqueness over its key values.
    pub unique: bool,
    /// Optional explicit index name.
    pub name: Option<String>,
}

impl IndexModel {
    /// A single-field ascending index.
    pub fn on(path: impl Into<String>) -> Self {
        Self {
            keys: vec![(path.into(), Direction::Ascending)],
            unique: false,
            name: None,
        }
    }

    /// A compound index over the given keys.
    pub fn compound(keys: Vec<(String, Direction)>) -> Self {
        Self {
            keys,
            unique: false,
            name: None,
        }
    }

    /// Mark the index as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Give the index an explicit name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The dotted paths covered by this index, in key order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(p, _)| p.as_str())
    }
}
