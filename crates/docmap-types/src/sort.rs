use serde::{Deserialize, Serialize};

/// Sort / index key direction.
///
/// `Ascending` and `Descending` are ordinal and understood by every backend.
/// The remaining variants are index hints only the document-database backend
/// accepts; other backends reject them at dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Ascending,
    Descending,
    Geo2d,
    GeoSphere,
    Hashed,
    Text,
}

impl Direction {
    /// Returns `true` for directions that define a total order.
    pub fn is_ordinal(&self) -> bool {
        matches!(self, Self::Ascending | Self::Descending)
    }

    /// Numeric wire form for ordinal directions (`1` / `-1`).
    pub fn as_int(&self) -> Option<i8> {
        match self {
            Self::Ascending => Some(1),
            Self::Descending => Some(-1),
            _ => None,
        }
    }
}

/// Canonical sort specification: ordered `(dotted path, direction)` pairs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sort {
    keys: Vec<(String, Direction)>,
}

impl Sort {
    /// An empty sort (backend-native order).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort ascending on a path.
    pub fn asc(mut self, path: impl Into<String>) -> Self {
        self.keys.push((path.into(), Direction::Ascending));
        self
    }

    /// Sort descending on a path.
    pub fn desc(mut self, path: impl Into<String>) -> Self {
        self.keys.push((path.into(), Direction::Descending));
        self
    }

    /// Sort with an explicit direction.
    pub fn by(mut self, path: impl Into<String>, direction: Direction) -> Self {
        self.keys.push((path.into(), direction));
        self
    }

    /// Returns `true` if no sort keys were given.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The ordered sort keys.
    pub fn keys(&self) -> &[(String, Direction)] {
        &self.keys
    }

    /// Returns `true` if every key is ordinal (sortable by comparison).
    pub fn is_ordinal(&self) -> bool {
        self.keys.iter().all(|(_, d)| d.is_ordinal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_directions() {
        assert!(Direction::Ascending.is_ordinal());
        assert!(Direction::Descending.is_ordinal());
        assert!(!Direction::GeoSphere.is_ordinal());
        assert_eq!(Direction::Ascending.as_int(), Some(1));
        assert_eq!(Direction::Descending.as_int(), Some(-1));
        assert_eq!(Direction::Text.as_int(), None);
    }

    #[test]
    fn sort_preserves_key_order() {
        let s = Sort::new().desc("age").asc("name");
        let keys: Vec<&str> = s.keys().iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(keys, vec!["age", "name"]);
        assert!(s.is_ordinal());
    }

    #[test]
    fn non_ordinal_sort_detected() {
        let s = Sort::new().by("location", Direction::Geo2d);
        assert!(!s.is_ordinal());
    }
}
