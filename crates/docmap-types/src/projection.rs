use std::collections::BTreeMap;

use crate::ID_FIELD;

/// A requested field-inclusion/exclusion specification.
///
/// Two input forms are accepted and normalized into one canonical map:
/// a flat list of names (pure inclusion) or explicit `(name, include)` pairs
/// (mixed inclusion/exclusion).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Include exactly these fields.
    Names(Vec<String>),
    /// Explicit per-field include/exclude flags.
    Flags(Vec<(String, bool)>),
}

impl Projection {
    /// Pure-inclusion projection from field names.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    /// Normalize into the canonical `name -> include` map.
    ///
    /// Identity default rule: when no explicit flag names the identity
    /// field, it is excluded whenever any other field is included and
    /// included when every entry is an exclusion. Mixed projections count
    /// as inclusion here, so they too get the implicit identity exclusion;
    /// an explicit identity flag from the caller always wins.
    pub fn normalize(&self) -> NormalizedProjection {
        let mut map = BTreeMap::new();
        match self {
            Self::Names(names) => {
                for name in names {
                    map.insert(name.clone(), true);
                }
            }
            Self::Flags(flags) => {
                for (name, include) in flags {
                    map.insert(name.clone(), *include);
                }
            }
        }
        if !map.contains_key(ID_FIELD) {
            let any_included = map.values().any(|v| *v);
            if any_included {
                map.insert(ID_FIELD.to_string(), false);
            } else if !map.is_empty() {
                map.insert(ID_FIELD.to_string(), true);
            }
        }
        NormalizedProjection { fields: map }
    }
}

/// Canonical projection form: a `name -> include` map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedProjection {
    fields: BTreeMap<String, bool>,
}

impl NormalizedProjection {
    /// The per-field flags.
    pub fn fields(&self) -> &BTreeMap<String, bool> {
        &self.fields
    }

    /// Returns `true` when at least one field is explicitly included, which
    /// switches application into inclusion mode (everything unnamed drops).
    pub fn is_inclusion(&self) -> bool {
        self.fields.iter().any(|(name, inc)| *inc && name != ID_FIELD)
            || self.fields.get(ID_FIELD).copied() == Some(true) && self.fields.len() == 1
    }

    /// Whether a field survives this projection.
    pub fn includes(&self, name: &str) -> bool {
        match self.fields.get(name) {
            Some(flag) => *flag,
            None => !self.is_inclusion(),
        }
    }

    /// Names explicitly included.
    pub fn included_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, inc)| **inc)
            .map(|(n, _)| n.as_str())
    }

    /// Names explicitly excluded.
    pub fn excluded_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, inc)| !**inc)
            .map(|(n, _)| n.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_flags_normalize_equivalently() {
        let a = Projection::names(["a", "b"]).normalize();
        let b = Projection::Flags(vec![("a".into(), true), ("b".into(), true)]).normalize();
        assert_eq!(a, b);
    }

    #[test]
    fn inclusion_excludes_identity_by_default() {
        let p = Projection::names(["name"]).normalize();
        assert_eq!(p.fields().get(ID_FIELD), Some(&false));
        assert!(!p.includes(ID_FIELD));
        assert!(p.includes("name"));
    }

    #[test]
    fn inclusion_keeps_identity_when_requested() {
        let p =
            Projection::Flags(vec![("name".into(), true), (ID_FIELD.into(), true)]).normalize();
        assert!(p.includes(ID_FIELD));
    }

    #[test]
    fn pure_exclusion_includes_identity_by_default() {
        let p = Projection::Flags(vec![("secret".into(), false)]).normalize();
        assert_eq!(p.fields().get(ID_FIELD), Some(&true));
        assert!(p.includes("anything_else"));
        assert!(!p.includes("secret"));
    }

    #[test]
    fn inclusion_mode_drops_unnamed_fields() {
        let p = Projection::names(["a"]).normalize();
        assert!(p.is_inclusion());
        assert!(!p.includes("unnamed"));
    }

    #[test]
    fn exclusion_mode_keeps_unnamed_fields() {
        let p = Projection::Flags(vec![("a".into(), false)]).normalize();
        assert!(!p.is_inclusion());
        assert!(p.includes("unnamed"));
    }

    #[test]
    fn mixed_projection_passes_flags_through() {
        let p = Projection::Flags(vec![("a".into(), true), ("b".into(), false)]).normalize();
        assert!(p.includes("a"));
        assert!(!p.includes("b"));
        // Net effect includes a field, so the identity default still applies.
        assert_eq!(p.fields().get(ID_FIELD), Some(&false));
    }
}
