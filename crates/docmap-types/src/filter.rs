use serde_json::Value;

use crate::error::TypeError;

/// Comparison operators understood by the canonical filter representation.
///
/// The document-database backend supports the full set; other backends may
/// support only a subset (the flat-file backend accepts equality only).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    Nin,
}

impl CompareOp {
    /// Wire spelling of the operator (`$eq`, `$gt`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
            Self::Nin => "$nin",
        }
    }

    /// Parse from the wire spelling.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "$eq" => Ok(Self::Eq),
            "$ne" => Ok(Self::Ne),
            "$gt" => Ok(Self::Gt),
            "$gte" => Ok(Self::Gte),
            "$lt" => Ok(Self::Lt),
            "$lte" => Ok(Self::Lte),
            "$in" => Ok(Self::In),
            "$nin" => Ok(Self::Nin),
            other => Err(TypeError::UnknownOperator(other.to_string())),
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The condition applied to one dotted path in a filter.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// Literal equality with a value.
    Equals(Value),
    /// One or more operator comparisons, all of which must hold.
    Ops(Vec<(CompareOp, Value)>),
}

impl Condition {
    /// Returns `true` if this is a plain equality condition.
    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Equals(_))
    }
}

/// Canonical filter: an ordered mapping from dotted field path to condition.
///
/// Entry order is preserved so filters render and dispatch deterministically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    entries: Vec<(String, Condition)>,
}

impl Filter {
    /// An empty filter (matches every document).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition. Replaces any prior condition on the path.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(path.into(), Condition::Equals(value.into()));
        self
    }

    /// Add an operator condition, merging with existing operators on the path.
    pub fn op(mut self, path: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        let path = path.into();
        let value = value.into();
        if let Some((_, Condition::Ops(ops))) = self
            .entries
            .iter_mut()
            .find(|(p, c)| *p == path && matches!(c, Condition::Ops(_)))
        {
            ops.push((op, value));
        } else {
            self.insert(path, Condition::Ops(vec![(op, value)]));
        }
        self
    }

    fn insert(&mut self, path: String, condition: Condition) {
        if let Some(entry) = self.entries.iter_mut().find(|(p, _)| *p == path) {
            entry.1 = condition;
        } else {
            self.entries.push((path, condition));
        }
    }

    /// Returns `true` if the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of filtered paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterate over `(path, condition)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, Condition)> {
        self.entries.iter()
    }

    /// The dotted paths referenced by this filter.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(p, _)| p.as_str())
    }

    /// Returns `true` if every condition is plain equality.
    pub fn is_equality_only(&self) -> bool {
        self.entries.iter().all(|(_, c)| c.is_equality())
    }

    /// Split into two filters by a path predicate. Entries for which the
    /// predicate holds land in the first filter, the rest in the second.
    pub fn partition(self, pred: impl Fn(&str) -> bool) -> (Self, Self) {
        let (matched, rest) = self.entries.into_iter().partition(|(p, _)| pred(p));
        (Self { entries: matched }, Self { entries: rest })
    }
}
