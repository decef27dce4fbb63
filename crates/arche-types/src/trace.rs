use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::ObjectId;

/// Name of a trace relationship, e.g. `depends-on` or `verifies`.
///
/// A trace type is also the name of the trace property that stores the
/// edges on the source object.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TraceType(String);

impl TraceType {
    /// Create a trace type. Names are non-empty and contain no whitespace.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidTraceType(name));
        }
        Ok(Self(name))
    }

    /// The trace type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceType({})", self.0)
    }
}

impl fmt::Display for TraceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TraceType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TraceType {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TraceType> for String {
    fn from(t: TraceType) -> Self {
        t.0
    }
}

/// One edge stored in a trace property: the target and an optional label.
///
/// The target may not resolve to a live object (a dangling trace). That is a
/// normal state for partially edited documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceLink {
    /// The object this edge points at.
    pub target: ObjectId,
    /// Optional human-readable description of the relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TraceLink {
    /// An unlabeled link to `target`.
    pub fn new(target: ObjectId) -> Self {
        Self {
            target,
            label: None,
        }
    }

    /// A labeled link to `target`.
    pub fn labeled(target: ObjectId, label: impl Into<String>) -> Self {
        Self {
            target,
            label: Some(label.into()),
        }
    }
}

/// Trace type filter for lookups and impact analysis.
///
/// Filters built from user-supplied tokens never fail: malformed tokens are
/// dropped and simply match nothing, so a matrix computed against a renamed
/// or removed type degrades to an empty result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceFilter {
    /// Every trace type matches.
    #[default]
    Any,
    /// Only the listed types match. An empty set matches nothing.
    Only(BTreeSet<TraceType>),
}

impl TraceFilter {
    /// A filter matching exactly one type.
    pub fn only(trace_type: TraceType) -> Self {
        Self::Only(BTreeSet::from([trace_type]))
    }

    /// Build a filter from raw tokens, discarding malformed ones.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(
            tokens
                .into_iter()
                .filter_map(|t| TraceType::new(t.as_ref()).ok())
                .collect(),
        )
    }

    /// Returns `true` if `trace_type` passes this filter.
    pub fn matches(&self, trace_type: &TraceType) -> bool {
        match self {
            Self::Any => true,
            Self::Only(types) => types.contains(trace_type),
        }
    }

    /// Returns `true` if no trace type can pass this filter.
    pub fn matches_nothing(&self) -> bool {
        matches!(self, Self::Only(types) if types.is_empty())
    }
}

impl From<Option<TraceType>> for TraceFilter {
    fn from(value: Option<TraceType>) -> Self {
        match value {
            Some(t) => Self::only(t),
            None => Self::Any,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tt(s: &str) -> TraceType {
        TraceType::new(s).unwrap()
    }

    #[test]
    fn trace_type_validation() {
        assert!(TraceType::new("depends-on").is_ok());
        assert_eq!(
            TraceType::new("depends on"),
            Err(TypeError::InvalidTraceType("depends on".into()))
        );
        assert!(TraceType::new("").is_err());
    }

    #[test]
    fn any_matches_everything() {
        assert!(TraceFilter::Any.matches(&tt("x")));
        assert!(!TraceFilter::Any.matches_nothing());
    }

    #[test]
    fn only_matches_listed_types() {
        let filter = TraceFilter::only(tt("depends-on"));
        assert!(filter.matches(&tt("depends-on")));
        assert!(!filter.matches(&tt("verifies")));
    }

    #[test]
    fn malformed_tokens_match_nothing() {
        let filter = TraceFilter::from_tokens(["", "two words"]);
        assert!(filter.matches_nothing());
        assert!(!filter.matches(&tt("depends-on")));
    }

    #[test]
    fn mixed_tokens_keep_the_valid_ones() {
        let filter = TraceFilter::from_tokens(["depends-on", "bad token"]);
        assert!(filter.matches(&tt("depends-on")));
        assert!(!filter.matches_nothing());
    }

    #[test]
    fn trace_link_label_is_omitted_when_absent() {
        let link = TraceLink::new(ObjectId::from_u128(3));
        let json = serde_json::to_string(&link).unwrap();
        assert!(!json.contains("label"));
        let labeled = TraceLink::labeled(ObjectId::from_u128(3), "why");
        let back: TraceLink =
            serde_json::from_str(&serde_json::to_string(&labeled).unwrap()).unwrap();
        assert_eq!(back, labeled);
    }

    proptest! {
        #[test]
        fn from_tokens_never_panics_and_only_keeps_valid(tokens in proptest::collection::vec(".{0,12}", 0..8)) {
            let filter = TraceFilter::from_tokens(&tokens);
            let TraceFilter::Only(kept) = filter else {
                panic!("token filters are always `Only`");
            };
            for t in kept {
                prop_assert!(!t.as_str().is_empty());
                prop_assert!(!t.as_str().chars().any(char::is_whitespace));
            }
        }
    }
}
