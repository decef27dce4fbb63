//! Typed property values and the ordered property map stored on objects.

use std::fmt;
use std::path::{Component, Path};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::class::ClassTag;
use crate::error::TypeError;
use crate::id::ObjectId;
use crate::trace::{TraceLink, TraceType};

/// A value drawn from a fixed label set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEnumValue")]
pub struct EnumValue {
    labels: Vec<String>,
    selected: String,
}

#[derive(Deserialize)]
struct RawEnumValue {
    labels: Vec<String>,
    selected: String,
}

impl TryFrom<RawEnumValue> for EnumValue {
    type Error = TypeError;

    fn try_from(raw: RawEnumValue) -> Result<Self, Self::Error> {
        Self::new(raw.labels, raw.selected)
    }
}

impl EnumValue {
    /// Create an enumerated value. `selected` must be one of `labels`.
    pub fn new(labels: Vec<String>, selected: impl Into<String>) -> Result<Self, TypeError> {
        let selected = selected.into();
        if !labels.contains(&selected) {
            return Err(TypeError::InvalidEnumValue {
                value: selected,
                labels,
            });
        }
        Ok(Self { labels, selected })
    }

    /// The allowed labels, in display order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The currently selected label.
    pub fn selected(&self) -> &str {
        &self.selected
    }
}

/// A relative path into a project's asset store.
///
/// Asset paths never start at the filesystem root and never climb out of the
/// asset directory with `..`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetPath(String);

impl AssetPath {
    /// Validate and wrap a relative asset path. Backslashes are normalized.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let raw = path.into();
        let normalized = raw.replace('\\', "/");
        if normalized.is_empty() {
            return Err(TypeError::InvalidAssetPath(raw));
        }
        let ok = Path::new(&normalized)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !ok || normalized.starts_with('/') {
            return Err(TypeError::InvalidAssetPath(raw));
        }
        Ok(Self(normalized))
    }

    /// The normalized relative path.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AssetPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AssetPath> for String {
    fn from(p: AssetPath) -> Self {
        p.0
    }
}

/// A typed value attached to an object by name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Single-line plain text.
    Text(String),
    /// Multi-line markup text, rendered by the templating layer.
    Markup(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Enumerated(EnumValue),
    /// Reference into the project asset store.
    File(AssetPath),
    Url(String),
    Classes(Vec<ClassTag>),
    /// Outgoing trace edges. The property name is the trace type.
    Trace(Vec<TraceLink>),
}

impl PropertyValue {
    /// Short name of the value kind, as used in persisted files.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Markup(_) => "markup",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Date(_) => "date",
            Self::Enumerated(_) => "enumerated",
            Self::File(_) => "file",
            Self::Url(_) => "url",
            Self::Classes(_) => "classes",
            Self::Trace(_) => "trace",
        }
    }

    /// Returns the trace links if this is a trace property.
    pub fn as_trace(&self) -> Option<&[TraceLink]> {
        match self {
            Self::Trace(links) => Some(links),
            _ => None,
        }
    }

    /// Returns the text if this is a text or markup property.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Markup(s) => Some(s),
            _ => None,
        }
    }

    /// Human-readable rendering of the value for listings.
    pub fn display_string(&self) -> String {
        match self {
            Self::Text(s) | Self::Markup(s) | Self::Url(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Enumerated(e) => e.selected().to_string(),
            Self::File(p) => p.to_string(),
            Self::Classes(tags) => tags
                .iter()
                .map(ClassTag::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            Self::Trace(links) => links
                .iter()
                .map(|l| match &l.label {
                    Some(label) => format!("{} ({label})", l.target),
                    None => l.target.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Insertion-ordered property map with unique names.
///
/// Replacing a value keeps the original position; removing a property shifts
/// the ones after it so display order stays stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, PropertyValue>);

impl TryFrom<IndexMap<String, PropertyValue>> for Properties {
    type Error = TypeError;

    fn try_from(map: IndexMap<String, PropertyValue>) -> Result<Self, Self::Error> {
        let mut props = Self::new();
        for (name, value) in map {
            props.insert(name, value)?;
        }
        Ok(props)
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = IndexMap::<String, PropertyValue>::deserialize(deserializer)?;
        Self::try_from(map).map_err(serde::de::Error::custom)
    }
}

impl Properties {
    /// An empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a property, returning the previous value.
    ///
    /// Trace properties must be named by a valid [`TraceType`].
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: PropertyValue,
    ) -> Result<Option<PropertyValue>, TypeError> {
        let name = name.into();
        if matches!(value, PropertyValue::Trace(_)) {
            TraceType::new(name.as_str())?;
        }
        Ok(self.0.insert(name, value))
    }

    /// Look up a property by name.
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.0.get(name)
    }

    /// Mutable access to a property value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.0.get_mut(name)
    }

    /// Remove a property, preserving the order of the remaining ones.
    pub fn remove(&mut self, name: &str) -> Option<PropertyValue> {
        self.0.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(name, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Mutable iteration in display order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PropertyValue)> {
        self.0.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate the trace properties as `(trace type, links)`.
    pub fn traces(&self) -> impl Iterator<Item = (TraceType, &[TraceLink])> {
        self.0.iter().filter_map(|(name, value)| {
            let links = value.as_trace()?;
            let trace_type = TraceType::new(name.as_str()).ok()?;
            Some((trace_type, links))
        })
    }

    /// Append a link to the trace property `trace_type`, creating it if
    /// needed. Returns `false` if a link to the same target already exists.
    ///
    /// Fails if a non-trace property already uses that name.
    pub fn push_trace(&mut self, trace_type: &TraceType, link: TraceLink) -> Result<bool, TypeError> {
        let entry = self
            .0
            .entry(trace_type.as_str().to_string())
            .or_insert_with(|| PropertyValue::Trace(Vec::new()));
        match entry {
            PropertyValue::Trace(links) => {
                if links.iter().any(|l| l.target == link.target) {
                    return Ok(false);
                }
                links.push(link);
                Ok(true)
            }
            _ => Err(TypeError::InvalidTraceType(trace_type.to_string())),
        }
    }

    /// Remove the link to `target` from the trace property `trace_type`.
    /// The property itself is kept (possibly empty).
    pub fn remove_trace(&mut self, trace_type: &TraceType, target: &ObjectId) -> bool {
        match self.0.get_mut(trace_type.as_str()) {
            Some(PropertyValue::Trace(links)) => {
                let before = links.len();
                links.retain(|l| &l.target != target);
                links.len() != before
            }
            _ => false,
        }
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a PropertyValue);
    type IntoIter = indexmap::map::Iter<'a, String, PropertyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
