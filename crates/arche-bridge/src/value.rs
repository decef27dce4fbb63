//! Argument and result types exchanged with the templating layer.
//!
//! Both sides are plain serde types so a template engine in another process
//! or language can call queries with JSON:
//!
//! ```json
//! ["0190a1b2-...", ["depends-on", "refines"]]
//! ```

use serde::{Deserialize, Serialize};

use arche_persist::AssetInfo;
use arche_store::{DocumentMeta, Object};
use arche_trace::DependencyMatrix;
use arche_types::{AssetPath, ClassTag, ObjectId, Properties};

/// One positional argument: a single token or a list of tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryArg {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for QueryArg {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for QueryArg {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<ObjectId> for QueryArg {
    fn from(value: ObjectId) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<ObjectId>> for QueryArg {
    fn from(value: Vec<ObjectId>) -> Self {
        Self::Many(value.iter().map(ToString::to_string).collect())
    }
}

impl From<Vec<&str>> for QueryArg {
    fn from(value: Vec<&str>) -> Self {
        Self::Many(value.into_iter().map(str::to_string).collect())
    }
}

/// Positional arguments of a query call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryArgs(pub Vec<QueryArg>);

impl QueryArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: append an argument.
    pub fn arg(mut self, value: impl Into<QueryArg>) -> Self {
        self.0.push(value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&QueryArg> {
        self.0.get(index)
    }

    /// Tokens of argument `index`: a single token counts as a list of one.
    /// Missing arguments are empty.
    pub fn tokens(&self, index: usize) -> Vec<&str> {
        match self.0.get(index) {
            Some(QueryArg::One(s)) => vec![s.as_str()],
            Some(QueryArg::Many(items)) => items.iter().map(String::as_str).collect(),
            None => Vec::new(),
        }
    }
}

/// An object as shown to templates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectView {
    pub id: ObjectId,
    pub label: String,
    pub classes: Vec<ClassTag>,
    pub properties: Properties,
    pub children: Vec<ObjectId>,
    pub parent: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentMeta>,
}

impl From<&Object> for ObjectView {
    fn from(obj: &Object) -> Self {
        Self {
            id: obj.id,
            label: obj.label(),
            classes: obj.classes.clone(),
            properties: obj.properties.clone(),
            children: obj.children.clone(),
            parent: obj.parent,
            document: obj.document_meta().cloned(),
        }
    }
}

/// Id plus display label, used for matrix headers and listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectSummary {
    pub id: ObjectId,
    pub label: String,
}

impl From<&Object> for ObjectSummary {
    fn from(obj: &Object) -> Self {
        Self {
            id: obj.id,
            label: obj.label(),
        }
    }
}

/// Asset content prepared for embedding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPayload {
    pub path: AssetPath,
    pub media_type: String,
    pub size: u64,
    pub digest: String,
    /// Standard base64 of the file content.
    pub base64: String,
}

impl AssetPayload {
    pub(crate) fn new(info: AssetInfo, base64: String) -> Self {
        let media_type = media_type_of(&info.path).to_string();
        Self {
            path: info.path,
            media_type,
            size: info.size,
            digest: info.digest,
            base64,
        }
    }

    /// A `data:` URL for direct embedding in HTML.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

/// Dependency matrix with labelled headers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixView {
    pub rows: Vec<ObjectSummary>,
    pub columns: Vec<ObjectSummary>,
    pub cells: Vec<Vec<bool>>,
}

impl MatrixView {
    pub(crate) fn new(
        matrix: DependencyMatrix,
        rows: Vec<ObjectSummary>,
        columns: Vec<ObjectSummary>,
    ) -> Self {
        Self {
            rows,
            columns,
            cells: matrix.cells,
        }
    }
}

/// Result of a query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryValue {
    /// Nothing to show (missing object, no current document, missing asset).
    Empty,
    Bool(bool),
    Id(ObjectId),
    Ids(Vec<ObjectId>),
    Object(Box<ObjectView>),
    Listing(Vec<ObjectSummary>),
    Asset(AssetPayload),
    Matrix(MatrixView),
}

impl QueryValue {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Ids(ids) => ids.is_empty(),
            Self::Listing(items) => items.is_empty(),
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_ids(&self) -> Option<&[ObjectId]> {
        match self {
            Self::Ids(ids) => Some(ids),
            _ => None,
        }
    }
}

fn media_type_of(path: &AssetPath) -> &'static str {
    let ext = path
        .as_str()
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_accept_json_tokens_and_lists() {
        let args: QueryArgs = serde_json::from_str(r#"["a", ["b", "c"]]"#).unwrap();
        assert_eq!(args.tokens(0), vec!["a"]);
        assert_eq!(args.tokens(1), vec!["b", "c"]);
        assert!(args.tokens(2).is_empty());
    }

    #[test]
    fn value_serializes_with_a_type_tag() {
        let json = serde_json::to_value(QueryValue::Bool(true)).unwrap();
        assert_eq!(json, serde_json::json!({"type": "bool", "value": true}));
        let json = serde_json::to_value(QueryValue::Empty).unwrap();
        assert_eq!(json, serde_json::json!({"type": "empty"}));
    }

    #[test]
    fn media_types_follow_extension() {
        assert_eq!(media_type_of(&AssetPath::new("img/Logo.PNG").unwrap()), "image/png");
        assert_eq!(media_type_of(&AssetPath::new("blob").unwrap()), "application/octet-stream");
    }
}
