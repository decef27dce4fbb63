use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use arche_types::{
    ClassTag, ObjectId, ProjectId, Properties, PropertyValue, TraceLink, TraceType, TypeError,
};

/// Document-level metadata carried by document roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub authors: Vec<String>,
}

impl DocumentMeta {
    /// Metadata with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Whether an object is a plain node or a document root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// A node inside a document tree. Always has a parent.
    Object,
    /// The root of a document tree. Never has a parent.
    Document(DocumentMeta),
}

impl ObjectKind {
    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document(_))
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object => write!(f, "object"),
            Self::Document(_) => write!(f, "document"),
        }
    }
}

/// A node in the containment forest.
///
/// Fields are public for construction; once an object is registered in an
/// [`ObjectStore`](crate::ObjectStore) the store owns `children` and
/// `parent` and only hands out shared references.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Object {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub classes: Vec<ClassTag>,
    pub properties: Properties,
    pub children: Vec<ObjectId>,
    pub parent: Option<ObjectId>,
}

impl Object {
    /// A new blank object with a fresh identifier, to be placed under `parent`.
    pub fn new(parent: ObjectId) -> Self {
        Self::with_id(ObjectId::new(), ObjectKind::Object, Some(parent))
    }

    /// A new document root with a fresh identifier.
    pub fn document(meta: DocumentMeta) -> Self {
        Self::with_id(ObjectId::new(), ObjectKind::Document(meta), None)
    }

    /// A blank object with an explicit identifier.
    pub fn with_id(id: ObjectId, kind: ObjectKind, parent: Option<ObjectId>) -> Self {
        Self {
            id,
            kind,
            classes: Vec::new(),
            properties: Properties::new(),
            children: Vec::new(),
            parent,
        }
    }

    /// Builder: add a class tag (ignored if already present).
    pub fn with_class(mut self, tag: ClassTag) -> Self {
        self.add_class(tag);
        self
    }

    /// Builder: set a property.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: PropertyValue,
    ) -> Result<Self, TypeError> {
        self.properties.insert(name, value)?;
        Ok(self)
    }

    /// Add a class tag, keeping tags unique. Returns `true` if added.
    pub fn add_class(&mut self, tag: ClassTag) -> bool {
        if self.classes.contains(&tag) {
            return false;
        }
        self.classes.push(tag);
        true
    }

    pub fn has_class(&self, tag: &ClassTag) -> bool {
        self.classes.contains(tag)
    }

    /// Returns `true` if the object carries at least one of `tags`.
    pub fn has_any_class(&self, tags: &[ClassTag]) -> bool {
        tags.iter().any(|t| self.has_class(t))
    }

    pub fn is_document(&self) -> bool {
        self.kind.is_document()
    }

    /// Document metadata, if this is a document root.
    pub fn document_meta(&self) -> Option<&DocumentMeta> {
        match &self.kind {
            ObjectKind::Document(meta) => Some(meta),
            ObjectKind::Object => None,
        }
    }

    /// Label used when listing the object: the `title` or `name` text
    /// property, the document name, or the short id.
    pub fn label(&self) -> String {
        ["title", "name"]
            .iter()
            .find_map(|key| self.properties.get(key).and_then(PropertyValue::as_text))
            .map(str::to_string)
            .or_else(|| self.document_meta().map(|m| m.name.clone()))
            .unwrap_or_else(|| self.id.short_id())
    }

    /// All outgoing trace edges as `(type, link)` pairs, in property order.
    pub fn trace_links(&self) -> Vec<(TraceType, &TraceLink)> {
        self.properties
            .traces()
            .flat_map(|(t, links)| links.iter().map(move |l| (t.clone(), l)))
            .collect()
    }
}

/// The top-level container: an ordered list of documents plus metadata.
///
/// The project is not itself an object; it owns the document roots, and the
/// assets folder lives next to it on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub documents: Vec<ObjectId>,
}

impl Project {
    /// A new, empty project.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            name: name.into(),
            documents: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> ClassTag {
        ClassTag::new(s).unwrap()
    }

    #[test]
    fn new_object_has_parent_and_no_children() {
        let parent = ObjectId::from_u128(1);
        let obj = Object::new(parent);
        assert_eq!(obj.parent, Some(parent));
        assert!(obj.children.is_empty());
        assert!(!obj.is_document());
    }

    #[test]
    fn document_has_no_parent() {
        let doc = Object::document(DocumentMeta::named("SRS"));
        assert!(doc.parent.is_none());
        assert!(doc.is_document());
        assert_eq!(doc.document_meta().unwrap().name, "SRS");
    }

    #[test]
    fn class_tags_are_unique() {
        let mut obj = Object::new(ObjectId::from_u128(1)).with_class(tag("requirement"));
        assert!(!obj.add_class(tag("requirement")));
        assert!(obj.add_class(tag("functional")));
        assert_eq!(obj.classes.len(), 2);
        assert!(obj.has_any_class(&[tag("nope"), tag("functional")]));
    }

    #[test]
    fn label_prefers_title_then_name_then_document_then_id() {
        let obj = Object::new(ObjectId::from_u128(1))
            .with_property("name", PropertyValue::Text("by name".into()))
            .unwrap();
        assert_eq!(obj.label(), "by name");

        let obj = obj
            .with_property("title", PropertyValue::Text("by title".into()))
            .unwrap();
        assert_eq!(obj.label(), "by title");

        let doc = Object::document(DocumentMeta::named("Spec"));
        assert_eq!(doc.label(), "Spec");

        let bare = Object::with_id(ObjectId::from_u128(0xabcdef), ObjectKind::Object, None);
        assert_eq!(bare.label(), bare.id.short_id());
    }

    #[test]
    fn trace_links_flatten_all_trace_properties() {
        let a = ObjectId::from_u128(10);
        let b = ObjectId::from_u128(11);
        let obj = Object::new(ObjectId::from_u128(1))
            .with_property("depends-on", PropertyValue::Trace(vec![TraceLink::new(a)]))
            .unwrap()
            .with_property("title", PropertyValue::Text("x".into()))
            .unwrap()
            .with_property("verifies", PropertyValue::Trace(vec![TraceLink::new(b)]))
            .unwrap();
        let links = obj.trace_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].0.as_str(), "depends-on");
        assert_eq!(links[0].1.target, a);
        assert_eq!(links[1].1.target, b);
    }

    #[test]
    fn kind_serde_is_tagged() {
        let kind = ObjectKind::Document(DocumentMeta::named("D"));
        let json = serde_json::to_string(&kind).unwrap();
        assert!(json.contains("\"type\":\"document\""));
        let back: ObjectKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kind);
    }
}
