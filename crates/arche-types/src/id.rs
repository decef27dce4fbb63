use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Globally unique identifier of an object in a project.
///
/// Identifiers are UUID v7 values: time-ordered, so freshly allocated ids sort
/// after older ones, and random enough that two projects never collide in
/// practice. An `ObjectId` is stable for the lifetime of its object and is
/// never rewritten in place; clones receive new identifiers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(uuid::Uuid);

impl ObjectId {
    /// Allocate a new time-ordered identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Create from a raw 128-bit value. Mostly useful for deterministic tests.
    pub const fn from_u128(value: u128) -> Self {
        Self(uuid::Uuid::from_u128(value))
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters).
    pub fn short_id(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_id())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))
    }
}

/// Identifier of a project (the unit of persistence).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(uuid::Uuid);

impl ProjectId {
    /// Allocate a new project identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProjectId({})", &self.0.simple().to_string()[..8])
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))
    }
}

/// Library address of an archetype: a profile name and an archetype name.
///
/// Archetype ids are distinct from runtime [`ObjectId`]s. They name a
/// template in a read-only library, not a live object, and are written as
/// `profile/name`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArchetypeId {
    profile: String,
    name: String,
}

impl ArchetypeId {
    /// Build an archetype id from its two components.
    pub fn new(profile: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let profile = profile.into();
        let name = name.into();
        if !is_segment(&profile) || !is_segment(&name) {
            return Err(TypeError::InvalidArchetypeId(format!("{profile}/{name}")));
        }
        Ok(Self { profile, name })
    }

    /// The profile this archetype belongs to.
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// The archetype name within its profile.
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Debug for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArchetypeId({}/{})", self.profile, self.name)
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.profile, self.name)
    }
}

impl FromStr for ArchetypeId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (profile, name) = s
            .split_once('/')
            .ok_or_else(|| TypeError::InvalidArchetypeId(s.to_string()))?;
        Self::new(profile, name)
    }
}

impl TryFrom<String> for ArchetypeId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArchetypeId> for String {
    fn from(id: ArchetypeId) -> Self {
        id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn new_ids_are_time_ordered() {
        let a = ObjectId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = ObjectId::new();
        assert!(a < b);
    }

    #[test]
    fn object_id_parses_its_display_form() {
        let id = ObjectId::new();
        let parsed: ObjectId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn object_id_rejects_garbage() {
        let err = "not-a-uuid".parse::<ObjectId>().unwrap_err();
        assert!(matches!(err, TypeError::InvalidId(_)));
    }

    #[test]
    fn short_id_is_8_chars() {
        assert_eq!(ObjectId::from_u128(7).short_id().len(), 8);
    }

    #[test]
    fn object_id_serializes_as_plain_string() {
        let id = ObjectId::from_u128(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn archetype_id_parse_and_display() {
        let id: ArchetypeId = "default/requirement".parse().unwrap();
        assert_eq!(id.profile(), "default");
        assert_eq!(id.name(), "requirement");
        assert_eq!(id.to_string(), "default/requirement");
    }

    #[test]
    fn archetype_id_requires_both_segments() {
        assert!("requirement".parse::<ArchetypeId>().is_err());
        assert!("/requirement".parse::<ArchetypeId>().is_err());
        assert!("default/".parse::<ArchetypeId>().is_err());
        assert!("default/a b".parse::<ArchetypeId>().is_err());
    }

    #[test]
    fn archetype_id_serde_uses_string_form() {
        let id = ArchetypeId::new("iso", "test-case").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"iso/test-case\"");
        let parsed: ArchetypeId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<ArchetypeId>("\"broken\"").is_err());
    }
}
