use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A class tag attached to an object.
///
/// Class tags decide which behaviors and templates apply to an object. An
/// object may carry several tags; there is no hierarchy between them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassTag(String);

impl ClassTag {
    /// Create a class tag. Tags are non-empty and contain no whitespace.
    pub fn new(tag: impl Into<String>) -> Result<Self, TypeError> {
        let tag = tag.into();
        if tag.is_empty() || tag.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidClassTag(tag));
        }
        Ok(Self(tag))
    }

    /// The tag text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassTag({})", self.0)
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClassTag {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ClassTag {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ClassTag> for String {
    fn from(tag: ClassTag) -> Self {
        tag.0
    }
}

impl AsRef<str> for ClassTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
