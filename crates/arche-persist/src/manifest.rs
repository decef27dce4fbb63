use serde::{Deserialize, Serialize};

use arche_store::Project;
use arche_types::{ObjectId, ProjectId};

use crate::error::{PersistError, PersistResult};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Contents of `project.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub format_version: u32,
    pub id: ProjectId,
    pub name: String,
    /// Document roots in display order.
    pub documents: Vec<ObjectId>,
}

impl ProjectManifest {
    pub fn from_project(project: &Project) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            id: project.id,
            name: project.name.clone(),
            documents: project.documents.clone(),
        }
    }

    /// Convert back into a project record, rejecting unknown versions.
    pub fn into_project(self) -> PersistResult<Project> {
        if self.format_version != FORMAT_VERSION {
            return Err(PersistError::UnsupportedFormat {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(Project {
            id: self.id,
            name: self.name,
            documents: self.documents,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_keeps_project_fields() {
        let mut project = Project::new("Avionics");
        project.documents.push(ObjectId::from_u128(1));
        let manifest = ProjectManifest::from_project(&project);
        assert_eq!(manifest.format_version, FORMAT_VERSION);
        assert_eq!(manifest.into_project().unwrap(), project);
    }

    #[test]
    fn future_versions_are_rejected() {
        let mut manifest = ProjectManifest::from_project(&Project::new("p"));
        manifest.format_version = FORMAT_VERSION + 1;
        assert!(matches!(
            manifest.into_project(),
            Err(PersistError::UnsupportedFormat { .. })
        ));
    }
}
