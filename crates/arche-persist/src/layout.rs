use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use arche_types::ObjectId;

/// Name of the manifest file at the project root.
pub const MANIFEST_FILE: &str = "project.json";

/// Directory holding one file per object.
pub const OBJECTS_DIR: &str = "objects";

/// Options for reading and writing project directories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistOptions {
    /// Name of the shared asset folder below the project root.
    pub asset_dir: String,
}

impl Default for PersistOptions {
    fn default() -> Self {
        Self {
            asset_dir: "assets".into(),
        }
    }
}

/// Paths inside a project directory.
///
/// ```text
/// <root>/project.json
/// <root>/objects/<uuid>.json
/// <root>/<asset_dir>/...
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectLayout {
    root: PathBuf,
    asset_dir: String,
}

impl ProjectLayout {
    pub fn new(root: impl Into<PathBuf>, options: &PersistOptions) -> Self {
        Self {
            root: root.into(),
            asset_dir: options.asset_dir.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.root.join(OBJECTS_DIR)
    }

    pub fn object_path(&self, id: &ObjectId) -> PathBuf {
        self.objects_dir().join(format!("{id}.json"))
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(&self.asset_dir)
    }

    /// Parse the object id out of an object file name, if it is one.
    pub fn object_id_of(path: &Path) -> Option<ObjectId> {
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            return None;
        }
        path.file_stem()?.to_str()?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_paths_round_trip() {
        let layout = ProjectLayout::new("/p", &PersistOptions::default());
        let id = ObjectId::from_u128(42);
        let path = layout.object_path(&id);
        assert!(path.starts_with("/p/objects"));
        assert_eq!(ProjectLayout::object_id_of(&path), Some(id));
        assert_eq!(ProjectLayout::object_id_of(Path::new("/p/objects/readme.txt")), None);
        assert_eq!(ProjectLayout::object_id_of(Path::new("/p/objects/junk.json")), None);
    }

    #[test]
    fn asset_dir_is_configurable() {
        let options = PersistOptions {
            asset_dir: "media".into(),
        };
        let layout = ProjectLayout::new("/p", &options);
        assert_eq!(layout.assets_dir(), Path::new("/p/media"));
    }
}
