use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use arche_clone::CloneOptions;
use arche_persist::PersistOptions;

use crate::error::{SdkError, SdkResult};

/// Name of the optional configuration file at the project root.
pub const CONFIG_FILE: &str = "arche.toml";

/// What happens to traces pointing at a deleted object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanglingPolicy {
    /// Leave them in place. They resolve to nothing until the target is
    /// restored or the link is removed by hand.
    #[default]
    Keep,
    /// Remove them from their source objects as well.
    Cascade,
}

/// Configuration of a workspace.
///
/// ```toml
/// dangling_policy = "keep"
/// max_id_attempts = 16
/// asset_dir = "assets"
/// library_root = "../library"
/// default_profile = "standard"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub dangling_policy: DanglingPolicy,
    /// Identifier candidates drawn per cloned node before the clone fails.
    pub max_id_attempts: u32,
    /// Asset folder name below the project root.
    pub asset_dir: String,
    /// Archetype library root. Relative paths are resolved against the
    /// project root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_root: Option<PathBuf>,
    /// Profile used when an archetype is named without one.
    pub default_profile: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            dangling_policy: DanglingPolicy::Keep,
            max_id_attempts: CloneOptions::default().max_id_attempts,
            asset_dir: PersistOptions::default().asset_dir,
            library_root: None,
            default_profile: "standard".into(),
        }
    }
}

impl WorkspaceConfig {
    /// Read a TOML configuration file. Missing keys take their defaults.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read `<root>/arche.toml`, or the defaults if there is none.
    pub fn load_or_default(root: &Path) -> SdkResult<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| SdkError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, text)?;
        Ok(())
    }

    pub fn clone_options(&self) -> CloneOptions {
        CloneOptions {
            max_id_attempts: self.max_id_attempts,
        }
    }

    pub fn persist_options(&self) -> PersistOptions {
        PersistOptions {
            asset_dir: self.asset_dir.clone(),
        }
    }

    /// The library root resolved against `project_root`.
    pub fn library_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.library_root.as_ref().map(|p| {
            if p.is_absolute() {
                p.clone()
            } else {
                project_root.join(p)
            }
        })
    }
}
