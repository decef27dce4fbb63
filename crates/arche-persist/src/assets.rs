//! The shared asset folder of a project.
//!
//! File properties hold an [`AssetPath`] relative to this folder. The store
//! never reads asset bytes itself; the rendering bridge asks the
//! [`AssetStore`] when a template embeds a file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use arche_types::AssetPath;

use crate::error::{PersistError, PersistResult};
use crate::io::write_atomic;

/// Metadata of a stored asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetInfo {
    pub path: AssetPath,
    pub size: u64,
    /// Hex-encoded BLAKE3 digest of the content.
    pub digest: String,
}

/// Read/write access to a project's asset folder.
#[derive(Clone, Debug)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of `asset`. The path is not required to exist.
    pub fn resolve(&self, asset: &AssetPath) -> PathBuf {
        asset
            .as_str()
            .split('/')
            .fold(self.root.clone(), |acc, seg| acc.join(seg))
    }

    pub fn exists(&self, asset: &AssetPath) -> bool {
        self.resolve(asset).is_file()
    }

    /// Read the bytes of `asset`.
    pub fn read(&self, asset: &AssetPath) -> PersistResult<Vec<u8>> {
        let path = self.resolve(asset);
        if !path.is_file() {
            return Err(PersistError::AssetNotFound(asset.to_string()));
        }
        Ok(fs::read(path)?)
    }

    /// Store `bytes` as `asset`, replacing any previous content.
    pub fn write(&self, asset: &AssetPath, bytes: &[u8]) -> PersistResult<AssetInfo> {
        write_atomic(&self.resolve(asset), bytes)?;
        debug!(asset = %asset, size = bytes.len(), "stored asset");
        Ok(AssetInfo {
            path: asset.clone(),
            size: bytes.len() as u64,
            digest: digest(bytes),
        })
    }

    /// Size and digest of an existing asset.
    pub fn info(&self, asset: &AssetPath) -> PersistResult<AssetInfo> {
        Ok(self.load(asset)?.0)
    }

    /// Bytes of `asset` together with their metadata.
    pub fn load(&self, asset: &AssetPath) -> PersistResult<(AssetInfo, Vec<u8>)> {
        let bytes = self.read(asset)?;
        let info = AssetInfo {
            path: asset.clone(),
            size: bytes.len() as u64,
            digest: digest(&bytes),
        };
        Ok((info, bytes))
    }

    /// Every file below the asset folder, sorted.
    pub fn list(&self) -> PersistResult<Vec<AssetPath>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut assets = Vec::new();
        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(|e| PersistError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let relative = relative.to_string_lossy().replace('\\', "/");
            assets.push(AssetPath::new(relative)?);
        }
        Ok(assets)
    }
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}
