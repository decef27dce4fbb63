//! Small file helpers shared by the project and asset writers.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::{PersistError, PersistResult};

/// Write `bytes` to `path` through a temporary file in the same directory,
/// then atomically move it into place. Readers never see a partial file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> PersistResult<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> PersistResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(|e| PersistError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> PersistResult<T> {
    let bytes = fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| PersistError::Serialization {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Remove `path`, treating an already missing file as success.
pub(crate) fn remove_if_exists(path: &Path) -> PersistResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
