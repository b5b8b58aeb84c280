// Verdict side file (<stem>.verdicts.json next to the upload)

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use fieldcheck_engine::{Review, ReviewCursor};
use serde::{Deserialize, Serialize};

use crate::error::IoError;
use crate::STORE_FORMAT_VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreFile {
    pub version: u32,
    #[serde(default)]
    pub verdicts: BTreeMap<String, Review>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<ReviewCursor>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: STORE_FORMAT_VERSION,
            verdicts: BTreeMap::new(),
            cursor: None,
        }
    }
}

/// `batch.xlsx` -> `batch.verdicts.json` in the same directory.
pub fn default_store_path(data_path: &Path) -> PathBuf {
    let stem = data_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    data_path.with_file_name(format!("{stem}.verdicts.json"))
}

impl StoreFile {
    pub fn new(verdicts: BTreeMap<String, Review>, cursor: Option<ReviewCursor>) -> Self {
        Self {
            version: STORE_FORMAT_VERSION,
            verdicts,
            cursor,
        }
    }

    /// Load a side file. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, IoError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no verdict file at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(IoError::read(path, e)),
        };

        // Check the version before the full parse so a newer schema reports
        // as a version problem rather than a shape mismatch
        let probe: VersionProbe = serde_json::from_str(&content).map_err(|e| IoError::Store {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if probe.version > STORE_FORMAT_VERSION {
            return Err(IoError::StoreVersion {
                path: path.to_path_buf(),
                found: probe.version,
                supported: STORE_FORMAT_VERSION,
            });
        }

        let store: StoreFile = serde_json::from_str(&content).map_err(|e| IoError::Store {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::debug!("loaded {} verdicts from {}", store.verdicts.len(), path.display());
        Ok(store)
    }

    /// Write atomically: temp file in the target directory, then rename.
    pub fn save(&self, path: &Path) -> Result<(), IoError> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let json = serde_json::to_string_pretty(self).map_err(|e| IoError::write(path, e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| IoError::write(path, e))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.write_all(b"\n"))
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| IoError::write(path, e))?;
        tmp.persist(path).map_err(|e| IoError::write(path, e.error))?;

        log::debug!("saved {} verdicts to {}", self.verdicts.len(), path.display());
        Ok(())
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}
