//! On-disk record formats and atomic file replacement.
//!
//! Every record carries a `version` tag. Readers treat a record with any
//! other version as absent, so a format change only costs a refetch.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{Result, StoreError};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// One cached query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Format version; missing in files from before versioning.
    #[serde(default)]
    pub version: u32,

    pub key: String,

    pub written_at: DateTime<Utc>,

    /// Opaque serialized response.
    pub payload: serde_json::Value,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, payload: serde_json::Value, written_at: DateTime<Utc>) -> Self {
        Self {
            version: FORMAT_VERSION,
            key: key.into(),
            written_at,
            payload,
        }
    }

    pub fn is_current_version(&self) -> bool {
        self.version == FORMAT_VERSION
    }
}

/// Session id to elevation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SessionIndex {
    #[serde(default)]
    pub version: u32,

    #[serde(default)]
    pub sessions: BTreeMap<String, DateTime<Utc>>,
}

impl SessionIndex {
    pub fn new() -> Self {
        Self {
            version: FORMAT_VERSION,
            sessions: BTreeMap::new(),
        }
    }
}

/// Read and decode a JSON record. `Ok(None)` if the file does not exist.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(path, e)),
    };
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Write `value` to `path` durably.
///
/// The bytes go to a temporary file in the same directory, which is synced
/// and then renamed over `path`. Concurrent writers of the same path leave
/// exactly one complete file behind.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let bytes = serde_json::to_vec_pretty(value)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
    tmp.write_all(&bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| StoreError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;

    Ok(())
}
