use crate::RemoteError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Cache file colocated with the target root, one per managed link tree.
pub const CACHE_FILE_NAME: &str = ".modelink-cache.json";

/// Outcome of a past identity lookup for one digest.
///
/// `repo_id: None` is the terminal "looked up, nothing found" marker and is
/// distinct from the digest being absent from the cache entirely: a cached
/// NOT_FOUND suppresses re-querying unless a refresh is requested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub resolved_at: String,
}

impl IdentityRecord {
    pub fn not_found() -> Self {
        Self {
            repo_id: None,
            author: None,
            filename: None,
            resolved_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.repo_id.is_some()
    }
}

/// Persisted digest → identity mapping.
///
/// Loaded once at the start of a run, mutated in place during resolution,
/// and written back once at the end. A BTreeMap keeps the serialized file in
/// stable digest order across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct IdentityCache {
    entries: BTreeMap<String, IdentityRecord>,
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from disk. An absent file is an empty cache; a file
    /// that exists but does not parse is fatal, never silently discarded.
    pub fn load(path: &Path) -> Result<Self, RemoteError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RemoteError::CacheCorrupt(format!("{}: {e}", path.display())))
    }

    pub fn get(&self, digest: &str) -> Option<&IdentityRecord> {
        self.entries.get(digest)
    }

    pub fn put(&mut self, digest: impl Into<String>, record: IdentityRecord) {
        self.entries.insert(digest.into(), record);
    }

    /// Write the whole cache atomically. A crash mid-save loses at most the
    /// cache, never the link tree or the model store.
    pub fn save(&self, path: &Path) -> Result<(), RemoteError> {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| RemoteError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| RemoteError::Io(e.error))?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
