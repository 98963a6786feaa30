//! The on-disk analysis cache:
//! `.doxy/cache.json`, rewritten atomically at end of run.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::analyzer::Finding;
use crate::error::{DoxyError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCacheEntry {
    pub file_path: PathBuf,
    pub content_hash: String,
    pub authority_version: String,
    pub repo_context_hash: String,
    /// Absent when written by an older `doxy` that predates this field.
    #[serde(default)]
    pub imported_packages: Option<Vec<String>>,
    #[serde(default)]
    pub package_versions: BTreeMap<String, String>,
    #[serde(default)]
    pub unresolved_imports: Vec<String>,
    /// Absent (empty string) when written by an older `doxy`: treated as a
    /// guaranteed mismatch against any non-empty current fingerprint, so an
    /// old cache is re-analyzed once rather than silently trusted.
    #[serde(default)]
    pub config_fingerprint: String,
    pub findings: Vec<Finding>,
    pub analyzed_at: String,

    /// Keys neither read nor written by this version, preserved verbatim
    /// across rewrites.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheFile {
    pub entries: BTreeMap<String, FileCacheEntry>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub doxy_version: Option<String>,
}

impl CacheFile {
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| DoxyError::unreadable_path(&path.to_path_buf(), source))?;
        serde_json::from_str(&raw).map_err(|e| DoxyError::project(format!("invalid cache at {}: {e}", path.display())))
    }

    /// Atomic write-to-temp-then-rename so a crash mid-write never leaves a
    /// corrupt cache file on disk.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| DoxyError::unreadable_path(&parent.to_path_buf(), source))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| DoxyError::internal("cache-encode", e.to_string()))?;
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|source| DoxyError::unreadable_path(&parent.to_path_buf(), source))?;
        tmp.write_all(json.as_bytes()).map_err(|source| DoxyError::unreadable_path(&path.to_path_buf(), source))?;
        tmp.persist(path).map_err(|e| DoxyError::internal("cache-persist", e.to_string()))?;
        Ok(())
    }

    pub fn get(&self, file: &Path) -> Option<&FileCacheEntry> {
        self.entries.get(&file.to_string_lossy().to_string())
    }

    pub fn insert(&mut self, entry: FileCacheEntry) {
        self.entries.insert(entry.file_path.to_string_lossy().to_string(), entry);
    }

    pub fn remove(&mut self, file: &Path) -> Option<FileCacheEntry> {
        self.entries.remove(&file.to_string_lossy().to_string())
    }

    /// Deletes entries whose file no longer exists on disk. Runs
    /// unconditionally at end of run.
    pub fn gc(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|path, _| Path::new(path).is_file());
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "garbage collected cache entries for deleted files");
        }
    }
}
