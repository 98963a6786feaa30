//! Run configuration: `doxy.config.json` or
//! `doxy.config.toml`, first found wins, plus CLI-flag overrides at the
//! external boundary.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analyzer::Severity;
use crate::error::{DoxyError, Result};
use crate::suppression::SuppressionRule;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
    #[serde(default)]
    pub frameworks: BTreeMap<String, String>,
    #[serde(default)]
    pub path_aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub suppressions: Vec<SuppressionRule>,
    #[serde(default)]
    pub require_suppression_reason: bool,
    #[serde(default)]
    pub authority_data_sources: Vec<PathBuf>,
}

fn default_severity() -> Severity {
    Severity::Info
}

fn default_fail_on() -> Severity {
    Severity::Error
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            severity: default_severity(),
            fail_on: default_fail_on(),
            frameworks: BTreeMap::new(),
            path_aliases: BTreeMap::new(),
            suppressions: Vec::new(),
            require_suppression_reason: false,
            authority_data_sources: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `doxy.config.json` if present, else `doxy.config.toml`, else
    /// the default configuration. Keys unrecognized by this version are
    /// tolerated (no `deny_unknown_fields`) for forward compatibility.
    pub fn load(root: &Path) -> Result<Self> {
        let json_path = root.join("doxy.config.json");
        if json_path.is_file() {
            let raw = fs::read_to_string(&json_path)
                .map_err(|source| DoxyError::unreadable_path(&json_path, source))?;
            return serde_json::from_str(&raw)
                .map_err(|e| DoxyError::config(format!("invalid {}: {e}", json_path.display())));
        }

        let toml_path = root.join("doxy.config.toml");
        if toml_path.is_file() {
            let raw = fs::read_to_string(&toml_path)
                .map_err(|source| DoxyError::unreadable_path(&toml_path, source))?;
            return toml::from_str(&raw)
                .map_err(|e| DoxyError::config(format!("invalid {}: {e}", toml_path.display())));
        }

        Ok(Self::default())
    }

    /// The ordered list of authority data roots to load and merge,
    /// first-hit-wins on key collision. Falls back to a single root
    /// (typically the `--authority` CLI flag) when the config declares
    /// none.
    pub fn authority_roots(&self, fallback: &Path) -> Vec<PathBuf> {
        let existing: Vec<PathBuf> = self.authority_data_sources.iter().filter(|p| p.is_dir()).cloned().collect();
        if existing.is_empty() {
            vec![fallback.to_path_buf()]
        } else {
            existing
        }
    }

    /// SHA-256 over the config fields that change per-file analysis output
    /// (minimum severity, config-level suppression rules,
    /// `requireSuppressionReason`) but aren't already folded into the repo
    /// context hash. A cache entry whose fingerprint disagrees with the
    /// current config is stale even if the file's content hasn't changed.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_string(&self.severity).unwrap_or_default().as_bytes());
        hasher.update(serde_json::to_string(&self.suppressions).unwrap_or_default().as_bytes());
        hasher.update([u8::from(self.require_suppression_reason)]);
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_info_severity_and_error_fail_on() {
        let config = Config::default();
        assert_eq!(config.severity, Severity::Info);
        assert_eq!(config.fail_on, Severity::Error);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.include.is_empty());
    }

    #[test]
    fn json_config_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("doxy.config.json"), r#"{"failOn": "warning", "requireSuppressionReason": true}"#).unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.fail_on, Severity::Warning);
        assert!(config.require_suppression_reason);
    }
}
