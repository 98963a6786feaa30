//! Config-level suppression rules: package/export/kind/path matchers, first match wins.

use std::path::Path;

use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::analyzer::FindingKind;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuppressionRule {
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub export: Option<String>,
    /// `"*"` or one of the six finding kinds.
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    #[serde(default)]
    pub reason: Option<String>,
}

fn default_kind() -> String {
    "*".to_string()
}

impl SuppressionRule {
    fn matches_glob_or_equal(pattern: &str, value: &str) -> bool {
        if pattern == value {
            return true;
        }
        Pattern::new(pattern).map(|p| p.matches(value)).unwrap_or(false)
    }

    pub fn matches(&self, package: &str, export: &str, kind: FindingKind, file: &Path) -> bool {
        if let Some(p) = &self.package {
            if !Self::matches_glob_or_equal(p, package) {
                return false;
            }
        }
        if let Some(e) = &self.export {
            if !Self::matches_glob_or_equal(e, export) {
                return false;
            }
        }
        if self.kind != "*" && FindingKind::from_suppression_token(&self.kind) != Some(kind) {
            return false;
        }
        if let Some(paths) = &self.paths {
            let file_str = file.to_string_lossy();
            if !paths.iter().any(|p| Pattern::new(p).map(|pat| pat.matches(&file_str)).unwrap_or(false)) {
                return false;
            }
        }
        true
    }
}
