//! Baseline suppression: a frozen set of
//! `longId`s accepted as pre-existing, not newly introduced.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analyzer::{Finding, Suppressed, SuppressionSource};
use crate::error::{DoxyError, Result};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Baseline {
    #[serde(default)]
    pub finding_ids: BTreeSet<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub doxy_version: Option<String>,
}

impl Baseline {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| DoxyError::unreadable_path(&path.to_path_buf(), source))?;
        serde_json::from_str(&raw).map_err(|e| DoxyError::project(format!("invalid baseline at {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| DoxyError::internal("baseline-encode", e.to_string()))?;
        fs::write(path, json).map_err(|source| DoxyError::unreadable_path(&path.to_path_buf(), source))
    }

    pub fn contains(&self, long_id: &str) -> bool {
        self.finding_ids.contains(long_id)
    }

    /// Marks a finding suppressed-by-baseline when its `longId` was frozen
    /// into the baseline in an earlier run.
    pub fn match_finding(&self, finding: &Finding) -> Option<Suppressed> {
        self.contains(&finding.long_id).then(|| Suppressed { source: SuppressionSource::Baseline, reason: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_baseline_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = Baseline::load(&dir.path().join("baseline.json")).unwrap();
        assert!(baseline.finding_ids.is_empty());
    }

    #[test]
    fn roundtrips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        let mut baseline = Baseline::default();
        baseline.finding_ids.insert("dxy:react/createFactory:src/app.tsx:4:1".into());
        baseline.save(&path).unwrap();
        let reloaded = Baseline::load(&path).unwrap();
        assert!(reloaded.contains("dxy:react/createFactory:src/app.tsx:4:1"));
    }
}
