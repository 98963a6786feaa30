//! Lockfile parsing: the exact versions a package manager resolved
//! top-level dependencies to. Grounded on the per-ecosystem lockfile
//! shapes (npm v2/v3 `package-lock.json`, yarn v1 `yarn.lock`, pnpm
//! `pnpm-lock.yaml`); byte-grammar parsing is mechanical and intentionally
//! shallow — this module fixes only the fields the rest of `doxy` consumes: the
//! resolved version of each top-level dependency name. Transitive-edge
//! tracking is out of scope.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DoxyError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Unknown,
}

impl PackageManager {
    pub fn lockfile_name(self) -> Option<&'static str> {
        match self {
            Self::Npm => Some("package-lock.json"),
            Self::Yarn => Some("yarn.lock"),
            Self::Pnpm => Some("pnpm-lock.yaml"),
            Self::Unknown => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Unknown => "unknown",
        }
    }
}

/// Detects which package manager produced the lockfile present in `root`,
/// preferring the most specific file when more than one is present (a
/// stale lockfile left over from a manager switch).
pub fn detect_package_manager(root: &Path) -> PackageManager {
    if root.join("pnpm-lock.yaml").is_file() {
        PackageManager::Pnpm
    } else if root.join("yarn.lock").is_file() {
        PackageManager::Yarn
    } else if root.join("package-lock.json").is_file() {
        PackageManager::Npm
    } else {
        PackageManager::Unknown
    }
}

#[derive(Debug, Default, Deserialize)]
struct NpmLockfile {
    #[serde(default)]
    packages: BTreeMap<String, NpmLockEntry>,
    #[serde(default)]
    dependencies: BTreeMap<String, NpmLockEntryV1>,
}

#[derive(Debug, Deserialize)]
struct NpmLockEntry {
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NpmLockEntryV1 {
    version: Option<String>,
}

/// Resolved versions for every top-level dependency the lockfile pins.
/// Returns `None` (rather than erring) when no lockfile exists at all —
/// a missing lockfile is a soft, degraded condition, not a `ProjectError`.
pub fn load_resolved_versions(root: &Path) -> Result<Option<BTreeMap<String, String>>> {
    match detect_package_manager(root) {
        PackageManager::Npm => load_npm(root).map(Some),
        PackageManager::Yarn => load_yarn(root).map(Some),
        PackageManager::Pnpm => load_pnpm(root).map(Some),
        PackageManager::Unknown => Ok(None),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| DoxyError::unreadable_path(&path.to_path_buf(), source))
}

fn load_npm(root: &Path) -> Result<BTreeMap<String, String>> {
    let path = root.join("package-lock.json");
    let raw = read(&path)?;
    let lock: NpmLockfile = serde_json::from_str(&raw)
        .map_err(|e| DoxyError::project(format!("invalid package-lock.json: {e}")))?;

    let mut out = BTreeMap::new();
    // v2/v3 shape: "packages" keyed by "node_modules/<name>" (possibly
    // nested); a top-level dependency is the shortest such key per name.
    for (key, entry) in &lock.packages {
        let Some(name) = key.strip_prefix("node_modules/") else { continue };
        if name.contains("/node_modules/") {
            continue; // nested/transitive, not top-level
        }
        if let Some(version) = &entry.version {
            out.entry(name.to_string()).or_insert_with(|| version.clone());
        }
    }
    // v1 shape: "dependencies" keyed directly by name, flat.
    for (name, entry) in &lock.dependencies {
        if let Some(version) = &entry.version {
            out.entry(name.clone()).or_insert_with(|| version.clone());
        }
    }
    Ok(out)
}

fn load_yarn(root: &Path) -> Result<BTreeMap<String, String>> {
    let path = root.join("yarn.lock");
    let raw = read(&path)?;
    Ok(parse_yarn_lock(&raw))
}

/// Yarn v1 lockfiles are a bespoke line grammar, not YAML/JSON: blocks of
/// `"name@range", "name@range2":` headers followed by indented fields.
/// We only need the `version "x.y.z"` line per block and the package name
/// (the part before `@` on the first header descriptor).
fn parse_yarn_lock(raw: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    let mut current_names: Vec<String> = Vec::new();
    for line in raw.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if !line.starts_with(' ') && line.ends_with(':') {
            current_names = line
                .trim_end_matches(':')
                .split(", ")
                .filter_map(|descriptor| {
                    let descriptor = descriptor.trim_matches('"');
                    package_name_from_descriptor(descriptor)
                })
                .collect();
            continue;
        }
        if let Some(rest) = line.trim().strip_prefix("version ") {
            let version = rest.trim_matches('"').to_string();
            for name in &current_names {
                out.entry(name.clone()).or_insert_with(|| version.clone());
            }
        }
    }
    out
}

fn package_name_from_descriptor(descriptor: &str) -> Option<String> {
    if let Some(rest) = descriptor.strip_prefix('@') {
        rest.find('@').map(|at| format!("@{}", &rest[..at]))
    } else {
        descriptor.split_once('@').map(|(name, _)| name.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct PnpmLockfile {
    #[serde(default)]
    importers: BTreeMap<String, PnpmImporter>,
}

#[derive(Debug, Default, Deserialize)]
struct PnpmImporter {
    #[serde(default)]
    dependencies: BTreeMap<String, PnpmDependencySpec>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, PnpmDependencySpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PnpmDependencySpec {
    Simple(String),
    Detailed { version: String },
}

fn load_pnpm(root: &Path) -> Result<BTreeMap<String, String>> {
    let path = root.join("pnpm-lock.yaml");
    let raw = read(&path)?;
    let lock: PnpmLockfile =
        serde_yaml::from_str(&raw).map_err(|e| DoxyError::project(format!("invalid pnpm-lock.yaml: {e}")))?;

    let mut out = BTreeMap::new();
    for importer in lock.importers.values() {
        for (name, spec) in importer.dependencies.iter().chain(importer.dev_dependencies.iter()) {
            out.entry(name.clone()).or_insert_with(|| spec.version_string());
        }
    }
    Ok(out)
}

impl PnpmDependencySpec {
    fn version_string(&self) -> String {
        match self {
            Self::Simple(v) => strip_resolved_suffix(v),
            Self::Detailed { version } => strip_resolved_suffix(version),
        }
    }
}

/// pnpm resolves specs like `18.2.0(react@18.2.0)` for peer-dependency
/// annotations; the part before the first `(` is the concrete version.
fn strip_resolved_suffix(v: &str) -> String {
    v.split('(').next().unwrap_or(v).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_npm_v3_top_level_version() {
        let raw = r#"{"packages": {"": {}, "node_modules/react": {"version": "18.2.0"}, "node_modules/react/node_modules/loose-envify": {"version": "1.0.0"}}}"#;
        let lock: NpmLockfile = serde_json::from_str(raw).unwrap();
        assert_eq!(lock.packages.get("node_modules/react").unwrap().version.as_deref(), Some("18.2.0"));
    }

    #[test]
    fn parses_yarn_v1_block() {
        let raw = "react@^18.0.0:\n  version \"18.2.0\"\n  resolved \"https://example\"\n";
        let out = parse_yarn_lock(raw);
        assert_eq!(out.get("react").map(String::as_str), Some("18.2.0"));
    }

    #[test]
    fn strips_pnpm_peer_annotation() {
        assert_eq!(strip_resolved_suffix("18.2.0(react@18.2.0)"), "18.2.0");
    }
}
