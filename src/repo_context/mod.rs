//! The Repo Context Builder: resolves installed
//! versions from lockfiles + manifest, reads type-compiler path aliases,
//! detects frameworks, and hashes the whole.

pub mod framework;
pub mod lockfile;
pub mod manifest;
pub mod pathalias;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{instrument, warn};

use crate::error::Result;
pub use framework::{Confidence, DetectedFramework};
pub use lockfile::PackageManager;
pub use pathalias::PathAliases;

/// Per-package dependency info. `resolved_version` is present iff a
/// lockfile pinned it; `declared_range` always comes from the manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DependencyInfo {
    pub resolved_version: Option<String>,
    pub declared_range: String,
}

impl DependencyInfo {
    /// The version the Analyzer should query the authority store with: the
    /// lockfile pin when present, else a representative version coerced
    /// from the declared range.
    pub fn effective_version(&self) -> Option<String> {
        self.resolved_version.clone().or_else(|| {
            doxy_authority::semver_ext::representative_version(&self.declared_range).map(|v| v.to_string())
        })
    }
}

pub struct RepoContext {
    pub root: PathBuf,
    pub package_manager: PackageManager,
    pub dependencies: BTreeMap<String, DependencyInfo>,
    pub frameworks: Vec<DetectedFramework>,
    pub path_aliases: PathAliases,
    pub lockfile_present: bool,
    context_hash: String,
}

impl RepoContext {
    /// Builds the per-run repo context. A missing lockfile degrades resolution to
    /// declared ranges rather than failing the build.
    #[instrument(skip(framework_overrides, path_alias_overrides), fields(root = %root.display()))]
    pub fn build(
        root: &Path,
        framework_overrides: &BTreeMap<String, String>,
        path_alias_overrides: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let manifest_path = root.join("package.json");
        let declared = manifest::load_declared_ranges(&manifest_path)?;

        let package_manager = lockfile::detect_package_manager(root);
        let resolved = lockfile::load_resolved_versions(root)?;
        let lockfile_present = resolved.is_some();
        if !lockfile_present {
            warn!("no lockfile found; falling back to declared-range resolution");
        }
        let resolved = resolved.unwrap_or_default();

        let mut dependencies = BTreeMap::new();
        for (name, declared_range) in &declared {
            dependencies.insert(
                name.clone(),
                DependencyInfo { resolved_version: resolved.get(name).cloned(), declared_range: declared_range.clone() },
            );
        }

        let frameworks = framework::detect_frameworks(&dependencies, framework_overrides);

        let mut path_aliases = PathAliases::from_tsconfig(&root.join("tsconfig.json")).unwrap_or_default();
        path_aliases.merge_overrides(path_alias_overrides);

        let context_hash = compute_context_hash(package_manager, &dependencies, &frameworks, &path_aliases);

        Ok(Self { root: root.to_path_buf(), package_manager, dependencies, frameworks, path_aliases, lockfile_present, context_hash })
    }

    pub fn context_hash(&self) -> &str {
        &self.context_hash
    }

    pub fn tracked_packages(&self) -> std::collections::BTreeSet<String> {
        self.dependencies.keys().cloned().collect()
    }
}

/// SHA-256 over a canonicalized form: dependency keys sorted
/// lexicographically (guaranteed by `BTreeMap`), framework list sorted by
/// id (guaranteed by `detect_frameworks`), path-alias keys sorted the
/// same way. Also folds in the detected package manager and the
/// tsconfig-derived `baseUrl`/`jsx` mode, so a `tsconfig.json` edit alone
/// (no CLI override) still changes the hash and invalidates the cache.
fn compute_context_hash(
    package_manager: PackageManager,
    dependencies: &BTreeMap<String, DependencyInfo>,
    frameworks: &[DetectedFramework],
    path_aliases: &PathAliases,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(package_manager.as_str().as_bytes());
    for (name, info) in dependencies {
        hasher.update(name.as_bytes());
        hasher.update(info.resolved_version.as_deref().unwrap_or("").as_bytes());
        hasher.update(info.declared_range.as_bytes());
    }
    for fw in frameworks {
        hasher.update(fw.id.as_bytes());
        hasher.update(fw.version.as_bytes());
    }
    for (prefix, target) in path_aliases.sorted_entries() {
        hasher.update(prefix.as_bytes());
        hasher.update(target.as_bytes());
    }
    hasher.update(path_aliases.base_url.as_deref().unwrap_or("").as_bytes());
    hasher.update(path_aliases.jsx_mode.as_deref().unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn context_hash_is_stable_for_identical_inputs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"dependencies": {"react": "^18.0.0"}}"#).unwrap();
        let empty = BTreeMap::new();
        let ctx1 = RepoContext::build(dir.path(), &empty, &empty).unwrap();
        let ctx2 = RepoContext::build(dir.path(), &empty, &empty).unwrap();
        assert_eq!(ctx1.context_hash(), ctx2.context_hash());
    }

    #[test]
    fn missing_lockfile_degrades_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"dependencies": {"react": "^18.0.0"}}"#).unwrap();
        let empty = BTreeMap::new();
        let ctx = RepoContext::build(dir.path(), &empty, &empty).unwrap();
        assert!(!ctx.lockfile_present);
        assert_eq!(ctx.dependencies["react"].effective_version().as_deref(), Some("18.0.0"));
    }

    #[test]
    fn tsconfig_change_alone_invalidates_context_hash() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"dependencies": {"react": "^18.0.0"}}"#).unwrap();
        let empty = BTreeMap::new();
        let before = RepoContext::build(dir.path(), &empty, &empty).unwrap();

        fs::write(dir.path().join("tsconfig.json"), r#"{"compilerOptions": {"baseUrl": "."}}"#).unwrap();
        let after = RepoContext::build(dir.path(), &empty, &empty).unwrap();

        assert_ne!(before.context_hash(), after.context_hash());
    }
}
