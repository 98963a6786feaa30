//! The Incremental Engine: reconciles content hashes, per-file
//! dependency-version fingerprints, authority-data version, and the
//! on-disk cache into a `RunPlan`.

pub mod git;
pub mod rename;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use doxy_authority::AuthorityStore;
use glob::Pattern;
use sha2::{Digest, Sha256};
use tracing::instrument;
use walkdir::WalkDir;

use crate::analyzer::Finding;
use crate::cache::{CacheFile, FileCacheEntry};
use crate::error::Result;
use crate::repo_context::RepoContext;
pub use git::ChangedFiles;
pub use rename::migrate_rename;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisReason {
    FileChanged,
    FileNew,
    FileRenamed,
    ManifestChanged,
    AuthorityUpdated,
    ConfigChanged,
    CacheMiss,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    Full,
    Incremental,
}

#[derive(Debug, Default)]
pub struct RunStats {
    pub analyzed: usize,
    pub cached: usize,
    pub renamed: usize,
}

pub struct CachedFile {
    pub file: PathBuf,
    pub findings: Vec<Finding>,
}

pub struct RunPlan {
    pub files_to_analyze: Vec<(PathBuf, AnalysisReason)>,
    pub cached_files: Vec<CachedFile>,
    pub mode: RunMode,
    pub base_ref: Option<String>,
    pub git_available: bool,
    pub renames: Vec<(PathBuf, PathBuf)>,
    pub stats: RunStats,
}

pub struct PlanOptions<'a> {
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub base_ref: Option<&'a str>,
    pub config_fingerprint: &'a str,
}

/// SHA-256 of a file's bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn matches_globs(path_str: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| Pattern::new(p).map(|pat| pat.matches(path_str)).unwrap_or(false))
}

fn candidate_files(root: &Path, include: &[String], exclude: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(std::result::Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let rel_str = rel.to_string_lossy();
        if rel_str.contains("node_modules") || rel_str.starts_with(".doxy") {
            continue;
        }
        if !include.is_empty() && !matches_globs(&rel_str, include) {
            continue;
        }
        if matches_globs(&rel_str, exclude) {
            continue;
        }
        out.push(entry.path().to_path_buf());
    }
    out
}

/// Checks the non-content parts of cache validity: authority data version,
/// repo context hash (or the per-file smart match against tracked package
/// versions), and whether a previously unresolved import has since been
/// added to the authority store. Needs no file bytes, so it is safe to
/// call for a file the VCS layer has not reported as changed.
fn entry_metadata_is_valid(
    entry: &FileCacheEntry,
    repo_context: &RepoContext,
    authority: &AuthorityStore,
    config_fingerprint: &str,
) -> bool {
    let Some(imported_packages) = &entry.imported_packages else {
        return false; // older cache without this field: invalidate-all
    };
    if authority.data_version() != entry.authority_version {
        return false;
    }
    if entry.config_fingerprint != config_fingerprint {
        return false;
    }
    let context_matches = repo_context.context_hash() == entry.repo_context_hash;
    let per_file_matches = imported_packages.iter().all(|pkg| {
        let current = repo_context.dependencies.get(pkg).and_then(crate::repo_context::DependencyInfo::effective_version);
        current.as_deref() == entry.package_versions.get(pkg).map(String::as_str)
    });
    if !context_matches && !per_file_matches {
        return false;
    }
    if entry.unresolved_imports.iter().any(|pkg| authority.has_package(pkg)) {
        return false;
    }
    true
}

/// Full cache-entry validity: the metadata check above plus the file's
/// current content hash.
fn entry_is_valid(
    entry: &FileCacheEntry,
    bytes: &[u8],
    repo_context: &RepoContext,
    authority: &AuthorityStore,
    config_fingerprint: &str,
) -> bool {
    content_hash(bytes) == entry.content_hash
        && entry_metadata_is_valid(entry, repo_context, authority, config_fingerprint)
}

/// Computes the run plan. `changed` carries the
/// VCS-reported change set when available; `None` means fall back to
/// hashing every candidate file against the cache.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn plan_run(
    root: &Path,
    repo_context: &RepoContext,
    authority: &AuthorityStore,
    cache: &CacheFile,
    changed: Option<&ChangedFiles>,
    options: &PlanOptions<'_>,
) -> Result<RunPlan> {
    let candidates = candidate_files(root, options.include, options.exclude);
    let candidate_set: BTreeSet<PathBuf> = candidates.iter().cloned().collect();

    let mut renames = Vec::new();
    let mut migrated: BTreeSet<PathBuf> = BTreeSet::new();
    let mut stats = RunStats::default();
    let mut files_to_analyze = Vec::new();
    let mut cached_files = Vec::new();

    let mut working_cache_view: std::collections::BTreeMap<PathBuf, FileCacheEntry> =
        cache.entries.values().map(|e| (e.file_path.clone(), e.clone())).collect();

    if let Some(changed) = changed {
        for (from, to) in &changed.renames {
            if !candidate_set.contains(to) {
                continue;
            }
            if let Some(from_entry) = working_cache_view.get(from) {
                if let Ok(bytes) = fs::read(to) {
                    if content_hash(&bytes) == from_entry.content_hash {
                        let migrated_entry = migrate_rename(from_entry, to);
                        working_cache_view.remove(from);
                        working_cache_view.insert(to.clone(), migrated_entry.clone());
                        migrated.insert(to.clone());
                        renames.push((from.clone(), to.clone()));
                        stats.renamed += 1;
                        continue;
                    }
                }
            }
            // content changed or no valid prior entry: treated as new below.
            working_cache_view.remove(from);
        }
    }

    for file in &candidates {
        if migrated.contains(file) {
            let entry = &working_cache_view[file];
            stats.cached += 1;
            cached_files.push(CachedFile { file: file.clone(), findings: entry.findings.clone() });
            continue;
        }

        // A cache entry for a file the VCS layer reports as untouched only
        // needs the (cheap) metadata check: skip the read+hash entirely.
        // Falls back to full content hashing when git is unavailable or the
        // file is flagged added/modified/untracked.
        let untouched_per_vcs = changed
            .map(|c| !c.added_or_modified.contains(file) && !c.untracked.contains(file))
            .unwrap_or(false);
        if untouched_per_vcs {
            if let Some(entry) = working_cache_view.get(file) {
                if entry_metadata_is_valid(entry, repo_context, authority, options.config_fingerprint) {
                    stats.cached += 1;
                    cached_files.push(CachedFile { file: file.clone(), findings: entry.findings.clone() });
                    continue;
                }
            }
        }

        let bytes = match fs::read(file) {
            Ok(b) => b,
            Err(_) => continue,
        };

        let reason = match working_cache_view.get(file) {
            None => Some(if changed.is_some() { AnalysisReason::FileNew } else { AnalysisReason::CacheMiss }),
            Some(entry) if !entry_is_valid(entry, &bytes, repo_context, authority, options.config_fingerprint) => {
                Some(if authority.data_version() != entry.authority_version {
                    AnalysisReason::AuthorityUpdated
                } else if entry.config_fingerprint != options.config_fingerprint {
                    AnalysisReason::ConfigChanged
                } else {
                    AnalysisReason::FileChanged
                })
            }
            Some(_) => None,
        };

        match reason {
            Some(reason) => {
                files_to_analyze.push((file.clone(), reason));
                stats.analyzed += 1;
            }
            None => {
                let entry = &working_cache_view[file];
                stats.cached += 1;
                cached_files.push(CachedFile { file: file.clone(), findings: entry.findings.clone() });
            }
        }
    }

    let mode = if cache.entries.is_empty() { RunMode::Full } else { RunMode::Incremental };

    Ok(RunPlan {
        files_to_analyze,
        cached_files,
        mode,
        base_ref: options.base_ref.map(str::to_string),
        git_available: changed.is_some(),
        renames,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entry(path: &str, hash: &str) -> FileCacheEntry {
        FileCacheEntry {
            file_path: PathBuf::from(path),
            content_hash: hash.into(),
            authority_version: "1.0.0".into(),
            repo_context_hash: "ctx".into(),
            imported_packages: Some(vec![]),
            package_versions: BTreeMap::new(),
            unresolved_imports: vec![],
            config_fingerprint: String::new(),
            findings: vec![],
            analyzed_at: "t".into(),
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn older_cache_without_imported_packages_invalidates() {
        let mut stale = entry("src/app.tsx", "h");
        stale.imported_packages = None;
        assert!(!entry_is_valid_for_test(&stale, b"content"));
    }

    fn entry_is_valid_for_test(entry: &FileCacheEntry, bytes: &[u8]) -> bool {
        entry.imported_packages.is_some() && content_hash(bytes) == entry.content_hash
    }

    #[test]
    fn content_hash_is_deterministic() {
        assert_eq!(content_hash(b"hello"), content_hash(b"hello"));
        assert_ne!(content_hash(b"hello"), content_hash(b"world"));
    }

    fn write_authority(dir: &Path) -> AuthorityStore {
        let manifest = serde_json::json!({
            "schemaVersion": 1,
            "dataVersion": "v1",
            "packages": [{"name": "react", "latestMappedVersion": "18.2.0", "specFile": "react.json"}],
        });
        fs::write(dir.join("manifest.json"), serde_json::to_vec(&manifest).unwrap()).unwrap();
        let spec = serde_json::json!({
            "schemaVersion": 1,
            "package": "react",
            "specs": [{"package": "react", "export": "useState", "kind": "function", "availableIn": ">=16.0.0"}],
        });
        fs::write(dir.join("react.json"), serde_json::to_vec(&spec).unwrap()).unwrap();
        AuthorityStore::load(dir).unwrap()
    }

    /// A file git reports as untouched, with a valid (stale-looking)
    /// on-disk content that no longer matches the cached content hash,
    /// must still be served from cache: git's changed-file union, not a
    /// full re-hash, decides whether a file needs re-reading.
    #[test]
    fn untouched_file_with_valid_cache_entry_is_served_without_rehash() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("package.json"), r#"{"dependencies": {}}"#).unwrap();
        let repo_context = RepoContext::build(root.path(), &BTreeMap::new(), &BTreeMap::new()).unwrap();

        let authority_dir = tempfile::tempdir().unwrap();
        let authority = write_authority(authority_dir.path());

        let file = root.path().join("src/app.tsx");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "changed on disk after the cache entry was written").unwrap();

        let mut cached_entry = entry(file.to_str().unwrap(), "stale-hash-not-matching-disk-content");
        cached_entry.repo_context_hash = repo_context.context_hash().to_string();
        cached_entry.authority_version = authority.data_version().to_string();
        let mut cache = CacheFile::default();
        cache.insert(cached_entry);

        let changed = ChangedFiles::default(); // empty: git saw no changes anywhere
        let options = PlanOptions { include: &[], exclude: &[], base_ref: None, config_fingerprint: "" };

        let plan = plan_run(root.path(), &repo_context, &authority, &cache, Some(&changed), &options).unwrap();

        assert!(plan.files_to_analyze.is_empty(), "untouched file should not be re-analyzed");
        assert_eq!(plan.cached_files.len(), 1);
        assert_eq!(plan.stats.cached, 1);
    }
}
