//! The Pipeline Orchestrator: sequences
//! `loadRepoContext -> buildAuthority -> planRun -> analyzeFiles ->
//! mergeWithCache` and owns per-file parallelism.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use doxy_authority::AuthorityStore;
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::analyzer::{self, Finding, FindingKind, FindingSymbol, Severity};
use crate::ast::SourceLocation;
use crate::cache::{CacheFile, FileCacheEntry};
use crate::config::Config;
use crate::error::Result;
use crate::incremental::{self, git, AnalysisReason, PlanOptions, RunPlan};
use crate::parser::ParserRegistry;
use crate::repo_context::RepoContext;
use crate::resolver::resolve_imports;
use crate::suppression::{ActiveSuppressions, Baseline};

const DEFAULT_FILE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PipelineOutcome {
    pub findings: Vec<Finding>,
    pub mode: crate::incremental::RunMode,
    pub stats: crate::incremental::RunStats,
}

/// Step 1: `loadRepoContext`.
pub fn load_repo_context(root: &Path, config: &Config) -> Result<RepoContext> {
    RepoContext::build(root, &config.frameworks, &config.path_aliases)
}

/// Step 2: `buildAuthority`. Loads and merges every configured authority
/// root, first-hit-wins on key collision, falling back to `default_root`
/// when the config declares no sources of its own.
pub fn build_authority(config: &Config, default_root: &Path) -> Result<AuthorityStore> {
    Ok(AuthorityStore::load_merged(&config.authority_roots(default_root))?)
}

/// Returns `None` only when the file's bytes could not be read at all
/// (vanished or permission-denied mid-run). A parse failure is *contained*:
/// it yields an info-severity finding and no cache entry, so the file is
/// retried on the next run rather than aborting the whole one.
fn per_file_evaluation(
    file: &Path,
    repo_context: &RepoContext,
    authority: &AuthorityStore,
    config: &Config,
    config_fingerprint: &str,
    baseline: &Baseline,
    parsers: &ParserRegistry,
) -> Option<(Option<FileCacheEntry>, Vec<Finding>)> {
    let started = Instant::now();
    let bytes = fs::read(file).ok()?;
    let content_hash = incremental::content_hash(&bytes);
    let content = String::from_utf8_lossy(&bytes).into_owned();

    let ast = match parsers.parse(file, &content) {
        Ok(ast) => ast,
        Err(e) => {
            warn!(file = %file.display(), error = %e, "parse failed, file will be retried next run");
            return Some((None, vec![parse_failure_finding(file, &e.to_string())]));
        }
    };

    if started.elapsed() > DEFAULT_FILE_TIMEOUT {
        let finding = timeout_finding(file);
        return Some((
            Some(timeout_cache_entry(file, &content_hash, repo_context, authority, config_fingerprint)),
            vec![finding],
        ));
    }

    let tracked = repo_context.tracked_packages();
    let resolved = resolve_imports(&ast, Some(&tracked));

    let suppressions = ActiveSuppressions::new(&ast.suppression_comments, config.suppressions.clone());
    if config.require_suppression_reason {
        if let Err(e) = suppressions.validate_reasons_present() {
            warn!(file = %file.display(), error = %e, "inline suppression missing required reason");
            return Some((None, vec![missing_suppression_reason_finding(file, &e.to_string())]));
        }
    }

    let findings = analyzer::analyze_file(file, &resolved, &repo_context.dependencies, authority, &suppressions, baseline);

    let package_versions: BTreeMap<String, String> = resolved
        .imported_packages
        .iter()
        .filter_map(|pkg| repo_context.dependencies.get(pkg).and_then(|d| d.effective_version().map(|v| (pkg.clone(), v))))
        .collect();

    let entry = FileCacheEntry {
        file_path: file.to_path_buf(),
        content_hash,
        authority_version: authority.data_version().to_string(),
        repo_context_hash: repo_context.context_hash().to_string(),
        imported_packages: Some(resolved.imported_packages.into_iter().collect()),
        package_versions,
        unresolved_imports: resolved.unresolved_imports,
        config_fingerprint: config_fingerprint.to_string(),
        findings: findings.clone(),
        analyzed_at: "unspecified".to_string(),
        extra: BTreeMap::new(),
    };

    Some((Some(entry), findings))
}

fn parse_failure_finding(file: &Path, error: &str) -> Finding {
    let location = SourceLocation { line: 1, column: 1 };
    let long_id = format!("dxy:internal/parse-failure:{}:1:1", file.display());
    let id = Finding::short_id(&long_id);
    Finding {
        id,
        long_id,
        kind: FindingKind::UnknownExport,
        severity: Severity::Info,
        location,
        file: file.to_path_buf(),
        message: format!("could not parse file: {error}"),
        symbol: FindingSymbol { package: String::new(), export: String::new(), installed_version: String::new() },
        fixes: vec![],
        authority_data_version: String::new(),
        suppressed: None,
    }
}

fn timeout_finding(file: &Path) -> Finding {
    let location = SourceLocation { line: 1, column: 1 };
    let long_id = format!("dxy:internal/timeout:{}:1:1", file.display());
    let id = Finding::short_id(&long_id);
    Finding {
        id,
        long_id,
        kind: FindingKind::UnknownExport,
        severity: Severity::Info,
        location,
        file: file.to_path_buf(),
        message: "analysis exceeded the per-file timeout".to_string(),
        symbol: FindingSymbol { package: String::new(), export: String::new(), installed_version: String::new() },
        fixes: vec![],
        authority_data_version: String::new(),
        suppressed: None,
    }
}

fn timeout_cache_entry(
    file: &Path,
    content_hash: &str,
    repo_context: &RepoContext,
    authority: &AuthorityStore,
    config_fingerprint: &str,
) -> FileCacheEntry {
    FileCacheEntry {
        file_path: file.to_path_buf(),
        content_hash: content_hash.to_string(),
        authority_version: authority.data_version().to_string(),
        repo_context_hash: repo_context.context_hash().to_string(),
        imported_packages: Some(vec![]),
        package_versions: BTreeMap::new(),
        unresolved_imports: vec![],
        config_fingerprint: config_fingerprint.to_string(),
        findings: vec![],
        analyzed_at: "unspecified".to_string(),
        extra: BTreeMap::new(),
    }
}

fn missing_suppression_reason_finding(file: &Path, error: &str) -> Finding {
    let location = SourceLocation { line: 1, column: 1 };
    let long_id = format!("dxy:internal/suppression-reason-missing:{}:1:1", file.display());
    let id = Finding::short_id(&long_id);
    Finding {
        id,
        long_id,
        kind: FindingKind::UnknownExport,
        severity: Severity::Error,
        location,
        file: file.to_path_buf(),
        message: error.to_string(),
        symbol: FindingSymbol { package: String::new(), export: String::new(), installed_version: String::new() },
        fixes: vec![],
        authority_data_version: String::new(),
        suppressed: None,
    }
}

/// Step 4: `analyzeFiles`, run over a bounded `rayon` worker pool.
/// Cancellation is cooperative: in-flight files complete, no new file is
/// dispatched once `cancel` is observed set.
#[instrument(skip_all)]
pub fn analyze_files(
    plan: &RunPlan,
    repo_context: &RepoContext,
    authority: &AuthorityStore,
    config: &Config,
    config_fingerprint: &str,
    baseline: &Baseline,
    cancel: Arc<AtomicBool>,
) -> Vec<(PathBuf, Option<FileCacheEntry>, Vec<Finding>)> {
    let parsers = ParserRegistry::default();
    let evaluate = || {
        plan.files_to_analyze
            .par_iter()
            .filter_map(|(file, reason)| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }
                let result =
                    per_file_evaluation(file, repo_context, authority, config, config_fingerprint, baseline, &parsers)?;
                info!(file = %file.display(), reason = ?reason, "analyzed");
                Some((file.clone(), result.0, result.1))
            })
            .collect()
    };

    match rayon::ThreadPoolBuilder::new().num_threads(num_cpus::get()).build() {
        Ok(pool) => pool.install(evaluate),
        Err(e) => {
            warn!(error = %e, "failed to size a dedicated worker pool, falling back to rayon's default");
            evaluate()
        }
    }
}

/// Steps 3/5: `planRun` then `mergeWithCache`. Writes the consolidated
/// cache once, single-threaded, at end of run.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn run(root: &Path, config: &Config, base_ref: Option<&str>, authority_default_root: &Path) -> Result<PipelineOutcome> {
    if config.require_suppression_reason {
        ActiveSuppressions::new(&[], config.suppressions.clone()).validate_reasons_present()?;
    }

    let repo_context = load_repo_context(root, config)?;
    let authority = build_authority(config, authority_default_root)?;
    let baseline = Baseline::load(&root.join(".doxy/baseline.json"))?;

    let cache_path = root.join(".doxy/cache.json");
    let cache = CacheFile::load(&cache_path)?;

    let changed = git::detect_changed_files(root, base_ref);
    let config_fingerprint = config.fingerprint();
    let options =
        PlanOptions { include: &config.include, exclude: &config.exclude, base_ref, config_fingerprint: &config_fingerprint };
    let plan = incremental::plan_run(root, &repo_context, &authority, &cache, changed.as_ref(), &options)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let fresh = analyze_files(&plan, &repo_context, &authority, config, &config_fingerprint, &baseline, cancel);

    let mut new_cache = CacheFile::default();
    let mut findings = Vec::new();
    for (_, entry, file_findings) in fresh {
        findings.extend(file_findings);
        if let Some(entry) = entry {
            new_cache.insert(entry);
        }
    }
    for cached in &plan.cached_files {
        if let Some(entry) = cache.get(&cached.file) {
            new_cache.insert(entry.clone());
        }
        findings.extend(cached.findings.clone());
    }

    new_cache.gc();
    new_cache.save(&cache_path)?;

    findings.sort_by(|a, b| {
        a.file.cmp(&b.file).then(a.location.line.cmp(&b.location.line)).then(a.location.column.cmp(&b.location.column)).then(a.long_id.cmp(&b.long_id))
    });

    Ok(PipelineOutcome { findings, mode: plan.mode, stats: plan.stats })
}
