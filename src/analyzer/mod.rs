//! The Analyzer: joins resolved symbol usages against the authority
//! store, classifies findings, and applies suppressions.

pub mod classify;
pub mod finding;

use std::path::Path;

use doxy_authority::AuthorityStore;

pub use finding::{Finding, FindingKind, FindingSymbol, FixSuggestion, Severity, Suppressed, SuppressionSource};

use crate::repo_context::DependencyInfo;
use crate::suppression::{ActiveSuppressions, Baseline};
use crate::symbol::ResolvedImports;

/// Analyzes one file's resolved imports against the authority store,
/// producing the full candidate finding set with suppressions already
/// applied.
pub fn analyze_file(
    file: &Path,
    resolved: &ResolvedImports,
    dependencies: &std::collections::BTreeMap<String, DependencyInfo>,
    authority: &AuthorityStore,
    suppressions: &ActiveSuppressions,
    baseline: &Baseline,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for usage in &resolved.usages {
        let Some(installed_version) = dependencies.get(&usage.package).and_then(DependencyInfo::effective_version) else {
            continue;
        };
        findings.extend(classify::classify(usage, &installed_version, authority, file));
    }

    for finding in &mut findings {
        finding.suppressed = suppressions.match_finding(finding).or_else(|| baseline.match_finding(finding));
    }

    findings.sort_by(|a, b| a.location.line.cmp(&b.location.line).then(a.location.column.cmp(&b.location.column)).then(a.long_id.cmp(&b.long_id)));
    findings
}
