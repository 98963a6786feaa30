//! The Analyzer's classification order: for each usage, the first
//! matching rule wins.

use doxy_authority::{AuthorityStore, ResolvedApiSpec};

use crate::analyzer::finding::{Finding, FindingKind, FindingSymbol, FixSuggestion};
use crate::ast::SourceLocation;
use crate::symbol::{SymbolUsage, UsageSite};

/// One classification outcome for a usage or a single site of it.
enum Verdict {
    UnknownExport,
    FutureApi { introduced_in: String },
    RemovedApi { removed_in: Option<String>, replacement: Option<(String, String, Option<String>)> },
    DeprecatedApi { since: String, message: String, replacement: Option<(String, String, Option<String>)> },
    WrongArity { min: u32, max: Option<u32>, got: u32 },
    WrongParam { bad_name: String },
    None,
}

fn classify_usage(resolved: &Option<ResolvedApiSpec>) -> Verdict {
    let Some(resolved) = resolved else {
        return Verdict::UnknownExport;
    };
    if !resolved.available && resolved.is_future {
        let introduced_in = resolved
            .spec
            .available_in
            .trim_start_matches(">=")
            .split(',')
            .next()
            .unwrap_or(&resolved.spec.available_in)
            .trim()
            .to_string();
        return Verdict::FutureApi { introduced_in };
    }
    if !resolved.available {
        let removed_in = resolved.active_deprecation.as_ref().and_then(|d| d.removed_in.clone());
        let replacement = resolved
            .active_deprecation
            .as_ref()
            .and_then(|d| d.replacement.as_ref())
            .map(|r| (r.package.clone(), r.export.clone(), r.migration_hint.clone()));
        return Verdict::RemovedApi { removed_in, replacement };
    }
    if let Some(dep) = &resolved.active_deprecation {
        let replacement = dep.replacement.as_ref().map(|r| (r.package.clone(), r.export.clone(), r.migration_hint.clone()));
        return Verdict::DeprecatedApi { since: dep.since.clone(), message: dep.message.clone(), replacement };
    }
    Verdict::None
}

fn classify_site(resolved: &ResolvedApiSpec, site: &UsageSite) -> Verdict {
    let Some(sig) = &resolved.active_signature else {
        return Verdict::None;
    };
    let Some(arg_count) = site.arg_count else {
        return Verdict::None;
    };
    if arg_count < sig.min_arity || sig.max_arity.map_or(false, |max| arg_count > max) {
        return Verdict::WrongArity { min: sig.min_arity, max: sig.max_arity, got: arg_count };
    }
    if !site.arg_names.is_empty() {
        let known: Vec<&str> = sig.params.iter().map(|p| p.name.as_str()).collect();
        if let Some(bad) = site.arg_names.iter().find(|name| !known.contains(&name.as_str())) {
            return Verdict::WrongParam { bad_name: bad.clone() };
        }
    }
    Verdict::None
}

fn fixes_for_replacement(replacement: &Option<(String, String, Option<String>)>) -> Vec<FixSuggestion> {
    replacement
        .as_ref()
        .map(|(pkg, export, hint)| {
            let description = hint.clone().unwrap_or_else(|| format!("use {pkg}/{export} instead"));
            vec![FixSuggestion { description, reference: None }]
        })
        .unwrap_or_default()
}

fn build(
    kind: FindingKind,
    message: String,
    file: &std::path::Path,
    location: SourceLocation,
    symbol: FindingSymbol,
    fixes: Vec<FixSuggestion>,
    authority_data_version: &str,
) -> Finding {
    let long_id = Finding::make_long_id(&symbol.package, &symbol.export, file, location);
    let id = Finding::short_id(&long_id);
    Finding {
        id,
        long_id,
        kind,
        severity: kind.severity(),
        location,
        file: file.to_path_buf(),
        message,
        symbol,
        fixes,
        authority_data_version: authority_data_version.to_string(),
        suppressed: None,
    }
}

/// Classifies one resolved usage into candidate findings. Rules 1-4
/// fire at most once, pinned to the usage's first site; rule 5 fires once
/// per site.
pub fn classify(
    usage: &SymbolUsage,
    installed_version: &str,
    authority: &AuthorityStore,
    file: &std::path::Path,
) -> Vec<Finding> {
    let resolved = authority.get_api_spec(&usage.package, &usage.export, installed_version);
    let symbol = || FindingSymbol {
        package: usage.package.clone(),
        export: usage.export.clone(),
        installed_version: installed_version.to_string(),
    };

    let Some(first_site) = usage.usage_sites.first() else {
        return Vec::new();
    };

    match classify_usage(&resolved) {
        Verdict::UnknownExport => {
            let message = format!("{}/{} is not recognized by authority data", usage.package, usage.export);
            return vec![build(
                FindingKind::UnknownExport,
                message,
                file,
                first_site.location,
                symbol(),
                Vec::new(),
                authority.data_version(),
            )];
        }
        Verdict::FutureApi { introduced_in } => {
            let message = format!("{}/{} is not available until {introduced_in}", usage.package, usage.export);
            return vec![build(
                FindingKind::FutureApi,
                message,
                file,
                first_site.location,
                symbol(),
                Vec::new(),
                authority.data_version(),
            )];
        }
        Verdict::RemovedApi { removed_in, replacement } => {
            let removed_in = removed_in.unwrap_or_else(|| "an earlier version".to_string());
            let message = format!("{}/{} was removed in {removed_in}", usage.package, usage.export);
            return vec![build(
                FindingKind::RemovedApi,
                message,
                file,
                first_site.location,
                symbol(),
                fixes_for_replacement(&replacement),
                authority.data_version(),
            )];
        }
        Verdict::DeprecatedApi { since, message, replacement } => {
            let message = format!("{}/{} has been deprecated since {since}: {message}", usage.package, usage.export);
            return vec![build(
                FindingKind::DeprecatedApi,
                message,
                file,
                first_site.location,
                symbol(),
                fixes_for_replacement(&replacement),
                authority.data_version(),
            )];
        }
        Verdict::None | Verdict::WrongArity { .. } | Verdict::WrongParam { .. } => {}
    }

    let Some(resolved) = resolved else { return Vec::new() };
    let mut findings = Vec::new();
    for site in &usage.usage_sites {
        match classify_site(&resolved, site) {
            Verdict::WrongArity { min, max, got } => {
                let upper = max.map(|m| m.to_string()).unwrap_or_else(|| "unbounded".to_string());
                let message = format!("{}/{} expected {min}\u{2013}{upper} arguments, got {got}", usage.package, usage.export);
                findings.push(build(FindingKind::WrongArity, message, file, site.location, symbol(), Vec::new(), authority.data_version()));
            }
            Verdict::WrongParam { bad_name } => {
                let message = format!("{}/{} does not accept a `{bad_name}` argument", usage.package, usage.export);
                findings.push(build(FindingKind::WrongParam, message, file, site.location, symbol(), Vec::new(), authority.data_version()));
            }
            _ => {}
        }
    }
    findings
}
