//! The Import Resolver: maps a Normalized AST to
//! `SymbolUsage` records by joining import bindings against call-site
//! callees, the way `foundry_compilers::compilers::ParsedSource::
//! resolve_imports` joins a parsed source's import table against its own
//! call graph — generalized here from "which local files does this import"
//! to "which `(package, export)` does this call target".

mod bindings;

use std::collections::{BTreeSet, HashMap};

use crate::ast::{ImportKind, NormalizedAst};
use crate::repo_context::framework::canonicalize_import_source;
use crate::symbol::{ResolvedImports, SymbolUsage, UsageSite};

pub use bindings::extract_package_name;
use bindings::{Binding, BindingTable};

/// Resolves an import source to the package it should be checked against,
/// applying framework compatibility-shim canonicalization ahead of the
/// plain scoped/subpath extraction.
fn resolve_package_name(source: &str) -> Option<String> {
    canonicalize_import_source(source).map(str::to_string).or_else(|| extract_package_name(source))
}

/// Maps a Normalized AST to `SymbolUsage` records.
///
/// `tracked_packages`: when `Some`, only imports from these packages are
/// bound; all others are collapsed into `unresolvedImports`. When `None`,
/// every non-relative package is tracked — used by the Incremental Engine
/// to detect "a previously unresolved package was added to the authority
/// store" without re-running the full analyzer.
pub fn resolve_imports(ast: &NormalizedAst, tracked_packages: Option<&BTreeSet<String>>) -> ResolvedImports {
    let mut table = BindingTable::default();
    let mut unresolved_imports = Vec::new();
    let mut imported_packages = BTreeSet::new();

    for import in &ast.imports {
        if import.is_type_only {
            continue;
        }
        let Some(package) = resolve_package_name(&import.source) else {
            continue; // relative import, out of scope
        };
        let tracked = tracked_packages.map_or(true, |set| set.contains(&package));
        if !tracked {
            unresolved_imports.push(import.source.clone());
            continue;
        }
        imported_packages.insert(package.clone());

        for (imported, local, _is_type_only) in &import.named {
            table.bind(local.clone(), Binding { package: package.clone(), export: imported.clone(), kind: ImportKind::Named });
        }
        if let Some(local) = &import.default_local {
            table.bind(local.clone(), Binding { package: package.clone(), export: "default".to_string(), kind: ImportKind::Default });
            table.bind_namespace_like(local.clone(), package.clone(), ImportKind::Default);
        }
        if let Some(local) = &import.namespace_local {
            table.bind(local.clone(), Binding { package: package.clone(), export: "*".to_string(), kind: ImportKind::Namespace });
            table.bind_namespace_like(local.clone(), package.clone(), ImportKind::Namespace);
        }
    }

    let mut usages: HashMap<(String, String), SymbolUsage> = HashMap::new();
    let mut called_locals: BTreeSet<String> = BTreeSet::new();

    for call in &ast.calls {
        let Some((package, export, kind, bound_local)) = resolve_callee(&table, &call.callee) else {
            continue;
        };
        called_locals.insert(bound_local);
        let entry = usages.entry((package.clone(), export.clone())).or_insert_with(|| SymbolUsage {
            package,
            export,
            import_kind: kind,
            usage_sites: Vec::new(),
        });
        entry.usage_sites.push(UsageSite {
            location: call.location,
            arg_count: Some(call.arg_count),
            arg_names: call.arg_names.clone(),
        });
    }

    // Import-only usages: any named binding with no call site still
    // produces a usage pinned to the import location.
    for import in &ast.imports {
        if import.is_type_only {
            continue;
        }
        let Some(package) = resolve_package_name(&import.source) else { continue };
        if tracked_packages.map_or(false, |set| !set.contains(&package)) {
            continue;
        }
        for (imported, local, _) in &import.named {
            if called_locals.contains(local) {
                continue;
            }
            usages.entry((package.clone(), imported.clone())).or_insert_with(|| SymbolUsage {
                package: package.clone(),
                export: imported.clone(),
                import_kind: ImportKind::Named,
                usage_sites: vec![UsageSite { location: import.location, arg_count: None, arg_names: vec![] }],
            });
        }
    }

    ResolvedImports { usages: usages.into_values().collect(), imported_packages, unresolved_imports }
}

/// Call-site resolution: single identifiers resolve directly;
/// dotted callees split once on the head, consulting the namespace-like
/// map when the head was bound as a default or namespace import.
fn resolve_callee(table: &BindingTable, callee: &str) -> Option<(String, String, ImportKind, String)> {
    match callee.split_once('.') {
        None => {
            let binding = table.get(callee)?;
            if matches!(binding.kind, ImportKind::Default | ImportKind::Namespace) {
                return None;
            }
            Some((binding.package.clone(), binding.export.clone(), binding.kind, callee.to_string()))
        }
        Some((head, tail)) => {
            let (package, kind) = table.get_namespace_like(head)?;
            Some((package.clone(), tail.to_string(), *kind, head.to_string()))
        }
    }
}
