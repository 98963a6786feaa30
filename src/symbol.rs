//! `SymbolUsage`: the Import Resolver's output — a file's call sites
//! and bare imports mapped to canonical `(package, export)` symbols.

use crate::ast::{ImportKind, SourceLocation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsageSite {
    pub location: SourceLocation,
    pub arg_count: Option<u32>,
    pub arg_names: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolUsage {
    pub package: String,
    pub export: String,
    pub import_kind: ImportKind,
    pub usage_sites: Vec<UsageSite>,
}

impl SymbolUsage {
    pub fn key(&self) -> (String, String) {
        (self.package.clone(), self.export.clone())
    }
}

/// The Import Resolver's full result for one file.
#[derive(Clone, Debug, Default)]
pub struct ResolvedImports {
    pub usages: Vec<SymbolUsage>,
    pub imported_packages: std::collections::BTreeSet<String>,
    pub unresolved_imports: Vec<String>,
}
