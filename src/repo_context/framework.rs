//! Framework detection. A closed, start-up
//! registry: each adapter declares which package signals its presence,
//! how to read its version off the dependency map, and optionally how to
//! canonicalize an import source that isn't the framework's own package
//! name but should resolve against it anyway (a compatibility shim),
//! mirroring the `Compiler`-trait-per-backend shape `foundry_compilers`
//! uses to dispatch solc vs. vyper vs. zksolc.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DependencyInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Lockfile,
    Manifest,
    Inferred,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectedFramework {
    pub id: String,
    pub name: String,
    pub version: String,
    pub confidence: Confidence,
}

/// One framework's detection rule and, optionally, its import-source
/// canonicalization. Implementors are plugged into a closed registry at
/// start-up; there is no dynamic loading.
pub trait FrameworkAdapter: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    /// The dependency-map key whose presence signals this framework.
    fn signature_package(&self) -> &'static str;
    /// Rewrites an import source that is a known compatibility alias for
    /// this framework's package into the framework's own package name, so
    /// the Import Resolver can join it against the same authority data.
    /// Returns `None` for sources this adapter has no opinion on.
    fn canonicalize_import(&self, _source: &str) -> Option<&'static str> {
        None
    }
}

struct Plain {
    id: &'static str,
    name: &'static str,
    signature_package: &'static str,
}

impl FrameworkAdapter for Plain {
    fn id(&self) -> &'static str {
        self.id
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn signature_package(&self) -> &'static str {
        self.signature_package
    }
}

/// Preact ships a `preact/compat` module that re-implements the React
/// API surface; code importing from it is checking compatibility against
/// React's authority data, not Preact's own.
struct PreactCompat;

impl FrameworkAdapter for PreactCompat {
    fn id(&self) -> &'static str {
        "react"
    }
    fn name(&self) -> &'static str {
        "React"
    }
    fn signature_package(&self) -> &'static str {
        "react"
    }
    fn canonicalize_import(&self, source: &str) -> Option<&'static str> {
        (source == "preact/compat" || source.starts_with("preact/compat/")).then_some("react")
    }
}

fn registry() -> Vec<Box<dyn FrameworkAdapter>> {
    vec![
        Box::new(Plain { id: "react", name: "React", signature_package: "react" }),
        Box::new(Plain { id: "next", name: "Next.js", signature_package: "next" }),
        Box::new(Plain { id: "vue", name: "Vue", signature_package: "vue" }),
        Box::new(Plain { id: "angular", name: "Angular", signature_package: "@angular/core" }),
        Box::new(Plain { id: "svelte", name: "Svelte", signature_package: "svelte" }),
        Box::new(PreactCompat),
    ]
}

/// Detects frameworks from the resolved dependency map, honoring manual
/// `frameworks` overrides from configuration which take precedence
/// over anything inferred (hence `Confidence::Inferred` only applies when
/// no override names that framework id).
pub fn detect_frameworks(
    deps: &BTreeMap<String, DependencyInfo>,
    overrides: &BTreeMap<String, String>,
) -> Vec<DetectedFramework> {
    let mut out = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for adapter in registry() {
        if !seen.insert(adapter.id()) {
            continue;
        }
        if let Some(version) = overrides.get(adapter.id()) {
            out.push(DetectedFramework {
                id: adapter.id().to_string(),
                name: adapter.name().to_string(),
                version: version.clone(),
                confidence: Confidence::Manifest,
            });
            continue;
        }
        let Some(info) = deps.get(adapter.signature_package()) else { continue };
        let (version, confidence) = match &info.resolved_version {
            Some(v) => (v.clone(), Confidence::Lockfile),
            None => (info.declared_range.clone(), Confidence::Manifest),
        };
        out.push(DetectedFramework { id: adapter.id().to_string(), name: adapter.name().to_string(), version, confidence });
    }
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

/// Rewrites `source` to the package name it should resolve against, if any
/// registered adapter claims it as a compatibility alias.
pub fn canonicalize_import_source(source: &str) -> Option<&'static str> {
    registry().iter().find_map(|adapter| adapter.canonicalize_import(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_react_from_lockfile_version() {
        let mut deps = BTreeMap::new();
        deps.insert(
            "react".to_string(),
            DependencyInfo { resolved_version: Some("18.2.0".to_string()), declared_range: "^18.0.0".to_string() },
        );
        let detected = detect_frameworks(&deps, &BTreeMap::new());
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].id, "react");
        assert_eq!(detected[0].confidence, Confidence::Lockfile);
    }

    #[test]
    fn override_takes_precedence_over_inference() {
        let mut deps = BTreeMap::new();
        deps.insert(
            "react".to_string(),
            DependencyInfo { resolved_version: Some("18.2.0".to_string()), declared_range: "^18.0.0".to_string() },
        );
        let mut overrides = BTreeMap::new();
        overrides.insert("react".to_string(), "17.0.0".to_string());
        let detected = detect_frameworks(&deps, &overrides);
        assert_eq!(detected[0].version, "17.0.0");
        assert_eq!(detected[0].confidence, Confidence::Manifest);
    }

    #[test]
    fn preact_compat_canonicalizes_to_react() {
        assert_eq!(canonicalize_import_source("preact/compat"), Some("react"));
        assert_eq!(canonicalize_import_source("preact/hooks"), None);
    }
}
