//! The canonical per-symbol API descriptions curated into authority data.

use semver::Version;
use serde::{Deserialize, Serialize};

use crate::semver_ext::{self, VersionRange};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Function,
    Component,
    Type,
    Constant,
    Class,
    Hook,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDescriptor {
    pub name: String,
    pub required: bool,
}

/// One arity/shape window of a symbol's call signature.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSpec {
    pub since: String,
    #[serde(default)]
    pub until: Option<String>,
    pub min_arity: u32,
    /// `None` means unbounded.
    pub max_arity: Option<u32>,
    #[serde(default)]
    pub params: Vec<ParamDescriptor>,
}

impl SignatureSpec {
    fn since_version(&self) -> Option<Version> {
        semver_ext::coerce_version(&self.since)
    }

    fn until_version(&self) -> Option<Version> {
        self.until.as_deref().and_then(semver_ext::coerce_version)
    }

    fn active_at(&self, v: &Version) -> bool {
        match self.since_version() {
            Some(since) if &since <= v => self.until_version().map_or(true, |until| v < &until),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRef {
    pub package: String,
    pub export: String,
    #[serde(default)]
    pub migration_hint: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeprecationEntry {
    pub since: String,
    #[serde(default)]
    pub removed_in: Option<String>,
    pub message: String,
    #[serde(default)]
    pub replacement: Option<ReplacementRef>,
}

impl DeprecationEntry {
    fn since_version(&self) -> Option<Version> {
        semver_ext::coerce_version(&self.since)
    }
}

/// The canonical description of one exported symbol, as curated by an
/// authority-data package file.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSpec {
    pub package: String,
    pub export: String,
    pub kind: SymbolKind,
    /// Ecosystem-style range string, e.g. `">=16.0.0"` or `">=18.0.0,
    /// <19.0.0"` when a `removedIn` deprecation closes the window.
    pub available_in: String,
    #[serde(default)]
    pub signatures: Vec<SignatureSpec>,
    #[serde(default)]
    pub deprecations: Vec<DeprecationEntry>,
}

impl ApiSpec {
    pub fn key(&self) -> (String, String) {
        (self.package.clone(), self.export.clone())
    }

    fn available_range(&self) -> Option<VersionRange> {
        VersionRange::parse(&self.available_in)
    }

    /// Validates that signature ranges partition
    /// their domain, deprecations are non-decreasing by `since`, and a
    /// `removedIn` deprecation is reflected in `availableIn`.
    pub fn validate(&self) -> Result<(), String> {
        let mut prev_since: Option<Version> = None;
        for dep in &self.deprecations {
            let since = dep
                .since_version()
                .ok_or_else(|| format!("{}/{}: invalid deprecation.since", self.package, self.export))?;
            if let Some(prev) = &prev_since {
                if &since < prev {
                    return Err(format!(
                        "{}/{}: deprecations must be ordered non-decreasing by since",
                        self.package, self.export
                    ));
                }
            }
            prev_since = Some(since);

            if let Some(removed_in) = &dep.removed_in {
                let removed = semver_ext::coerce_version(removed_in)
                    .ok_or_else(|| format!("{}/{}: invalid removedIn", self.package, self.export))?;
                if let Some(range) = self.available_range() {
                    if range.contains(&removed) {
                        return Err(format!(
                            "{}/{}: availableIn must exclude versions >= removedIn ({})",
                            self.package, self.export, removed_in
                        ));
                    }
                }
            }
        }

        for (i, a) in self.signatures.iter().enumerate() {
            for (j, b) in self.signatures.iter().enumerate() {
                if i >= j {
                    continue;
                }
                if signatures_overlap(a, b) {
                    return Err(format!(
                        "{}/{}: signatures at indices {i} and {j} overlap",
                        self.package, self.export
                    ));
                }
            }
        }
        Ok(())
    }
}

fn signatures_overlap(a: &SignatureSpec, b: &SignatureSpec) -> bool {
    let (Some(a_since), Some(b_since)) = (a.since_version(), b.since_version()) else {
        return false;
    };
    let a_until = a.until_version();
    let b_until = b.until_version();
    let a_lo = a_since;
    let a_hi = a_until;
    let b_lo = b_since;
    let b_hi = b_until;
    let starts_before_other_ends = a_lo < b_hi.unwrap_or_else(|| Version::new(u64::MAX, 0, 0));
    let other_starts_before_this_ends = b_lo < a_hi.unwrap_or_else(|| Version::new(u64::MAX, 0, 0));
    starts_before_other_ends && other_starts_before_this_ends
}

/// The result of querying an [`ApiSpec`] at a concrete version.
#[derive(Clone, Debug)]
pub struct ResolvedApiSpec {
    pub spec: ApiSpec,
    pub active_signature: Option<SignatureSpec>,
    pub active_deprecation: Option<DeprecationEntry>,
    pub available: bool,
    pub is_future: bool,
}

impl ResolvedApiSpec {
    pub fn unresolvable(spec: ApiSpec) -> Self {
        Self { spec, active_signature: None, active_deprecation: None, available: false, is_future: false }
    }

    /// Resolves availability, the active signature, and the active
    /// deprecation for one requested version against the spec.
    pub fn resolve(spec: ApiSpec, requested: &str) -> Self {
        let Some(v) = semver_ext::coerce_version(requested) else {
            return Self::unresolvable(spec);
        };

        let available_range = spec.available_range();
        let available = available_range.as_ref().map_or(false, |r| r.contains(&v));
        let is_future = !available
            && available_range.as_ref().map_or(false, |r| &v < r.min_version());

        let active_signature = spec
            .signatures
            .iter()
            .filter(|s| s.active_at(&v))
            .max_by(|a, b| {
                // Tie-break: greatest `since` wins; if equal,
                // last in declaration order wins.
                a.since_version().cmp(&b.since_version())
            })
            .cloned();

        let active_deprecation = spec
            .deprecations
            .iter()
            .enumerate()
            .filter(|(_, d)| d.since_version().map_or(false, |since| since <= v))
            .max_by(|(ia, a), (ib, b)| {
                // Ties on `since` resolve to the last one in declaration order.
                a.since_version().cmp(&b.since_version()).then(ia.cmp(ib))
            })
            .map(|(_, d)| d.clone());

        Self { spec, active_signature, active_deprecation, available, is_future }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn spec() -> ApiSpec {
        ApiSpec {
            package: "react".into(),
            export: "createFactory".into(),
            kind: SymbolKind::Function,
            available_in: ">=0.14.0, <19.0.0".into(),
            signatures: vec![SignatureSpec {
                since: "0.14.0".into(),
                until: None,
                min_arity: 1,
                max_arity: Some(1),
                params: vec![],
            }],
            deprecations: vec![DeprecationEntry {
                since: "16.13.0".into(),
                removed_in: Some("19.0.0".into()),
                message: "createFactory is deprecated".into(),
                replacement: Some(ReplacementRef {
                    package: "react".into(),
                    export: "createElement".into(),
                    migration_hint: None,
                }),
            }],
        }
    }

    #[test]
    fn deprecated_but_available_at_18() {
        let r = ResolvedApiSpec::resolve(spec(), "18.2.0");
        assert!(r.available);
        assert!(r.active_deprecation.is_some());
    }

    #[test]
    fn removed_at_19_still_carries_deprecation() {
        let r = ResolvedApiSpec::resolve(spec(), "19.0.0");
        assert!(!r.available);
        assert!(!r.is_future);
        assert!(r.active_deprecation.is_some());
    }

    #[test]
    fn available_and_future_are_mutually_exclusive() {
        for v in ["0.1.0", "0.14.0", "18.2.0", "19.0.0", "30.0.0"] {
            let r = ResolvedApiSpec::resolve(spec(), v);
            assert!(!(r.available && r.is_future));
        }
    }

    #[test]
    fn validate_rejects_availability_spanning_removal() {
        let mut bad = spec();
        bad.available_in = ">=0.14.0".into();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn validate_accepts_well_formed_spec() {
        assert!(spec().validate().is_ok());
    }
}
