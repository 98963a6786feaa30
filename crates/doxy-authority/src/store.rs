//! Loading and querying the curated authority catalog.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{instrument, trace, warn};

use crate::error::{AuthorityError, Result};
use crate::spec::{ApiSpec, ResolvedApiSpec};

const SUPPORTED_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestPackageEntry {
    pub name: String,
    pub latest_mapped_version: String,
    pub spec_file: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    pub data_version: String,
    pub packages: Vec<ManifestPackageEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct PackageSpecFile {
    schema_version: u32,
    package: String,
    specs: Vec<ApiSpec>,
}

/// A version-indexed catalog of per-symbol specifications, built once per
/// run and read-only thereafter.
pub struct AuthorityStore {
    data_version: String,
    content_hash: String,
    specs: HashMap<(String, String), ApiSpec>,
    packages: Vec<String>,
}

impl AuthorityStore {
    /// Loads the manifest plus every referenced per-package data file
    /// rooted at `dir`. All load errors are fatal — there is no partial
    /// store.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest_path = dir.join("manifest.json");
        let manifest_bytes = read_bytes(&manifest_path)?;
        let manifest: Manifest =
            serde_json::from_slice(&manifest_bytes).map_err(|source| AuthorityError::Json {
                path: manifest_path.clone(),
                source,
            })?;
        if manifest.schema_version > SUPPORTED_SCHEMA_VERSION {
            return Err(AuthorityError::UnsupportedSchemaVersion {
                path: manifest_path,
                found: manifest.schema_version,
                supported: SUPPORTED_SCHEMA_VERSION,
            });
        }

        let mut hasher = Sha256::new();
        hasher.update(&manifest_bytes);

        let mut specs = HashMap::new();
        let mut packages = Vec::with_capacity(manifest.packages.len());
        for entry in &manifest.packages {
            let spec_path = dir.join(&entry.spec_file);
            let spec_bytes = read_bytes(&spec_path)?;
            hasher.update(&spec_bytes);

            let file: PackageSpecFile =
                serde_json::from_slice(&spec_bytes).map_err(|source| AuthorityError::Json {
                    path: spec_path.clone(),
                    source,
                })?;
            if file.schema_version > SUPPORTED_SCHEMA_VERSION {
                return Err(AuthorityError::UnsupportedSchemaVersion {
                    path: spec_path,
                    found: file.schema_version,
                    supported: SUPPORTED_SCHEMA_VERSION,
                });
            }
            if file.package != entry.name {
                return Err(AuthorityError::PackageMismatch {
                    path: spec_path,
                    declared: file.package,
                    expected: entry.name.clone(),
                });
            }

            for spec in file.specs {
                if let Err(reason) = spec.validate() {
                    warn!(reason, "authority spec failed invariant validation, skipping");
                    continue;
                }
                specs.insert(spec.key(), spec);
            }
            packages.push(entry.name.clone());
        }

        let content_hash = hex::encode(hasher.finalize());
        trace!(packages = packages.len(), specs = specs.len(), "authority store loaded");

        Ok(Self { data_version: manifest.data_version, content_hash, specs, packages })
    }

    /// Pure, version-parameterized query. Returns `None` only when
    /// `(package, export)` is entirely unknown to the store.
    pub fn get_api_spec(
        &self,
        package: &str,
        export: &str,
        installed_version: &str,
    ) -> Option<ResolvedApiSpec> {
        let spec = self.specs.get(&(package.to_string(), export.to_string()))?.clone();
        Some(ResolvedApiSpec::resolve(spec, installed_version))
    }

    /// Loads every root in order and merges them into a single store:
    /// the first root to define a `(package, export)` key wins, later
    /// roots filling in whatever that one didn't cover. The merged
    /// `dataVersion`/content hash come from the first root; each
    /// subsequent root's content still folds into the hash so that
    /// changing any root invalidates the cache.
    pub fn load_merged(dirs: &[PathBuf]) -> Result<Self> {
        let mut dirs = dirs.iter();
        let Some(first) = dirs.next() else {
            return Err(AuthorityError::NoSources);
        };
        let mut merged = Self::load(first)?;
        let mut hasher = Sha256::new();
        hasher.update(merged.content_hash.as_bytes());

        for dir in dirs {
            let next = Self::load(dir)?;
            hasher.update(next.content_hash.as_bytes());
            for (key, spec) in next.specs {
                merged.specs.entry(key).or_insert(spec);
            }
            for package in next.packages {
                if !merged.packages.contains(&package) {
                    merged.packages.push(package);
                }
            }
        }
        merged.content_hash = hex::encode(hasher.finalize());
        Ok(merged)
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn data_version(&self) -> &str {
        &self.data_version
    }

    pub fn covered_packages(&self) -> &[String] {
        &self.packages
    }

    pub fn has_package(&self, name: &str) -> bool {
        self.packages.iter().any(|p| p == name)
    }

    #[cfg(test)]
    pub fn from_specs(data_version: impl Into<String>, specs: Vec<ApiSpec>) -> Self {
        let packages: Vec<String> =
            specs.iter().map(|s| s.package.clone()).collect::<std::collections::BTreeSet<_>>().into_iter().collect();
        Self {
            data_version: data_version.into(),
            content_hash: "test".into(),
            specs: specs.into_iter().map(|s| (s.key(), s)).collect(),
            packages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Writes a manifest plus one spec file per `(package, export, availableIn)` entry into `dir`.
    fn write_store(dir: &Path, data_version: &str, entries: &[(&str, &str, &str)]) {
        let manifest_entries: Vec<_> = entries
            .iter()
            .map(|(package, _, _)| {
                serde_json::json!({"name": package, "latestMappedVersion": "1.0.0", "specFile": format!("{package}.json")})
            })
            .collect();
        let manifest =
            serde_json::json!({"schemaVersion": 1, "dataVersion": data_version, "packages": manifest_entries});
        fs::write(dir.join("manifest.json"), serde_json::to_vec(&manifest).unwrap()).unwrap();

        for (package, export, available_in) in entries {
            let spec = serde_json::json!({
                "schemaVersion": 1,
                "package": package,
                "specs": [{
                    "package": package,
                    "export": export,
                    "kind": "function",
                    "availableIn": available_in,
                }],
            });
            fs::write(dir.join(format!("{package}.json")), serde_json::to_vec(&spec).unwrap()).unwrap();
        }
    }

    #[test]
    fn load_merged_requires_at_least_one_root() {
        let err = AuthorityStore::load_merged(&[]).unwrap_err();
        assert!(matches!(err, AuthorityError::NoSources));
    }

    #[test]
    fn load_merged_prefers_first_root_on_key_collision() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_store(first.path(), "first", &[("react", "useState", ">=16.0.0")]);
        write_store(second.path(), "second", &[("react", "useState", ">=20.0.0"), ("lodash", "map", ">=1.0.0")]);

        let merged = AuthorityStore::load_merged(&[first.path().to_path_buf(), second.path().to_path_buf()]).unwrap();

        let spec = merged.get_api_spec("react", "useState", "16.1.0").unwrap();
        assert!(spec.available, "first root's wider availableIn range should win the collision");
        assert!(merged.has_package("lodash"));
        assert!(merged.has_package("react"));
    }

    #[test]
    fn load_merged_single_root_matches_content_hash_of_plain_load() {
        let dir = tempfile::tempdir().unwrap();
        write_store(dir.path(), "only", &[("react", "useState", ">=16.0.0")]);
        let merged = AuthorityStore::load_merged(&[dir.path().to_path_buf()]).unwrap();
        let plain = AuthorityStore::load(dir.path()).unwrap();
        assert_eq!(merged.content_hash, plain.content_hash);
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| AuthorityError::Io { path: path.to_path_buf(), source })
}

/// Resolves a lockfile-declared or manifest-declared version string to the
/// form the store expects. Exposed so callers in `doxy` don't need their
/// own copy of the coercion rule.
pub fn coerce(raw: &str) -> Option<Version> {
    crate::semver_ext::coerce_version(raw)
}

/// Lists every on-disk file that participates in the store's content hash,
/// in the manifest order used to compute it.
pub fn authority_file_names(dir: &Path) -> Result<Vec<PathBuf>> {
    let manifest_path = dir.join("manifest.json");
    let manifest: Manifest = serde_json::from_slice(&read_bytes(&manifest_path)?)
        .map_err(|source| AuthorityError::Json { path: manifest_path.clone(), source })?;
    let mut out = vec![manifest_path];
    out.extend(manifest.packages.into_iter().map(|entry| dir.join(entry.spec_file)));
    Ok(out)
}
