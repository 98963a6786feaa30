//! Manifest (`package.json`-shaped) parsing: declared dependency ranges.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DoxyError, Result};

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    peer_dependencies: BTreeMap<String, String>,
}

/// Every declared range in the project manifest, keyed by package name.
/// Dev and peer dependencies merge in after `dependencies` so a direct
/// dependency's range always wins on key collision.
pub fn load_declared_ranges(manifest_path: &Path) -> Result<BTreeMap<String, String>> {
    let bytes = fs::read(manifest_path)
        .map_err(|source| DoxyError::unreadable_path(&manifest_path.to_path_buf(), source))?;
    let raw: RawManifest = serde_json::from_slice(&bytes)
        .map_err(|e| DoxyError::project(format!("invalid manifest {}: {e}", manifest_path.display())))?;

    let mut ranges = BTreeMap::new();
    ranges.extend(raw.peer_dependencies);
    ranges.extend(raw.dev_dependencies);
    ranges.extend(raw.dependencies);
    Ok(ranges)
}
