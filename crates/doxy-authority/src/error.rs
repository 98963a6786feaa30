use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong while loading curated authority data.
///
/// Every variant is fatal to the load: the store is all-or-nothing. Queries against an already-loaded store never
/// fail — "unknown" is a first-class return, not an error.
#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("failed to read authority file {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },

    #[error("failed to parse authority file {path}: {source}")]
    Json { path: PathBuf, #[source] source: serde_json::Error },

    #[error("{path}: unsupported schema version {found} (supported: {supported})")]
    UnsupportedSchemaVersion { path: PathBuf, found: u32, supported: u32 },

    #[error("manifest references package {package} but no data file was supplied")]
    MissingPackageFile { package: String },

    #[error("data file {path} declares package {declared} but manifest expects {expected}")]
    PackageMismatch { path: PathBuf, declared: String, expected: String },

    #[error("{context}: invalid semver range {value:?}")]
    InvalidRange { context: String, value: String },

    #[error(
        "{package}/{export}: signature ranges overlap at version {at} (entries {lhs} and {rhs})"
    )]
    OverlappingSignatures { package: String, export: String, at: String, lhs: usize, rhs: usize },

    #[error("no authority data sources configured")]
    NoSources,
}

pub type Result<T> = std::result::Result<T, AuthorityError>;
