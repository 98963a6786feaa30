//! `Finding`: a single reported incompatibility, with its stable
//! long/short id pair and suppression metadata.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ast::SourceLocation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    UnknownExport,
    FutureApi,
    RemovedApi,
    DeprecatedApi,
    WrongArity,
    WrongParam,
}

impl FindingKind {
    /// Fixed `kind -> severity` mapping; not configurable.
    pub fn severity(self) -> Severity {
        match self {
            Self::RemovedApi | Self::FutureApi | Self::WrongArity | Self::WrongParam => Severity::Error,
            Self::DeprecatedApi => Severity::Warning,
            Self::UnknownExport => Severity::Info,
        }
    }

    /// The inline-suppression token this kind is named by.
    pub fn suppression_token(self) -> &'static str {
        match self {
            Self::UnknownExport => "unknown-export",
            Self::FutureApi => "future-api",
            Self::RemovedApi => "removed-api",
            Self::DeprecatedApi => "deprecated-api",
            Self::WrongArity => "wrong-arity",
            Self::WrongParam => "wrong-param",
        }
    }

    pub fn from_suppression_token(token: &str) -> Option<Self> {
        Some(match token {
            "unknown-export" => Self::UnknownExport,
            "future-api" => Self::FutureApi,
            "removed-api" => Self::RemovedApi,
            "deprecated-api" => Self::DeprecatedApi,
            "wrong-arity" => Self::WrongArity,
            "wrong-param" => Self::WrongParam,
            _ => return None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSuggestion {
    pub description: String,
    pub reference: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingSymbol {
    pub package: String,
    pub export: String,
    pub installed_version: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuppressionSource {
    Inline,
    Config,
    Baseline,
}

impl SuppressionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Config => "config",
            Self::Baseline => "baseline",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suppressed {
    pub source: SuppressionSource,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    pub long_id: String,
    pub kind: FindingKind,
    pub severity: Severity,
    pub location: SourceLocation,
    pub file: PathBuf,
    pub message: String,
    pub symbol: FindingSymbol,
    pub fixes: Vec<FixSuggestion>,
    pub authority_data_version: String,
    pub suppressed: Option<Suppressed>,
}

impl Finding {
    /// `longId = "dxy:" + package + "/" + export + ":" + file + ":" + line + ":" + col`.
    pub fn make_long_id(package: &str, export: &str, file: &Path, location: SourceLocation) -> String {
        format!("dxy:{package}/{export}:{}:{}:{}", file.display(), location.line, location.column)
    }

    /// `id = "dxy_" + first 8 hex chars of SHA-256(longId)`.
    pub fn short_id(long_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(long_id.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("dxy_{}", &digest[..8])
    }
}
