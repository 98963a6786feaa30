//! The process-level error taxonomy, each variant routable to a
//! stable exit code.

use std::path::PathBuf;
use thiserror::Error;

use doxy_authority::AuthorityError;

#[derive(Debug, Error)]
pub enum DoxyError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("project error: {0}")]
    Project(String),

    #[error("authority data error: {0}")]
    Authority(#[from] AuthorityError),

    #[error("internal error [{code}]: {message}")]
    Internal { code: &'static str, message: String },
}

impl DoxyError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn project(msg: impl Into<String>) -> Self {
        Self::Project(msg.into())
    }

    pub fn internal(code: &'static str, msg: impl Into<String>) -> Self {
        Self::Internal { code, message: msg.into() }
    }

    pub fn unreadable_path(path: &PathBuf, source: std::io::Error) -> Self {
        Self::Project(format!("unreadable path {}: {source}", path.display()))
    }

    /// The process exit code for this error. `FindingsPresent` is not a
    /// thrown error — it is computed separately from the finding set by
    /// the CLI boundary, never constructed here.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Project(_) => 3,
            Self::Authority(_) => 4,
            Self::Internal { .. } => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, DoxyError>;

/// Exit code used when at least one non-suppressed finding has severity
/// `>= failOn`. Not a `DoxyError` variant: a clean run that still
/// surfaces findings is not a failure of the tool itself.
pub const EXIT_FINDINGS_PRESENT: i32 = 1;
pub const EXIT_OK: i32 = 0;
