//! `doxy`: a static API-compatibility verifier. Given a project tree and
//! its dependency lockfile, it finds call sites whose target symbol is
//! deprecated in, removed from, not yet introduced in, or called with an
//! incompatible signature against the exact dependency version the
//! project has locked.

pub mod analyzer;
pub mod ast;
pub mod cache;
pub mod config;
pub mod error;
pub mod incremental;
pub mod parser;
pub mod pipeline;
pub mod repo_context;
pub mod resolver;
pub mod suppression;
pub mod symbol;

pub use error::{DoxyError, Result, EXIT_FINDINGS_PRESENT, EXIT_OK};
