//! The Normalized AST: a language-agnostic snapshot of a
//! single source file's imports, call expressions, JSX-like element uses,
//! and suppression-comment ranges. Any concrete parser that produces this
//! shape can plug into the Import Resolver — this module defines
//! only the shape, not a grammar.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportKind {
    Named,
    Default,
    Namespace,
    Dynamic,
}

/// One named/default/namespace specifier bound by an import statement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedImport {
    /// The literal import source string, e.g. `"react"`, `"react-dom/client"`, `"./local"`.
    pub source: String,
    /// `(imported, local, isTypeOnly)` for each named specifier.
    pub named: Vec<(String, String, bool)>,
    pub default_local: Option<String>,
    pub namespace_local: Option<String>,
    pub is_type_only: bool,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedCallExpression {
    /// Dotted callee path, e.g. `"useState"` or `"React.createElement"`.
    pub callee: String,
    pub arg_count: u32,
    pub arg_names: Vec<String>,
    pub location: SourceLocation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedJsxElement {
    pub tag_name: String,
    pub attributes: Vec<String>,
    pub location: SourceLocation,
}

/// An inline suppression comment's raw text and line. Produced by the
/// parser alongside the rest of the Normalized AST because extracting
/// comment text is a parser-level concern; interpreting it is the
/// Suppression Engine's job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawSuppressionComment {
    pub text: String,
    pub line: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedAst {
    pub file: PathBuf,
    pub imports: Vec<NormalizedImport>,
    pub calls: Vec<NormalizedCallExpression>,
    pub jsx_elements: Vec<NormalizedJsxElement>,
    pub suppression_comments: Vec<RawSuppressionComment>,
}

impl NormalizedAst {
    pub fn new(file: PathBuf) -> Self {
        Self { file, ..Default::default() }
    }
}
