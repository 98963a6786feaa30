//! The language-parser seam. Full per-language grammars
//! are treated as an external collaborator; this module defines the
//! interface — mirroring `foundry_compilers::compilers::ParsedSource`
//! (`parse`, `version_req`, `resolve_imports`) — plus one reference
//! implementation adequate to drive the Import Resolver and the
//! end-to-end scenarios over JS/TS-shaped sources.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{NormalizedAst, NormalizedCallExpression, NormalizedImport, NormalizedJsxElement, RawSuppressionComment, SourceLocation};
use crate::error::{DoxyError, Result};

/// A parser that turns file bytes into a [`NormalizedAst`]. Implementors
/// declare the extensions they handle so the pipeline orchestrator
/// can dispatch by file extension; the registry of available parsers is
/// closed at start-up.
pub trait LanguageParser: Send + Sync {
    fn extensions(&self) -> &'static [&'static str];
    fn parse(&self, content: &str, file: &Path) -> Result<NormalizedAst>;
}

/// A heuristic scanner for JS/TS-family sources: enough to extract import
/// specifiers, call expressions, JSX element uses, and suppression
/// comments without building a full grammar. Implemented as regex passes
/// over the source text, in the spirit of `foundry_compilers`'s own
/// `resolver::parse::SolData::parse`, which falls back to regex extraction
/// when a full AST isn't warranted.
#[derive(Default)]
pub struct JsTsHeuristicParser;

static IMPORT_NAMED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(type\s+)?\{([^}]*)\}\s+from\s+['"]([^'"]+)['"]"#).unwrap()
});
static IMPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(type\s+)?([A-Za-z_$][\w$]*)\s+from\s+['"]([^'"]+)['"]"#).unwrap()
});
static IMPORT_NAMESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(type\s+)?\*\s+as\s+([A-Za-z_$][\w$]*)\s+from\s+['"]([^'"]+)['"]"#).unwrap()
});
static CALL_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b([A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*)\s*\(([^()]*)\)"#).unwrap()
});
static JSX_ELEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<([A-Z][\w.]*)((?:\s+[A-Za-z_][\w-]*(?:=(?:\{[^}]*\}|"[^"]*"|'[^']*'))?)*)\s*/?>"#).unwrap()
});
static JSX_ATTR: Lazy<Regex> = Lazy::new(|| Regex::new(r#"([A-Za-z_][\w-]*)\s*="#).unwrap());
static SUPPRESSION_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r#"//\s*(doxy-ignore[\w-]*.*)$|/\*\s*(doxy-ignore[\w-]*.*?)\*/"#).unwrap());

impl LanguageParser for JsTsHeuristicParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["js", "jsx", "ts", "tsx", "mjs", "cjs"]
    }

    fn parse(&self, content: &str, file: &Path) -> Result<NormalizedAst> {
        let mut ast = NormalizedAst::new(file.to_path_buf());
        let line_starts = line_start_offsets(content);

        for mat in IMPORT_NAMESPACE.captures_iter(content) {
            let loc = location_of(&line_starts, mat.get(0).unwrap().start());
            ast.imports.push(NormalizedImport {
                source: mat[3].to_string(),
                named: vec![],
                default_local: None,
                namespace_local: Some(mat[2].to_string()),
                is_type_only: mat.get(1).is_some(),
                location: loc,
            });
        }
        for mat in IMPORT_NAMED.captures_iter(content) {
            let loc = location_of(&line_starts, mat.get(0).unwrap().start());
            let named = parse_named_specifiers(&mat[2]);
            ast.imports.push(NormalizedImport {
                source: mat[3].to_string(),
                named,
                default_local: None,
                namespace_local: None,
                is_type_only: mat.get(1).is_some(),
                location: loc,
            });
        }
        for mat in IMPORT_DEFAULT.captures_iter(content) {
            let loc = location_of(&line_starts, mat.get(0).unwrap().start());
            ast.imports.push(NormalizedImport {
                source: mat[3].to_string(),
                named: vec![],
                default_local: Some(mat[2].to_string()),
                namespace_local: None,
                is_type_only: mat.get(1).is_some(),
                location: loc,
            });
        }

        for mat in CALL_EXPR.captures_iter(content) {
            let callee = mat[1].to_string();
            if is_control_keyword(&callee) {
                continue;
            }
            let loc = location_of(&line_starts, mat.get(0).unwrap().start());
            let raw_args = mat[2].trim();
            let (arg_count, arg_names) = split_args(raw_args);
            ast.calls.push(NormalizedCallExpression { callee, arg_count, arg_names, location: loc });
        }

        for mat in JSX_ELEMENT.captures_iter(content) {
            let loc = location_of(&line_starts, mat.get(0).unwrap().start());
            let attrs = JSX_ATTR.captures_iter(&mat[2]).map(|c| c[1].to_string()).collect();
            ast.jsx_elements.push(NormalizedJsxElement { tag_name: mat[1].to_string(), attributes: attrs, location: loc });
        }

        for (line_idx, line) in content.lines().enumerate() {
            if let Some(c) = SUPPRESSION_COMMENT.captures(line) {
                let text = c.get(1).or_else(|| c.get(2)).map(|m| m.as_str().trim().to_string()).unwrap_or_default();
                ast.suppression_comments.push(RawSuppressionComment { text, line: line_idx as u32 + 1 });
            }
        }

        Ok(ast)
    }
}

fn is_control_keyword(callee: &str) -> bool {
    matches!(callee, "if" | "for" | "while" | "switch" | "catch" | "function" | "return")
}

fn parse_named_specifiers(raw: &str) -> Vec<(String, String, bool)> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|spec| {
            let is_type_only = spec.starts_with("type ");
            let spec = spec.strip_prefix("type ").unwrap_or(spec).trim();
            if let Some((imported, local)) = spec.split_once(" as ") {
                (imported.trim().to_string(), local.trim().to_string(), is_type_only)
            } else {
                (spec.to_string(), spec.to_string(), is_type_only)
            }
        })
        .collect()
}

fn split_args(raw: &str) -> (u32, Vec<String>) {
    if raw.is_empty() {
        return (0, vec![]);
    }
    let parts: Vec<&str> = raw.split(',').map(str::trim).filter(|s| !s.is_empty()).collect();
    let names = parts
        .iter()
        .filter(|p| p.chars().next().map_or(false, |c| c.is_alphabetic() || c == '_' || c == '$'))
        .map(|p| p.to_string())
        .collect();
    (parts.len() as u32, names)
}

fn line_start_offsets(content: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in content.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

fn location_of(line_starts: &[usize], offset: usize) -> SourceLocation {
    let line_idx = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    };
    let column = (offset - line_starts[line_idx]) as u32 + 1;
    SourceLocation { line: line_idx as u32 + 1, column }
}

/// Closed registry of language parsers, keyed by file extension.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn LanguageParser>>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self { parsers: vec![Box::new(JsTsHeuristicParser)] }
    }
}

impl ParserRegistry {
    pub fn for_file(&self, file: &Path) -> Option<&dyn LanguageParser> {
        let ext = file.extension()?.to_str()?;
        self.parsers.iter().find(|p| p.extensions().contains(&ext)).map(|p| p.as_ref())
    }

    pub fn parse(&self, file: &Path, content: &str) -> Result<NormalizedAst> {
        match self.for_file(file) {
            Some(parser) => parser.parse(content, file),
            None => Err(DoxyError::internal("DOXY_NO_PARSER", format!("no parser registered for {}", file.display()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_imports_and_calls() {
        let src = "import { useState, useEffect } from 'react';\nuseState(0);\n";
        let ast = JsTsHeuristicParser.parse(src, Path::new("a.tsx")).unwrap();
        assert_eq!(ast.imports.len(), 1);
        assert_eq!(ast.imports[0].source, "react");
        assert_eq!(ast.imports[0].named.len(), 2);
        assert_eq!(ast.calls[0].callee, "useState");
        assert_eq!(ast.calls[0].arg_count, 1);
    }

    #[test]
    fn parses_default_import_as_namespace_receiver() {
        let src = "import React from 'react';\nReact.useState(0, 1);\n";
        let ast = JsTsHeuristicParser.parse(src, Path::new("a.tsx")).unwrap();
        assert_eq!(ast.imports[0].default_local.as_deref(), Some("React"));
        assert_eq!(ast.calls[0].callee, "React.useState");
        assert_eq!(ast.calls[0].arg_count, 2);
    }

    #[test]
    fn extracts_inline_suppression_comment() {
        let src = "// doxy-ignore deprecated-api -- legacy call\ncreateFactory('div');\n";
        let ast = JsTsHeuristicParser.parse(src, Path::new("a.ts")).unwrap();
        assert_eq!(ast.suppression_comments.len(), 1);
        assert!(ast.suppression_comments[0].text.starts_with("doxy-ignore"));
    }
}
