//! Type-compiler path aliases: a `tsconfig.json`-style `compilerOptions.paths` map, used
//! as a pre-pass that rewrites relative-looking import sources to their
//! package-shaped target before package-name extraction runs.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct TsconfigCompilerOptions {
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
    #[serde(default, rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(default, rename = "jsx")]
    jsx_mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Tsconfig {
    #[serde(default, rename = "compilerOptions")]
    compiler_options: TsconfigCompilerOptions,
}

#[derive(Clone, Debug, Default)]
pub struct PathAliases {
    /// Prefix -> target, sorted longest-prefix-first so the pre-pass picks
    /// the most specific alias on overlap.
    entries: Vec<(String, String)>,
    pub base_url: Option<String>,
    pub jsx_mode: Option<String>,
}

impl PathAliases {
    pub fn from_tsconfig(path: &Path) -> Option<Self> {
        let raw = fs::read_to_string(path).ok()?;
        let config: Tsconfig = serde_json_strip_comments(&raw)?;
        let mut entries: Vec<(String, String)> = config
            .compiler_options
            .paths
            .into_iter()
            .filter_map(|(pattern, mut targets)| {
                let target = targets.drain(..).next()?;
                Some((pattern.trim_end_matches("/*").to_string(), target.trim_end_matches("/*").to_string()))
            })
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Some(Self { entries, base_url: config.compiler_options.base_url, jsx_mode: config.compiler_options.jsx_mode })
    }

    pub fn merge_overrides(&mut self, overrides: &BTreeMap<String, String>) {
        for (prefix, target) in overrides {
            self.entries.push((prefix.clone(), target.clone()));
        }
        self.entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Prefix/target pairs sorted lexicographically by prefix, for a
    /// canonical hash — not the longest-prefix-first order `rewrite` uses
    /// for matching priority.
    pub fn sorted_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> =
            self.entries.iter().map(|(prefix, target)| (prefix.as_str(), target.as_str())).collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Rewrites an import source if it matches a configured alias prefix;
    /// otherwise returns it unchanged.
    pub fn rewrite<'a>(&self, source: &'a str) -> std::borrow::Cow<'a, str> {
        for (prefix, target) in &self.entries {
            if let Some(rest) = source.strip_prefix(prefix.as_str()) {
                return std::borrow::Cow::Owned(format!("{target}{rest}"));
            }
        }
        std::borrow::Cow::Borrowed(source)
    }
}

/// `tsconfig.json` permits `//` and `/* */` comments and trailing commas,
/// which `serde_json` rejects outright; strip them before parsing rather
/// than pull in a second JSON parser for one file shape.
fn serde_json_strip_comments(raw: &str) -> Option<Tsconfig> {
    let mut cleaned = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            cleaned.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    cleaned.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                cleaned.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        cleaned.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => cleaned.push(c),
        }
    }
    serde_json::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_aliased_prefix() {
        let aliases = PathAliases { entries: vec![("@/".into(), "src/".into())], base_url: None, jsx_mode: None };
        assert_eq!(aliases.rewrite("@/components/Button"), "src/components/Button");
    }

    #[test]
    fn leaves_unmatched_source_alone() {
        let aliases = PathAliases::default();
        assert_eq!(aliases.rewrite("react"), "react");
    }

    #[test]
    fn strips_line_and_block_comments_before_parsing() {
        let raw = r#"{
            // a comment
            "compilerOptions": { /* inline */ "baseUrl": "." }
        }"#;
        let parsed = serde_json_strip_comments(raw).unwrap();
        assert_eq!(parsed.compiler_options.base_url.as_deref(), Some("."));
    }
}
