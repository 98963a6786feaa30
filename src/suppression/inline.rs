//! Inline suppression grammar: `doxy-ignore`, `doxy-ignore-line`,
//! and `doxy-ignore-start`/`doxy-ignore-end` directives embedded in source
//! comments.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzer::FindingKind;
use crate::ast::RawSuppressionComment;

static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?x)
        doxy-ignore(?P<form>-line|-start)?
        \s+(?P<kind>\*|[a-z][a-z-]*)
        (?:\s*(?:--|—|:)\s*(?P<reason>.+))?
    ").unwrap()
});

static END_DIRECTIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"doxy-ignore-end").unwrap());

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineSuppression {
    /// `None` means the wildcard `*`.
    pub kind: Option<FindingKind>,
    pub reason: Option<String>,
    pub start_line: u32,
    pub end_line: u32,
}

impl InlineSuppression {
    pub fn matches(&self, line: u32, kind: FindingKind) -> bool {
        line >= self.start_line && line <= self.end_line && self.kind.map_or(true, |k| k == kind)
    }
}

enum Form {
    NextLine,
    SameLine,
    RangeStart,
}

/// Parses a file's raw suppression comments into resolved ranges. Ranges
/// from `doxy-ignore-start`/`-end` pairs match LIFO, mirroring how nested
/// block comments are conventionally closed.
pub fn parse_inline_suppressions(comments: &[RawSuppressionComment]) -> Vec<InlineSuppression> {
    let mut out = Vec::new();
    let mut pending_starts: Vec<(Option<FindingKind>, Option<String>, u32)> = Vec::new();

    for comment in comments {
        if END_DIRECTIVE.is_match(&comment.text) {
            if let Some((kind, reason, start_line)) = pending_starts.pop() {
                out.push(InlineSuppression { kind, reason, start_line, end_line: comment.line });
            }
            continue;
        }
        let Some(caps) = DIRECTIVE.captures(&comment.text) else { continue };
        let form = match caps.name("form").map(|m| m.as_str()) {
            Some("-line") => Form::SameLine,
            Some("-start") => Form::RangeStart,
            _ => Form::NextLine,
        };
        let kind_token = caps.name("kind").map(|m| m.as_str()).unwrap_or("*");
        let kind = if kind_token == "*" { None } else { FindingKind::from_suppression_token(kind_token) };
        if kind_token != "*" && kind.is_none() {
            continue; // unknown kind: ignored, no error
        }
        let reason = caps.name("reason").map(|m| m.as_str().trim().to_string());

        match form {
            Form::NextLine => out.push(InlineSuppression { kind, reason, start_line: comment.line + 1, end_line: comment.line + 1 }),
            Form::SameLine => out.push(InlineSuppression { kind, reason, start_line: comment.line, end_line: comment.line }),
            Form::RangeStart => pending_starts.push((kind, reason, comment.line)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(text: &str, line: u32) -> RawSuppressionComment {
        RawSuppressionComment { text: text.to_string(), line }
    }

    #[test]
    fn doxy_ignore_applies_to_next_line() {
        let suppressions = parse_inline_suppressions(&[comment("doxy-ignore deprecated-api", 3)]);
        assert_eq!(suppressions.len(), 1);
        assert!(suppressions[0].matches(4, FindingKind::DeprecatedApi));
        assert!(!suppressions[0].matches(3, FindingKind::DeprecatedApi));
    }

    #[test]
    fn doxy_ignore_line_applies_to_same_line() {
        let suppressions = parse_inline_suppressions(&[comment("doxy-ignore-line removed-api: migrating soon", 10)]);
        assert!(suppressions[0].matches(10, FindingKind::RemovedApi));
        assert_eq!(suppressions[0].reason.as_deref(), Some("migrating soon"));
    }

    #[test]
    fn range_form_closes_on_matching_end() {
        let suppressions = parse_inline_suppressions(&[comment("doxy-ignore-start *", 5), comment("doxy-ignore-end", 20)]);
        assert!(suppressions[0].matches(12, FindingKind::WrongArity));
        assert!(!suppressions[0].matches(21, FindingKind::WrongArity));
    }

    #[test]
    fn unknown_kind_token_is_ignored() {
        let suppressions = parse_inline_suppressions(&[comment("doxy-ignore not-a-real-kind", 1)]);
        assert!(suppressions.is_empty());
    }
}
