//! The Suppression Engine: inline directives, config rules, and a
//! baseline — three independent layers, applied in that order.

pub mod baseline;
pub mod config;
pub mod inline;

pub use baseline::Baseline;
pub use config::SuppressionRule;
pub use inline::{parse_inline_suppressions, InlineSuppression};

use crate::analyzer::{Finding, Suppressed, SuppressionSource};
use crate::ast::RawSuppressionComment;
use crate::error::{DoxyError, Result};

/// The suppressions active for one file's analysis: its own inline
/// directives plus the project-wide config rules.
pub struct ActiveSuppressions {
    pub inline: Vec<InlineSuppression>,
    pub config_rules: Vec<SuppressionRule>,
}

impl ActiveSuppressions {
    pub fn new(comments: &[RawSuppressionComment], config_rules: Vec<SuppressionRule>) -> Self {
        Self { inline: parse_inline_suppressions(comments), config_rules }
    }

    /// First matching inline range wins, else first matching config rule.
    pub fn match_finding(&self, finding: &Finding) -> Option<Suppressed> {
        if let Some(range) = self.inline.iter().find(|r| r.matches(finding.location.line, finding.kind)) {
            return Some(Suppressed { source: SuppressionSource::Inline, reason: range.reason.clone() });
        }
        if let Some(rule) = self
            .config_rules
            .iter()
            .find(|rule| rule.matches(&finding.symbol.package, &finding.symbol.export, finding.kind, &finding.file))
        {
            return Some(Suppressed { source: SuppressionSource::Config, reason: rule.reason.clone() });
        }
        None
    }

    /// `requireSuppressionReason`: every parsed inline/config
    /// suppression must carry a reason, checked against parsed
    /// suppressions at run start rather than at parse time.
    pub fn validate_reasons_present(&self) -> Result<()> {
        if self.inline.iter().any(|r| r.reason.is_none()) || self.config_rules.iter().any(|r| r.reason.is_none()) {
            return Err(DoxyError::config("requireSuppressionReason is set but a suppression is missing a reason"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{FindingKind, FindingSymbol};
    use crate::ast::SourceLocation;
    use std::path::PathBuf;

    fn finding(line: u32, kind: FindingKind) -> Finding {
        Finding {
            id: "dxy_deadbeef".into(),
            long_id: "dxy:react/createFactory:src/app.tsx:4:1".into(),
            kind,
            severity: kind.severity(),
            location: SourceLocation { line, column: 1 },
            file: PathBuf::from("src/app.tsx"),
            message: "x".into(),
            symbol: FindingSymbol { package: "react".into(), export: "createFactory".into(), installed_version: "18.2.0".into() },
            fixes: vec![],
            authority_data_version: "1.0.0".into(),
            suppressed: None,
        }
    }

    #[test]
    fn inline_suppression_wins_over_config_rule() {
        let comments = vec![RawSuppressionComment { text: "doxy-ignore deprecated-api".into(), line: 3 }];
        let active = ActiveSuppressions::new(&comments, vec![]);
        let suppressed = active.match_finding(&finding(4, FindingKind::DeprecatedApi));
        assert_eq!(suppressed.unwrap().source, SuppressionSource::Inline);
    }

    #[test]
    fn require_reason_rejects_bare_suppression() {
        let comments = vec![RawSuppressionComment { text: "doxy-ignore deprecated-api".into(), line: 3 }];
        let active = ActiveSuppressions::new(&comments, vec![]);
        assert!(active.validate_reasons_present().is_err());
    }
}
