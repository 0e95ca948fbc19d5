//! Core types for findings.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::extract::{CodeUnit, UnitId, UnitKind};

/// Severity levels for findings, least severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "fatal" => Ok(Severity::Fatal),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// What kind of problem a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    MissingComment,
    StyleViolation,
    StaleComment,
    OrphanComment,
    ParseError,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::MissingComment => "missing_comment",
            Category::StyleViolation => "style_violation",
            Category::StaleComment => "stale_comment",
            Category::OrphanComment => "orphan_comment",
            Category::ParseError => "parse_error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "missing_comment" => Some(Category::MissingComment),
            "style_violation" => Some(Category::StyleViolation),
            "stale_comment" => Some(Category::StaleComment),
            "orphan_comment" => Some(Category::OrphanComment),
            "parse_error" => Some(Category::ParseError),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule identifiers for findings not produced by a named style rule.
pub mod rules {
    pub const MISSING_COMMENT: &str = "missing_comment";
    pub const SIGNATURE_DRIFT: &str = "signature_drift";
    pub const SEMANTIC_DRIFT: &str = "semantic_drift";
    pub const BASELINE_DRIFT: &str = "baseline_drift";
    pub const ORPHAN_COMMENT: &str = "orphan_comment";
    pub const MALFORMED_COMMENT: &str = "malformed_comment";
    pub const PARSE_ERROR: &str = "parse_error";
}

/// Reference to the unit a finding is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRef {
    pub id: UnitId,
    pub kind: UnitKind,
    pub identifier: String,
    /// First line of the unit's span.
    pub line: usize,
}

impl UnitRef {
    pub fn from_unit(unit: &CodeUnit) -> Self {
        Self {
            id: unit.id,
            kind: unit.kind,
            identifier: unit.identifier.clone(),
            line: unit.span.start_line,
        }
    }
}

/// A single reported issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub file: String,
    pub line: usize,
    pub unit: Option<UnitRef>,
    pub category: Category,
    pub severity: Severity,
    /// Score penalty applied to the unit.
    pub weight: f64,
    pub rule: String,
    pub message: String,
}

impl Finding {
    /// Create a unique key for this finding (for deduplication/comparison).
    pub fn key(&self) -> String {
        format!("{}|{}|{}|{}", self.category, self.rule, self.file, self.message)
    }

    /// Report order: file, line, severity descending, category, message.
    pub fn report_order(a: &Finding, b: &Finding) -> Ordering {
        a.file
            .cmp(&b.file)
            .then(a.line.cmp(&b.line))
            .then(b.severity.cmp(&a.severity))
            .then(a.category.cmp(&b.category))
            .then(a.message.cmp(&b.message))
            .then(a.rule.cmp(&b.rule))
    }
}

/// Sort findings into report order.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(Finding::report_order);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(file: &str, line: usize, severity: Severity, message: &str) -> Finding {
        Finding {
            file: file.to_string(),
            line,
            unit: None,
            category: Category::StyleViolation,
            severity,
            weight: 0.2,
            rule: "r".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Fatal > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Low > Severity::Info);
        assert_eq!("HIGH".parse::<Severity>(), Ok(Severity::High));
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_report_order() {
        let mut findings = vec![
            finding("b.py", 1, Severity::Low, "x"),
            finding("a.py", 9, Severity::Low, "x"),
            finding("a.py", 3, Severity::Low, "later"),
            finding("a.py", 3, Severity::High, "z"),
            finding("a.py", 3, Severity::Low, "earlier"),
        ];
        sort_findings(&mut findings);
        let order: Vec<(&str, usize, &str)> = findings
            .iter()
            .map(|f| (f.file.as_str(), f.line, f.message.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.py", 3, "z"),
                ("a.py", 3, "earlier"),
                ("a.py", 3, "later"),
                ("a.py", 9, "x"),
                ("b.py", 1, "x"),
            ]
        );
    }

    #[test]
    fn test_category_names() {
        assert_eq!(Category::parse("stale_comment"), Some(Category::StaleComment));
        assert_eq!(Category::MissingComment.to_string(), "missing_comment");
        assert_eq!(Category::parse("unknown"), None);
    }
}
