//! Inline suppression of findings via comments.
//!
//! Supports suppression comments like:
//! - `# commentgate:ignore <category|rule|*> - <reason>`
//! - `// commentgate:ignore-next-line <category|rule|*> - <reason>`
//! - `// commentgate:ignore-file <category|rule|*> - <reason>`

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::Finding;
use crate::comments::RawComment;

/// How a suppression applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionType {
    /// Applies to the same line
    Line,
    /// Applies to the next line
    NextLine,
    /// Applies to the entire file
    File,
}

/// An inline suppression directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    /// Category (e.g. "stale_comment"), rule name, or "*" for all
    pub target: String,
    /// Human-readable reason
    pub reason: String,
    /// File containing the suppression
    pub file: String,
    /// Line of the directive (0 for file-level)
    pub line: usize,
    pub suppression_type: SuppressionType,
}

impl Suppression {
    /// Line whose findings this suppression covers, if line-scoped.
    pub fn target_line(&self) -> Option<usize> {
        match self.suppression_type {
            SuppressionType::File => None,
            SuppressionType::Line => Some(self.line),
            SuppressionType::NextLine => Some(self.line + 1),
        }
    }
}

/// A finding that was suppressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressedFinding {
    pub finding: Finding,
    pub suppression: Suppression,
}

lazy_static::lazy_static! {
    /// Directive text once comment markers are stripped.
    static ref SUPPRESSION_PATTERN: Regex = Regex::new(
        r"^commentgate:(ignore(?:-file|-next-line)?)\s+(\S+)\s*(?:-\s*(.*))?"
    ).unwrap();
}

/// Parse suppression directives from a file's comments.
///
/// `ignore-file` only counts in the file header, before the first unit.
pub fn parse_suppressions(
    file_path: &str,
    comments: &[RawComment],
    first_unit_line: Option<usize>,
) -> Vec<Suppression> {
    let mut suppressions = Vec::new();

    for comment in comments {
        let text = comment.text.trim();
        let Some(caps) = SUPPRESSION_PATTERN.captures(text) else {
            continue;
        };
        let target = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let reason = caps
            .get(3)
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();

        let (suppression_type, line) = match caps.get(1).map(|m| m.as_str()) {
            Some("ignore-file") => {
                if first_unit_line.is_some_and(|l| comment.end_line() >= l) {
                    continue;
                }
                (SuppressionType::File, 0)
            }
            Some("ignore-next-line") => (SuppressionType::NextLine, comment.end_line()),
            // Alone on its line it covers the next line, after code it
            // covers its own.
            Some("ignore") if comment.own_line => (SuppressionType::NextLine, comment.end_line()),
            Some("ignore") => (SuppressionType::Line, comment.start_line()),
            _ => continue,
        };

        suppressions.push(Suppression {
            target: target.to_string(),
            reason,
            file: file_path.to_string(),
            line,
            suppression_type,
        });
    }

    suppressions
}

/// Check if a finding matches a suppression.
pub fn matches_suppression(finding: &Finding, suppression: &Suppression) -> bool {
    if finding.file != suppression.file {
        return false;
    }

    if suppression.target != "*"
        && suppression.target != finding.category.as_str()
        && suppression.target != finding.rule
    {
        return false;
    }

    match suppression.target_line() {
        None => true,
        Some(line) => {
            finding.line == line || finding.unit.as_ref().is_some_and(|u| u.line == line)
        }
    }
}

/// Separate findings into active and suppressed.
pub fn filter_suppressed(
    findings: Vec<Finding>,
    suppressions: &[Suppression],
) -> (Vec<Finding>, Vec<SuppressedFinding>) {
    let mut active = Vec::new();
    let mut suppressed = Vec::new();

    for finding in findings {
        match suppressions.iter().find(|s| matches_suppression(&finding, s)) {
            Some(suppression) => suppressed.push(SuppressedFinding {
                finding,
                suppression: suppression.clone(),
            }),
            None => active.push(finding),
        }
    }

    (active, suppressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::locate;
    use crate::detect::{Category, Severity, UnitRef};
    use crate::extract::languages::{go, python};
    use crate::extract::{UnitId, UnitKind};

    #[test]
    fn test_parse_suppressions_go_style() {
        let content = r#"
package main

// commentgate:ignore-file orphan_comment - Generated code
func main() {
    x := 1 // commentgate:ignore stale_comment - Expected
}
"#;
        let comments = locate(content, &go::COMMENT_SYNTAX).comments;
        let suppressions = parse_suppressions("main.go", &comments, Some(5));
        assert_eq!(suppressions.len(), 2);

        assert_eq!(suppressions[0].suppression_type, SuppressionType::File);
        assert_eq!(suppressions[0].target, "orphan_comment");
        assert_eq!(suppressions[0].reason, "Generated code");

        assert_eq!(suppressions[1].suppression_type, SuppressionType::Line);
        assert_eq!(suppressions[1].line, 6);
    }

    #[test]
    fn test_parse_suppressions_next_line() {
        let content = "\n# commentgate:ignore missing_comment - legacy\ndef f():\n    pass\n";
        let comments = locate(content, &python::COMMENT_SYNTAX).comments;
        let suppressions = parse_suppressions("a.py", &comments, Some(3));
        assert_eq!(suppressions.len(), 1);
        assert_eq!(suppressions[0].suppression_type, SuppressionType::NextLine);
        assert_eq!(suppressions[0].target_line(), Some(3));
    }

    #[test]
    fn test_file_directive_after_first_unit_is_ignored() {
        let content = "def f():\n    pass\n# commentgate:ignore-file * - too late\n";
        let comments = locate(content, &python::COMMENT_SYNTAX).comments;
        assert!(parse_suppressions("a.py", &comments, Some(1)).is_empty());
    }

    fn finding(line: usize, unit_line: usize) -> Finding {
        Finding {
            file: "main.go".to_string(),
            line,
            unit: Some(UnitRef {
                id: UnitId(0),
                kind: UnitKind::Function,
                identifier: "main".to_string(),
                line: unit_line,
            }),
            category: Category::StaleComment,
            severity: Severity::High,
            weight: 0.4,
            rule: "signature_drift".to_string(),
            message: "stale".to_string(),
        }
    }

    fn suppression(target: &str, line: usize, suppression_type: SuppressionType) -> Suppression {
        Suppression {
            target: target.to_string(),
            reason: String::new(),
            file: "main.go".to_string(),
            line,
            suppression_type,
        }
    }

    #[test]
    fn test_matches_suppression() {
        let f = finding(4, 5);

        assert!(matches_suppression(&f, &suppression("stale_comment", 0, SuppressionType::File)));
        assert!(matches_suppression(&f, &suppression("signature_drift", 0, SuppressionType::File)));
        assert!(matches_suppression(&f, &suppression("*", 0, SuppressionType::File)));
        assert!(!matches_suppression(&f, &suppression("missing_comment", 0, SuppressionType::File)));

        // Matches either the finding line or the unit's first line.
        assert!(matches_suppression(&f, &suppression("*", 3, SuppressionType::NextLine)));
        assert!(matches_suppression(&f, &suppression("*", 4, SuppressionType::NextLine)));
        assert!(!matches_suppression(&f, &suppression("*", 5, SuppressionType::NextLine)));
        assert!(matches_suppression(&f, &suppression("*", 5, SuppressionType::Line)));
    }

    #[test]
    fn test_filter_suppressed() {
        let findings = vec![finding(4, 5), finding(9, 9)];
        let suppressions = vec![suppression("*", 3, SuppressionType::NextLine)];
        let (active, suppressed) = filter_suppressed(findings, &suppressions);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].line, 9);
        assert_eq!(suppressed.len(), 1);
        assert_eq!(suppressed[0].suppression.line, 3);
    }
}
