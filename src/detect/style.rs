//! Style-guide checks for attached comments and missing-comment detection.

use regex::Regex;

use super::complexity::is_material;
use super::types::{rules, Category, Finding, Severity, UnitRef};
use crate::comments::RawComment;
use crate::config::{RuleCondition, StyleGuide, StyleRule};
use crate::error::{EngineError, EngineResult};
use crate::extract::{CodeUnit, UnitKind};
use crate::text::stem;

/// A style rule with its regexes compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: Option<String>,
    pattern: Option<Regex>,
    forbidden_pattern: Option<Regex>,
    /// Section as written, with its stemmed header words.
    required_sections: Vec<(String, Vec<String>)>,
    required_prefix: Option<String>,
    min_length: Option<usize>,
    max_length: Option<usize>,
    when: RuleCondition,
    severity: Severity,
}

impl CompiledRule {
    fn compile(rule: &StyleRule) -> EngineResult<Self> {
        let label = rule.name.as_deref().unwrap_or("<unnamed>");
        let regex = |field: &str, source: &Option<String>| -> EngineResult<Option<Regex>> {
            source
                .as_deref()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        EngineError::Config(format!("rule {}: invalid {} {:?}: {}", label, field, p, e))
                    })
                })
                .transpose()
        };

        if let (Some(min), Some(max)) = (rule.min_length, rule.max_length) {
            if min > max {
                return Err(EngineError::Config(format!(
                    "rule {}: min_length {} exceeds max_length {}",
                    label, min, max
                )));
            }
        }

        let mut required_sections = Vec::new();
        for section in &rule.required_sections {
            let words = header_words(section);
            if words.is_empty() {
                return Err(EngineError::Config(format!(
                    "rule {}: required section {:?} has no words",
                    label, section
                )));
            }
            required_sections.push((section.clone(), words));
        }

        Ok(Self {
            name: rule.name.clone(),
            pattern: regex("pattern", &rule.pattern)?,
            forbidden_pattern: regex("forbidden_pattern", &rule.forbidden_pattern)?,
            required_sections,
            required_prefix: rule.required_prefix.clone(),
            min_length: rule.min_length,
            max_length: rule.max_length,
            when: rule.when,
            severity: rule.severity.unwrap_or(Severity::Medium),
        })
    }

    fn applies_to(&self, unit: &CodeUnit) -> bool {
        match self.when {
            RuleCondition::Always => true,
            RuleCondition::HasParameters => !unit.parameters.is_empty(),
            RuleCondition::HasReturn => unit.has_return,
        }
    }

    /// Every requirement the comment violates, as `(requirement, message)`.
    fn violations(&self, text: &str) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        let trimmed = text.trim();

        if let Some(re) = &self.pattern {
            if !re.is_match(text) {
                out.push((
                    "pattern",
                    format!("comment does not match required pattern `{}`", re.as_str()),
                ));
            }
        }
        if let Some(re) = &self.forbidden_pattern {
            if let Some(m) = re.find(text) {
                out.push((
                    "forbidden_pattern",
                    format!(
                        "comment contains `{}`, forbidden by `{}`",
                        m.as_str(),
                        re.as_str()
                    ),
                ));
            }
        }
        for (section, words) in &self.required_sections {
            if !text.lines().any(|line| line_has_section(line, words)) {
                out.push((
                    "required_sections",
                    format!("comment is missing required section `{}`", section),
                ));
            }
        }
        if let Some(prefix) = &self.required_prefix {
            if !trimmed.starts_with(prefix.as_str()) {
                out.push((
                    "required_prefix",
                    format!("comment does not start with `{}`", prefix),
                ));
            }
        }

        let length = trimmed.chars().count();
        if let Some(min) = self.min_length {
            if length < min {
                out.push((
                    "min_length",
                    format!("comment is {} characters, shorter than the minimum of {}", length, min),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                out.push((
                    "max_length",
                    format!("comment is {} characters, longer than the maximum of {}", length, max),
                ));
            }
        }
        out
    }
}

/// Compiled rules for every unit kind.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    function: Vec<CompiledRule>,
    method: Vec<CompiledRule>,
    class: Vec<CompiledRule>,
    complex_block: Vec<CompiledRule>,
    all: Vec<CompiledRule>,
}

impl RuleSet {
    /// Compile the guide's rules, including the rule synthesized from the
    /// top-level `min_length` / `required_prefix` keys.
    pub fn compile(guide: &StyleGuide) -> EngineResult<Self> {
        let compile_all = |rules: &[StyleRule]| -> EngineResult<Vec<CompiledRule>> {
            rules.iter().map(CompiledRule::compile).collect()
        };

        let mut all = compile_all(&guide.rules.all)?;
        if let Some(legacy) = guide.legacy_rule() {
            all.push(CompiledRule::compile(&legacy)?);
        }

        Ok(Self {
            function: compile_all(&guide.rules.function)?,
            method: compile_all(&guide.rules.method)?,
            class: compile_all(&guide.rules.class)?,
            complex_block: compile_all(&guide.rules.complex_block)?,
            all,
        })
    }

    /// Rules scoped to `kind`, followed by the rules for every kind.
    pub fn rules_for(&self, kind: UnitKind) -> impl Iterator<Item = &CompiledRule> {
        let scoped = match kind {
            UnitKind::Function => &self.function,
            UnitKind::Method => &self.method,
            UnitKind::Class => &self.class,
            UnitKind::ComplexBlock => &self.complex_block,
        };
        scoped.iter().chain(self.all.iter())
    }

    pub fn len(&self) -> usize {
        self.function.len()
            + self.method.len()
            + self.class.len()
            + self.complex_block.len()
            + self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Check one unit's attachment: style violations for a present comment,
/// a missing-comment finding for an absent one on a material unit.
pub fn check_style(
    file: &str,
    unit: &CodeUnit,
    comment: Option<&RawComment>,
    rule_set: &RuleSet,
    guide: &StyleGuide,
) -> Vec<Finding> {
    let Some(comment) = comment else {
        return check_missing(file, unit, guide).into_iter().collect();
    };

    let mut findings = Vec::new();
    for rule in rule_set.rules_for(unit.kind).filter(|r| r.applies_to(unit)) {
        for (requirement, message) in rule.violations(&comment.text) {
            findings.push(Finding {
                file: file.to_string(),
                line: comment.start_line(),
                unit: Some(UnitRef::from_unit(unit)),
                category: Category::StyleViolation,
                severity: rule.severity,
                weight: guide.weights.style_violation,
                rule: rule.name.clone().unwrap_or_else(|| requirement.to_string()),
                message: format!("{}: {}", unit.label(), message),
            });
        }
    }
    findings
}

fn check_missing(file: &str, unit: &CodeUnit, guide: &StyleGuide) -> Option<Finding> {
    if !is_material(unit, guide) {
        return None;
    }
    Some(Finding {
        file: file.to_string(),
        line: unit.start_line(),
        unit: Some(UnitRef::from_unit(unit)),
        category: Category::MissingComment,
        severity: Severity::High,
        weight: guide.weights.missing_comment,
        rule: rules::MISSING_COMMENT.to_string(),
        message: format!(
            "{} has no comment (complexity {})",
            unit.label(),
            unit.complexity
        ),
    })
}

const SECTION_MARKERS: &[char] = &['#', '@', ':'];

/// Stemmed words of a section header such as `Returns:` or `@return`.
fn header_words(section: &str) -> Vec<String> {
    section
        .trim()
        .trim_start_matches(SECTION_MARKERS)
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|w| !w.is_empty())
        .map(|w| stem(&w.to_lowercase()))
        .collect()
}

/// Whether a comment line opens the section named by `words`.
///
/// Google (`Returns:`), numpy (`Returns` then a rule), rustdoc
/// (`# Returns`), javadoc (`@return x`) and reST (`:returns: x`) headers
/// all match `Returns:`. Prose such as "Returns the total" does not.
fn line_has_section(line: &str, words: &[String]) -> bool {
    let trimmed = line.trim_start();
    let body = trimmed.trim_start_matches(SECTION_MARKERS);
    let had_marker = body.len() != trimmed.len();
    let mut rest = body.trim_start();

    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            rest = rest.trim_start_matches(' ');
        }
        let end = rest
            .find(|c: char| !c.is_alphanumeric() && c != '_')
            .unwrap_or(rest.len());
        if end == 0 || stem(&rest[..end].to_lowercase()) != *word {
            return false;
        }
        rest = &rest[end..];
    }

    let tail = rest.trim_start();
    had_marker || tail.is_empty() || tail.starts_with(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{CommentForm, CommentId};
    use crate::extract::test_support::unit;
    use crate::extract::Span;

    fn comment(text: &str) -> RawComment {
        RawComment {
            id: CommentId(0),
            text: text.to_string(),
            span: Span {
                start_byte: 0,
                end_byte: 10,
                start_line: 4,
                start_col: 1,
                end_line: 4,
                end_col: 10,
            },
            form: CommentForm::DocComment,
            own_line: true,
            inner: false,
            marker: "\"\"\"",
        }
    }

    fn guide(yaml: &str) -> (StyleGuide, RuleSet) {
        let guide = StyleGuide::from_yaml(yaml).unwrap();
        let rules = RuleSet::compile(&guide).unwrap();
        (guide, rules)
    }

    fn returning_function() -> CodeUnit {
        let mut f = unit(0, UnitKind::Function, "total", 5, 9);
        f.has_return = true;
        f.parameters = vec!["items".to_string()];
        f
    }

    #[test]
    fn test_missing_returns_section_named_once() {
        let (guide, rules) = guide(
            "rules:\n  function:\n    - required_sections: [\"Returns:\"]\n",
        );
        let f = returning_function();
        let c = comment("Sum the items.\n\nArgs:\n    items: things to add.");
        let findings = check_style("a.py", &f, Some(&c), &rules, &guide);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, Category::StyleViolation);
        assert_eq!(findings[0].rule, "required_sections");
        assert!(findings[0].message.contains("`Returns:`"));
        assert_eq!(findings[0].line, 4);
        assert_eq!(findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_section_header_styles() {
        let words = header_words("Returns:");
        assert!(line_has_section("Returns:", &words));
        assert!(line_has_section("    Returns:", &words));
        assert!(line_has_section("Returns", &words));
        assert!(line_has_section("# Returns", &words));
        assert!(line_has_section("@return the sum", &words));
        assert!(line_has_section(":returns: the sum", &words));
        assert!(!line_has_section("Returns the sum of items.", &words));
        assert!(!line_has_section("Returned values are cached", &words));

        let words = header_words("Keyword Args:");
        assert!(line_has_section("Keyword Args:", &words));
        assert!(!line_has_section("Keyword:", &words));
    }

    #[test]
    fn test_each_violation_is_separate() {
        let (guide, rules) = guide(
            r#"
rules:
  function:
    - name: google
      required_sections: ["Args:", "Returns:"]
      forbidden_pattern: "(?i)\\bxxx\\b"
  all:
    - max_length: 5
"#,
        );
        let f = returning_function();
        let c = comment("Sum XXX things.");
        let findings = check_style("a.py", &f, Some(&c), &rules, &guide);
        let rules_hit: Vec<&str> = findings.iter().map(|f| f.rule.as_str()).collect();
        assert_eq!(rules_hit, vec!["google", "google", "google", "max_length"]);
    }

    #[test]
    fn test_when_condition() {
        let (guide, rules) = guide(
            "rules:\n  function:\n    - required_sections: [\"Returns:\"]\n      when: has_return\n",
        );
        let f = unit(0, UnitKind::Function, "log", 5, 9);
        let c = comment("Log the message.");
        assert!(check_style("a.py", &f, Some(&c), &rules, &guide).is_empty());
    }

    #[test]
    fn test_rules_scoped_by_kind() {
        let (guide, rules) = guide("rules:\n  class:\n    - min_length: 100\n");
        let f = returning_function();
        let c = comment("Short.");
        assert!(check_style("a.py", &f, Some(&c), &rules, &guide).is_empty());
        let class = unit(0, UnitKind::Class, "Cart", 5, 9);
        assert_eq!(check_style("a.py", &class, Some(&c), &rules, &guide).len(), 1);
    }

    #[test]
    fn test_legacy_global_rule() {
        let (guide, rules) = guide("min_length: 10\nrequired_prefix: \"NOTE:\"\n");
        let f = returning_function();
        let c = comment("Short.");
        let findings = check_style("a.py", &f, Some(&c), &rules, &guide);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.rule == "global"));
    }

    #[test]
    fn test_missing_comment_needs_materiality() {
        let (guide, rules) = guide("");
        let mut f = returning_function();
        f.complexity = 1;
        assert!(check_style("a.py", &f, None, &rules, &guide).is_empty());

        f.complexity = 7;
        let findings = check_style("a.py", &f, None, &rules, &guide);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, Category::MissingComment);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].weight, 0.6);
        assert_eq!(findings[0].line, 5);
    }

    #[test]
    fn test_compile_rejects_bad_rules() {
        let guide = StyleGuide::from_yaml("rules:\n  all:\n    - pattern: \"(\"\n").unwrap();
        assert!(matches!(RuleSet::compile(&guide), Err(EngineError::Config(_))));
        let guide =
            StyleGuide::from_yaml("rules:\n  all:\n    - required_sections: [\":\"]\n").unwrap();
        assert!(RuleSet::compile(&guide).is_err());
    }
}
