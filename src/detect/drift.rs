//! Staleness detection: does a comment still describe its code?
//!
//! Three independent triggers:
//! - signature drift: the comment names a parameter or identifier that is
//!   gone from the signature and body (strong);
//! - semantic drift: comment and code share too few words (weak);
//! - baseline drift: the body changed since the baseline but the comment
//!   did not (weak).

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use super::similarity::{scorer_by_name, SimilarityScorer};
use super::types::{rules, Category, Finding, Severity, UnitRef};
use crate::baseline::BaselineEntry;
use crate::comments::RawComment;
use crate::config::StyleGuide;
use crate::error::EngineResult;
use crate::extract::{CodeUnit, UnitKind, UnitTree};
use crate::text::{self, is_identifier_shaped, is_stopword, split_identifier, stem};

lazy_static::lazy_static! {
    /// Google, numpy and rustdoc parameter section headers.
    static ref PARAM_SECTION: Regex = Regex::new(
        r"(?i)^\s*(?:#+\s*)?(?:args|arguments|parameters|params|keyword args|keyword arguments|other parameters)\s*:?\s*$"
    ).unwrap();

    /// One entry of a parameter section: `name (type): ...`, `name : type`,
    /// `* `name` - ...`.
    static ref PARAM_ENTRY: Regex = Regex::new(
        r"^(?:[-*+]\s+)?`?\*{0,2}([A-Za-z_][A-Za-z0-9_]*)`?\s*(?:\([^)]*\))?\s*(?::|-\s|-$)"
    ).unwrap();

    /// Javadoc / JSDoc `@param {type} name`.
    static ref AT_PARAM: Regex = Regex::new(
        r"@param\s+(?:\{[^}]*\}\s*)?\[?([A-Za-z_$][A-Za-z0-9_$]*)"
    ).unwrap();

    /// reST `:param type name:`.
    static ref REST_PARAM: Regex = Regex::new(
        r":param\s+(?:[^:\n]*\s)?([A-Za-z_][A-Za-z0-9_]*)\s*:"
    ).unwrap();

    static ref BACKTICKED: Regex = Regex::new(
        r"`([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)(?:\(\))?`"
    ).unwrap();

    /// Subject of a constraint phrase, as in "count must be positive".
    /// A leading determiner ("the file must") marks prose, not a name.
    static ref CONSTRAINT_SUBJECT: Regex = Regex::new(
        r"\b(?:((?i:the|a|an|this|that|each|every|any|its|their|our|your|all|some|no))\s+)?([A-Za-z_][A-Za-z0-9_]*)\s+(?i:must|should|shall|cannot|can't|may\s+not|needs\s+to|has\s+to|is\s+required)\b"
    ).unwrap();

    static ref UNDERLINE: Regex = Regex::new(r"^\s*[-=~]{3,}\s*$").unwrap();
}

const RECEIVERS: &[&str] = &["self", "cls", "this"];
const CONSTRUCTORS: &[&str] = &["__init__", "constructor", "new"];

/// Drift checks with the guide's scorer, threshold and weights.
pub struct DriftDetector {
    scorer: Box<dyn SimilarityScorer>,
    threshold: f64,
    strong_weight: f64,
    weak_weight: f64,
}

impl DriftDetector {
    pub fn new(guide: &StyleGuide) -> EngineResult<Self> {
        Ok(Self {
            scorer: scorer_by_name(&guide.similarity_scorer)?,
            threshold: guide.thresholds.similarity,
            strong_weight: guide.weights.stale_strong,
            weak_weight: guide.weights.stale_weak,
        })
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Check one attached comment against its unit.
    pub fn check(
        &self,
        file: &str,
        tree: &UnitTree,
        unit: &CodeUnit,
        comment: &RawComment,
        baseline: Option<&BaselineEntry>,
    ) -> Vec<Finding> {
        let finding = |severity, weight, rule: &str, message: String| Finding {
            file: file.to_string(),
            line: comment.start_line(),
            unit: Some(UnitRef::from_unit(unit)),
            category: Category::StaleComment,
            severity,
            weight,
            rule: rule.to_string(),
            message: format!("{}: {}", unit.label(), message),
        };
        let mut findings = Vec::new();

        let stale = stale_references(tree, unit, &comment.text);
        if !stale.is_empty() {
            let names: Vec<String> = stale.iter().map(|n| format!("`{}`", n)).collect();
            findings.push(finding(
                Severity::High,
                self.strong_weight,
                rules::SIGNATURE_DRIFT,
                format!(
                    "comment mentions {} which no longer appear in the code",
                    names.join(", ")
                ),
            ));
        }

        let similarity = self
            .scorer
            .score(&text::content_words(&comment.text), &unit_words(unit));
        if similarity < self.threshold {
            findings.push(finding(
                Severity::Low,
                self.weak_weight,
                rules::SEMANTIC_DRIFT,
                format!(
                    "comment shares little vocabulary with the code (similarity {:.2} < {:.2})",
                    similarity, self.threshold
                ),
            ));
        }

        if let Some(entry) = baseline {
            let comment_digest = text::sha256_hex(&comment.text);
            if entry.body_digest != unit.body_fingerprint.digest
                && entry.comment_digest.as_deref() == Some(comment_digest.as_str())
            {
                findings.push(finding(
                    Severity::Low,
                    self.weak_weight,
                    rules::BASELINE_DRIFT,
                    "code changed since the baseline but its comment did not".to_string(),
                ));
            }
        }

        findings
    }
}

/// Names the comment refers to that the unit no longer has, sorted.
pub fn stale_references(tree: &UnitTree, unit: &CodeUnit, comment: &str) -> Vec<String> {
    let mut stale = BTreeSet::new();

    let structured = documented_parameters(comment);
    if let Some(params) = current_parameters(tree, unit) {
        for name in &structured {
            if !params.contains(name.as_str()) && !RECEIVERS.contains(&name.as_str()) {
                stale.insert(name.clone());
            }
        }
    }

    let mut known = unit_words(unit);
    let mut exact: BTreeSet<&str> = unit.parameters.iter().map(String::as_str).collect();
    exact.insert(unit.identifier.as_str());
    if matches!(unit.kind, UnitKind::Method | UnitKind::ComplexBlock) {
        let mut ancestor = unit.parent.and_then(|p| tree.get(p));
        while let Some(a) = ancestor {
            known.extend(unit_words(a));
            exact.extend(a.parameters.iter().map(String::as_str));
            ancestor = a.parent.and_then(|p| tree.get(p));
        }
    }

    for name in free_references(comment) {
        if structured.contains(&name) || exact.contains(name.as_str()) {
            continue;
        }
        if !is_known(&name, &known) {
            stale.insert(name);
        }
    }
    stale.into_iter().collect()
}

/// Parameter names documented in structured form, in order of appearance.
pub fn documented_parameters(comment: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    };

    let mut in_section = false;
    let mut entry_indent: Option<usize> = None;
    for line in comment.lines() {
        if PARAM_SECTION.is_match(line) {
            in_section = true;
            entry_indent = None;
            continue;
        }
        if !in_section || line.trim().is_empty() || UNDERLINE.is_match(line) {
            continue;
        }
        let indent = line.len() - line.trim_start().len();
        let expected = *entry_indent.get_or_insert(indent);
        if indent > expected {
            continue;
        }
        match PARAM_ENTRY.captures(line.trim_start()) {
            Some(caps) if indent == expected => push(&caps[1]),
            _ => in_section = false,
        }
    }

    for caps in AT_PARAM.captures_iter(comment) {
        push(&caps[1]);
    }
    for caps in REST_PARAM.captures_iter(comment) {
        push(&caps[1]);
    }
    names
}

/// Free-form references: backticked names, identifier-shaped tokens and
/// constraint subjects, deduplicated in order of appearance.
fn free_references(comment: &str) -> Vec<String> {
    let mut refs: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if is_stopword(name) || refs.iter().any(|r| r == name) {
            return;
        }
        refs.push(name.to_string());
    };

    for caps in BACKTICKED.captures_iter(comment) {
        if let Some(last) = caps[1].rsplit('.').next() {
            push(last);
        }
    }
    for token in text::identifiers(comment) {
        if is_identifier_shaped(token) {
            push(token);
        }
    }
    for caps in CONSTRAINT_SUBJECT.captures_iter(comment) {
        let subject = &caps[2];
        if caps.get(1).is_none() && is_constraint_name(subject) {
            push(subject);
        }
    }
    refs
}

/// Lowercase or snake_case subjects name code; capitalized words start
/// sentences.
fn is_constraint_name(subject: &str) -> bool {
    subject
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
}

/// Parameters a structured reference is checked against. Classes use their
/// constructor; units without parameters of their own are not checked.
fn current_parameters<'t>(tree: &'t UnitTree, unit: &'t CodeUnit) -> Option<BTreeSet<&'t str>> {
    match unit.kind {
        UnitKind::Function | UnitKind::Method => {
            Some(unit.parameters.iter().map(String::as_str).collect())
        }
        UnitKind::Class => tree
            .children(unit.id)
            .find(|c| {
                c.kind.is_callable()
                    && (CONSTRUCTORS.contains(&c.identifier.as_str()) || c.identifier == unit.identifier)
            })
            .map(|ctor| ctor.parameters.iter().map(String::as_str).collect()),
        UnitKind::ComplexBlock => None,
    }
}

/// Stemmed words of a unit's name, signature, parameters and body.
fn unit_words(unit: &CodeUnit) -> BTreeSet<String> {
    let mut tokens = BTreeMap::new();
    text::add_token_words(&mut tokens, &unit.identifier);
    text::add_token_words(&mut tokens, &unit.signature_text);
    for param in &unit.parameters {
        text::add_token_words(&mut tokens, param);
    }
    tokens
        .into_keys()
        .chain(unit.body_fingerprint.tokens.keys().cloned())
        .collect()
}

fn is_known(name: &str, known: &BTreeSet<String>) -> bool {
    split_identifier(name)
        .iter()
        .filter(|w| w.len() >= 2 && !w.chars().all(|c| c.is_ascii_digit()))
        .all(|w| is_stopword(w) || known.contains(&stem(w)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{CommentForm, CommentId};
    use crate::detect::complexity::promote;
    use crate::extract::languages::frontend_for;
    use crate::extract::Language;

    fn tree(source: &str) -> UnitTree {
        let tree = frontend_for(Language::Python)
            .unwrap()
            .extract("t.py", source)
            .unwrap();
        promote(tree, 5)
    }

    fn comment_on(unit: &CodeUnit, text: &str) -> RawComment {
        RawComment {
            id: CommentId(0),
            text: text.to_string(),
            span: unit.span,
            form: CommentForm::DocComment,
            own_line: true,
            inner: false,
            marker: "\"\"\"",
        }
    }

    fn detector() -> DriftDetector {
        DriftDetector::new(&StyleGuide::default()).unwrap()
    }

    #[test]
    fn test_renamed_parameter_in_constraint() {
        let t = tree("def repeat(text, total):\n    return text * total\n");
        let unit = &t.units[0];
        let c = comment_on(unit, "Repeat the text; count must be positive.");
        let findings = detector().check("t.py", &t, unit, &c, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, rules::SIGNATURE_DRIFT);
        assert_eq!(findings[0].severity, Severity::High);
        assert_eq!(findings[0].weight, 0.4);
        assert!(findings[0].message.contains("`count`"));
    }

    #[test]
    fn test_accurate_comment_is_clean() {
        let t = tree("def repeat(text, total):\n    return text * total\n");
        let unit = &t.units[0];
        let c = comment_on(unit, "Repeat `text` several times; total must be positive.");
        assert!(detector().check("t.py", &t, unit, &c, None).is_empty());
    }

    #[test]
    fn test_sentence_subjects_are_not_references() {
        let t = tree("def sort_users(users):\n    return sorted(users, key=lambda u: u.name)\n");
        let unit = &t.units[0];
        assert!(stale_references(&t, unit, "Sort users by name. Order must be stable.").is_empty());

        let t = tree("def load(path):\n    return open(path).read()\n");
        let unit = &t.units[0];
        assert!(stale_references(&t, unit, "Load the file. File should exist.").is_empty());
        assert!(stale_references(&t, unit, "Read it; the file must exist.").is_empty());
        assert_eq!(stale_references(&t, unit, "Read it; count MUST be set."), vec!["count"]);
    }

    #[test]
    fn test_structured_parameter_sections() {
        let google = "Sum things.\n\nArgs:\n    items (list): the items.\n        More detail.\n    *args: extra.\n\nReturns:\n    int: the sum.";
        assert_eq!(documented_parameters(google), vec!["items", "args"]);

        let numpy = "Sum things.\n\nParameters\n----------\nitems : list\n    The items.\nscale : int\n\nReturns\n-------\nint\n";
        assert_eq!(documented_parameters(numpy), vec!["items", "scale"]);

        let rustdoc = "Sum things.\n\n# Arguments\n\n* `items` - the items\n* `scale` - factor\n\n# Panics\n";
        assert_eq!(documented_parameters(rustdoc), vec!["items", "scale"]);

        let javadoc = "Sum things.\n@param {number[]} items the items\n@param [scale=1] factor\n@return the sum";
        assert_eq!(documented_parameters(javadoc), vec!["items", "scale"]);

        let rest = "Sum things.\n\n:param list items: the items\n:param scale: factor\n:returns: sum";
        assert_eq!(documented_parameters(rest), vec!["items", "scale"]);
    }

    #[test]
    fn test_stale_structured_parameter() {
        let t = tree("def total(items, factor):\n    return sum(items) * factor\n");
        let unit = &t.units[0];
        let stale = stale_references(&t, unit, "Args:\n    items: things.\n    scale: multiplier.\n");
        assert_eq!(stale, vec!["scale"]);
    }

    #[test]
    fn test_class_uses_constructor_parameters() {
        let src = "class Cart:\n    def __init__(self, items):\n        self.items = items\n";
        let t = tree(src);
        let class = &t.units[0];
        let stale = stale_references(&t, class, "Args:\n    items: initial items.\n    owner: who.\n");
        assert_eq!(stale, vec!["owner"]);
    }

    #[test]
    fn test_method_may_mention_enclosing_names() {
        let src = "class Cart:\n    def __init__(self, max_items):\n        self.max_items = max_items\n\n    def add(self, item):\n        self.items.append(item)\n";
        let t = tree(src);
        let add = t.iter().find(|u| u.identifier == "add").unwrap();
        assert!(stale_references(&t, add, "Add `item` unless max_items is reached.").is_empty());
    }

    #[test]
    fn test_semantic_drift_on_unrelated_comment() {
        let t = tree("def repeat(text, total):\n    return text * total\n");
        let unit = &t.units[0];
        let c = comment_on(unit, "Frobnicate the widget cache.");
        let findings = detector().check("t.py", &t, unit, &c, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, rules::SEMANTIC_DRIFT);
        assert_eq!(findings[0].severity, Severity::Low);
        assert!(findings[0].message.contains("0.00"));
    }

    #[test]
    fn test_baseline_drift() {
        let t = tree("def repeat(text, total):\n    return text * total\n");
        let unit = &t.units[0];
        let c = comment_on(unit, "Repeat the text total times.");
        let entry = BaselineEntry {
            body_digest: "old".to_string(),
            comment_digest: Some(text::sha256_hex(&c.text)),
        };
        let findings = detector().check("t.py", &t, unit, &c, Some(&entry));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, rules::BASELINE_DRIFT);

        let unchanged = BaselineEntry {
            body_digest: unit.body_fingerprint.digest.clone(),
            comment_digest: Some(text::sha256_hex(&c.text)),
        };
        assert!(detector().check("t.py", &t, unit, &c, Some(&unchanged)).is_empty());
    }
}
