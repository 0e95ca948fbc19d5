//! Per-file analysis pipeline and the parallel multi-file driver.
//!
//! `analyze` runs extraction, promotion, comment location and attachment in
//! order, then style and drift checks side by side, then suppression and
//! scoring. Files share nothing but the read-only engine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::attach::{resolve, Resolution};
use crate::baseline::{unit_keys, Baseline};
use crate::comments::{locate, RawComment};
use crate::config::StyleGuide;
use crate::detect::complexity::kind_counts;
use crate::detect::{
    check_style, filter_suppressed, parse_suppressions, promote, rules, Category, DriftDetector,
    Finding, RuleSet, Severity, UnitRef,
};
use crate::error::{EngineError, EngineResult};
use crate::extract::languages::frontend_for;
use crate::extract::{CodeUnit, Language, UnitTree};
use crate::score::{file_score, unit_score, FileReport, QualityScore, Report, UnitScore};
use crate::text::sha256_hex;

/// One file handed to the engine by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
    pub language: Language,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>, language: Language) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            language,
        }
    }
}

/// Run-level cancellation flag, checked before each file starts.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The comment quality engine, configured once per run.
pub struct Engine {
    guide: StyleGuide,
    rules: RuleSet,
    drift: DriftDetector,
    ignore: Vec<Regex>,
    baseline: Option<Baseline>,
}

impl Engine {
    /// Validate the guide and compile everything derived from it.
    pub fn new(guide: StyleGuide) -> EngineResult<Self> {
        guide.validate()?;
        let rules = RuleSet::compile(&guide)?;
        let drift = DriftDetector::new(&guide)?;
        let ignore = guide
            .ignore_comment_patterns
            .iter()
            .map(|p| Regex::new(p).map_err(|e| EngineError::Config(e.to_string())))
            .collect::<EngineResult<Vec<_>>>()?;
        debug!(
            rules = rules.len(),
            scorer = drift.scorer_name(),
            "engine configured"
        );
        Ok(Self {
            guide,
            rules,
            drift,
            ignore,
            baseline: None,
        })
    }

    /// Compare bodies and comments against an earlier run.
    pub fn with_baseline(mut self, baseline: Baseline) -> Self {
        self.baseline = Some(baseline);
        self
    }

    pub fn guide(&self) -> &StyleGuide {
        &self.guide
    }

    /// Analyze one file. Parse failures become a failed report; only
    /// invariant violations are returned as errors.
    pub fn analyze(&self, file: &SourceFile) -> EngineResult<FileReport> {
        let path = file.path.as_str();
        let Some(frontend) = frontend_for(file.language) else {
            let err = EngineError::parse(path, format!("unsupported language {}", file.language));
            return Ok(self.failed(file, &err, Vec::new()));
        };

        let located = locate(&file.text, frontend.comment_syntax());
        let malformed = |tree: Option<&UnitTree>| -> Vec<Finding> {
            located
                .malformed
                .iter()
                .map(|m| Finding {
                    file: path.to_string(),
                    line: m.span.start_line,
                    unit: tree
                        .and_then(|t| innermost_unit(t, m.span.start_byte))
                        .map(UnitRef::from_unit),
                    category: Category::StyleViolation,
                    severity: Severity::High,
                    weight: self.guide.weights.style_violation,
                    rule: rules::MALFORMED_COMMENT.to_string(),
                    message: m.to_error().to_string(),
                })
                .collect()
        };

        let tree = match frontend.extract(path, &file.text) {
            Ok(tree) => tree,
            Err(err @ EngineError::Parse { .. }) => {
                warn!(path, error = %err, "skipping unparseable file");
                return Ok(self.failed(file, &err, malformed(None)));
            }
            Err(err) => return Err(err),
        };
        let tree = promote(tree, self.guide.thresholds.block_complexity);
        tree.check_invariants()?;
        debug!(path, counts = ?kind_counts(&tree), comments = located.comments.len(), "extracted");

        let comments = &located.comments;
        let resolution = resolve(&tree, comments, frontend.doc_placement(), &self.ignore)?;
        let keys = unit_keys(&tree);
        let baseline = self.baseline.as_ref();
        let comment_of = |unit: &CodeUnit| -> Option<&RawComment> {
            resolution.comment_for(unit.id).and_then(|id| comments.get(id.0))
        };

        let (style, drift) = rayon::join(
            || {
                tree.iter()
                    .flat_map(|unit| check_style(path, unit, comment_of(unit), &self.rules, &self.guide))
                    .collect::<Vec<_>>()
            },
            || {
                tree.iter()
                    .filter_map(|unit| comment_of(unit).map(|c| (unit, c)))
                    .flat_map(|(unit, comment)| {
                        let entry = baseline.and_then(|b| b.entry(path, &keys[unit.id.0]));
                        self.drift.check(path, &tree, unit, comment, entry)
                    })
                    .collect::<Vec<_>>()
            },
        );

        let mut findings = style;
        findings.extend(drift);
        if self.guide.report_orphans {
            findings.extend(self.orphan_findings(path, &tree, comments, &resolution));
        }
        findings.extend(malformed(Some(&tree)));

        let first_unit_line = tree
            .roots
            .first()
            .and_then(|r| tree.get(*r))
            .map(|u| u.start_line());
        let suppressions = parse_suppressions(path, comments, first_unit_line);
        let (active, suppressed) = filter_suppressed(findings, &suppressions);

        let units: Vec<UnitScore> = tree
            .iter()
            .map(|unit| {
                let comment = comment_of(unit);
                UnitScore {
                    key: keys[unit.id.0].clone(),
                    unit: UnitRef::from_unit(unit),
                    end_line: unit.span.end_line,
                    complexity: unit.complexity,
                    score: unit_score(unit.id, &active),
                    documented: comment.is_some(),
                    body_digest: unit.body_fingerprint.digest.clone(),
                    comment_digest: comment.map(|c| sha256_hex(&c.text)),
                }
            })
            .collect();

        debug!(
            path,
            findings = active.len(),
            suppressed = suppressed.len(),
            "analyzed"
        );
        Ok(FileReport {
            path: path.to_string(),
            language: file.language,
            quality: QualityScore::new(file_score(&units), active),
            units,
            suppressed,
            failed: false,
        })
    }

    /// Analyze files in parallel.
    pub fn analyze_all(&self, files: &[SourceFile]) -> EngineResult<Report> {
        self.analyze_all_with_cancel(files, &CancellationToken::new())
    }

    /// Analyze files in parallel, skipping files that have not started
    /// once `token` is cancelled.
    pub fn analyze_all_with_cancel(
        &self,
        files: &[SourceFile],
        token: &CancellationToken,
    ) -> EngineResult<Report> {
        info!(files = files.len(), "analyzing");
        let results: Vec<Option<EngineResult<FileReport>>> = files
            .par_iter()
            .map(|file| {
                if token.is_cancelled() {
                    None
                } else {
                    Some(self.analyze(file))
                }
            })
            .collect();

        let mut reports = Vec::with_capacity(results.len());
        let mut skipped = 0;
        for result in results {
            match result {
                Some(report) => reports.push(report?),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "run cancelled");
        }

        let report = Report::new(
            reports,
            self.guide.thresholds.min_score,
            token.is_cancelled(),
            skipped,
        );
        info!(
            score = report.aggregate_score,
            grade = %report.grade,
            passed = report.passed,
            "analysis complete"
        );
        Ok(report)
    }

    fn failed(&self, file: &SourceFile, err: &EngineError, mut findings: Vec<Finding>) -> FileReport {
        let (line, column) = match err {
            EngineError::Parse { line, column, .. } => (*line, *column),
            _ => (1, 1),
        };
        findings.push(Finding {
            file: file.path.clone(),
            line,
            unit: None,
            category: Category::ParseError,
            severity: Severity::Fatal,
            weight: 0.0,
            rule: rules::PARSE_ERROR.to_string(),
            message: format!("{} (column {})", err, column),
        });
        FileReport::failed(&file.path, file.language, findings)
    }

    fn orphan_findings(
        &self,
        path: &str,
        tree: &UnitTree,
        comments: &[RawComment],
        resolution: &Resolution,
    ) -> Vec<Finding> {
        resolution
            .orphans()
            .filter_map(|id| comments.get(id.0))
            .map(|comment| Finding {
                file: path.to_string(),
                line: comment.start_line(),
                unit: innermost_unit(tree, comment.span.start_byte).map(UnitRef::from_unit),
                category: Category::OrphanComment,
                severity: Severity::Info,
                weight: self.guide.weights.orphan_comment,
                rule: rules::ORPHAN_COMMENT.to_string(),
                message: format!("comment \"{}\" does not document any unit", preview(&comment.text)),
            })
            .collect()
    }
}

/// Deepest unit whose span contains the byte offset.
fn innermost_unit(tree: &UnitTree, byte: usize) -> Option<&CodeUnit> {
    tree.iter()
        .filter(|u| u.span.start_byte <= byte && byte < u.span.end_byte)
        .max_by_key(|u| u.span.start_byte)
}

fn preview(text: &str) -> String {
    const MAX: usize = 40;
    let first = text.lines().next().unwrap_or("").trim();
    if first.chars().count() > MAX {
        format!("{}...", first.chars().take(MAX).collect::<String>())
    } else {
        first.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> Engine {
        Engine::new(StyleGuide::default()).unwrap()
    }

    fn python(path: &str, text: &str) -> SourceFile {
        SourceFile::new(path, text, Language::Python)
    }

    #[test]
    fn test_trivial_getter_has_no_findings() {
        let src = "class Box:\n    def get(self):\n        return self.x\n";
        let report = engine().analyze(&python("box.py", src)).unwrap();
        assert!(report.quality.findings.is_empty());
        assert_eq!(report.quality.score, 1.0);
        assert_eq!(report.units.len(), 2);
    }

    #[test]
    fn test_parse_error_becomes_fatal_finding() {
        let report = engine().analyze(&python("bad.py", "def f(:\n")).unwrap();
        assert!(report.failed);
        assert!(report.units.is_empty());
        assert_eq!(report.quality.score, 0.0);
        assert_eq!(report.quality.findings.len(), 1);
        assert_eq!(report.quality.findings[0].severity, Severity::Fatal);
        assert_eq!(report.quality.findings[0].category, Category::ParseError);
    }

    #[test]
    fn test_unterminated_block_comment_is_reported() {
        let src = "package main\n\nfunc main() {\n}\n\n/* never closed\n";
        let report = engine()
            .analyze(&SourceFile::new("main.go", src, Language::Go))
            .unwrap();
        let malformed: Vec<&Finding> = report
            .quality
            .findings
            .iter()
            .filter(|f| f.rule == rules::MALFORMED_COMMENT)
            .collect();
        assert_eq!(malformed.len(), 1);
        assert_eq!(malformed[0].category, Category::StyleViolation);
        assert_eq!(malformed[0].severity, Severity::High);
        assert_eq!(malformed[0].line, 6);
    }

    #[test]
    fn test_orphan_reported_inside_unit() {
        let src = "def f(a):\n    x = a\n\n    # stray note\n\n    return x\n";
        let report = engine().analyze(&python("a.py", src)).unwrap();
        let orphan = &report.quality.findings[0];
        assert_eq!(orphan.category, Category::OrphanComment);
        assert_eq!(orphan.severity, Severity::Info);
        assert_eq!(orphan.unit.as_ref().unwrap().identifier, "f");
        assert!((report.units[0].score - 0.98).abs() < 1e-9);

        let mut guide = StyleGuide::default();
        guide.report_orphans = false;
        let quiet = Engine::new(guide).unwrap().analyze(&python("a.py", src)).unwrap();
        assert!(quiet.quality.findings.is_empty());
    }

    #[test]
    fn test_suppressed_missing_comment() {
        let mut body = String::from("# commentgate:ignore missing_comment - legacy\ndef f(a):\n");
        for i in 0..6 {
            body.push_str(&format!("    if a == {}:\n        a += 1\n", i));
        }
        body.push_str("    return a\n");
        let report = engine().analyze(&python("a.py", &body)).unwrap();
        assert!(report.quality.findings.is_empty());
        assert_eq!(report.suppressed.len(), 1);
        assert_eq!(report.suppressed[0].finding.category, Category::MissingComment);
    }

    #[test]
    fn test_cancelled_run_skips_files() {
        let files = vec![python("a.py", "x = 1\n"), python("b.py", "y = 2\n")];
        let token = CancellationToken::new();
        token.cancel();
        let report = engine().analyze_all_with_cancel(&files, &token).unwrap();
        assert!(report.cancelled);
        assert_eq!(report.skipped, 2);
        assert!(report.files.is_empty());
    }

    #[test]
    fn test_invalid_guide_rejected_before_analysis() {
        let mut guide = StyleGuide::default();
        guide.thresholds.similarity = 2.0;
        assert!(matches!(Engine::new(guide), Err(EngineError::Config(_))));
    }
}
