//! Integration tests for the full analysis pipeline.
//!
//! These tests run the engine end to end against inline sources and the
//! testdata fixtures.

use std::path::PathBuf;

use commentgate::baseline::Baseline;
use commentgate::detect::{rules, Category, Finding, Severity};
use commentgate::{Engine, FileReport, Language, SourceFile, StyleGuide};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn fixture(name: &str) -> SourceFile {
    let path = testdata_path().join(name);
    let text = std::fs::read_to_string(&path).expect("should read fixture");
    let language = Language::from_path(&path).expect("supported fixture");
    SourceFile::new(name, text, language)
}

fn default_engine() -> Engine {
    Engine::new(StyleGuide::default()).expect("default guide is valid")
}

fn python(path: &str, text: &str) -> SourceFile {
    SourceFile::new(path, text, Language::Python)
}

fn with_category(report: &FileReport, category: Category) -> Vec<&Finding> {
    report
        .quality
        .findings
        .iter()
        .filter(|f| f.category == category)
        .collect()
}

#[test]
fn test_missing_comment_on_complex_function() {
    let report = default_engine().analyze(&fixture("inventory.py")).unwrap();

    let missing = with_category(&report, Category::MissingComment);
    assert_eq!(missing.len(), 1, "findings: {:#?}", report.quality.findings);
    let finding = missing[0];
    assert_eq!(finding.unit.as_ref().unwrap().identifier, "classify");
    assert_eq!(finding.line, 18);
    assert_eq!(finding.severity, Severity::High);
    assert_eq!(finding.weight, StyleGuide::default().weights.missing_comment);

    let classify = report
        .units
        .iter()
        .find(|u| u.unit.identifier == "classify")
        .unwrap();
    assert_eq!(classify.complexity, 7);
    assert!(!classify.documented);
}

#[test]
fn test_leading_comment_attaches_and_separated_comment_is_orphan() {
    let attached = "# Normalize a raw score.\ndef norm(x):\n    return x / 10\n";
    let report = default_engine().analyze(&python("a.py", attached)).unwrap();
    assert!(report.units[0].documented);
    assert!(with_category(&report, Category::OrphanComment).is_empty());

    let separated = "# Normalize a raw score.\n\ndef norm(x):\n    return x / 10\n";
    let report = default_engine().analyze(&python("a.py", separated)).unwrap();
    assert!(!report.units[0].documented);
    let orphans = with_category(&report, Category::OrphanComment);
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].line, 1);
    assert_eq!(orphans[0].severity, Severity::Info);
}

#[test]
fn test_renamed_parameter_is_signature_drift() {
    let src = "# count must be positive.\ndef repeat(word, total):\n    return word * total\n";
    let report = default_engine().analyze(&python("a.py", src)).unwrap();

    let strong: Vec<&Finding> = report
        .quality
        .findings
        .iter()
        .filter(|f| f.rule == rules::SIGNATURE_DRIFT)
        .collect();
    assert_eq!(strong.len(), 1);
    assert_eq!(strong[0].category, Category::StaleComment);
    assert_eq!(strong[0].severity, Severity::High);
    assert!(strong[0].message.contains("`count`"));
    assert_eq!(strong[0].line, 1);
}

#[test]
fn test_fixture_drift_and_orphan() {
    let report = default_engine().analyze(&fixture("inventory.py")).unwrap();

    let drift: Vec<&Finding> = report
        .quality
        .findings
        .iter()
        .filter(|f| f.rule == rules::SIGNATURE_DRIFT)
        .collect();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].unit.as_ref().unwrap().identifier, "restock");
    assert_eq!(drift[0].line, 13);

    // The module docstring is not an orphan; the separated helper note is.
    let orphans = with_category(&report, Category::OrphanComment);
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].line, 34);
    assert!(orphans[0].unit.is_none());
}

#[test]
fn test_missing_returns_section() {
    let guide = StyleGuide::parse_file(testdata_path().join("google.yaml")).unwrap();
    let engine = Engine::new(guide).unwrap();
    let report = engine.analyze(&fixture("shapes.py")).unwrap();

    let style = with_category(&report, Category::StyleViolation);
    assert_eq!(style.len(), 1, "findings: {:#?}", report.quality.findings);
    assert_eq!(style[0].rule, "returns-section");
    assert_eq!(style[0].unit.as_ref().unwrap().identifier, "perimeter");
    assert!(style[0].message.contains("Returns:"));
    assert_eq!(style[0].severity, Severity::Medium);
}

#[test]
fn test_trivial_getter_is_exempt() {
    let src = "def name(user):\n    return user.name\n";
    let report = default_engine().analyze(&python("a.py", src)).unwrap();
    assert!(report.quality.findings.is_empty());
    assert_eq!(report.units[0].complexity, 1);
    assert_eq!(report.quality.score, 1.0);
}

#[test]
fn test_go_fixture_is_clean() {
    let report = default_engine().analyze(&fixture("stack.go")).unwrap();
    assert!(!report.failed);
    assert!(
        with_category(&report, Category::MissingComment).is_empty(),
        "findings: {:#?}",
        report.quality.findings
    );
    let push = report
        .units
        .iter()
        .find(|u| u.unit.identifier == "Push")
        .unwrap();
    assert!(push.documented);
}

#[test]
fn test_parse_failure_fails_the_run() {
    let files = vec![fixture("broken.py"), fixture("shapes.py")];
    let report = default_engine().analyze_all(&files).unwrap();

    let broken = report.files.iter().find(|f| f.path == "broken.py").unwrap();
    assert!(broken.failed);
    assert_eq!(broken.quality.findings[0].severity, Severity::Fatal);
    assert_eq!(broken.quality.findings[0].rule, rules::PARSE_ERROR);

    // The healthy file is still analyzed and carries the aggregate.
    let shapes = report.files.iter().find(|f| f.path == "shapes.py").unwrap();
    assert!(!shapes.failed);
    assert_eq!(report.aggregate_score, shapes.quality.score);
    assert!(!report.passed);
}

#[test]
fn test_analysis_is_deterministic() {
    let files = vec![
        fixture("inventory.py"),
        fixture("shapes.py"),
        fixture("stack.go"),
        fixture("broken.py"),
    ];
    let engine = default_engine();
    let first = serde_json::to_string(&engine.analyze_all(&files).unwrap()).unwrap();
    for _ in 0..3 {
        let again = serde_json::to_string(&engine.analyze_all(&files).unwrap()).unwrap();
        assert_eq!(first, again);
    }

    let mut reversed = files.clone();
    reversed.reverse();
    let shuffled = serde_json::to_string(&engine.analyze_all(&reversed).unwrap()).unwrap();
    assert_eq!(first, shuffled);
}

#[test]
fn test_missing_findings_monotonic_in_threshold() {
    let file = fixture("inventory.py");
    let mut previous = usize::MAX;
    for threshold in 1..=10 {
        let mut guide = StyleGuide::default();
        guide.thresholds.missing_complexity = threshold;
        let report = Engine::new(guide).unwrap().analyze(&file).unwrap();
        let missing = with_category(&report, Category::MissingComment).len();
        assert!(
            missing <= previous,
            "threshold {} reported {} > {}",
            threshold,
            missing,
            previous
        );
        previous = missing;
    }
    assert_eq!(previous, 0);
}

#[test]
fn test_dissolved_blocks_raise_parent_complexity() {
    let src = "\
def route(a, b, c):
    if a:
        a += 1
    if b:
        b += 1
    if c:
        c += 1
    return a + b + c
";
    let file = python("route.py", src);
    let run = |block: u32, missing: u32| {
        let mut guide = StyleGuide::default();
        guide.thresholds.block_complexity = block;
        guide.thresholds.missing_complexity = missing;
        let report = Engine::new(guide).unwrap().analyze(&file).unwrap();
        with_category(&report, Category::MissingComment).len()
    };

    // Promoted blocks keep their branches; the function stays simple.
    assert_eq!(run(2, 3), 0);
    // Dissolved blocks hand their branches to the function.
    assert_eq!(run(3, 3), 1);
    assert_eq!(run(3, 4), 1);

    // With the block threshold fixed, raising the missing threshold never
    // adds findings.
    for block in [2, 3] {
        let mut previous = usize::MAX;
        for missing in 1..=10 {
            let count = run(block, missing);
            assert!(count <= previous, "block {} missing {}", block, missing);
            previous = count;
        }
    }
}

#[test]
fn test_scores_stay_in_bounds() {
    let mut guide = StyleGuide::default();
    guide.weights.missing_comment = 5.0;
    guide.weights.stale_strong = 5.0;
    guide.always_require = vec![commentgate::UnitKind::Function, commentgate::UnitKind::Method];
    let engine = Engine::new(guide).unwrap();
    let files = vec![fixture("inventory.py"), fixture("shapes.py")];
    let report = engine.analyze_all(&files).unwrap();

    for file in &report.files {
        assert!((0.0..=1.0).contains(&file.quality.score));
        for unit in &file.units {
            assert!((0.0..=1.0).contains(&unit.score), "{}: {}", unit.key, unit.score);
        }
    }
    assert!((0.0..=1.0).contains(&report.aggregate_score));
}

#[test]
fn test_file_without_units_scores_one() {
    let report = default_engine()
        .analyze(&python("consts.py", "LIMIT = 10\nNAME = \"x\"\n"))
        .unwrap();
    assert!(report.units.is_empty());
    assert_eq!(report.quality.score, 1.0);
    assert_eq!(report.quality.grade, "A");
}

#[test]
fn test_baseline_detects_changed_body_with_same_comment() {
    let before = "def area(w, h):\n    \"\"\"Area of a w by h rectangle.\"\"\"\n    return w * h\n";
    let after = "def area(w, h):\n    \"\"\"Area of a w by h rectangle.\"\"\"\n    return w * h * 2\n";

    let engine = default_engine();
    let first = engine.analyze_all(&[python("shapes.py", before)]).unwrap();
    let baseline = Baseline::from_report(&first);
    assert!(baseline.entry("shapes.py", "function:area#0").is_some());

    let engine = default_engine().with_baseline(baseline);
    let unchanged = engine.analyze(&python("shapes.py", before)).unwrap();
    assert!(unchanged
        .quality
        .findings
        .iter()
        .all(|f| f.rule != rules::BASELINE_DRIFT));

    let changed = engine.analyze(&python("shapes.py", after)).unwrap();
    let drift: Vec<&Finding> = changed
        .quality
        .findings
        .iter()
        .filter(|f| f.rule == rules::BASELINE_DRIFT)
        .collect();
    assert_eq!(drift.len(), 1);
    assert_eq!(drift[0].severity, Severity::Low);
    assert_eq!(drift[0].category, Category::StaleComment);
}

#[test]
fn test_file_suppression() {
    let mut src = String::from("# commentgate:ignore-file * - generated code\n\ndef f(a):\n");
    for i in 0..6 {
        src.push_str(&format!("    if a == {}:\n        a += 1\n", i));
    }
    src.push_str("    return a\n");
    let report = default_engine().analyze(&python("gen.py", &src)).unwrap();
    assert!(report.quality.findings.is_empty());
    assert_eq!(report.suppressed.len(), 1);
    assert_eq!(report.quality.score, 1.0);
}
