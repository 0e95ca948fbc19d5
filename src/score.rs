//! Scoring and grading.
//!
//! Unit scores start at 1.0 and lose the weight of every finding about the
//! unit. File scores are complexity-weighted means of unit scores, and the
//! run score is the complexity-weighted mean of file scores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detect::{sort_findings, Finding, SuppressedFinding, UnitRef};
use crate::extract::{Language, UnitId};

/// Lower bounds of the letter grades.
pub mod grades {
    pub const A_MIN: f64 = 0.9;
    pub const B_MIN: f64 = 0.8;
    pub const C_MIN: f64 = 0.65;
    pub const D_MIN: f64 = 0.5;
}

/// Determine the letter grade from a score.
pub fn calculate_grade(score: f64) -> String {
    match score {
        s if s >= grades::A_MIN => "A".to_string(),
        s if s >= grades::B_MIN => "B".to_string(),
        s if s >= grades::C_MIN => "C".to_string(),
        s if s >= grades::D_MIN => "D".to_string(),
        _ => "F".to_string(),
    }
}

/// Score and documentation state of one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitScore {
    /// Stable key used by baselines, e.g. `method:Cart.add#0`.
    pub key: String,
    pub unit: UnitRef,
    pub end_line: usize,
    pub complexity: u32,
    pub score: f64,
    pub documented: bool,
    pub body_digest: String,
    /// SHA-256 of the attached comment text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_digest: Option<String>,
}

/// Score of a file plus its findings in report order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub score: f64,
    pub grade: String,
    pub findings: Vec<Finding>,
    /// Finding counts by category.
    pub breakdown: BTreeMap<String, usize>,
}

impl QualityScore {
    pub fn new(score: f64, mut findings: Vec<Finding>) -> Self {
        sort_findings(&mut findings);
        let mut breakdown = BTreeMap::new();
        for finding in &findings {
            *breakdown
                .entry(finding.category.as_str().to_string())
                .or_insert(0) += 1;
        }
        Self {
            score,
            grade: calculate_grade(score),
            findings,
            breakdown,
        }
    }
}

/// Analysis result for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: String,
    pub language: Language,
    pub units: Vec<UnitScore>,
    pub quality: QualityScore,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedFinding>,
    /// The file could not be parsed.
    #[serde(default)]
    pub failed: bool,
}

impl FileReport {
    /// Report for a file that could not be analyzed: no units, score 0.
    pub fn failed(path: &str, language: Language, findings: Vec<Finding>) -> Self {
        Self {
            path: path.to_string(),
            language,
            units: Vec::new(),
            quality: QualityScore::new(0.0, findings),
            suppressed: Vec::new(),
            failed: true,
        }
    }

    /// Weight of this file in the run score.
    pub fn weight(&self) -> f64 {
        if self.failed {
            return 0.0;
        }
        self.units.iter().map(|u| f64::from(u.complexity)).sum()
    }
}

/// Results of a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub files: Vec<FileReport>,
    pub aggregate_score: f64,
    pub grade: String,
    /// Aggregate reached `min_score` and every file parsed.
    pub passed: bool,
    pub min_score: f64,
    pub cancelled: bool,
    /// Files not analyzed because the run was cancelled.
    pub skipped: usize,
}

impl Report {
    pub fn new(mut files: Vec<FileReport>, min_score: f64, cancelled: bool, skipped: usize) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        let aggregate_score = aggregate_score(&files);
        let passed = aggregate_score >= min_score && !files.iter().any(|f| f.failed);
        Self {
            files,
            grade: calculate_grade(aggregate_score),
            aggregate_score,
            passed,
            min_score,
            cancelled,
            skipped,
        }
    }

    pub fn findings(&self) -> impl Iterator<Item = &Finding> {
        self.files.iter().flat_map(|f| f.quality.findings.iter())
    }

    pub fn total_findings(&self) -> usize {
        self.files.iter().map(|f| f.quality.findings.len()).sum()
    }

    pub fn total_suppressed(&self) -> usize {
        self.files.iter().map(|f| f.suppressed.len()).sum()
    }
}

/// 1.0 minus the weights of the findings about `unit`, clamped to [0, 1].
pub fn unit_score(unit: UnitId, findings: &[Finding]) -> f64 {
    let penalty: f64 = findings
        .iter()
        .filter(|f| f.unit.as_ref().is_some_and(|u| u.id == unit))
        .map(|f| f.weight)
        .sum();
    (1.0 - penalty).clamp(0.0, 1.0)
}

/// Complexity-weighted mean of unit scores; 1.0 for a file without units.
pub fn file_score(units: &[UnitScore]) -> f64 {
    weighted_mean(units.iter().map(|u| (u.score, f64::from(u.complexity))))
}

/// Complexity-weighted mean of file scores; 1.0 when nothing carries weight.
pub fn aggregate_score(files: &[FileReport]) -> f64 {
    weighted_mean(files.iter().map(|f| (f.quality.score, f.weight())))
}

fn weighted_mean(items: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (sum, total) = items.fold((0.0, 0.0), |(sum, total), (score, weight)| {
        (sum + score * weight, total + weight)
    });
    if total <= 0.0 {
        return 1.0;
    }
    (sum / total).clamp(0.0, 1.0)
}
