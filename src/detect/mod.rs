//! Detection of comment quality issues.

pub mod complexity;
pub mod drift;
pub mod similarity;
mod style;
mod suppress;
mod types;

pub use complexity::{is_material, promote};
pub use drift::{documented_parameters, stale_references, DriftDetector};
pub use similarity::{scorer_by_name, Jaccard, SimilarityScorer, TokenOverlap};
pub use style::{check_style, CompiledRule, RuleSet};
pub use suppress::{
    filter_suppressed, matches_suppression, parse_suppressions, SuppressedFinding, Suppression,
    SuppressionType,
};
pub use types::{rules, sort_findings, Category, Finding, Severity, UnitRef};
