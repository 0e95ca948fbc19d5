//! Style guide schema for commentgate.
//!
//! A style guide holds every threshold, weight and comment rule the engine
//! applies. All fields are optional; an empty file yields the defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detect::{scorer_by_name, RuleSet, Severity};
use crate::error::{EngineError, EngineResult};
use crate::extract::UnitKind;

/// Name given to the rule synthesized from the top-level `min_length` and
/// `required_prefix` keys.
pub const LEGACY_RULE_NAME: &str = "global";

/// Top-level style guide definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StyleGuide {
    pub version: String,
    pub name: String,
    pub thresholds: Thresholds,
    /// Unit kinds that always need a comment, whatever their complexity.
    pub always_require: Vec<UnitKind>,
    /// "token_overlap" (default) or "jaccard"
    pub similarity_scorer: String,
    pub weights: WeightsConfig,
    /// Whether unattached comments produce OrphanComment findings.
    pub report_orphans: bool,
    /// Regexes for directive comments that are never reported as orphans.
    pub ignore_comment_patterns: Vec<String>,
    /// Glob patterns for paths to exclude when walking a directory.
    pub excluded_paths: Vec<String>,
    /// Minimum length of every comment.
    pub min_length: Option<usize>,
    /// Prefix every comment must start with.
    pub required_prefix: Option<String>,
    pub rules: RulesConfig,
}

impl Default for StyleGuide {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            name: String::new(),
            thresholds: Thresholds::default(),
            always_require: Vec::new(),
            similarity_scorer: "token_overlap".to_string(),
            weights: WeightsConfig::default(),
            report_orphans: true,
            ignore_comment_patterns: default_ignore_patterns(),
            excluded_paths: vec![
                "**/vendor/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/target/**".to_string(),
                "**/.git/**".to_string(),
            ],
            min_length: None,
            required_prefix: None,
            rules: RulesConfig::default(),
        }
    }
}

fn default_ignore_patterns() -> Vec<String> {
    [
        r"^commentgate:",
        r"^!",
        r"-\*-.*-\*-",
        r"(?i)^\s*(?:vim?|ex):",
        r"^(?:noqa|type:\s*ignore|pylint:|mypy:|fmt:|isort:|pragma\b)",
        r"^(?:eslint|jshint|tslint|prettier-ignore|istanbul|@ts-|global\s)",
        r"^(?:nolint|NOLINT|go:|\+build)",
        r"^(?:#?region\b|#?endregion\b)",
        r"^(?:rustfmt::|clippy::|@formatter:|CHECKSTYLE|NOSONAR)",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Numeric thresholds.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// Complexity at which a complex block candidate becomes a unit.
    pub block_complexity: u32,
    /// Complexity at which an undocumented unit is reported.
    pub missing_complexity: u32,
    /// Semantic drift is reported below this similarity.
    pub similarity: f64,
    /// Aggregate score needed for a run to pass.
    pub min_score: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            block_complexity: 5,
            missing_complexity: 5,
            similarity: 0.1,
            min_score: 0.7,
        }
    }
}

/// Score penalty per finding category.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct WeightsConfig {
    pub missing_comment: f64,
    pub stale_strong: f64,
    pub style_violation: f64,
    pub stale_weak: f64,
    pub orphan_comment: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            missing_comment: 0.6,
            stale_strong: 0.4,
            style_violation: 0.2,
            stale_weak: 0.1,
            orphan_comment: 0.02,
        }
    }
}

impl WeightsConfig {
    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("missing_comment", self.missing_comment),
            ("stale_strong", self.stale_strong),
            ("style_violation", self.style_violation),
            ("stale_weak", self.stale_weak),
            ("orphan_comment", self.orphan_comment),
        ]
    }
}

/// Comment rules per unit kind; `all` applies to every kind.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RulesConfig {
    pub function: Vec<StyleRule>,
    pub method: Vec<StyleRule>,
    pub class: Vec<StyleRule>,
    pub complex_block: Vec<StyleRule>,
    pub all: Vec<StyleRule>,
}

impl RulesConfig {
    /// Rules scoped to exactly `kind` (not including `all`).
    pub fn for_kind(&self, kind: UnitKind) -> &[StyleRule] {
        match kind {
            UnitKind::Function => &self.function,
            UnitKind::Method => &self.method,
            UnitKind::Class => &self.class,
            UnitKind::ComplexBlock => &self.complex_block,
        }
    }
}

/// When a rule applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    #[default]
    Always,
    HasParameters,
    HasReturn,
}

/// A declarative comment requirement.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StyleRule {
    pub name: Option<String>,
    /// Regex the comment text must match.
    pub pattern: Option<String>,
    /// Regex the comment text must not match.
    pub forbidden_pattern: Option<String>,
    /// Section headers (e.g. "Returns:") that must appear on a line of
    /// their own, case-insensitively.
    pub required_sections: Vec<String>,
    pub required_prefix: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub when: RuleCondition,
    pub severity: Option<Severity>,
    pub description: Option<String>,
}

impl StyleGuide {
    /// Parse a style guide from a YAML file, or JSON for `.json` paths.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let result = if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        };
        result.map_err(|e| match e {
            EngineError::Config(msg) => {
                EngineError::Config(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> EngineResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn from_json(content: &str) -> EngineResult<Self> {
        serde_json::from_str(content).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Rule synthesized from the top-level `min_length` / `required_prefix`.
    pub fn legacy_rule(&self) -> Option<StyleRule> {
        if self.min_length.is_none() && self.required_prefix.is_none() {
            return None;
        }
        Some(StyleRule {
            name: Some(LEGACY_RULE_NAME.to_string()),
            min_length: self.min_length,
            required_prefix: self.required_prefix.clone(),
            ..StyleRule::default()
        })
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }
        let path_str = path.to_string_lossy();
        self.excluded_paths.iter().any(|pattern| {
            globset::Glob::new(pattern)
                .map(|g| g.compile_matcher().is_match(&*path_str))
                .unwrap_or(false)
        })
    }

    /// Reject guides the engine cannot run with.
    pub fn validate(&self) -> EngineResult<()> {
        let t = &self.thresholds;
        if t.block_complexity < 1 {
            return Err(EngineError::Config(
                "thresholds.block_complexity must be at least 1".to_string(),
            ));
        }
        if t.missing_complexity < 1 {
            return Err(EngineError::Config(
                "thresholds.missing_complexity must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&t.similarity) {
            return Err(EngineError::Config(format!(
                "thresholds.similarity must be within [0, 1], got {}",
                t.similarity
            )));
        }
        if !(0.0..=1.0).contains(&t.min_score) {
            return Err(EngineError::Config(format!(
                "thresholds.min_score must be within [0, 1], got {}",
                t.min_score
            )));
        }

        for (name, weight) in self.weights.entries() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EngineError::Config(format!(
                    "weights.{} must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        scorer_by_name(&self.similarity_scorer)?;
        RuleSet::compile(self)?;

        for pattern in &self.ignore_comment_patterns {
            regex::Regex::new(pattern).map_err(|e| {
                EngineError::Config(format!("invalid ignore_comment_patterns entry {:?}: {}", pattern, e))
            })?;
        }

        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern).map_err(|e| {
                EngineError::Config(format!("invalid excluded_paths pattern {:?}: {}", pattern, e))
            })?;
        }

        Ok(())
    }
}
