//! Output formatting for commentgate results.
//!
//! Supports three output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use colored::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::Path;

use crate::detect::{rules, Finding, Severity, SuppressedFinding, SuppressionType};
use crate::score::Report;

// =============================================================================
// JSON Format
// =============================================================================

#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub config: String,
    pub score: f64,
    pub grade: String,
    pub min_score: f64,
    pub passed: bool,
    pub files_scanned: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub cancelled: bool,
    #[serde(default)]
    pub skipped: usize,
    pub findings: Vec<Finding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppressed: Vec<SuppressedFinding>,
    pub suppressed_count: usize,
    /// Finding counts by category.
    pub breakdown: BTreeMap<String, usize>,
    pub files: Vec<JsonFile>,
}

/// Per-file summary.
#[derive(Serialize, Deserialize)]
pub struct JsonFile {
    pub path: String,
    pub language: String,
    pub score: f64,
    pub grade: String,
    pub units: usize,
    pub documented: usize,
    pub findings: usize,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

/// Write results in JSON format.
pub fn write_json<W: Write>(
    out: &mut W,
    path: &str,
    config_path: &str,
    report: &Report,
) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&build_json(path, config_path, report))?;
    writeln!(out, "{}", json)?;
    Ok(())
}

/// Build the JSON document for a report.
pub fn build_json(path: &str, config_path: &str, report: &Report) -> JsonReport {
    let findings: Vec<Finding> = report.findings().cloned().collect();
    let suppressed: Vec<SuppressedFinding> = report
        .files
        .iter()
        .flat_map(|f| f.suppressed.iter().cloned())
        .collect();

    let mut breakdown = BTreeMap::new();
    for file in &report.files {
        for (category, count) in &file.quality.breakdown {
            *breakdown.entry(category.clone()).or_insert(0) += count;
        }
    }

    let files = report
        .files
        .iter()
        .map(|f| JsonFile {
            path: f.path.clone(),
            language: f.language.to_string(),
            score: f.quality.score,
            grade: f.quality.grade.clone(),
            units: f.units.len(),
            documented: f.units.iter().filter(|u| u.documented).count(),
            findings: f.quality.findings.len(),
            failed: f.failed,
        })
        .collect();

    JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        config: config_path.to_string(),
        score: report.aggregate_score,
        grade: report.grade.clone(),
        min_score: report.min_score,
        passed: report.passed,
        files_scanned: report.files.len(),
        cancelled: report.cancelled,
        skipped: report.skipped,
        suppressed_count: suppressed.len(),
        findings,
        suppressed,
        breakdown,
        files,
    }
}

// =============================================================================
// SARIF Format
// =============================================================================

const SARIF_VERSION: &str = "2.1.0";
const SARIF_SCHEMA: &str = "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json";
const TOOL_NAME: &str = "commentgate";
const INFO_URI: &str = "https://github.com/commentgate/commentgate";

#[derive(Serialize, Deserialize)]
struct SarifReport {
    version: String,
    #[serde(rename = "$schema")]
    schema: String,
    runs: Vec<SarifRun>,
}

#[derive(Serialize, Deserialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Serialize, Deserialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Serialize, Deserialize)]
struct SarifDriver {
    name: String,
    version: String,
    #[serde(rename = "informationUri")]
    information_uri: String,
    rules: Vec<SarifRule>,
}

#[derive(Serialize, Deserialize)]
struct SarifRule {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: SarifMessage,
    #[serde(rename = "fullDescription", skip_serializing_if = "Option::is_none")]
    full_description: Option<SarifMessage>,
    #[serde(rename = "helpUri", skip_serializing_if = "Option::is_none")]
    help_uri: Option<String>,
    #[serde(rename = "defaultConfiguration")]
    default_config: SarifRuleConfig,
}

#[derive(Serialize, Deserialize)]
struct SarifRuleConfig {
    level: String,
}

#[derive(Serialize, Deserialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Serialize, Deserialize)]
struct SarifMessage {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct SarifLocation {
    #[serde(rename = "physicalLocation")]
    physical_location: SarifPhysicalLocation,
}

#[derive(Serialize, Deserialize)]
struct SarifPhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: SarifArtifact,
    region: SarifRegion,
}

#[derive(Serialize, Deserialize)]
struct SarifArtifact {
    uri: String,
}

#[derive(Serialize, Deserialize)]
struct SarifRegion {
    #[serde(rename = "startLine")]
    start_line: usize,
}

/// Rule metadata for SARIF output.
struct RuleInfo {
    name: String,
    short_description: &'static str,
    full_description: &'static str,
    help_uri: &'static str,
    default_level: &'static str,
}

fn get_rule_info(rule_id: &str) -> RuleInfo {
    let info = |name: &str, short, full, help_uri, default_level| RuleInfo {
        name: name.to_string(),
        short_description: short,
        full_description: full,
        help_uri,
        default_level,
    };
    match rule_id {
        rules::MISSING_COMMENT => info(
            "MissingComment",
            "Complex or required code unit has no comment",
            "A function, method, class or complex block whose complexity reaches the configured threshold, or whose kind always requires documentation, has no attached comment.",
            "#missing-comments",
            "error",
        ),
        rules::SIGNATURE_DRIFT => info(
            "SignatureDrift",
            "Comment refers to names that no longer exist",
            "The comment documents a parameter or mentions an identifier that appears in neither the unit's signature nor its body, which usually means the code was renamed without updating the comment.",
            "#drift",
            "error",
        ),
        rules::SEMANTIC_DRIFT => info(
            "SemanticDrift",
            "Comment shares little vocabulary with its code",
            "The similarity between the comment's content words and the unit's signature and body fell below the configured threshold.",
            "#drift",
            "warning",
        ),
        rules::BASELINE_DRIFT => info(
            "BaselineDrift",
            "Code changed since the baseline but its comment did not",
            "The unit's body fingerprint differs from the recorded baseline while the attached comment is byte-for-byte unchanged.",
            "#baselines",
            "warning",
        ),
        rules::ORPHAN_COMMENT => info(
            "OrphanComment",
            "Comment is not attached to any code unit",
            "The comment is neither a doc comment nor directly above a unit. It may be dead documentation or separated from its code by a blank line.",
            "#attachment",
            "note",
        ),
        rules::MALFORMED_COMMENT => info(
            "MalformedComment",
            "Block comment is never closed",
            "A block comment opener has no matching terminator before the end of the file.",
            "#malformed-comments",
            "error",
        ),
        rules::PARSE_ERROR => info(
            "ParseError",
            "File could not be parsed",
            "The file contains syntax the language grammar rejects, so no code units could be extracted.",
            "#parse-errors",
            "error",
        ),
        other => info(
            &pascal_case(other),
            "Comment violates a style guide rule",
            "The attached comment fails a requirement of a style rule configured in the style guide.",
            "#style-rules",
            "warning",
        ),
    }
}

fn pascal_case(id: &str) -> String {
    id.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect()
}

fn map_severity_to_level(severity: &Severity) -> &'static str {
    match severity {
        Severity::Fatal | Severity::High => "error",
        Severity::Medium | Severity::Low => "warning",
        Severity::Info => "note",
    }
}

fn make_relative_path(file_path: &str, base_path: &Path) -> String {
    if base_path.to_string_lossy().is_empty() {
        return file_path.to_string();
    }

    let file = Path::new(file_path);

    // Single file scan
    if file == base_path {
        return file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string());
    }

    file.strip_prefix(base_path)
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_else(|_| file_path.to_string())
}

/// Write results in SARIF format.
pub fn write_sarif<W: Write>(out: &mut W, base_path: &Path, report: &Report) -> anyhow::Result<()> {
    let rule_ids: BTreeSet<&str> = report.findings().map(|f| f.rule.as_str()).collect();

    let rules: Vec<SarifRule> = rule_ids
        .iter()
        .map(|rule_id| {
            let info = get_rule_info(rule_id);
            SarifRule {
                id: rule_id.to_string(),
                name: info.name,
                short_description: SarifMessage {
                    text: info.short_description.to_string(),
                },
                full_description: Some(SarifMessage {
                    text: info.full_description.to_string(),
                }),
                help_uri: Some(format!("{}{}", INFO_URI, info.help_uri)),
                default_config: SarifRuleConfig {
                    level: info.default_level.to_string(),
                },
            }
        })
        .collect();

    let results: Vec<SarifResult> = report
        .findings()
        .map(|f| SarifResult {
            rule_id: f.rule.clone(),
            level: map_severity_to_level(&f.severity).to_string(),
            message: SarifMessage {
                text: f.message.clone(),
            },
            locations: vec![SarifLocation {
                physical_location: SarifPhysicalLocation {
                    artifact_location: SarifArtifact {
                        uri: make_relative_path(&f.file, base_path),
                    },
                    region: SarifRegion {
                        start_line: f.line.max(1),
                    },
                },
            }],
        })
        .collect();

    let sarif = SarifReport {
        version: SARIF_VERSION.to_string(),
        schema: SARIF_SCHEMA.to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: TOOL_NAME.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    information_uri: INFO_URI.to_string(),
                    rules,
                },
            },
            results,
        }],
    };

    let json = serde_json::to_string_pretty(&sarif)?;
    writeln!(out, "{}", json)?;
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty<W: Write>(
    out: &mut W,
    path: &str,
    config_path: &str,
    report: &Report,
    show_suppressed: bool,
) -> anyhow::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "  {} v{}",
        "commentgate".cyan().bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out)?;
    writeln!(out, "  {}{}", "Scanning: ".dimmed(), path)?;
    writeln!(out, "  {}{}", "Config:   ".dimmed(), config_path)?;
    writeln!(out)?;

    write_result_summary(out, report)?;
    writeln!(out)?;

    let findings: Vec<&Finding> = report.findings().collect();
    if !findings.is_empty() {
        write_findings(out, &findings)?;
        writeln!(out)?;
    }

    let suppressed: Vec<&SuppressedFinding> =
        report.files.iter().flat_map(|f| f.suppressed.iter()).collect();
    if !suppressed.is_empty() {
        write_suppressed_summary(out, &suppressed, show_suppressed)?;
        writeln!(out)?;
    }

    if !findings.is_empty() {
        write_breakdown(out, &findings)?;
        writeln!(out)?;
    }

    if report.files.len() > 1 {
        write_file_scores(out, report)?;
        writeln!(out)?;
    }

    write_final_status(out, report)?;
    writeln!(out)?;
    Ok(())
}

fn write_result_summary<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    if report.passed {
        write!(out, "  {}", "✓ PASS".green())?;
    } else {
        write!(out, "  {}", "✗ FAIL".red())?;
    }
    write!(
        out,
        "  Score: {}  Grade: {}",
        colored_score(report.aggregate_score),
        colored_grade(&report.grade)
    )?;

    let suppressed = report.total_suppressed();
    if suppressed > 0 {
        write!(out, "  {}", format!("({} suppressed)", suppressed).dimmed())?;
    }
    if report.cancelled {
        write!(
            out,
            "  {}",
            format!("(cancelled, {} files skipped)", report.skipped).yellow()
        )?;
    }
    writeln!(out)?;
    Ok(())
}

fn colored_score(score: f64) -> ColoredString {
    let text = format!("{:.2}", score);
    match calculate_band(score) {
        'A' => text.green().bold(),
        'B' => text.green(),
        'C' => text.yellow(),
        'D' => text.yellow().bold(),
        _ => text.red(),
    }
}

fn calculate_band(score: f64) -> char {
    crate::score::calculate_grade(score).chars().next().unwrap_or('F')
}

fn colored_grade(grade: &str) -> ColoredString {
    match grade {
        "A" => grade.green().bold(),
        "B" => grade.green(),
        "C" => grade.yellow(),
        "D" => grade.yellow().bold(),
        _ => grade.red(),
    }
}

fn write_findings<W: Write>(out: &mut W, findings: &[&Finding]) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Findings".bold(), findings.len())?;
    writeln!(out)?;

    for f in findings {
        write!(out, "    {} ", severity_tag(&f.severity))?;
        write!(out, "  {}", format!("{:<20}", f.rule).dimmed())?;
        write!(out, "{}", f.file.blue())?;
        if f.line > 0 {
            write!(out, "{}", format!(":{}", f.line).dimmed())?;
        }
        writeln!(out)?;
        writeln!(out, "            {}", f.message)?;
        writeln!(out)?;
    }
    Ok(())
}

fn severity_tag(severity: &Severity) -> ColoredString {
    match severity {
        Severity::Fatal => "FATAL".red().bold(),
        Severity::High => "HIGH ".red(),
        Severity::Medium => "MED  ".yellow(),
        Severity::Low => "LOW  ".yellow(),
        Severity::Info => "INFO ".blue(),
    }
}

fn write_breakdown<W: Write>(out: &mut W, findings: &[&Finding]) -> anyhow::Result<()> {
    writeln!(out, "  {}", "Breakdown:".bold())?;

    let mut counts: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for f in findings {
        let entry = counts.entry(f.category.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += f.weight;
    }

    // Heaviest penalty first
    let mut rows: Vec<(&str, (usize, f64))> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1 .1.total_cmp(&a.1 .1).then(a.0.cmp(b.0)));

    for (category, (count, penalty)) in rows {
        let plural = if count != 1 { "s" } else { "" };
        writeln!(
            out,
            "    {:<18} {:>3} finding{:<2} {:>6.2} penalty",
            category, count, plural, penalty
        )?;
    }
    Ok(())
}

fn write_file_scores<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    writeln!(out, "  {}", "Files:".bold())?;
    for file in &report.files {
        let documented = file.units.iter().filter(|u| u.documented).count();
        write!(
            out,
            "    {}  {}  ",
            colored_score(file.quality.score),
            colored_grade(&file.quality.grade)
        )?;
        write!(out, "{}", file.path.blue())?;
        if file.failed {
            write!(out, "  {}", "(parse error)".red())?;
        } else {
            write!(
                out,
                "  {}",
                format!("({}/{} units documented)", documented, file.units.len()).dimmed()
            )?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_final_status<W: Write>(out: &mut W, report: &Report) -> anyhow::Result<()> {
    write!(
        out,
        "  {}",
        format!("Min score: {:.2}", report.min_score).dimmed()
    )?;
    write!(out, "  Score: {}  ", colored_score(report.aggregate_score))?;
    if report.passed {
        write!(out, "{}", "PASSED".green())?;
    } else {
        write!(out, "{}", "FAILED".red())?;
    }
    writeln!(out)?;
    Ok(())
}

fn write_suppressed_summary<W: Write>(
    out: &mut W,
    suppressed: &[&SuppressedFinding],
    show_details: bool,
) -> anyhow::Result<()> {
    writeln!(out, "  {} ({}):", "Suppressed".dimmed(), suppressed.len())?;

    if !show_details {
        writeln!(out, "    {}", "(use --show-suppressed to see details)".dimmed())?;
        return Ok(());
    }

    writeln!(out)?;
    for sf in suppressed {
        let f = &sf.finding;
        let s = &sf.suppression;

        write!(out, "    {}", format!("{:<20}", f.rule).dimmed())?;
        write!(out, "{}", f.file.blue())?;
        if s.suppression_type == SuppressionType::File {
            write!(out, "{}", ":* (file)".dimmed())?;
        } else if f.line > 0 {
            write!(out, "{}", format!(":{}", f.line).dimmed())?;
        }
        writeln!(out)?;

        if !s.reason.is_empty() {
            writeln!(out, "            {}", format!("reason: {:?}", s.reason).dimmed())?;
        }
    }
    Ok(())
}
