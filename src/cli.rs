//! Command-line interface for commentgate.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::baseline::Baseline;
use crate::config::StyleGuide;
use crate::engine::{Engine, SourceFile};
use crate::extract::Language;
use crate::report;
use crate::score::Report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Style guide file names searched for, in order.
const DEFAULT_CONFIG_NAMES: &[&str] = &[".commentgate.yaml", "commentgate.yaml", "commentgate.json"];

/// Comment quality gate - detect missing, stale, and off-style comments.
///
/// Commentgate parses source files, attaches comments to the functions,
/// methods, classes and complex blocks they document, and scores how well
/// the code is commented against a style guide.
#[derive(Parser)]
#[command(name = "commentgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check comment quality against a style guide
    #[command(visible_alias = "check")]
    Lint(LintArgs),
    /// Create a new style guide from a template
    Init(InitArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
    Sarif,
}

/// Arguments for the lint command.
#[derive(Parser)]
pub struct LintArgs {
    /// Path to check (file or directory)
    pub path: PathBuf,

    /// Path to style guide YAML or JSON file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Minimum passing score, overriding the style guide
    #[arg(short, long)]
    pub min_score: Option<f64>,

    /// Baseline file to compare unit bodies and comments against
    #[arg(short, long)]
    pub baseline: Option<PathBuf>,

    /// Record this run's digests to a baseline file
    #[arg(long)]
    pub write_baseline: Option<PathBuf>,

    /// Show suppressed findings in output
    #[arg(long)]
    pub show_suppressed: bool,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = ".commentgate.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "minimal")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// A style guide template shipped with the binary.
pub struct Template {
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

pub static TEMPLATES: &[Template] = &[
    Template {
        name: "minimal",
        description: "Missing comments and drift only, default thresholds",
        content: include_str!("templates/minimal.yaml"),
    },
    Template {
        name: "strict",
        description: "Lower complexity thresholds, documented classes, sentence rules",
        content: include_str!("templates/strict.yaml"),
    },
    Template {
        name: "google-docstrings",
        description: "Args: and Returns: sections for functions and methods",
        content: include_str!("templates/google-docstrings.yaml"),
    },
];

/// Find a style guide next to the scanned path, then in the current directory.
pub fn discover_config(scan_path: &Path) -> Option<PathBuf> {
    let scan_dir = if scan_path.is_dir() {
        Some(scan_path)
    } else {
        scan_path.parent().filter(|p| !p.as_os_str().is_empty())
    };

    let mut dirs = Vec::new();
    if let Some(dir) = scan_dir {
        dirs.push(dir.to_path_buf());
    }
    dirs.push(PathBuf::from("."));

    dirs.iter()
        .flat_map(|dir| DEFAULT_CONFIG_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Collect supported source files under `root`, honoring `excluded_paths`.
pub fn collect_files(root: &Path, guide: &StyleGuide) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            // Skip hidden directories, but not the root itself (".")
            if e.depth() > 0 && e.file_type().is_dir() && name.starts_with('.') {
                return false;
            }
            !guide.is_path_excluded(e.path())
        })
    {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if entry.file_type().is_file() && Language::from_path(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}

/// Read collected paths into source files.
pub fn load_sources(paths: &[PathBuf]) -> anyhow::Result<Vec<SourceFile>> {
    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(language) = Language::from_path(path) else {
            continue;
        };
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), "file is not valid UTF-8, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        };
        sources.push(SourceFile::new(
            path.to_string_lossy().replace('\\', "/"),
            text,
            language,
        ));
    }
    Ok(sources)
}

/// Run the lint command.
pub fn run_lint(args: &LintArgs) -> anyhow::Result<i32> {
    let config_path = match &args.config {
        Some(p) => Some(p.clone()),
        None => discover_config(&args.path),
    };

    let mut guide = match &config_path {
        Some(path) => {
            info!(config = %path.display(), "loading style guide");
            StyleGuide::parse_file(path)
                .with_context(|| format!("loading style guide {}", path.display()))?
        }
        None => {
            debug!("no style guide found, using defaults");
            StyleGuide::default()
        }
    };
    if let Some(min_score) = args.min_score {
        guide.thresholds.min_score = min_score;
    }

    let metadata = fs::metadata(&args.path)
        .with_context(|| format!("cannot access path {}", args.path.display()))?;

    let paths = if metadata.is_dir() {
        collect_files(&args.path, &guide)?
    } else if Language::from_path(&args.path).is_some() {
        vec![args.path.clone()]
    } else {
        anyhow::bail!("unsupported file type: {}", args.path.display());
    };

    if paths.is_empty() {
        eprintln!("Warning: no files to scan");
        return Ok(EXIT_SUCCESS);
    }
    debug!(files = paths.len(), "collected files");

    let sources = load_sources(&paths)?;

    let mut engine = Engine::new(guide).context("invalid style guide")?;
    if let Some(path) = &args.baseline {
        let baseline = Baseline::load(path)
            .with_context(|| format!("loading baseline {}", path.display()))?;
        engine = engine.with_baseline(baseline);
    }

    let report = engine.analyze_all(&sources)?;

    if let Some(path) = &args.write_baseline {
        Baseline::from_report(&report)
            .save(path)
            .with_context(|| format!("writing baseline {}", path.display()))?;
        info!(baseline = %path.display(), "baseline written");
    }

    let config_str = config_path
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "(defaults)".to_string());
    let path_str = args.path.to_string_lossy().to_string();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_report(&mut out, args, &path_str, &config_str, &report)?;
    out.flush()?;

    if report.passed {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILED)
    }
}

fn write_report<W: Write>(
    out: &mut W,
    args: &LintArgs,
    path: &str,
    config: &str,
    report: &Report,
) -> anyhow::Result<()> {
    match args.format {
        OutputFormat::Json => report::write_json(out, path, config, report),
        OutputFormat::Sarif => report::write_sarif(out, &args.path, report),
        OutputFormat::Pretty => report::write_pretty(out, path, config, report, args.show_suppressed),
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        return list_templates();
    }

    let template = match TEMPLATES.iter().find(|t| t.name == args.template) {
        Some(t) => t,
        None => {
            eprintln!("Error: unknown template {:?}", args.template);
            eprintln!("Run 'commentgate init --list' to see available templates");
            return Ok(EXIT_ERROR);
        }
    };

    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }

    fs::write(&args.output, template.content)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("Created {} from template '{}'", args.output.display(), template.name);
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to customize for your project", args.output.display());
    println!("  2. Run: commentgate lint . --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

fn list_templates() -> anyhow::Result<i32> {
    println!("Available templates:");
    println!();

    for template in TEMPLATES {
        let name = if template.name == "minimal" {
            format!("{} (default)", template.name)
        } else {
            template.name.to_string()
        };
        println!("  {:<20} {}", name, template.description);
    }

    println!();
    println!("Usage:");
    println!("  commentgate init --template <name>");

    Ok(EXIT_SUCCESS)
}
