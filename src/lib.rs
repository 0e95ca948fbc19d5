//! Commentgate - comment quality gate.
//!
//! Commentgate checks that complex code is documented, that comments still
//! describe the code they sit on, and that they follow a style guide. Each
//! file yields a score in [0, 1]; the run passes when the complexity
//! weighted aggregate reaches the guide's `min_score`.
//!
//! # Architecture
//!
//! - `extract`: tree-sitter front ends producing a tree of code units
//! - `comments`: comment lexer driven by per-language syntax tables
//! - `attach`: binds comments to the units they document
//! - `detect`: complexity promotion, style rules, drift and suppressions
//! - `score`: unit, file and run scores
//! - `engine`: the per-file pipeline and the parallel driver
//! - `report`: pretty, JSON and SARIF output
//!
//! # Adding a New Language
//!
//! Add a `GrammarSpec` table in `src/extract/languages/` and register it in
//! `languages/mod.rs`.

pub mod attach;
pub mod baseline;
pub mod cli;
pub mod comments;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod extract;
pub mod report;
pub mod score;
pub mod text;

pub use attach::{resolve, AttachRule, Attachment, Resolution};
pub use baseline::{Baseline, BaselineEntry};
pub use comments::{locate, CommentSyntax, RawComment};
pub use config::{StyleGuide, StyleRule};
pub use detect::{Category, Finding, Severity};
pub use engine::{CancellationToken, Engine, SourceFile};
pub use error::{EngineError, EngineResult};
pub use extract::{CodeUnit, Language, LanguageFrontend, UnitId, UnitKind, UnitTree};
pub use score::{FileReport, QualityScore, Report};
