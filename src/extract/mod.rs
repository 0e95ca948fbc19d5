//! Structural extraction of functions, methods, classes and complex blocks.
//!
//! Each supported grammar is wrapped in a [`LanguageFrontend`]; all of
//! them share the table-driven walker in [`treesitter`].

pub mod languages;
pub mod treesitter;
mod units;

pub use treesitter::{GrammarSpec, TreeSitterFrontend};
pub use units::{BodyFingerprint, CodeUnit, LineIndex, Span, UnitId, UnitKind, UnitTree};

#[cfg(test)]
pub(crate) use units::test_support;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::comments::CommentSyntax;
use crate::error::EngineResult;

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Rust,
    Go,
    JavaScript,
    TypeScript,
    Java,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Python,
        Language::Rust,
        Language::Go,
        Language::JavaScript,
        Language::TypeScript,
        Language::Java,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
        }
    }

    /// Language for a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyi" => Some(Language::Python),
            "rs" => Some(Language::Rust),
            "go" => Some(Language::Go),
            "js" | "jsx" | "mjs" | "cjs" => Some(Language::JavaScript),
            "ts" | "tsx" | "mts" | "cts" => Some(Language::TypeScript),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a language places the documentation of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocPlacement {
    /// First statement of the body (Python docstrings).
    Inside,
    /// Directly above the declaration.
    Before,
}

/// A parser front end for one language.
///
/// # Thread Safety
///
/// `tree_sitter::Parser` is not `Sync`, so implementations create a parser
/// per call and keep only immutable grammar tables.
pub trait LanguageFrontend: Send + Sync {
    fn language(&self) -> Language;

    /// File extensions this front end handles (without dot).
    fn extensions(&self) -> &'static [&'static str];

    fn comment_syntax(&self) -> &'static CommentSyntax;

    fn doc_placement(&self) -> DocPlacement;

    /// Parse `source` into an arena of candidate units.
    ///
    /// Returns [`crate::EngineError::Parse`] when the grammar reports any
    /// error or missing node.
    fn extract(&self, path: &str, source: &str) -> EngineResult<UnitTree>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_from_path() {
        assert_eq!(Language::from_path(Path::new("a/b.py")), Some(Language::Python));
        assert_eq!(Language::from_path(Path::new("x.tsx")), Some(Language::TypeScript));
        assert_eq!(Language::from_path(Path::new("Main.java")), Some(Language::Java));
        assert_eq!(Language::from_path(Path::new("README.md")), None);
        assert_eq!(Language::from_path(Path::new("Makefile")), None);
    }
}
