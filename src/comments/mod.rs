//! Lexical comment location.
//!
//! Comments are found by a single pass over the raw text rather than from
//! the syntax tree, so that docstrings, merged line-comment runs, and
//! malformed block comments are handled identically across languages.

mod lexer;

pub use lexer::locate;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::extract::Span;

/// Prefix shared by every inline directive understood by the engine.
pub const DIRECTIVE_PREFIX: &str = "commentgate:";

/// Lexical comment and string rules for one language.
#[derive(Debug, Clone)]
pub struct CommentSyntax {
    /// Plain line comment markers, e.g. `//` or `#`.
    pub line_markers: &'static [&'static str],
    /// Line markers that introduce documentation, longest first.
    pub doc_line_markers: &'static [&'static str],
    /// Markers that look like doc markers but are plain comments (`////`).
    pub plain_overrides: &'static [&'static str],
    /// Block comment delimiters.
    pub block: Option<(&'static str, &'static str)>,
    /// Block openers that introduce documentation (`/**`, `/*!`).
    pub doc_block_openers: &'static [&'static str],
    /// Markers for docs describing the enclosing item (`//!`, `/*!`).
    pub inner_doc_markers: &'static [&'static str],
    pub nested_blocks: bool,
    /// Single-character string delimiters.
    pub string_quotes: &'static [u8],
    /// `'` may open a lifetime rather than a char literal.
    pub lifetimes: bool,
    /// Triple-quoted strings (`"""`, and `'''` when `'` is a quote).
    pub triple_quotes: bool,
    /// Rust raw strings `r#"..."#`.
    pub raw_strings: bool,
    /// Backtick strings (Go raw strings, JS template literals).
    pub backtick_strings: bool,
    /// Backslash escapes inside backtick strings.
    pub backtick_escapes: bool,
    /// Plain strings may span lines.
    pub multiline_strings: bool,
    /// Standalone triple-quoted strings are documentation.
    pub docstrings: bool,
    /// `/` may open a regular expression literal (JavaScript).
    pub regex_literals: bool,
}

/// Syntactic form of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentForm {
    LineComment,
    BlockComment,
    DocComment,
}

impl CommentForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentForm::LineComment => "line_comment",
            CommentForm::BlockComment => "block_comment",
            CommentForm::DocComment => "doc_comment",
        }
    }
}

impl fmt::Display for CommentForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Index of a comment in its file's comment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub usize);

/// A located comment with its markers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComment {
    pub id: CommentId,
    /// Normalized text without comment markers.
    pub text: String,
    pub span: Span,
    pub form: CommentForm,
    /// Only whitespace precedes the comment on its first line and nothing
    /// but whitespace follows it on its last line.
    pub own_line: bool,
    /// Documents the enclosing item (`//!`, `/*!`).
    pub inner: bool,
    /// Opening marker as written.
    pub marker: &'static str,
}

impl RawComment {
    pub fn start_line(&self) -> usize {
        self.span.start_line
    }

    pub fn end_line(&self) -> usize {
        self.span.end_line
    }

    /// Directive payload when the comment is an inline directive.
    pub fn directive(&self) -> Option<&str> {
        self.text.trim_start().strip_prefix(DIRECTIVE_PREFIX)
    }
}

/// A block comment that never closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedComment {
    pub span: Span,
}

impl MalformedComment {
    pub fn to_error(&self) -> EngineError {
        EngineError::MalformedComment {
            line: self.span.start_line,
            column: self.span.start_col,
        }
    }
}

/// Output of [`locate`].
#[derive(Debug, Clone, Default)]
pub struct LocatedComments {
    pub comments: Vec<RawComment>,
    pub malformed: Vec<MalformedComment>,
}

impl LocatedComments {
    pub fn get(&self, id: CommentId) -> Option<&RawComment> {
        self.comments.get(id.0)
    }
}
