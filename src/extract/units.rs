//! Normalized structural model shared by every language front end.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Source location span with byte offsets and line/column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (0-indexed).
    pub start_byte: usize,
    /// End byte offset (0-indexed, exclusive).
    pub end_byte: usize,
    /// Start line (1-indexed).
    pub start_line: usize,
    /// Start column (1-indexed, in bytes).
    pub start_col: usize,
    /// End line (1-indexed).
    pub end_line: usize,
    /// End column (1-indexed, in bytes).
    pub end_col: usize,
}

impl Span {
    /// Create a span from a tree-sitter node.
    pub fn from_node(node: tree_sitter::Node) -> Self {
        let start = node.start_position();
        let end = node.end_position();
        Self {
            start_byte: node.start_byte(),
            end_byte: node.end_byte(),
            start_line: start.row + 1, // tree-sitter is 0-indexed
            start_col: start.column + 1,
            end_line: end.row + 1,
            end_col: end.column + 1,
        }
    }

    /// Span covering `other` from its start to the end of `self`.
    pub fn extend_from(&self, other: &Span) -> Span {
        Span {
            start_byte: other.start_byte,
            start_line: other.start_line,
            start_col: other.start_col,
            ..*self
        }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Maps byte offsets of a source text to 1-indexed line/column pairs.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { line_starts }
    }

    /// Line and column (both 1-indexed) of a byte offset.
    pub fn position(&self, byte: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&byte) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (line + 1, byte - self.line_starts[line] + 1)
    }

    /// Span for a byte range.
    pub fn span(&self, start_byte: usize, end_byte: usize) -> Span {
        let (start_line, start_col) = self.position(start_byte);
        let (end_line, end_col) = self.position(end_byte);
        Span {
            start_byte,
            end_byte,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Byte offset at which a 1-indexed line starts.
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.line_starts.get(line.checked_sub(1)?).copied()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Index of a unit in its file's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub usize);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Kind of structural unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Function,
    Method,
    Class,
    ComplexBlock,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Function => "function",
            UnitKind::Method => "method",
            UnitKind::Class => "class",
            UnitKind::ComplexBlock => "complex_block",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(UnitKind::Function),
            "method" => Some(UnitKind::Method),
            "class" => Some(UnitKind::Class),
            "complex_block" => Some(UnitKind::ComplexBlock),
            _ => None,
        }
    }

    /// Check if this is a callable (function or method).
    pub fn is_callable(&self) -> bool {
        matches!(self, UnitKind::Function | UnitKind::Method)
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Digest and word multiset of a unit body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyFingerprint {
    /// Hex SHA-256 of the ordered body token sequence.
    pub digest: String,
    /// Stemmed lowercase words of the body, with multiplicity.
    pub tokens: BTreeMap<String, u32>,
}

/// A function, method, class or complex block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeUnit {
    pub id: UnitId,
    pub kind: UnitKind,
    /// Declared name; empty for complex blocks.
    pub identifier: String,
    /// Covers decorators and attributes attached to the declaration.
    pub span: Span,
    pub signature_text: String,
    pub parameters: Vec<String>,
    pub has_return: bool,
    pub body_fingerprint: BodyFingerprint,
    /// Line of the first non-comment statement of the body.
    pub body_first_line: Option<usize>,
    /// Line where the body's leading docstring statement starts.
    pub docstring_line: Option<usize>,
    /// Byte range of the body's only statement, when there is exactly one.
    #[serde(skip)]
    pub sole_statement: Option<(usize, usize)>,
    /// Decision points counted in this unit's own body.
    #[serde(skip)]
    pub branch_points: u32,
    pub complexity: u32,
    /// Unpromoted complex block candidate.
    #[serde(skip)]
    pub candidate: bool,
    pub parent: Option<UnitId>,
    pub children: Vec<UnitId>,
}

impl CodeUnit {
    pub fn start_line(&self) -> usize {
        self.span.start_line
    }

    /// Display label, e.g. `function parse_args` or `complex_block at line 12`.
    pub fn label(&self) -> String {
        if self.identifier.is_empty() {
            format!("{} at line {}", self.kind, self.span.start_line)
        } else {
            format!("{} {}", self.kind, self.identifier)
        }
    }
}

/// Arena of units for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnitTree {
    pub units: Vec<CodeUnit>,
    pub roots: Vec<UnitId>,
}

impl UnitTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: UnitId) -> Option<&CodeUnit> {
        self.units.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CodeUnit> {
        self.units.iter()
    }

    pub fn children(&self, id: UnitId) -> impl Iterator<Item = &CodeUnit> {
        self.get(id)
            .into_iter()
            .flat_map(move |u| u.children.iter().filter_map(move |c| self.get(*c)))
    }

    pub fn parent(&self, id: UnitId) -> Option<&CodeUnit> {
        self.get(id)?.parent.and_then(|p| self.get(p))
    }

    /// Verify parent links, child containment, and sibling ordering.
    pub fn check_invariants(&self) -> EngineResult<()> {
        for (index, unit) in self.units.iter().enumerate() {
            if unit.id.0 != index {
                return Err(EngineError::InternalInvariant(format!(
                    "unit at index {} carries id {}",
                    index, unit.id
                )));
            }
            for child_id in &unit.children {
                let child = self.get(*child_id).ok_or_else(|| {
                    EngineError::InternalInvariant(format!("dangling child {}", child_id))
                })?;
                if child.parent != Some(unit.id) {
                    return Err(EngineError::InternalInvariant(format!(
                        "{} lists {} as child but parent link disagrees",
                        unit.id, child.id
                    )));
                }
                if !unit.span.contains(&child.span) {
                    return Err(EngineError::InternalInvariant(format!(
                        "{} ({}) escapes parent {} ({})",
                        child.label(),
                        child.span,
                        unit.label(),
                        unit.span
                    )));
                }
            }
            self.check_siblings(&unit.children)?;
        }
        self.check_siblings(&self.roots)?;
        for root in &self.roots {
            if self.get(*root).and_then(|u| u.parent).is_some() {
                return Err(EngineError::InternalInvariant(format!(
                    "root {} has a parent",
                    root
                )));
            }
        }
        Ok(())
    }

    fn check_siblings(&self, ids: &[UnitId]) -> EngineResult<()> {
        for pair in ids.windows(2) {
            let (a, b) = match (self.get(pair[0]), self.get(pair[1])) {
                (Some(a), Some(b)) => (a, b),
                _ => {
                    return Err(EngineError::InternalInvariant(
                        "dangling sibling reference".to_string(),
                    ))
                }
            };
            if a.span.start_byte > b.span.start_byte || a.span.overlaps(&b.span) {
                return Err(EngineError::InternalInvariant(format!(
                    "siblings {} and {} overlap or are out of order",
                    a.label(),
                    b.label()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a unit with the given kind and line range for tree tests.
    pub fn unit(id: usize, kind: UnitKind, name: &str, start: usize, end: usize) -> CodeUnit {
        CodeUnit {
            id: UnitId(id),
            kind,
            identifier: name.to_string(),
            span: Span {
                start_byte: start * 100,
                end_byte: end * 100 + 50,
                start_line: start,
                start_col: 1,
                end_line: end,
                end_col: 1,
            },
            signature_text: String::new(),
            parameters: Vec::new(),
            has_return: false,
            body_fingerprint: BodyFingerprint::default(),
            body_first_line: Some(start + 1),
            docstring_line: None,
            sole_statement: None,
            branch_points: 0,
            complexity: 1,
            candidate: false,
            parent: None,
            children: Vec::new(),
        }
    }
}
