//! Binding comments to the units they document.
//!
//! Every unit receives exactly one [`Attachment`]; every comment is used by
//! at most one. Candidate pairs are ranked by rule, distance, unit start
//! and comment start and assigned greedily, so the closest comment wins.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::comments::{CommentForm, CommentId, RawComment};
use crate::error::{EngineError, EngineResult};
use crate::extract::{DocPlacement, UnitId, UnitKind, UnitTree};

/// Which precedence rule bound a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachRule {
    /// Doc comment in the language's documentation position.
    DocPosition,
    /// Own-line comment ending on the line before the unit.
    Leading,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub unit: UnitId,
    pub comment: Option<CommentId>,
    pub rule: Option<AttachRule>,
}

/// Why a comment was left unattached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnattachedKind {
    /// Suppression directive, shebang, encoding line or lint pragma.
    Directive,
    /// Documentation of the file itself.
    ModuleDoc,
    Orphan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unattached {
    pub comment: CommentId,
    pub kind: UnattachedKind,
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One entry per unit, indexed by `UnitId`.
    pub attachments: Vec<Attachment>,
    pub unattached: Vec<Unattached>,
}

impl Resolution {
    pub fn attachment(&self, unit: UnitId) -> Option<&Attachment> {
        self.attachments.get(unit.0)
    }

    pub fn comment_for(&self, unit: UnitId) -> Option<CommentId> {
        self.attachment(unit).and_then(|a| a.comment)
    }

    pub fn orphans(&self) -> impl Iterator<Item = CommentId> + '_ {
        self.unattached
            .iter()
            .filter(|u| u.kind == UnattachedKind::Orphan)
            .map(|u| u.comment)
    }
}

struct Candidate {
    rule: AttachRule,
    distance: usize,
    unit: UnitId,
    unit_start: usize,
    unit_end: usize,
    comment: CommentId,
    comment_start: usize,
}

/// Attach comments to units.
///
/// Comments whose text matches one of `ignore` are directives: they never
/// attach and are never reported.
pub fn resolve(
    tree: &UnitTree,
    comments: &[RawComment],
    placement: DocPlacement,
    ignore: &[Regex],
) -> EngineResult<Resolution> {
    let directive: Vec<bool> = comments
        .iter()
        .map(|c| ignore.iter().any(|re| re.is_match(&c.text)))
        .collect();

    // Own-line comments by their last line, for walking runs upward.
    let by_end_line: BTreeMap<usize, &RawComment> = comments
        .iter()
        .filter(|c| c.own_line)
        .map(|c| (c.end_line(), c))
        .collect();

    let mut candidates = Vec::new();
    for unit in tree.iter() {
        let mut push = |rule, distance, comment: &RawComment| {
            candidates.push(Candidate {
                rule,
                distance,
                unit: unit.id,
                unit_start: unit.span.start_byte,
                unit_end: unit.span.end_byte,
                comment: comment.id,
                comment_start: comment.span.start_byte,
            })
        };
        let usable = |c: &RawComment| !directive[c.id.0] && !c.inner;
        let start_line = unit.span.start_line;

        if unit.kind != UnitKind::ComplexBlock {
            match placement {
                DocPlacement::Inside => {
                    if let Some(first) = unit.docstring_line {
                        for c in comments.iter().filter(|c| {
                            usable(c)
                                && c.form == CommentForm::DocComment
                                && c.start_line() == first
                                && unit.span.contains(&c.span)
                        }) {
                            push(AttachRule::DocPosition, 0, c);
                        }
                    }
                }
                DocPlacement::Before => {
                    let mut line = start_line;
                    while let Some(c) = line
                        .checked_sub(1)
                        .and_then(|l| by_end_line.get(&l))
                    {
                        if usable(c) && c.form == CommentForm::DocComment {
                            push(AttachRule::DocPosition, start_line - c.end_line(), c);
                            break;
                        }
                        line = c.start_line();
                    }
                }
            }
        }

        if let Some(c) = start_line.checked_sub(1).and_then(|l| by_end_line.get(&l)) {
            if usable(c) {
                push(AttachRule::Leading, 1, c);
            }
        }
    }

    candidates.sort_by_key(|c| {
        (
            c.rule,
            c.distance,
            c.unit_start,
            Reverse(c.unit_end),
            c.comment_start,
        )
    });

    let mut attachments: Vec<Attachment> = tree
        .iter()
        .map(|u| Attachment {
            unit: u.id,
            comment: None,
            rule: None,
        })
        .collect();
    let mut used: HashSet<CommentId> = HashSet::new();
    for candidate in candidates {
        let slot = &mut attachments[candidate.unit.0];
        if slot.comment.is_some() || used.contains(&candidate.comment) {
            continue;
        }
        slot.comment = Some(candidate.comment);
        slot.rule = Some(candidate.rule);
        used.insert(candidate.comment);
    }

    verify_unique(&attachments)?;

    let first_unit_line = tree
        .roots
        .first()
        .and_then(|r| tree.get(*r))
        .map(|u| u.span.start_line);
    let unattached = comments
        .iter()
        .filter(|c| !used.contains(&c.id))
        .map(|c| {
            let kind = if directive[c.id.0] {
                UnattachedKind::Directive
            } else if c.inner
                || (c.form == CommentForm::DocComment
                    && first_unit_line.map_or(true, |l| c.end_line() < l))
            {
                UnattachedKind::ModuleDoc
            } else {
                UnattachedKind::Orphan
            };
            Unattached {
                comment: c.id,
                kind,
            }
        })
        .collect();

    Ok(Resolution {
        attachments,
        unattached,
    })
}

fn verify_unique(attachments: &[Attachment]) -> EngineResult<()> {
    let mut seen = HashSet::new();
    for attachment in attachments {
        if let Some(comment) = attachment.comment {
            if !seen.insert(comment) {
                return Err(EngineError::InternalInvariant(format!(
                    "comment {} attached to more than one unit",
                    comment.0
                )));
            }
        }
    }
    Ok(())
}
