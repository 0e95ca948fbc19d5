//! Recorded body and comment digests from an earlier run.
//!
//! A baseline lets the drift detector notice code that changed while its
//! comment stayed the same. Units are keyed by kind, qualified name and
//! ordinal so that keys survive edits elsewhere in the file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::extract::{UnitKind, UnitTree};
use crate::score::Report;

const BASELINE_VERSION: u32 = 1;

/// Digests recorded for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    pub body_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_digest: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub version: u32,
    /// File path, then unit key.
    pub files: BTreeMap<String, BTreeMap<String, BaselineEntry>>,
}

impl Baseline {
    /// Record every unit of a report.
    pub fn from_report(report: &Report) -> Self {
        let files = report
            .files
            .iter()
            .filter(|f| !f.failed)
            .map(|f| {
                let units = f
                    .units
                    .iter()
                    .map(|u| {
                        (
                            u.key.clone(),
                            BaselineEntry {
                                body_digest: u.body_digest.clone(),
                                comment_digest: u.comment_digest.clone(),
                            },
                        )
                    })
                    .collect();
                (f.path.clone(), units)
            })
            .collect();
        Self {
            version: BASELINE_VERSION,
            files,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let baseline: Baseline = serde_json::from_str(&content)?;
        if baseline.version != BASELINE_VERSION {
            return Err(EngineError::Config(format!(
                "{}: unsupported baseline version {}",
                path.display(),
                baseline.version
            )));
        }
        Ok(baseline)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")?;
        Ok(())
    }

    pub fn entry(&self, path: &str, key: &str) -> Option<&BaselineEntry> {
        self.files.get(path).and_then(|units| units.get(key))
    }
}

/// Baseline keys of every unit, indexed by `UnitId`.
///
/// Names are qualified by enclosing named units (`Cart.add`); complex
/// blocks take the qualified name of the unit that contains them. The
/// ordinal separates units with the same kind and name.
pub fn unit_keys(tree: &UnitTree) -> Vec<String> {
    let mut seen: BTreeMap<(UnitKind, String), usize> = BTreeMap::new();
    tree.iter()
        .map(|unit| {
            let mut names = Vec::new();
            if !unit.identifier.is_empty() {
                names.push(unit.identifier.as_str());
            }
            let mut ancestor = unit.parent.and_then(|p| tree.get(p));
            while let Some(a) = ancestor {
                if !a.identifier.is_empty() {
                    names.push(a.identifier.as_str());
                }
                ancestor = a.parent.and_then(|p| tree.get(p));
            }
            names.reverse();
            let name = names.join(".");

            let ordinal = seen.entry((unit.kind, name.clone())).or_insert(0);
            let key = format!("{}:{}#{}", unit.kind, name, ordinal);
            *ordinal += 1;
            key
        })
        .collect()
}
