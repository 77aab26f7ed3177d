use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{Control, ControlCatalog, ImplementationRecord};

pub mod gap_analyzer;

/// Totals derived from a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GapCounts {
    pub total: usize,
    pub implemented: usize,
    pub gaps: usize,
}

impl GapCounts {
    /// Share of catalog controls marked implemented (0.0–100.0).
    pub fn coverage_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.implemented as f64 / self.total as f64 * 100.0
    }
}

/// Non-fatal observations surfaced alongside a gap result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    UnknownControl { id: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownControl { id } => write!(
                f,
                "implementation record references unknown control `{id}`"
            ),
        }
    }
}

/// Outcome of comparing a control catalog against an implementation record.
///
/// `implemented` and `gaps` partition the catalog and keep catalog order;
/// `unknown` keeps record order and never overlaps the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapResult {
    pub implemented: Vec<Control>,
    pub gaps: Vec<Control>,
    pub unknown: Vec<String>,
    pub counts: GapCounts,
}

impl GapResult {
    pub fn has_gaps(&self) -> bool {
        !self.gaps.is_empty()
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.unknown
            .iter()
            .map(|id| Warning::UnknownControl { id: id.clone() })
            .collect()
    }
}

/// Split the catalog into implemented controls and gaps.
///
/// A control missing from the record counts as a gap, the same as an explicit
/// `false`. Record entries naming controls outside the catalog are collected
/// in `unknown` and excluded from the counts.
pub fn reconcile(catalog: &ControlCatalog, record: &ImplementationRecord) -> GapResult {
    let (implemented, gaps): (Vec<Control>, Vec<Control>) = catalog
        .iter()
        .cloned()
        .partition(|control| record.status(&control.id).unwrap_or(false));

    let unknown: Vec<String> = record
        .iter()
        .filter(|(id, _)| !catalog.contains(id))
        .map(|(id, _)| id.to_string())
        .collect();

    let counts = GapCounts {
        total: implemented.len() + gaps.len(),
        implemented: implemented.len(),
        gaps: gaps.len(),
    };

    GapResult {
        implemented,
        gaps,
        unknown,
        counts,
    }
}
