//! The "LINK" Engine - binds each cell to its progenitor one frame earlier.
//!
//! For every cell at timepoint `T` the lookup chain is flat and bounded:
//! 1. Direct name match in `T-1` (identity continuation)
//! 2. One resolver step (founder table or suffix strip), then a match in `T-1`
//! 3. Otherwise the cell is an orphan (`ancestor = None`)
//!
//! No cell's resolution depends on a sibling's, so link order inside a
//! timepoint only affects the order of each parent's `descendants`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::history::{Timepoint, TimepointIndex};
use crate::record::{CellRecord, CellRef, SnapshotRow};
use crate::resolver::{NameResolver, Resolution};

/// How a cell's ancestor was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    /// Same name present one frame earlier
    Identity,
    /// Founder table mapping
    Founder,
    /// Last character stripped
    Division,
}

/// Summary of linking one timepoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    /// Timepoint that was linked
    pub timepoint: usize,

    /// Number of records created
    pub cells: usize,

    pub identity_links: usize,
    pub founder_links: usize,
    pub division_links: usize,

    /// Cells with no resolvable ancestor (always empty at timepoint 0)
    pub orphans: Vec<String>,

    /// Names that occurred more than once in the input
    pub duplicates: Vec<String>,

    /// Previous-timepoint cells that collected more than two descendants
    pub overfull_parents: Vec<String>,
}

impl LinkReport {
    /// Number of cells that received an ancestor.
    pub fn linked(&self) -> usize {
        self.identity_links + self.founder_links + self.division_links
    }

    /// Returns true if the timepoint failed an integrity check.
    pub fn is_suspect(&self) -> bool {
        !self.duplicates.is_empty() || !self.overfull_parents.is_empty()
    }
}

/// Finds the ancestor slot for `name` in the previous timepoint's index.
fn find_ancestor(
    name: &str,
    previous: &TimepointIndex,
    resolver: &NameResolver,
) -> Option<(usize, LinkKind)> {
    if let Some(slot) = previous.get(name) {
        return Some((slot, LinkKind::Identity));
    }

    let resolution = resolver.resolve(name);
    let kind = match resolution {
        Resolution::Founder(_) => LinkKind::Founder,
        Resolution::Stripped(_) => LinkKind::Division,
        Resolution::Terminal | Resolution::Unresolvable => return None,
    };

    resolution
        .candidate()
        .and_then(|candidate| previous.get(candidate))
        .map(|slot| (slot, kind))
}

/// Creates, indexes, and links the records for timepoint `t`.
///
/// `previous` is timepoint `t-1`; its records gain descendants. When
/// `previous` is `None` (timepoint 0) every cell is left without ancestor.
///
/// Anomalies are logged and reported, never returned as errors: duplicate
/// names keep the last record in the index, unresolvable names become
/// orphans.
pub fn link_timepoint(
    rows: Vec<SnapshotRow>,
    t: usize,
    previous: Option<&mut Timepoint>,
    resolver: &NameResolver,
) -> (Timepoint, LinkReport) {
    let mut records: Vec<CellRecord> = rows
        .into_iter()
        .map(|row| CellRecord::from_row(row, t))
        .collect();

    let (index, duplicates) = TimepointIndex::build(&records);
    for name in &duplicates {
        warn!(timepoint = t, name = %name, "duplicate cell name, keeping last record");
    }

    let mut report = LinkReport {
        timepoint: t,
        cells: records.len(),
        duplicates: duplicates.clone(),
        ..Default::default()
    };

    if let Some(prev) = previous {
        debug_assert!(t > 0, "timepoint 0 has no predecessor");
        let prev_t = t.saturating_sub(1);
        let mut touched: Vec<usize> = Vec::new();

        for (slot, record) in records.iter_mut().enumerate() {
            match find_ancestor(&record.name, &prev.index, resolver) {
                Some((parent_slot, kind)) => {
                    record.ancestor = Some(CellRef::new(prev_t, parent_slot));
                    prev.records[parent_slot]
                        .descendants
                        .push(CellRef::new(t, slot));
                    touched.push(parent_slot);

                    match kind {
                        LinkKind::Identity => report.identity_links += 1,
                        LinkKind::Founder => report.founder_links += 1,
                        LinkKind::Division => report.division_links += 1,
                    }
                }
                None => {
                    debug!(timepoint = t, name = %record.name, "no resolvable ancestor");
                    report.orphans.push(record.name.clone());
                }
            }
        }

        touched.sort_unstable();
        touched.dedup();
        for parent_slot in touched {
            let parent = &prev.records[parent_slot];
            if parent.is_overfull() {
                warn!(
                    timepoint = prev_t,
                    name = %parent.name,
                    descendants = parent.descendants.len(),
                    "cell has more than two descendants"
                );
                report.overfull_parents.push(parent.name.clone());
            }
        }
    }

    let suspect = report.is_suspect();
    let timepoint = Timepoint {
        records,
        index,
        duplicates,
        suspect,
    };

    (timepoint, report)
}
