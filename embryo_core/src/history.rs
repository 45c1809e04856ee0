//! Append-only per-timepoint history of linked cell records.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::linker::{link_timepoint, LinkReport};
use crate::record::{CellRecord, CellRef, SnapshotRow};
use crate::resolver::NameResolver;

// ============================================================================
// TIMEPOINT INDEX
// ============================================================================

/// Name -> slot lookup for one timepoint.
///
/// Built once while the timepoint's records are created; read-only after.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimepointIndex {
    slots: HashMap<String, usize>,
}

impl TimepointIndex {
    /// Builds the index for `records`.
    ///
    /// Returns the index plus every name that appeared more than once. For
    /// a duplicated name the last record wins.
    pub fn build(records: &[CellRecord]) -> (Self, Vec<String>) {
        let mut slots = HashMap::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for (slot, record) in records.iter().enumerate() {
            if slots.insert(record.name.clone(), slot).is_some()
                && !duplicates.contains(&record.name)
            {
                duplicates.push(record.name.clone());
            }
        }

        (Self { slots }, duplicates)
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}

// ============================================================================
// TIMEPOINT
// ============================================================================

/// All records observed at one timepoint plus their name index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timepoint {
    /// Records in input order
    pub records: Vec<CellRecord>,

    /// Name index (last write wins on duplicates)
    pub index: TimepointIndex,

    /// Names that occurred more than once in the input
    pub duplicates: Vec<String>,

    /// Set when the input for this timepoint failed an integrity check
    pub suspect: bool,
}

impl Timepoint {
    /// Looks up a record by name.
    pub fn find(&self, name: &str) -> Option<&CellRecord> {
        self.index.get(name).and_then(|slot| self.records.get(slot))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// HISTORY
// ============================================================================

/// Ordered sequence of linked timepoints.
///
/// Single writer while loading, read-only afterwards. Entries are never
/// removed, so every [`CellRef`] handed out stays valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    timepoints: Vec<Timepoint>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes and links the next timepoint against the last one.
    pub fn push_snapshot(&mut self, rows: Vec<SnapshotRow>, resolver: &NameResolver) -> LinkReport {
        let t = self.timepoints.len();
        let (timepoint, report) = link_timepoint(rows, t, self.timepoints.last_mut(), resolver);
        self.timepoints.push(timepoint);
        report
    }

    pub fn len(&self) -> usize {
        self.timepoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timepoints.is_empty()
    }

    pub fn timepoint(&self, t: usize) -> Option<&Timepoint> {
        self.timepoints.get(t)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Timepoint> {
        self.timepoints.iter()
    }

    /// Resolves a handle to its record.
    pub fn get(&self, cell: CellRef) -> Option<&CellRecord> {
        self.timepoints
            .get(cell.timepoint)
            .and_then(|tp| tp.records.get(cell.slot))
    }

    /// Looks up a cell by name at timepoint `t`.
    pub fn find(&self, t: usize, name: &str) -> Option<CellRef> {
        let slot = self.timepoints.get(t)?.index.get(name)?;
        Some(CellRef::new(t, slot))
    }

    /// Walks ancestor links starting at (and excluding) `cell`.
    pub fn ancestry(&self, cell: CellRef) -> Ancestry<'_> {
        Ancestry {
            history: self,
            next: self.get(cell).and_then(|r| r.ancestor),
            remaining: cell.timepoint,
        }
    }

    /// Returns the descendants recorded for `cell`.
    pub fn descendants_of(&self, cell: CellRef) -> &[CellRef] {
        self.get(cell)
            .map(|r| r.descendants.as_slice())
            .unwrap_or(&[])
    }

    /// Timepoints flagged as suspect during linking.
    pub fn suspect_timepoints(&self) -> Vec<usize> {
        self.timepoints
            .iter()
            .enumerate()
            .filter(|(_, tp)| tp.suspect)
            .map(|(t, _)| t)
            .collect()
    }

    /// Total number of records across all timepoints.
    pub fn cell_count(&self) -> usize {
        self.timepoints.iter().map(Timepoint::len).sum()
    }
}

/// Iterator over a cell's ancestors, nearest first.
///
/// Bounded by the starting timepoint: ancestor links always point one
/// timepoint back, so at most `t` steps exist.
pub struct Ancestry<'h> {
    history: &'h History,
    next: Option<CellRef>,
    remaining: usize,
}

impl<'h> Iterator for Ancestry<'h> {
    type Item = (CellRef, &'h CellRecord);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        let record = self.history.get(current)?;
        self.remaining -= 1;
        self.next = record.ancestor;
        Some((current, record))
    }
}
