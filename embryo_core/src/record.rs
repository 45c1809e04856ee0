//! Cell records - one nucleus at one timepoint.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::history::History;

/// Handle to a [`CellRecord`] stored in a [`History`].
///
/// Records never hold references to each other directly; cross-time links
/// are handles into the append-only history arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    /// Timepoint index (0 = first snapshot)
    pub timepoint: usize,

    /// Position of the record within its timepoint's list
    pub slot: usize,
}

impl CellRef {
    pub fn new(timepoint: usize, slot: usize) -> Self {
        Self { timepoint, slot }
    }
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}#{}", self.timepoint, self.slot)
    }
}

/// One parsed input row, as delivered by the parsing collaborator.
///
/// Coordinates are already mean-centered for their timepoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,
}

impl SnapshotRow {
    pub fn new(name: impl Into<String>, x: f64, y: f64, z: f64, radius: f64) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            z,
            radius,
        }
    }
}

/// A single cell observed at a single timepoint.
///
/// `ancestor` is set once at link time. `descendants` grows while the next
/// timepoint is linked and is frozen afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellRecord {
    /// Cell name, unique within its timepoint
    pub name: String,

    /// Mean-centered position
    pub position: Vector3<f64>,

    /// Nucleus radius
    pub radius: f64,

    /// Timepoint this record belongs to
    pub timepoint: usize,

    /// Progenitor one timepoint earlier (`None` = no resolvable ancestor)
    pub ancestor: Option<CellRef>,

    /// Cells one timepoint later that resolved to this record
    pub descendants: Vec<CellRef>,
}

impl CellRecord {
    /// Creates an unlinked record from an input row.
    pub fn from_row(row: SnapshotRow, timepoint: usize) -> Self {
        Self {
            name: row.name,
            position: Vector3::new(row.x, row.y, row.z),
            radius: row.radius,
            timepoint,
            ancestor: None,
            descendants: Vec::new(),
        }
    }

    /// Returns true if no progenitor was resolved for this cell.
    pub fn is_orphan(&self) -> bool {
        self.ancestor.is_none()
    }

    /// Returns true if this record has more descendants than a single
    /// division can produce.
    pub fn is_overfull(&self) -> bool {
        self.descendants.len() > 2
    }

    /// Returns the ancestor record, if any.
    pub fn ancestor_record<'h>(&self, history: &'h History) -> Option<&'h CellRecord> {
        self.ancestor.and_then(|r| history.get(r))
    }

    /// Returns the ancestor's name, if any.
    pub fn ancestor_name<'h>(&self, history: &'h History) -> Option<&'h str> {
        self.ancestor_record(history).map(|a| a.name.as_str())
    }

    /// Returns true if this cell was produced by a division (its name
    /// differs from its ancestor's).
    pub fn is_division_product(&self, history: &History) -> bool {
        self.ancestor_name(history)
            .map(|parent| parent != self.name)
            .unwrap_or(false)
    }

    /// Position a renderer should animate this cell from.
    ///
    /// A cell with an ancestor starts at the ancestor's position; an orphan
    /// starts where it is.
    pub fn origin_position(&self, history: &History) -> Vector3<f64> {
        self.ancestor_record(history)
            .map(|a| a.position)
            .unwrap_or(self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::NameResolver;
    use approx::assert_relative_eq;

    #[test]
    fn test_record_from_row() {
        let record = CellRecord::from_row(SnapshotRow::new("ABa", 1.0, -2.0, 3.5, 4.0), 7);

        assert_eq!(record.name, "ABa");
        assert_eq!(record.timepoint, 7);
        assert_relative_eq!(record.position.z, 3.5);
        assert!(record.is_orphan());
        assert!(record.descendants.is_empty());
    }

    #[test]
    fn test_origin_position_follows_ancestor() {
        let resolver = NameResolver::default();
        let mut history = History::new();
        history.push_snapshot(vec![SnapshotRow::new("AB", 10.0, 0.0, 0.0, 5.0)], &resolver);
        history.push_snapshot(
            vec![
                SnapshotRow::new("ABa", 12.0, 1.0, 0.0, 4.0),
                SnapshotRow::new("Zq", -4.0, 0.0, 0.0, 4.0),
            ],
            &resolver,
        );

        let daughter = history.get(CellRef::new(1, 0)).unwrap();
        let origin = daughter.origin_position(&history);
        assert_relative_eq!(origin.x, 10.0);
        assert!(daughter.is_division_product(&history));

        let orphan = history.get(CellRef::new(1, 1)).unwrap();
        assert_relative_eq!(orphan.origin_position(&history).x, -4.0);
        assert!(!orphan.is_division_product(&history));
    }

    #[test]
    fn test_cell_ref_display() {
        assert_eq!(CellRef::new(3, 12).to_string(), "t3#12");
    }
}
