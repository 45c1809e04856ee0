//! JSON exporter for the point-cloud and tree renderers.
//!
//! Exports every linked timepoint plus the assembled lineage tree. Each cell
//! carries the position it should be animated from, so a renderer can make
//! new daughters emerge from their mother without touching the history.

use embryo_core::{History, LineageTree, LinkReport};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One cell at one timepoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellFrame {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub radius: f64,

    /// Animation start: ancestor's position, or own position for orphans
    pub origin: [f64; 3],

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor: Option<String>,
}

/// One exported timepoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimepointFrame {
    pub timepoint: usize,
    pub cells: Vec<CellFrame>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub suspect: bool,
}

/// Complete lineage export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageExport {
    /// Where the snapshots came from
    pub source: String,

    /// All frames
    pub timepoints: Vec<TimepointFrame>,

    /// Assembled lineage tree
    pub tree: LineageTree,

    /// Timepoints that failed an integrity check
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suspect_timepoints: Vec<usize>,

    /// Per-timepoint link summaries
    pub reports: Vec<LinkReport>,
}

impl LineageExport {
    /// Projects a linked history into an export.
    pub fn new(source: &str, history: &History, tree: &LineageTree, reports: &[LinkReport]) -> Self {
        let timepoints = history
            .iter()
            .enumerate()
            .map(|(t, tp)| TimepointFrame {
                timepoint: t,
                cells: tp
                    .records
                    .iter()
                    .map(|record| {
                        let origin = record.origin_position(history);
                        CellFrame {
                            name: record.name.clone(),
                            x: record.position.x,
                            y: record.position.y,
                            z: record.position.z,
                            radius: record.radius,
                            origin: [origin.x, origin.y, origin.z],
                            ancestor: record.ancestor_name(history).map(str::to_string),
                        }
                    })
                    .collect(),
                suspect: tp.suspect,
            })
            .collect();

        Self {
            source: source.to_string(),
            timepoints,
            tree: tree.clone(),
            suspect_timepoints: history.suspect_timepoints(),
            reports: reports.to_vec(),
        }
    }

    /// Total number of exported cells.
    pub fn cell_count(&self) -> usize {
        self.timepoints.iter().map(|tp| tp.cells.len()).sum()
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embryo_core::{assemble, NameResolver, SnapshotRow};

    fn sample() -> (History, LineageTree) {
        let resolver = NameResolver::default();
        let mut history = History::new();
        history.push_snapshot(vec![SnapshotRow::new("AB", 5.0, 0.0, 0.0, 10.0)], &resolver);
        history.push_snapshot(
            vec![
                SnapshotRow::new("ABa", 8.0, 1.0, 0.0, 8.0),
                SnapshotRow::new("ABp", 2.0, -1.0, 0.0, 8.0),
            ],
            &resolver,
        );
        let tree = assemble(&history);
        (history, tree)
    }

    #[test]
    fn test_export_origins_follow_ancestors() {
        let (history, tree) = sample();
        let export = LineageExport::new("test", &history, &tree, &[]);

        assert_eq!(export.timepoints.len(), 2);
        assert_eq!(export.cell_count(), 3);

        let zygote = &export.timepoints[0].cells[0];
        assert_eq!(zygote.origin, [5.0, 0.0, 0.0]);
        assert_eq!(zygote.ancestor, None);

        let daughter = &export.timepoints[1].cells[1];
        assert_eq!(daughter.origin, [5.0, 0.0, 0.0]);
        assert_eq!(daughter.ancestor.as_deref(), Some("AB"));
    }

    #[test]
    fn test_export_json_shape() {
        let (history, tree) = sample();
        let export = LineageExport::new("test", &history, &tree, &[]);
        let value = serde_json::to_value(&export).unwrap();

        assert_eq!(value["source"], "test");
        assert_eq!(value["tree"]["roots"][0]["name"], "root");
        assert!(value.get("suspect_timepoints").is_none());
        assert!(value["timepoints"][0].get("suspect").is_none());
        assert!(value["timepoints"][0]["cells"][0].get("ancestor").is_none());
    }

    #[test]
    fn test_export_write_to_file() {
        let (history, tree) = sample();
        let export = LineageExport::new("test", &history, &tree, &[]);
        let path = std::env::temp_dir().join(format!("embryo_export_{}.json", std::process::id()));

        export.write_to_file(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: LineageExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.cell_count(), 3);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_clean_export_reads_back() {
        let (history, tree) = sample();
        let export = LineageExport::new("clean", &history, &tree, &[]);
        assert!(export.suspect_timepoints.is_empty());

        let text = serde_json::to_string(&export).unwrap();
        assert!(!text.contains("suspect_timepoints"));

        let back: LineageExport = serde_json::from_str(&text).unwrap();
        assert!(back.suspect_timepoints.is_empty());
        assert_eq!(back.source, "clean");
        assert_eq!(back.timepoints[1].cells[0].ancestor.as_deref(), Some("AB"));
    }
}
