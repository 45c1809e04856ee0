//! Nuclei file parser.
//!
//! One row per detected nucleus, comma separated, no header:
//!
//! ```text
//! col:  0 ..... 4 | 5 | 6 | 7     | 8      | 9
//!       (ignored) | x | y | plane | radius | name
//! ```
//!
//! Rows without a name are unassigned detections and are dropped. The
//! z column is a plane index and is scaled into the x/y units.

use embryo_core::SnapshotRow;
use serde::{Deserialize, Serialize};
use tracing::debug;

const X_COL: usize = 5;
const Y_COL: usize = 6;
const Z_COL: usize = 7;
const RADIUS_COL: usize = 8;
const NAME_COL: usize = 9;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Multiplier applied to the plane index (default: 11.1)
    pub z_scale: f64,

    /// Subtract the per-timepoint mean position (default: true)
    pub mean_center: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            z_scale: 11.1,
            mean_center: true,
        }
    }
}

fn parse_row(line: &str, z_scale: f64) -> Option<SnapshotRow> {
    let cols: Vec<&str> = line.split(',').collect();
    let name = cols.get(NAME_COL)?.trim();
    if name.is_empty() {
        return None;
    }

    // `parse` accepts NaN and inf, which would poison mean-centering
    let num = |col: usize| {
        cols.get(col)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    };
    Some(SnapshotRow::new(
        name,
        num(X_COL)?,
        num(Y_COL)?,
        num(Z_COL)? * z_scale,
        num(RADIUS_COL)?,
    ))
}

/// Parses one snapshot file into rows ready for linking.
///
/// Malformed lines are skipped. Empty input yields no rows.
pub fn parse_nuclei(text: &str, config: &ParseConfig) -> Vec<SnapshotRow> {
    let mut skipped = 0usize;
    let mut rows: Vec<SnapshotRow> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let row = parse_row(line, config.z_scale);
            if row.is_none() {
                skipped += 1;
            }
            row
        })
        .collect();

    if skipped > 0 {
        debug!(skipped, kept = rows.len(), "dropped unnamed or malformed nuclei rows");
    }

    if config.mean_center && !rows.is_empty() {
        let n = rows.len() as f64;
        let (sx, sy, sz) = rows
            .iter()
            .fold((0.0, 0.0, 0.0), |(x, y, z), r| (x + r.x, y + r.y, z + r.z));
        let (mx, my, mz) = (sx / n, sy / n, sz / n);
        for row in &mut rows {
            row.x -= mx;
            row.y -= my;
            row.z -= mz;
        }
    }

    rows
}
