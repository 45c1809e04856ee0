//! Embryo Lineage Core - Cell-Lineage Reconstruction from Snapshots
//!
//! Each timepoint of an embryo recording is a flat list of named nuclei with
//! no identity carried across frames. This library recovers the lineage:
//! 1. **Name Resolver**: founder table + suffix stripping proposes an ancestor name
//! 2. **Lineage Linker**: binds every cell to its progenitor one frame earlier
//! 3. **Tree Assembler**: collapses per-frame continuity into division events
//!
//! Data flows strictly forward in time. Timepoint `T` can only be linked once
//! timepoint `T-1` is fully indexed, so [`History`] is append-only and each
//! [`History::push_snapshot`] links against the last entry.
//!
//! # Example
//!
//! ```ignore
//! use embryo_core::{History, NameResolver, SnapshotRow, assemble};
//!
//! let resolver = NameResolver::default();
//! let mut history = History::new();
//! history.push_snapshot(vec![SnapshotRow::new("P0", 0.0, 0.0, 0.0, 5.0)], &resolver);
//! history.push_snapshot(vec![
//!     SnapshotRow::new("AB", -1.0, 0.0, 0.0, 4.0),
//!     SnapshotRow::new("P1", 1.0, 0.0, 0.0, 3.5),
//! ], &resolver);
//!
//! let tree = assemble(&history);
//! ```

pub mod error;
pub mod history;
pub mod linker;
pub mod record;
pub mod resolver;
pub mod tree;

// Re-export key types for convenience
pub use error::LineageError;
pub use history::{Ancestry, History, Timepoint, TimepointIndex};
pub use linker::{link_timepoint, LinkKind, LinkReport};
pub use record::{CellRecord, CellRef, SnapshotRow};
pub use resolver::{FounderTable, NameResolver, Resolution, ROOT_FOUNDER};
pub use tree::{assemble, assemble_edges, collect_edges, LineageEdge, LineageNode, LineageTree, ROOT_NAME};
