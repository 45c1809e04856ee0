//! Embryo Snapshot Environment Layer
//!
//! This crate is the transport and parsing collaborator of the lineage core.
//! It knows where snapshot files live and how one nuclei file is laid out;
//! the core only ever sees parsed, mean-centered [`SnapshotRow`]s.
//!
//! # End of Sequence
//!
//! Sources return `Ok(None)` when a requested timepoint has no data. That
//! is the normal termination signal for the sequential load loop, not an
//! error.
//!
//! # Example
//!
//! ```ignore
//! use embryo_env::{DirectorySource, ParseConfig, SnapshotSource, parse_nuclei};
//!
//! async fn first_frame(source: &DirectorySource) -> Result<(), EnvError> {
//!     if let Some(text) = source.fetch(0).await? {
//!         let rows = parse_nuclei(&text, &ParseConfig::default());
//!         println!("{} cells", rows.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! [`SnapshotRow`]: embryo_core::SnapshotRow

mod directory;
mod error;
mod memory;
mod nuclei;
mod source;

pub use directory::{DirectorySource, FileNaming};
pub use error::EnvError;
pub use memory::MemorySource;
pub use nuclei::{parse_nuclei, ParseConfig};
pub use source::SnapshotSource;
