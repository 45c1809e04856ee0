//! Embryo Lineage Loader and Synthetic Recordings
//!
//! This crate drives the lineage core end to end:
//! - **LoadSession**: the sequential fetch -> parse -> link loop
//! - **SyntheticEmbryo**: a seeded, reproducible dividing embryo
//! - **LineageExport**: JSON hand-off to point-cloud and tree renderers
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐  text   ┌──────────────┐  rows   ┌───────────────┐
//! │ SnapshotSource │────────►│ parse_nuclei │────────►│    History    │
//! │ (dir / memory) │         └──────────────┘         │ (link per t)  │
//! └────────────────┘                                   └───────┬───────┘
//!         ▲ end of sequence                                    │
//!         └──────────────── LoadSession ───────────────► assemble()
//!                                                              │
//!                                                       LineageExport
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use embryo_sim::{LoadSession, LoaderConfig, SyntheticEmbryo, SyntheticConfig};
//! use embryo_core::NameResolver;
//!
//! let source = SyntheticEmbryo::new(SyntheticConfig::default()).into_source();
//! let mut session = LoadSession::new(source, NameResolver::default(), LoaderConfig::default());
//! let tree = session.run().await?;
//! ```

mod exporter;
mod session;
mod synthetic;

pub use exporter::{CellFrame, LineageExport, TimepointFrame};
pub use session::{LoadSession, LoadState, LoadStep, LoaderConfig, SessionError};
pub use synthetic::{SyntheticCell, SyntheticConfig, SyntheticEmbryo};
