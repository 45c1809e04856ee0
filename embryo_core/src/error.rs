//! Error types for the lineage core.
//!
//! Data anomalies (orphans, duplicate names, re-parenting) are never errors
//! here; they are absorbed into reports. Only configuration can fail.

use thiserror::Error;

/// Errors raised while configuring the lineage core.
#[derive(Debug, Error)]
pub enum LineageError {
    /// Founder table JSON could not be parsed
    #[error("Founder table parse error: {0}")]
    FounderTableParse(#[from] serde_json::Error),

    /// Founder table entry is unusable (empty founder name, self-mapping)
    #[error("Invalid founder entry: {0}")]
    InvalidFounder(String),
}

impl LineageError {
    /// Creates an invalid founder error.
    pub fn invalid_founder(msg: impl Into<String>) -> Self {
        Self::InvalidFounder(msg.into())
    }
}
