//! Error types for the snapshot environment layer.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching snapshots.
#[derive(Debug, Error)]
pub enum EnvError {
    /// Reading a snapshot file failed for a reason other than absence
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source is misconfigured
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl EnvError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
