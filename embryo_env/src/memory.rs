//! In-memory snapshot source.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::source::SnapshotSource;

/// Serves pre-rendered snapshot texts, one per timepoint.
///
/// An empty or whitespace-only text ends the sequence, the same way an
/// empty response does for file-backed sources.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    snapshots: Vec<String>,
}

impl MemorySource {
    pub fn new(snapshots: Vec<String>) -> Self {
        Self { snapshots }
    }

    /// Appends another timepoint.
    pub fn push(&mut self, text: impl Into<String>) {
        self.snapshots.push(text.into());
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

#[async_trait]
impl SnapshotSource for MemorySource {
    async fn fetch(&self, timepoint: usize) -> Result<Option<String>, EnvError> {
        Ok(self
            .snapshots
            .get(timepoint)
            .filter(|text| !text.trim().is_empty())
            .cloned())
    }

    fn describe(&self) -> String {
        format!("memory ({} timepoints)", self.snapshots.len())
    }
}
