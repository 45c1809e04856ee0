//! Snapshot transport abstraction.

use async_trait::async_trait;
use crate::error::EnvError;

/// Abstraction for fetching the raw text of one timepoint.
///
/// # Implementations
///
/// - **Production**: `DirectorySource` - one nuclei file per timepoint
/// - **Testing / demos**: `MemorySource` - pre-rendered snapshot texts
///
/// # Load Flow
///
/// ```text
/// Loader                     Source
///   |-- fetch(0) ------------->|-- Some(text)
///   |-- fetch(1) ------------->|-- Some(text)
///   |          ...             |
///   |-- fetch(n) ------------->|-- None (end of recording)
/// ```
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetches the raw snapshot text for a zero-based timepoint.
    ///
    /// # Returns
    /// * `Ok(Some(text))` - Snapshot data for the timepoint
    /// * `Ok(None)` - No data: the recording has ended
    /// * `Err(EnvError)` - Transport failure
    async fn fetch(&self, timepoint: usize) -> Result<Option<String>, EnvError>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;
}
