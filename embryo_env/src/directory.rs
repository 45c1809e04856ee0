//! File-backed snapshot source using Tokio.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::EnvError;
use crate::source::SnapshotSource;

/// File naming scheme for per-timepoint snapshot files.
///
/// Timepoint `i` maps to `{prefix}{i + 1:0width}{suffix}`, so the default
/// scheme names timepoint 0 `t001-nuclei`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNaming {
    pub prefix: String,
    pub width: usize,
    pub suffix: String,
}

impl Default for FileNaming {
    fn default() -> Self {
        Self {
            prefix: "t".to_string(),
            width: 3,
            suffix: "-nuclei".to_string(),
        }
    }
}

impl FileNaming {
    /// File name for a zero-based timepoint.
    pub fn file_name(&self, timepoint: usize) -> String {
        format!(
            "{}{:0width$}{}",
            self.prefix,
            timepoint + 1,
            self.suffix,
            width = self.width
        )
    }
}

/// Production source reading one nuclei file per timepoint from a directory.
///
/// A missing file (or an empty one) ends the sequence.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    /// Directory holding the snapshot files
    root: PathBuf,

    naming: FileNaming,
}

impl DirectorySource {
    /// Opens a source over `root`, which must be an existing directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, EnvError> {
        let root = root.into();
        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|e| EnvError::io(&root, e))?;
        if !metadata.is_dir() {
            return Err(EnvError::config(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            naming: FileNaming::default(),
        })
    }

    /// Replaces the file naming scheme.
    pub fn with_naming(mut self, naming: FileNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path for a zero-based timepoint.
    pub fn path_for(&self, timepoint: usize) -> PathBuf {
        self.root.join(self.naming.file_name(timepoint))
    }
}

#[async_trait]
impl SnapshotSource for DirectorySource {
    async fn fetch(&self, timepoint: usize) -> Result<Option<String>, EnvError> {
        let path = self.path_for(timepoint);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                // Stray bytes land in one row's fields; the row parser drops what it can't read
                let text = String::from_utf8_lossy(&bytes);
                if text.trim().is_empty() {
                    debug!(path = %path.display(), "empty snapshot, end of sequence");
                    Ok(None)
                } else {
                    Ok(Some(text.into_owned()))
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot, end of sequence");
                Ok(None)
            }
            Err(e) => Err(EnvError::io(path, e)),
        }
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "embryo_env_{}_{}",
            name,
            std::process::id()
        ));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(&dir).await.unwrap();
        dir
    }

    #[test]
    fn test_default_file_naming() {
        let naming = FileNaming::default();
        assert_eq!(naming.file_name(0), "t001-nuclei");
        assert_eq!(naming.file_name(41), "t042-nuclei");
        assert_eq!(naming.file_name(1233), "t1234-nuclei");
    }

    #[tokio::test]
    async fn test_directory_source_reads_until_missing() {
        let dir = scratch_dir("reads").await;
        tokio::fs::write(dir.join("t001-nuclei"), "first").await.unwrap();
        tokio::fs::write(dir.join("t002-nuclei"), "second").await.unwrap();

        let source = DirectorySource::open(&dir).await.unwrap();
        assert_eq!(source.fetch(0).await.unwrap().as_deref(), Some("first"));
        assert_eq!(source.fetch(1).await.unwrap().as_deref(), Some("second"));
        assert_eq!(source.fetch(2).await.unwrap(), None);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_source_decodes_invalid_utf8_lossily() {
        let dir = scratch_dir("lossy").await;
        let bytes: &[u8] = b"1,1,0,0,0,10,0,0,5,AB\xff\n2,1,0,0,0,20,0,0,5,P1\n";
        tokio::fs::write(dir.join("t001-nuclei"), bytes).await.unwrap();

        let source = DirectorySource::open(&dir).await.unwrap();
        let text = source.fetch(0).await.unwrap().unwrap();
        assert!(text.contains("AB\u{FFFD}"));

        let rows = crate::parse_nuclei(&text, &crate::ParseConfig::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "P1");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_source_custom_naming() {
        let dir = scratch_dir("naming").await;
        tokio::fs::write(dir.join("frame_0001.csv"), "data").await.unwrap();

        let source = DirectorySource::open(&dir).await.unwrap().with_naming(FileNaming {
            prefix: "frame_".into(),
            width: 4,
            suffix: ".csv".into(),
        });
        assert_eq!(source.fetch(0).await.unwrap().as_deref(), Some("data"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_source_rejects_missing_dir() {
        let missing = std::env::temp_dir().join("embryo_env_does_not_exist_9f1c");
        assert!(matches!(
            DirectorySource::open(&missing).await,
            Err(EnvError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_directory_source_rejects_file() {
        let dir = scratch_dir("file").await;
        let file = dir.join("t001-nuclei");
        tokio::fs::write(&file, "x").await.unwrap();

        assert!(matches!(
            DirectorySource::open(&file).await,
            Err(EnvError::ConfigError(_))
        ));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
