//! LoadSession - the sequential load-and-link loop.
//!
//! Timepoints are fetched, parsed, and linked strictly one after another:
//! linking timepoint `T` needs the fully built index of `T-1`. When the
//! source reports end of sequence the lineage tree is assembled once and
//! the session becomes read-only.

use embryo_core::{assemble, History, LineageError, LineageTree, LinkReport, NameResolver};
use embryo_env::{parse_nuclei, EnvError, ParseConfig, SnapshotSource};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort a load.
///
/// Data anomalies never end up here; only transport and configuration
/// failures do.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Snapshot transport failed
    #[error("Snapshot source error: {0}")]
    Env(#[from] EnvError),

    /// Lineage configuration (founder table) failed
    #[error("Lineage config error: {0}")]
    Lineage(#[from] LineageError),

    /// Writing results failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding results failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration for a load.
#[derive(Debug, Clone, Default)]
pub struct LoaderConfig {
    /// Nuclei parser settings
    pub parse: ParseConfig,

    /// Stop after this many timepoints even if the source has more
    pub max_timepoints: Option<usize>,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// History is still growing
    Loading,
    /// All timepoints linked and the tree assembled
    Ready,
}

/// Result of one load step.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStep {
    /// One more timepoint was linked
    Linked(LinkReport),
    /// The source is exhausted and the tree is assembled
    Finished,
}

/// Owns the history while loading; read-only once [`LoadState::Ready`].
pub struct LoadSession<S: SnapshotSource> {
    source: S,
    resolver: NameResolver,
    config: LoaderConfig,
    history: History,
    reports: Vec<LinkReport>,
    tree: Option<LineageTree>,
}

impl<S: SnapshotSource> LoadSession<S> {
    pub fn new(source: S, resolver: NameResolver, config: LoaderConfig) -> Self {
        Self {
            source,
            resolver,
            config,
            history: History::new(),
            reports: Vec::new(),
            tree: None,
        }
    }

    pub fn state(&self) -> LoadState {
        if self.tree.is_some() {
            LoadState::Ready
        } else {
            LoadState::Loading
        }
    }

    /// Linked history (partial while loading).
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The assembled tree, available once the session is ready.
    pub fn tree(&self) -> Option<&LineageTree> {
        self.tree.as_ref()
    }

    /// Per-timepoint link reports in load order.
    pub fn reports(&self) -> &[LinkReport] {
        &self.reports
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetches, parses, and links the next timepoint.
    pub async fn step(&mut self) -> Result<LoadStep, SessionError> {
        if self.tree.is_some() {
            return Ok(LoadStep::Finished);
        }

        let t = self.history.len();
        if self.config.max_timepoints.is_some_and(|max| t >= max) {
            debug!(timepoint = t, "timepoint limit reached");
            self.finish();
            return Ok(LoadStep::Finished);
        }

        let text = match self.source.fetch(t).await? {
            Some(text) => text,
            None => {
                self.finish();
                return Ok(LoadStep::Finished);
            }
        };

        let rows = parse_nuclei(&text, &self.config.parse);
        let report = self.history.push_snapshot(rows, &self.resolver);

        if report.is_suspect() {
            warn!(
                timepoint = t,
                duplicates = report.duplicates.len(),
                overfull = report.overfull_parents.len(),
                "timepoint flagged as suspect"
            );
        }
        debug!(
            timepoint = t,
            cells = report.cells,
            linked = report.linked(),
            orphans = report.orphans.len(),
            "timepoint linked"
        );

        self.reports.push(report.clone());
        Ok(LoadStep::Linked(report))
    }

    /// Loads until the source is exhausted, then returns the tree.
    pub async fn run(&mut self) -> Result<&LineageTree, SessionError> {
        while let LoadStep::Linked(_) = self.step().await? {}
        Ok(self.tree.get_or_insert_with(LineageTree::default))
    }

    fn finish(&mut self) {
        let tree = assemble(&self.history);
        info!(
            timepoints = self.history.len(),
            cells = self.history.cell_count(),
            nodes = tree.node_count(),
            "load complete, lineage assembled"
        );
        self.tree = Some(tree);
    }
}
