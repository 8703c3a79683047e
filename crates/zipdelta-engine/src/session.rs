//! Engine session
//!
//! Owns everything one comparison window needs: the configuration, the
//! current comparison, both view states and the sync guard. A new run
//! replaces the previous comparison only once it has fully succeeded.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};
use zipdelta_core::{Error, NodeId, Result, Side};
use zipdelta_parsers::{EntryMap, ParseOptions, read_archive_with_options};

use crate::builder::{Comparison, compare};
use crate::config::EngineConfig;
use crate::index::NodePair;
use crate::report::Report;
use crate::sync::{SyncGuard, SyncOutcome, ViewChange, apply_change};
use crate::view::{DualView, ViewState};

/// Archive paths of the current comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub left: PathBuf,
    pub right: PathBuf,
}

/// Comparison state owned by the presentation layer
#[derive(Debug, Default)]
pub struct EngineSession {
    config: EngineConfig,
    comparison: Option<Comparison>,
    sources: Option<Sources>,
    views: DualView,
    guard: SyncGuard,
}

impl EngineSession {
    /// Create a session with the given configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next run
    pub fn set_config(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    pub fn sources(&self) -> Option<&Sources> {
        self.sources.as_ref()
    }

    pub fn view(&self, side: Side) -> &ViewState {
        self.views.get(side)
    }

    pub fn views(&self) -> &DualView {
        &self.views
    }

    /// Read both archives and compare them
    ///
    /// Fails with `MissingSelection` when a path is empty and with
    /// `ArchiveUnreadable` when either archive cannot be listed. On any
    /// failure the previous comparison and views are left as they were.
    pub fn run(&mut self, left: &Path, right: &Path) -> Result<&Comparison> {
        let missing: Vec<Side> = Side::BOTH
            .into_iter()
            .zip([left, right])
            .filter(|(_, path)| path.as_os_str().is_empty())
            .map(|(side, _)| side)
            .collect();
        if !missing.is_empty() {
            return Err(Error::missing_selection(&missing));
        }

        info!(left = %left.display(), right = %right.display(), "Starting comparison");
        let start = Instant::now();

        let options = self.config.parse_options();
        let (left_entries, right_entries) = if self.config.parallel_read {
            let (l, r) = rayon::join(
                || read_side(left, &options),
                || read_side(right, &options),
            );
            (l?, r?)
        } else {
            (read_side(left, &options)?, read_side(right, &options)?)
        };

        let comparison = compare(&left_entries, &right_entries, &self.config).inspect_err(|e| {
            error!(error = %e, "Comparison failed");
        })?;

        info!(
            duration_ms = %start.elapsed().as_millis(),
            differences = comparison.summary.differences(),
            "Comparison ready"
        );

        self.sources = Some(Sources {
            left: left.to_path_buf(),
            right: right.to_path_buf(),
        });
        Ok(self.install(comparison))
    }

    /// Compare two listings that are already in memory
    pub fn run_entries(&mut self, left: &EntryMap, right: &EntryMap) -> Result<&Comparison> {
        let comparison = compare(left, right, &self.config)?;
        self.sources = None;
        Ok(self.install(comparison))
    }

    fn install(&mut self, comparison: Comparison) -> &Comparison {
        self.views = DualView::default();
        self.guard = SyncGuard::default();
        self.comparison.insert(comparison)
    }

    /// Drop the current comparison and view state
    pub fn clear(&mut self) {
        self.comparison = None;
        self.sources = None;
        self.views = DualView::default();
        self.guard = SyncGuard::default();
    }

    /// Node pair for a canonical path of the current comparison
    pub fn lookup(&self, path: &str) -> Result<NodePair> {
        match &self.comparison {
            Some(comparison) => comparison.index.lookup(path),
            None => Err(Error::path_not_indexed(path)),
        }
    }

    /// User selected a node in one view
    pub fn select(&mut self, side: Side, node: NodeId) -> SyncOutcome {
        self.change(side, ViewChange::Select(node))
    }

    /// User cleared the selection in one view
    pub fn deselect(&mut self, side: Side) -> SyncOutcome {
        self.change(side, ViewChange::Deselect)
    }

    /// User opened or closed a node in one view
    pub fn set_expanded(&mut self, side: Side, node: NodeId, open: bool) -> SyncOutcome {
        self.change(side, ViewChange::SetExpanded { node, open })
    }

    /// Open a node given by path in one view, mirroring it like a user action
    pub fn expand_path(&mut self, side: Side, path: &str) -> SyncOutcome {
        let node = self
            .comparison
            .as_ref()
            .and_then(|c| c.tree(side).find_path(path));
        match node {
            Some(node) => self.set_expanded(side, node, true),
            None => {
                warn!(side = %side, path, "Cannot expand unknown path");
                SyncOutcome::Missed
            }
        }
    }

    /// Open every directory in both views
    pub fn expand_all(&mut self) {
        if let Some(comparison) = &self.comparison {
            for side in Side::BOTH {
                self.views.get_mut(side).expand_all(comparison.tree(side));
            }
        }
    }

    pub fn collapse_all(&mut self) {
        for side in Side::BOTH {
            self.views.get_mut(side).collapse_all();
        }
    }

    fn change(&mut self, side: Side, change: ViewChange) -> SyncOutcome {
        let Some(comparison) = &self.comparison else {
            warn!(side = %side, ?change, "View change before any comparison ran");
            return SyncOutcome::Missed;
        };
        apply_change(
            comparison,
            &mut self.views,
            &mut self.guard,
            side,
            change,
            self.config.sync_enabled,
        )
    }

    /// Serializable report of the current comparison
    pub fn report(&self, only_differences: bool) -> Result<Report> {
        let comparison = self
            .comparison
            .as_ref()
            .ok_or_else(|| Error::comparison("no comparison has been run"))?;
        Report::build(comparison, self.sources.as_ref(), &self.config, only_differences)
    }
}

/// Read one archive, mapping reader failures to `ArchiveUnreadable`
fn read_side(path: &Path, options: &ParseOptions) -> Result<EntryMap> {
    read_archive_with_options(path, options).map_err(|e| {
        if e.is_truncation() {
            Error::archive_unreadable(path, format!("archive is truncated ({e})"))
        } else {
            Error::archive_unreadable(path, e)
        }
    })
}
