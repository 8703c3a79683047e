//! Path tree builder
//!
//! Walks the sorted union of both archives' paths once, growing the two
//! side trees in lockstep, classifying leaves as they are created and
//! indexing every node pair. Directory statuses are settled in a second
//! pass from the per-directory accumulator.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};
use zipdelta_core::{Error, NodeKind, Result, ResultExt, Side, Status};
use zipdelta_parsers::{ArchiveEntry, EntryMap};

use crate::classify::{DirectoryAccumulator, LeafClassification, classify_leaf};
use crate::config::EngineConfig;
use crate::index::{CrossTreeIndex, NodePair};
use crate::path::split_segments;
use crate::tree::PathSegmentTree;

/// Counts gathered during one comparison
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    /// Distinct paths in the union of both archives
    pub total_paths: usize,
    pub files: usize,
    pub directories: usize,
    pub same: usize,
    pub only_left: usize,
    pub only_right: usize,
    pub content_diff: usize,
    pub date_diff: usize,
    /// Directories with at least one differing descendant
    pub differing_directories: usize,
}

impl ComparisonSummary {
    fn record_leaf(&mut self, classification: LeafClassification) {
        self.files += 1;
        match classification.left {
            Status::OnlyLeft => self.only_left += 1,
            Status::Placeholder => self.only_right += 1,
            Status::ContentDiff => self.content_diff += 1,
            Status::DateDiff => self.date_diff += 1,
            _ => self.same += 1,
        }
    }

    /// Number of differing leaves
    pub fn differences(&self) -> usize {
        self.only_left + self.only_right + self.content_diff + self.date_diff
    }

    pub fn has_differences(&self) -> bool {
        self.differences() > 0
    }
}

/// Result of one comparison run
#[derive(Debug, Clone)]
pub struct Comparison {
    pub left: PathSegmentTree,
    pub right: PathSegmentTree,
    pub index: CrossTreeIndex,
    pub summary: ComparisonSummary,
}

impl Comparison {
    /// The tree for one side
    pub fn tree(&self, side: Side) -> &PathSegmentTree {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Whether both trees are empty
    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }
}

/// Build and classify the two trees for a pair of entry listings
pub fn compare(left: &EntryMap, right: &EntryMap, config: &EngineConfig) -> Result<Comparison> {
    let paths: BTreeSet<&str> = left.keys().chain(right.keys()).map(String::as_str).collect();
    info!(
        left_entries = left.len(),
        right_entries = right.len(),
        paths = paths.len(),
        "Comparing archive listings"
    );

    let mut builder = TreeBuilder::new(config);
    for path in &paths {
        builder
            .insert_path(path, left.get(*path), right.get(*path))
            .with_context(|| format!("while placing '{path}'"))
            .map_err(into_comparison_error)?;
    }

    let comparison = builder.finish(paths.len());
    info!(
        nodes = comparison.left.len(),
        differences = comparison.summary.differences(),
        differing_directories = comparison.summary.differing_directories,
        "Comparison complete"
    );
    Ok(comparison)
}

/// Surface any build failure as a `ComparisonError`, keeping its context
fn into_comparison_error(error: Error) -> Error {
    match error {
        Error::ComparisonError { .. } => error,
        Error::WithContext { context, source } => match *source {
            Error::ComparisonError { message } => {
                Error::comparison(format!("{context}: {message}"))
            }
            other => Error::comparison(format!("{context}: {other}")),
        },
        other => Error::comparison(other.to_string()),
    }
}

/// Incremental state while the trees grow
struct TreeBuilder<'a> {
    config: &'a EngineConfig,
    left: PathSegmentTree,
    right: PathSegmentTree,
    index: CrossTreeIndex,
    accumulator: DirectoryAccumulator,
    summary: ComparisonSummary,
}

impl<'a> TreeBuilder<'a> {
    fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            left: PathSegmentTree::new(Side::Left),
            right: PathSegmentTree::new(Side::Right),
            index: CrossTreeIndex::new(),
            accumulator: DirectoryAccumulator::new(),
            summary: ComparisonSummary::default(),
        }
    }

    fn insert_path(
        &mut self,
        path: &str,
        left: Option<&ArchiveEntry>,
        right: Option<&ArchiveEntry>,
    ) -> Result<()> {
        let split = split_segments(path);
        let Some((last, dirs)) = split.segments.split_last() else {
            debug!(path, "Skipping entry without a name");
            return Ok(());
        };

        let is_directory = split.kind == NodeKind::Directory
            || left.is_some_and(|e| e.is_directory)
            || right.is_some_and(|e| e.is_directory);

        let mut parent = None;
        for segment in dirs {
            parent = Some(self.child_pair(parent, NodeKind::Directory, segment)?.0);
        }

        if is_directory {
            self.child_pair(parent, NodeKind::Directory, last)?;
            return Ok(());
        }

        let (pair, created) = self.child_pair(parent, NodeKind::File, last)?;
        if !created {
            warn!(path, "Entry collides with an earlier path after normalization, skipping");
            return Ok(());
        }
        self.classify(pair, left, right)
    }

    /// Find or create the child on both sides at once
    fn child_pair(
        &mut self,
        parent: Option<NodePair>,
        kind: NodeKind,
        label: &str,
    ) -> Result<(NodePair, bool)> {
        let (left, left_created) =
            self.left
                .get_or_insert_child(parent.map(|p| p.left), kind, label)?;
        let (right, right_created) =
            self.right
                .get_or_insert_child(parent.map(|p| p.right), kind, label)?;

        if left_created != right_created {
            return Err(Error::comparison(format!(
                "trees diverged at '{}'",
                self.left.node(left)?.path
            )));
        }

        let pair = NodePair { left, right };
        if left_created {
            let path = self.left.node(left)?.path.clone();
            debug!(path = %path, left = %left, right = %right, "Indexed node pair");
            self.index.insert(path, pair);
        }
        Ok((pair, left_created))
    }

    fn classify(
        &mut self,
        pair: NodePair,
        left: Option<&ArchiveEntry>,
        right: Option<&ArchiveEntry>,
    ) -> Result<()> {
        let path = self.left.node(pair.left)?.path.clone();
        let classification = classify_leaf(left, right, self.config.checksum_policy)
            .ok_or_else(|| Error::comparison(format!("'{}' is in neither archive", path)))?;

        debug!(
            path = %path,
            left = %classification.left,
            right = %classification.right,
            "Classified entry"
        );

        let placeholders = self.config.placeholders;
        for (tree, entry, status) in [
            (&mut self.left, left, classification.left),
            (&mut self.right, right, classification.right),
        ] {
            let side = tree.side();
            let id = pair.get(side);
            let node = tree
                .get_mut(id)
                .ok_or_else(|| Error::internal(format!("node {} missing from {} tree", id, side)))?;
            node.status = status;
            node.size = entry.map(ArchiveEntry::display_size).unwrap_or_default();
            node.date = entry.map(ArchiveEntry::display_date).unwrap_or_default();
            node.visible = placeholders || status != Status::Placeholder;
        }

        self.accumulator.record(&path, classification);
        self.summary.record_leaf(classification);
        Ok(())
    }

    /// Settle directory statuses and hand over the finished trees
    fn finish(mut self, total_paths: usize) -> Comparison {
        let propagate = self.config.propagate_directory_diff;
        for tree in [&mut self.left, &mut self.right] {
            for node in tree.nodes_mut().filter(|n| n.is_directory()) {
                node.status = self.accumulator.directory_status(&node.path, propagate);
            }
        }

        self.summary.total_paths = total_paths;
        self.summary.directories = self.left.directories().count();
        self.summary.differing_directories = self
            .left
            .iter()
            .filter(|n| n.status == Status::DirectoryDiff)
            .count();

        Comparison {
            left: self.left,
            right: self.right,
            index: self.index,
            summary: self.summary,
        }
    }
}
