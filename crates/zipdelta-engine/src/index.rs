//! Cross-tree index
//!
//! Maps each canonical full path to the pair of nodes showing it, one per
//! side. Built once per comparison and replaced, never merged.

use std::collections::HashMap;

use serde::Serialize;
use zipdelta_core::{Error, NodeId, Result, Side};

/// The two nodes that show one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodePair {
    pub left: NodeId,
    pub right: NodeId,
}

impl NodePair {
    /// The node on the given side
    pub fn get(self, side: Side) -> NodeId {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    /// The node on the side opposite `source`
    pub fn mirror(self, source: Side) -> NodeId {
        self.get(source.other())
    }
}

/// Full path to node pair mapping
#[derive(Debug, Clone, Default)]
pub struct CrossTreeIndex {
    pairs: HashMap<String, NodePair>,
}

impl CrossTreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the pair for a path, returning any pair it replaced
    pub(crate) fn insert(&mut self, path: impl Into<String>, pair: NodePair) -> Option<NodePair> {
        self.pairs.insert(path.into(), pair)
    }

    /// Look up the node pair for a canonical path
    pub fn lookup(&self, path: &str) -> Result<NodePair> {
        self.pairs
            .get(path)
            .copied()
            .ok_or_else(|| Error::path_not_indexed(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pairs.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Indexed paths in sorted order
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<_> = self.pairs.keys().map(String::as_str).collect();
        paths.sort_unstable();
        paths
    }
}

/// The node on the other side showing the same path as `source`'s node
pub fn lookup_mirror(index: &CrossTreeIndex, path: &str, source: Side) -> Result<NodeId> {
    index.lookup(path).map(|pair| pair.mirror(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_index() -> CrossTreeIndex {
        let mut index = CrossTreeIndex::new();
        index.insert("dir/", NodePair { left: NodeId(0), right: NodeId(0) });
        index.insert("dir/f1.txt", NodePair { left: NodeId(1), right: NodeId(4) });
        index
    }

    #[test]
    fn test_lookup_mirror() {
        let index = make_test_index();
        assert_eq!(lookup_mirror(&index, "dir/f1.txt", Side::Left).unwrap(), NodeId(4));
        assert_eq!(lookup_mirror(&index, "dir/f1.txt", Side::Right).unwrap(), NodeId(1));
    }

    #[test]
    fn test_lookup_miss() {
        let index = make_test_index();
        let err = lookup_mirror(&index, "dir", Side::Left).unwrap_err();
        assert!(matches!(err, Error::PathNotIndexed { ref path } if path == "dir"));
        assert!(!err.is_user_facing());
    }

    #[test]
    fn test_paths_sorted() {
        let index = make_test_index();
        assert_eq!(index.paths(), vec!["dir/", "dir/f1.txt"]);
        assert_eq!(index.len(), 2);
    }
}
