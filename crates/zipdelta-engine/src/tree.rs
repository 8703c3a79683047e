//! Arena-backed path segment trees
//!
//! One tree is built per archive side. Nodes live in a flat arena and are
//! addressed by [`NodeId`]; each directory keeps its children in insertion
//! order plus a `(kind, label)` map for constant-time lookup.

use std::collections::HashMap;

use zipdelta_core::{Error, NodeId, NodeKind, Result, Side, Status, SEPARATOR};

use crate::path::split_segments;

/// Ordered children of a directory (or of the synthetic root)
///
/// A file and a directory may share a label; each kind has its own slot.
#[derive(Debug, Clone, Default)]
struct Children {
    order: Vec<NodeId>,
    by_label: HashMap<String, [Option<NodeId>; 2]>,
}

fn kind_slot(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Directory => 0,
        NodeKind::File => 1,
    }
}

impl Children {
    fn find(&self, kind: NodeKind, label: &str) -> Option<NodeId> {
        self.by_label.get(label)?[kind_slot(kind)]
    }

    fn push(&mut self, kind: NodeKind, label: &str, id: NodeId) {
        self.order.push(id);
        self.by_label.entry(label.to_string()).or_default()[kind_slot(kind)] = Some(id);
    }
}

/// A node in one side's tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Arena identifier
    pub id: NodeId,
    /// Enclosing directory, `None` for top-level nodes
    pub parent: Option<NodeId>,
    /// Path segment shown for this node
    pub label: String,
    /// Directory or file
    pub kind: NodeKind,
    /// Classification after comparison
    pub status: Status,
    /// Size column (`"<n> bytes"`, empty when absent)
    pub size: String,
    /// Date column (empty when absent)
    pub date: String,
    /// Canonical full path, directories end in `/`
    pub path: String,
    /// Whether renderers should draw this node
    pub visible: bool,
    children: Children,
}

impl TreeNode {
    fn new(id: NodeId, parent: Option<NodeId>, kind: NodeKind, label: &str, path: String) -> Self {
        Self {
            id,
            parent,
            label: label.to_string(),
            kind,
            status: Status::Same,
            size: String::new(),
            date: String::new(),
            path,
            visible: true,
            children: Children::default(),
        }
    }

    /// Check if this is a directory
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Children in insertion order (empty for files)
    pub fn children(&self) -> &[NodeId] {
        &self.children.order
    }

    /// The size/date display pair
    pub fn display(&self) -> (&str, &str) {
        (&self.size, &self.date)
    }
}

/// Tree of path segments for one archive side
#[derive(Debug, Clone)]
pub struct PathSegmentTree {
    side: Side,
    nodes: Vec<TreeNode>,
    roots: Children,
}

impl PathSegmentTree {
    /// Create an empty tree for one side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            nodes: Vec::new(),
            roots: Children::default(),
        }
    }

    /// Which archive this tree shows
    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of nodes, the synthetic root excluded
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.index())
    }

    /// Get a node by ID, failing for IDs from another tree
    pub fn node(&self, id: NodeId) -> Result<&TreeNode> {
        self.get(id)
            .ok_or_else(|| Error::internal(format!("node {} is not in the {} tree", id, self.side)))
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.nodes.get_mut(id.index())
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut TreeNode> {
        self.nodes.iter_mut()
    }

    /// Top-level nodes in insertion order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots.order
    }

    /// Children of `parent`, or the top-level nodes for `None`
    pub fn children(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(id) => self.get(id).map(TreeNode::children).unwrap_or_default(),
            None => self.roots(),
        }
    }

    /// Find a direct child by kind and label
    pub fn find_child(&self, parent: Option<NodeId>, kind: NodeKind, label: &str) -> Option<NodeId> {
        match parent {
            Some(id) => self.get(id)?.children.find(kind, label),
            None => self.roots.find(kind, label),
        }
    }

    /// Find the child with this kind and label, creating it if missing
    ///
    /// Returns the child and whether it was created by this call.
    pub fn get_or_insert_child(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        label: &str,
    ) -> Result<(NodeId, bool)> {
        if let Some(existing) = self.find_child(parent, kind, label) {
            return Ok((existing, false));
        }

        let mut path = match parent {
            Some(pid) => {
                let parent_node = self.node(pid)?;
                if !parent_node.is_directory() {
                    return Err(Error::comparison(format!(
                        "cannot add '{}' below file '{}'",
                        label, parent_node.path
                    )));
                }
                format!("{}{}", parent_node.path, label)
            }
            None => label.to_string(),
        };
        if kind == NodeKind::Directory {
            path.push(SEPARATOR);
        }

        let id = NodeId::from_index(self.nodes.len()).ok_or_else(|| {
            Error::comparison(format!(
                "{} tree exceeds {} nodes at '{}'",
                self.side,
                u32::MAX,
                path
            ))
        })?;
        self.nodes.push(TreeNode::new(id, parent, kind, label, path));

        let siblings = match parent {
            Some(pid) => match self.get_mut(pid) {
                Some(node) => &mut node.children,
                None => return Err(Error::internal(format!("parent {} vanished", pid))),
            },
            None => &mut self.roots,
        };
        siblings.push(kind, label, id);

        Ok((id, true))
    }

    /// Find a node by its canonical path
    pub fn find_path(&self, path: &str) -> Option<NodeId> {
        let split = split_segments(path);
        let (last, dirs) = split.segments.split_last()?;

        let mut current = None;
        for segment in dirs {
            current = Some(self.find_child(current, NodeKind::Directory, segment)?);
        }
        self.find_child(current, split.kind, last)
    }

    /// All nodes in arena (creation) order
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// IDs of every directory node
    pub fn directories(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|n| n.is_directory()).map(|n| n.id)
    }

    /// Depth-first walk over the whole tree in display order
    pub fn walk(&self) -> Walk<'_, impl FnMut(&TreeNode) -> bool> {
        self.walk_with(|_| true)
    }

    /// Depth-first walk that only descends into directories accepted by `descend`
    pub fn walk_with<F>(&self, descend: F) -> Walk<'_, F>
    where
        F: FnMut(&TreeNode) -> bool,
    {
        let stack = self.roots.order.iter().rev().map(|id| (0, *id)).collect();
        Walk {
            tree: self,
            stack,
            descend,
        }
    }
}

/// Depth-first iterator yielding `(depth, node)`
pub struct Walk<'a, F> {
    tree: &'a PathSegmentTree,
    stack: Vec<(usize, NodeId)>,
    descend: F,
}

impl<'a, F> Iterator for Walk<'a, F>
where
    F: FnMut(&TreeNode) -> bool,
{
    type Item = (usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, id) = self.stack.pop()?;
        let node = self.tree.get(id)?;

        if node.is_directory() && (self.descend)(node) {
            self.stack
                .extend(node.children.order.iter().rev().map(|child| (depth + 1, *child)));
        }

        Some((depth, node))
    }
}

/// Full path of a node, derived by walking parent links to the root
///
/// Labels are joined with `/`; directory paths get a trailing `/`.
pub fn resolve_path(tree: &PathSegmentTree, id: NodeId) -> Result<String> {
    let node = tree.node(id)?;
    let mut labels = vec![node.label.as_str()];

    let mut current = node.parent;
    while let Some(pid) = current {
        let parent = tree.node(pid)?;
        labels.push(&parent.label);
        current = parent.parent;
    }
    labels.reverse();

    let mut path = labels.join("/");
    if node.is_directory() {
        path.push(SEPARATOR);
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_tree() -> PathSegmentTree {
        let mut tree = PathSegmentTree::new(Side::Left);
        let (project, _) = tree.get_or_insert_child(None, NodeKind::Directory, "project").unwrap();
        let (docs, _) = tree
            .get_or_insert_child(Some(project), NodeKind::Directory, "docs")
            .unwrap();
        tree.get_or_insert_child(Some(docs), NodeKind::File, "readme.txt").unwrap();
        tree.get_or_insert_child(Some(project), NodeKind::File, "main.py").unwrap();
        tree.get_or_insert_child(None, NodeKind::File, "top.txt").unwrap();
        tree
    }

    #[test]
    fn test_insert_reuses_existing() {
        let mut tree = make_test_tree();
        let before = tree.len();
        let (id, created) = tree.get_or_insert_child(None, NodeKind::Directory, "project").unwrap();
        assert!(!created);
        assert_eq!(id, NodeId(0));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_paths() {
        let tree = make_test_tree();
        let readme = tree.find_path("project/docs/readme.txt").unwrap();
        assert_eq!(tree.get(readme).unwrap().path, "project/docs/readme.txt");
        assert_eq!(resolve_path(&tree, readme).unwrap(), "project/docs/readme.txt");

        let docs = tree.find_path("project/docs/").unwrap();
        assert_eq!(resolve_path(&tree, docs).unwrap(), "project/docs/");
        assert!(tree.find_path("project/docs").is_none());
    }

    #[test]
    fn test_file_and_directory_siblings() {
        let mut tree = PathSegmentTree::new(Side::Right);
        let (file, _) = tree.get_or_insert_child(None, NodeKind::File, "a").unwrap();
        let (dir, created) = tree.get_or_insert_child(None, NodeKind::Directory, "a").unwrap();
        assert!(created);
        assert_ne!(file, dir);
        assert_eq!(tree.find_path("a"), Some(file));
        assert_eq!(tree.find_path("a/"), Some(dir));
    }

    #[test]
    fn test_no_children_under_file() {
        let mut tree = make_test_tree();
        let top = tree.find_path("top.txt").unwrap();
        let err = tree
            .get_or_insert_child(Some(top), NodeKind::File, "nested")
            .unwrap_err();
        assert!(matches!(err, Error::ComparisonError { .. }));
    }

    #[test]
    fn test_walk_order() {
        let tree = make_test_tree();
        let rows: Vec<_> = tree.walk().map(|(d, n)| (d, n.label.as_str())).collect();
        assert_eq!(
            rows,
            vec![
                (0, "project"),
                (1, "docs"),
                (2, "readme.txt"),
                (1, "main.py"),
                (0, "top.txt"),
            ]
        );
    }

    #[test]
    fn test_walk_with_collapsed() {
        let tree = make_test_tree();
        let rows: Vec<_> = tree
            .walk_with(|n| n.label != "docs")
            .map(|(_, n)| n.label.as_str())
            .collect();
        assert_eq!(rows, vec!["project", "docs", "main.py", "top.txt"]);
    }

    #[test]
    fn test_unknown_node() {
        let tree = make_test_tree();
        assert!(tree.get(NodeId(99)).is_none());
        assert!(resolve_path(&tree, NodeId(99)).is_err());
    }
}
