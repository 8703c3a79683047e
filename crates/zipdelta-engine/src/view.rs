//! Headless view state for the two rendered trees

use std::collections::HashSet;

use zipdelta_core::{NodeId, Side};

use crate::tree::{PathSegmentTree, TreeNode};

/// Expansion and selection of one tree view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    expanded: HashSet<NodeId>,
    selected: Option<NodeId>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: NodeId) -> bool {
        self.expanded.contains(&id)
    }

    /// Open or close a node; returns whether anything changed
    pub fn set_expanded(&mut self, id: NodeId, open: bool) -> bool {
        if open {
            self.expanded.insert(id)
        } else {
            self.expanded.remove(&id)
        }
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    /// Change the selection; returns whether anything changed
    pub fn select(&mut self, id: Option<NodeId>) -> bool {
        let changed = self.selected != id;
        self.selected = id;
        changed
    }

    /// Expanded nodes in ID order
    pub fn expanded(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.expanded.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Open every directory of `tree`
    pub fn expand_all(&mut self, tree: &PathSegmentTree) {
        self.expanded.extend(tree.directories());
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Whether every directory enclosing `id` is open in this view
    pub fn is_visible(&self, tree: &PathSegmentTree, id: NodeId) -> bool {
        let mut parent = tree.get(id).and_then(|node| node.parent);
        while let Some(pid) = parent {
            if !self.is_expanded(pid) {
                return false;
            }
            parent = tree.get(pid).and_then(|node| node.parent);
        }
        true
    }

    /// Rows a renderer draws: open directories are descended into
    pub fn visible_rows<'a>(&self, tree: &'a PathSegmentTree) -> Vec<(usize, &'a TreeNode)> {
        tree.walk_with(|node| self.is_expanded(node.id)).collect()
    }
}

/// The pair of views shown side by side
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DualView {
    left: ViewState,
    right: ViewState,
}

impl DualView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Side) -> &ViewState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut ViewState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zipdelta_core::NodeKind;

    #[test]
    fn test_expand_collapse() {
        let mut view = ViewState::new();
        assert!(view.set_expanded(NodeId(3), true));
        assert!(!view.set_expanded(NodeId(3), true));
        assert!(view.is_expanded(NodeId(3)));

        assert!(view.set_expanded(NodeId(3), false));
        assert!(!view.is_expanded(NodeId(3)));
    }

    #[test]
    fn test_select() {
        let mut view = ViewState::new();
        assert!(view.select(Some(NodeId(1))));
        assert!(!view.select(Some(NodeId(1))));
        assert_eq!(view.selected(), Some(NodeId(1)));
        assert!(view.select(None));
        assert_eq!(view.selected(), None);
    }

    #[test]
    fn test_visible_rows() {
        let mut tree = PathSegmentTree::new(Side::Left);
        let (dir, _) = tree.get_or_insert_child(None, NodeKind::Directory, "dir").unwrap();
        tree.get_or_insert_child(Some(dir), NodeKind::File, "a.txt").unwrap();

        let mut view = ViewState::new();
        assert_eq!(view.visible_rows(&tree).len(), 1);

        view.expand_all(&tree);
        let rows: Vec<_> = view
            .visible_rows(&tree)
            .into_iter()
            .map(|(depth, node)| (depth, node.label.clone()))
            .collect();
        assert_eq!(rows, vec![(0, "dir".to_string()), (1, "a.txt".to_string())]);
    }

    #[test]
    fn test_is_visible() {
        let mut tree = PathSegmentTree::new(Side::Right);
        let (outer, _) = tree.get_or_insert_child(None, NodeKind::Directory, "outer").unwrap();
        let (inner, _) = tree.get_or_insert_child(Some(outer), NodeKind::Directory, "inner").unwrap();
        let (leaf, _) = tree.get_or_insert_child(Some(inner), NodeKind::File, "x.txt").unwrap();

        let mut view = ViewState::new();
        assert!(view.is_visible(&tree, outer));
        assert!(!view.is_visible(&tree, inner));

        view.set_expanded(inner, true);
        assert!(!view.is_visible(&tree, leaf));

        view.set_expanded(outer, true);
        assert!(view.is_visible(&tree, leaf));
    }

    #[test]
    fn test_dual_view_sides() {
        let mut views = DualView::new();
        views.get_mut(Side::Right).select(Some(NodeId(2)));
        assert_eq!(views.get(Side::Right).selected(), Some(NodeId(2)));
        assert_eq!(views.get(Side::Left).selected(), None);
    }
}
