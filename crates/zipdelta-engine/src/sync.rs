//! Selection and expansion sync between the two views
//!
//! A user change in one view is applied there and mirrored onto the node
//! showing the same path in the other view. The mirrored change is applied
//! while the [`SyncGuard`] is in `Syncing`, so anything that reacts to it
//! and calls back into [`apply_change`] is applied locally only and never
//! bounces back.

use tracing::{debug, warn};
use zipdelta_core::{NodeId, Result, Side};

use crate::builder::Comparison;
use crate::index::lookup_mirror;
use crate::tree::resolve_path;
use crate::view::DualView;

/// Re-entrancy state of the sync protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    /// A change from `source` is being mirrored
    Syncing { source: Side },
}

/// `Idle -> Syncing -> Idle` state machine
#[derive(Debug, Default)]
pub struct SyncGuard {
    state: SyncState,
}

impl SyncGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self.state, SyncState::Syncing { .. })
    }

    /// Enter `Syncing`; false if a sync is already in progress
    pub fn begin(&mut self, source: Side) -> bool {
        if self.is_syncing() {
            return false;
        }
        self.state = SyncState::Syncing { source };
        true
    }

    pub fn end(&mut self) {
        self.state = SyncState::Idle;
    }
}

/// A state change made in one view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewChange {
    Select(NodeId),
    Deselect,
    SetExpanded { node: NodeId, open: bool },
}

impl ViewChange {
    /// The node the change applies to, if any
    pub fn node(self) -> Option<NodeId> {
        match self {
            ViewChange::Select(node) | ViewChange::SetExpanded { node, .. } => Some(node),
            ViewChange::Deselect => None,
        }
    }

    /// The same change applied to another node
    fn retarget(self, target: NodeId) -> Self {
        match self {
            ViewChange::Select(_) => ViewChange::Select(target),
            ViewChange::SetExpanded { open, .. } => ViewChange::SetExpanded { node: target, open },
            ViewChange::Deselect => ViewChange::Deselect,
        }
    }

    fn apply(self, views: &mut DualView, side: Side) {
        let view = views.get_mut(side);
        match self {
            ViewChange::Select(node) => {
                view.select(Some(node));
            }
            ViewChange::Deselect => {
                view.select(None);
            }
            ViewChange::SetExpanded { node, open } => {
                view.set_expanded(node, open);
            }
        }
    }
}

/// What [`apply_change`] did with the other view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The change was mirrored onto this node of the other view
    Mirrored(Option<NodeId>),
    /// Sync is switched off; only the source view changed
    LocalOnly,
    /// A sync was already in progress; only the source view changed
    Suppressed,
    /// The node's path was not indexed; logged and ignored
    Missed,
}

/// Apply a user change to `source`'s view and mirror it onto the other view
pub fn apply_change(
    comparison: &Comparison,
    views: &mut DualView,
    guard: &mut SyncGuard,
    source: Side,
    change: ViewChange,
    sync_enabled: bool,
) -> SyncOutcome {
    change.apply(views, source);

    if !sync_enabled {
        return SyncOutcome::LocalOnly;
    }
    if !guard.begin(source) {
        debug!(source = %source, ?change, "Change made while syncing, not mirrored");
        return SyncOutcome::Suppressed;
    }

    let outcome = match change.node() {
        None => {
            change.apply(views, source.other());
            SyncOutcome::Mirrored(None)
        }
        Some(node) => match mirror_node(comparison, source, node) {
            Ok(target) => {
                change.retarget(target).apply(views, source.other());
                SyncOutcome::Mirrored(Some(target))
            }
            Err(e) => {
                warn!(source = %source, node = %node, error = %e, "Cannot mirror view change");
                SyncOutcome::Missed
            }
        },
    };

    guard.end();
    outcome
}

/// The node in the other tree showing the same path as `node`
pub fn mirror_node(comparison: &Comparison, source: Side, node: NodeId) -> Result<NodeId> {
    let path = resolve_path(comparison.tree(source), node)?;
    lookup_mirror(&comparison.index, &path, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::compare;
    use crate::config::EngineConfig;
    use zipdelta_parsers::{entry_map, ArchiveEntry};

    fn make_test_comparison() -> Comparison {
        let left = entry_map(vec![
            ArchiveEntry::file("dir/f1.txt", 1, 1, None),
            ArchiveEntry::file("dir/f2.txt", 1, 2, None),
        ]);
        let right = entry_map(vec![
            ArchiveEntry::file("dir/f1.txt", 1, 1, None),
            ArchiveEntry::file("dir/f3.txt", 1, 3, None),
        ]);
        compare(&left, &right, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_guard_states() {
        let mut guard = SyncGuard::new();
        assert_eq!(guard.state(), SyncState::Idle);
        assert!(guard.begin(Side::Left));
        assert!(!guard.begin(Side::Right));
        assert_eq!(guard.state(), SyncState::Syncing { source: Side::Left });
        guard.end();
        assert!(!guard.is_syncing());
    }

    #[test]
    fn test_select_mirrors() {
        let c = make_test_comparison();
        let mut views = DualView::new();
        let mut guard = SyncGuard::new();

        let f3 = c.right.find_path("dir/f3.txt").unwrap();
        let outcome = apply_change(&c, &mut views, &mut guard, Side::Right, ViewChange::Select(f3), true);

        let mirrored = c.left.find_path("dir/f3.txt").unwrap();
        assert_eq!(outcome, SyncOutcome::Mirrored(Some(mirrored)));
        assert_eq!(views.get(Side::Left).selected(), Some(mirrored));
        assert_eq!(views.get(Side::Right).selected(), Some(f3));
        assert!(!guard.is_syncing());
    }

    #[test]
    fn test_expand_mirrors() {
        let c = make_test_comparison();
        let mut views = DualView::new();
        let mut guard = SyncGuard::new();

        let dir = c.left.find_path("dir/").unwrap();
        let change = ViewChange::SetExpanded { node: dir, open: true };
        apply_change(&c, &mut views, &mut guard, Side::Left, change, true);

        let right_dir = c.right.find_path("dir/").unwrap();
        assert!(views.get(Side::Right).is_expanded(right_dir));

        let change = ViewChange::SetExpanded { node: right_dir, open: false };
        apply_change(&c, &mut views, &mut guard, Side::Right, change, true);
        assert!(!views.get(Side::Left).is_expanded(dir));
    }

    #[test]
    fn test_sync_disabled() {
        let c = make_test_comparison();
        let mut views = DualView::new();
        let mut guard = SyncGuard::new();

        let f1 = c.left.find_path("dir/f1.txt").unwrap();
        let outcome = apply_change(&c, &mut views, &mut guard, Side::Left, ViewChange::Select(f1), false);
        assert_eq!(outcome, SyncOutcome::LocalOnly);
        assert_eq!(views.get(Side::Right).selected(), None);
    }

    #[test]
    fn test_no_feedback_while_syncing() {
        let c = make_test_comparison();
        let mut views = DualView::new();
        let mut guard = SyncGuard::new();
        guard.begin(Side::Left);

        let f1 = c.right.find_path("dir/f1.txt").unwrap();
        let outcome = apply_change(&c, &mut views, &mut guard, Side::Right, ViewChange::Select(f1), true);
        assert_eq!(outcome, SyncOutcome::Suppressed);
        assert_eq!(views.get(Side::Left).selected(), None);
        assert!(guard.is_syncing());
    }

    #[test]
    fn test_unknown_node_is_swallowed() {
        let c = make_test_comparison();
        let mut views = DualView::new();
        let mut guard = SyncGuard::new();

        let outcome = apply_change(
            &c,
            &mut views,
            &mut guard,
            Side::Left,
            ViewChange::Select(NodeId(999)),
            true,
        );
        assert_eq!(outcome, SyncOutcome::Missed);
        assert_eq!(views.get(Side::Right).selected(), None);
        assert!(!guard.is_syncing());
    }

    #[test]
    fn test_deselect_mirrors() {
        let c = make_test_comparison();
        let mut views = DualView::new();
        let mut guard = SyncGuard::new();

        let f1 = c.left.find_path("dir/f1.txt").unwrap();
        apply_change(&c, &mut views, &mut guard, Side::Left, ViewChange::Select(f1), true);
        apply_change(&c, &mut views, &mut guard, Side::Left, ViewChange::Deselect, true);
        assert_eq!(views.get(Side::Right).selected(), None);
    }
}
