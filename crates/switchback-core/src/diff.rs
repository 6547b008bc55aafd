//! Lifecycle diff between two root snapshots.
//!
//! One traversal of each tree: collect the new tree's keys, then walk the
//! old tree and report everything that vanished. Feeds result cancellation
//! (removed screens) and detach notification (removed screens, tabs, and
//! panes — plain stacks carry no lifecycle).

use std::collections::HashSet;
use std::sync::Arc;

use crate::iter::descendants;
use crate::key::NodeKey;
use crate::node::{NavNode, walk_post};

#[derive(Debug, Default)]
pub struct LifecycleDiff {
    /// Screen keys present in the old tree but not the new one.
    pub removed_screen_keys: HashSet<NodeKey>,
    /// Removed nodes whose variant opts into lifecycle notifications, in
    /// post-order: children detach before the container that held them.
    pub removed_lifecycle_nodes: Vec<Arc<NavNode>>,
}

impl LifecycleDiff {
    pub fn is_empty(&self) -> bool {
        self.removed_screen_keys.is_empty() && self.removed_lifecycle_nodes.is_empty()
    }
}

pub fn diff_trees(old: &Arc<NavNode>, new: &Arc<NavNode>) -> LifecycleDiff {
    if Arc::ptr_eq(old, new) {
        return LifecycleDiff::default();
    }

    let kept: HashSet<NodeKey> = descendants(new).map(|node| node.key()).collect();

    let mut diff = LifecycleDiff::default();
    walk_post(old, &mut |node| {
        if kept.contains(&node.key()) {
            return;
        }
        match &**node {
            NavNode::Screen(s) => {
                diff.removed_screen_keys.insert(s.key);
                diff.removed_lifecycle_nodes.push(node.clone());
            }
            NavNode::Tabs(_) | NavNode::Panes(_) => {
                diff.removed_lifecycle_nodes.push(node.clone());
            }
            NavNode::Stack(_) => {}
        }
    });
    diff
}
