//! Tree iteration without callbacks.
//!
//! The closure walks in [`node`](crate::node) are enough for the core's own
//! passes; hosts and tooling usually want ordinary iterators they can
//! filter, zip, and collect. Traversal order is pre-order: a node before
//! its children, stack children bottom-to-top, tab stacks left-to-right,
//! panes in configuration order.

use std::sync::Arc;

use crate::key::NodeKey;
use crate::node::NavNode;

/// Pre-order depth-first iterator over a subtree.
pub struct Descendants<'a> {
    pending: Vec<&'a Arc<NavNode>>,
}

pub fn descendants(root: &Arc<NavNode>) -> Descendants<'_> {
    Descendants {
        pending: vec![root],
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Arc<NavNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.pending.pop()?;
        // Children go on the stack reversed so the first child pops first.
        match &**node {
            NavNode::Screen(_) => {}
            NavNode::Stack(n) => self.pending.extend(n.children.iter().rev()),
            NavNode::Tabs(n) => self.pending.extend(n.stacks.iter().rev()),
            NavNode::Panes(n) => self
                .pending
                .extend(n.panes.iter().rev().map(|(_, cfg)| &cfg.content)),
        }
        Some(node)
    }
}

/// Root-to-target chain, target included. `None` when the key is absent.
pub fn path_to_key(root: &Arc<NavNode>, key: NodeKey) -> Option<Vec<&Arc<NavNode>>> {
    fn descend<'a>(
        node: &'a Arc<NavNode>,
        key: NodeKey,
        path: &mut Vec<&'a Arc<NavNode>>,
    ) -> bool {
        path.push(node);
        if node.key() == key {
            return true;
        }
        let found = match &**node {
            NavNode::Screen(_) => false,
            NavNode::Stack(n) => n.children.iter().any(|c| descend(c, key, path)),
            NavNode::Tabs(n) => n.stacks.iter().any(|c| descend(c, key, path)),
            NavNode::Panes(n) => n
                .panes
                .iter()
                .any(|(_, cfg)| descend(&cfg.content, key, path)),
        };
        if !found {
            path.pop();
        }
        found
    }

    let mut path = Vec::new();
    descend(root, key, &mut path).then_some(path)
}

/// Ancestor chain of `key`, nearest parent first, root last.
pub fn ancestors(root: &Arc<NavNode>, key: NodeKey) -> Vec<&Arc<NavNode>> {
    let Some(mut path) = path_to_key(root, key) else {
        return Vec::new();
    };
    path.pop();
    path.reverse();
    path
}
