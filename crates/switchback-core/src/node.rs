//! # The navigation tree
//!
//! One recursive structure models linear stacks, tab containers with parallel
//! stacks, and multi-pane layouts:
//!
//! - [`ScreenNode`] — leaf; renders a [`Destination`](crate::Destination).
//! - [`StackNode`] — ordered children, last child active ("top of stack").
//! - [`TabNode`] — one stack per tab plus an active index.
//! - [`PaneNode`] — role-keyed pane configurations plus an active role.
//!
//! Nodes are immutable; every mutation produces a new root that shares all
//! untouched subtrees by `Arc`. Each node carries its `key` and a
//! `parent_key` back-reference. The back-reference is a lookup aid, never an
//! ownership edge, and is rewritten whenever a node is rebuilt under a new
//! parent.
//!
//! The **active path** is the unique root-to-leaf walk obtained by taking,
//! at each level, the child selected by that node's activity rule (last
//! child for stacks, `active_stack_index` for tabs, `active_pane_role` for
//! panes).

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::destination::DestinationRef;
use crate::key::{KeySource, NodeKey};

pub type Children = SmallVec<[Arc<NavNode>; 4]>;

#[derive(Clone, Debug)]
pub enum NavNode {
    Screen(ScreenNode),
    Stack(StackNode),
    Tabs(TabNode),
    Panes(PaneNode),
}

#[derive(Clone, Debug)]
pub struct ScreenNode {
    pub key: NodeKey,
    pub parent_key: Option<NodeKey>,
    pub destination: DestinationRef,
}

impl ScreenNode {
    pub fn new(key: NodeKey, parent_key: Option<NodeKey>, destination: DestinationRef) -> Self {
        Self {
            key,
            parent_key,
            destination,
        }
    }
}

#[derive(Clone, Debug)]
pub struct StackNode {
    pub key: NodeKey,
    pub parent_key: Option<NodeKey>,
    pub children: Children,
}

impl StackNode {
    pub fn new(key: NodeKey, parent_key: Option<NodeKey>) -> Self {
        Self {
            key,
            parent_key,
            children: Children::new(),
        }
    }

    /// Stack holding a single freshly keyed screen.
    pub fn with_screen(
        key: NodeKey,
        parent_key: Option<NodeKey>,
        destination: DestinationRef,
        keys: &KeySource,
    ) -> Self {
        let mut stack = Self::new(key, parent_key);
        let screen = ScreenNode::new(keys.next(), Some(key), destination);
        stack.children.push(Arc::new(NavNode::Screen(screen)));
        stack
    }

    pub fn top(&self) -> Option<&Arc<NavNode>> {
        self.children.last()
    }
}

/// Per-tab metadata kept on the tree so back-resolution and deep-link
/// reconstruction can read it without re-entering the host's registries.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TabItem {
    pub label: String,
    pub icon: Option<String>,
    pub route: String,
}

impl TabItem {
    pub fn new(label: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            route: route.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TabNode {
    pub key: NodeKey,
    pub parent_key: Option<NodeKey>,
    /// One stack per tab; every element is the `Stack` variant.
    pub stacks: Vec<Arc<NavNode>>,
    pub active_stack_index: usize,
    /// The tab a back press returns to before delegating further up.
    pub initial_stack_index: usize,
    pub items: Vec<TabItem>,
    /// Destination set this container is willing to host; `None` hosts
    /// anything.
    pub scope_key: Option<String>,
    /// Names the UI chrome (e.g. which bottom bar) the renderer wraps this
    /// container in.
    pub wrapper_key: Option<String>,
}

impl TabNode {
    /// Builds a tab container with one single-screen stack per entry.
    pub fn build(
        key: NodeKey,
        parent_key: Option<NodeKey>,
        tabs: Vec<(TabItem, DestinationRef)>,
        initial_index: usize,
        scope_key: Option<String>,
        keys: &KeySource,
    ) -> Self {
        let mut items = Vec::with_capacity(tabs.len());
        let mut stacks = Vec::with_capacity(tabs.len());
        for (item, destination) in tabs {
            items.push(item);
            let stack = StackNode::with_screen(keys.next(), Some(key), destination, keys);
            stacks.push(Arc::new(NavNode::Stack(stack)));
        }
        let initial = if initial_index < stacks.len() {
            initial_index
        } else {
            0
        };
        Self {
            key,
            parent_key,
            stacks,
            active_stack_index: initial,
            initial_stack_index: initial,
            items,
            scope_key,
            wrapper_key: None,
        }
    }

    pub fn stack_at(&self, index: usize) -> Option<&StackNode> {
        self.stacks.get(index).and_then(|n| n.as_stack())
    }

    /// Tab whose metadata carries `route`; deep-link reconstruction picks a
    /// tab through this instead of re-entering the registries.
    pub fn index_of_route(&self, route: &str) -> Option<usize> {
        self.items.iter().position(|item| item.route == route)
    }

    pub fn active_stack_node(&self) -> Option<&Arc<NavNode>> {
        self.stacks.get(self.active_stack_index)
    }
}

/// Well-known pane roles of an adaptive layout. Closed set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaneRole {
    Primary,
    Supporting,
    Extra,
}

/// How a pane container answers a back request in expanded layouts. Compact
/// layouts always treat the container as a single stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaneBackBehavior {
    /// Pop whichever pane stack changes the visible layout.
    #[default]
    PopUntilLayoutChange,
    /// Always pop the primary pane's stack.
    PopPrimaryPane,
    /// Only the primary pane answers; decline if it cannot pop.
    DelegateToPrimary,
}

#[derive(Clone, Debug)]
pub struct PaneConfiguration {
    /// Always the `Stack` variant; mutators normalise other content by
    /// wrapping it.
    pub content: Arc<NavNode>,
}

#[derive(Clone, Debug)]
pub struct PaneNode {
    pub key: NodeKey,
    pub parent_key: Option<NodeKey>,
    /// Insertion-ordered role map; at most one entry per role.
    pub panes: SmallVec<[(PaneRole, PaneConfiguration); 3]>,
    pub active_pane_role: PaneRole,
    pub back_behavior: PaneBackBehavior,
    pub scope_key: Option<String>,
}

impl PaneNode {
    /// Builds a pane container with one single-screen stack per role.
    pub fn build(
        key: NodeKey,
        parent_key: Option<NodeKey>,
        panes: Vec<(PaneRole, DestinationRef)>,
        active_role: PaneRole,
        back_behavior: PaneBackBehavior,
        scope_key: Option<String>,
        keys: &KeySource,
    ) -> Self {
        let mut entries: SmallVec<[(PaneRole, PaneConfiguration); 3]> = SmallVec::new();
        for (role, destination) in panes {
            let stack = StackNode::with_screen(keys.next(), Some(key), destination, keys);
            entries.push((
                role,
                PaneConfiguration {
                    content: Arc::new(NavNode::Stack(stack)),
                },
            ));
        }
        let active = if entries.iter().any(|(r, _)| *r == active_role) {
            active_role
        } else {
            entries.first().map(|(r, _)| *r).unwrap_or(PaneRole::Primary)
        };
        Self {
            key,
            parent_key,
            panes: entries,
            active_pane_role: active,
            back_behavior,
            scope_key,
        }
    }

    pub fn configuration(&self, role: PaneRole) -> Option<&PaneConfiguration> {
        self.panes.iter().find(|(r, _)| *r == role).map(|(_, c)| c)
    }

    pub fn has_role(&self, role: PaneRole) -> bool {
        self.panes.iter().any(|(r, _)| *r == role)
    }

    pub fn active_configuration(&self) -> Option<&PaneConfiguration> {
        self.configuration(self.active_pane_role)
    }
}

impl NavNode {
    pub fn key(&self) -> NodeKey {
        match self {
            NavNode::Screen(n) => n.key,
            NavNode::Stack(n) => n.key,
            NavNode::Tabs(n) => n.key,
            NavNode::Panes(n) => n.key,
        }
    }

    pub fn parent_key(&self) -> Option<NodeKey> {
        match self {
            NavNode::Screen(n) => n.parent_key,
            NavNode::Stack(n) => n.parent_key,
            NavNode::Tabs(n) => n.parent_key,
            NavNode::Panes(n) => n.parent_key,
        }
    }

    pub fn as_screen(&self) -> Option<&ScreenNode> {
        match self {
            NavNode::Screen(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_stack(&self) -> Option<&StackNode> {
        match self {
            NavNode::Stack(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_tabs(&self) -> Option<&TabNode> {
        match self {
            NavNode::Tabs(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_panes(&self) -> Option<&PaneNode> {
        match self {
            NavNode::Panes(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NavNode::Tabs(_) | NavNode::Panes(_))
    }

    /// The child selected by this node's activity rule.
    pub fn active_child(&self) -> Option<&Arc<NavNode>> {
        match self {
            NavNode::Screen(_) => None,
            NavNode::Stack(n) => n.children.last(),
            NavNode::Tabs(n) => n.active_stack_node(),
            NavNode::Panes(n) => n.active_configuration().map(|c| &c.content),
        }
    }

    /// Follows the active path down to its leaf screen. `None` only when the
    /// walk dead-ends in an empty stack.
    pub fn active_leaf(&self) -> Option<&ScreenNode> {
        let mut cur = self;
        loop {
            match cur.active_child() {
                Some(child) => cur = child,
                None => return cur.as_screen(),
            }
        }
    }

    /// Deepest stack on the active path.
    pub fn active_stack(&self) -> Option<&StackNode> {
        let mut cur = self;
        let mut deepest = cur.as_stack();
        while let Some(child) = cur.active_child() {
            cur = child;
            if let Some(stack) = cur.as_stack() {
                deepest = Some(stack);
            }
        }
        deepest
    }

    /// Pre-order search by key.
    pub fn find_by_key(&self, key: NodeKey) -> Option<&NavNode> {
        if self.key() == key {
            return Some(self);
        }
        match self {
            NavNode::Screen(_) => None,
            NavNode::Stack(n) => n.children.iter().find_map(|c| c.find_by_key(key)),
            NavNode::Tabs(n) => n.stacks.iter().find_map(|c| c.find_by_key(key)),
            NavNode::Panes(n) => n
                .panes
                .iter()
                .find_map(|(_, c)| c.content.find_by_key(key)),
        }
    }

    /// Pre-order search for the first tab container.
    pub fn find_first_tabs(&self) -> Option<&TabNode> {
        match self {
            NavNode::Tabs(t) => Some(t),
            NavNode::Screen(_) => None,
            NavNode::Stack(n) => n.children.iter().find_map(|c| c.find_first_tabs()),
            NavNode::Panes(n) => n.panes.iter().find_map(|(_, c)| c.content.find_first_tabs()),
        }
    }

    /// Pre-order search for the first pane container.
    pub fn find_first_panes(&self) -> Option<&PaneNode> {
        match self {
            NavNode::Screen(_) => None,
            NavNode::Stack(n) => n.children.iter().find_map(|c| c.find_first_panes()),
            NavNode::Tabs(n) => n.stacks.iter().find_map(|c| c.find_first_panes()),
            NavNode::Panes(p) => Some(p),
        }
    }

    /// Compact single-line rendering used by tests and debug logging.
    ///
    /// Screens print their route, stacks as `[..]`, tabs as `Tabs@i[..]`,
    /// panes as `Panes@Role{Role:[..], ..}`.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out);
        out
    }

    fn write_outline(&self, out: &mut String) {
        match self {
            NavNode::Screen(n) => {
                let _ = write!(out, "{:?}", n.destination);
            }
            NavNode::Stack(n) => {
                out.push('[');
                for (i, child) in n.children.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    child.write_outline(out);
                }
                out.push(']');
            }
            NavNode::Tabs(n) => {
                let _ = write!(out, "Tabs@{}", n.active_stack_index);
                out.push('[');
                for (i, stack) in n.stacks.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    stack.write_outline(out);
                }
                out.push(']');
            }
            NavNode::Panes(n) => {
                let _ = write!(out, "Panes@{:?}", n.active_pane_role);
                out.push('{');
                for (i, (role, cfg)) in n.panes.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{role:?}:");
                    cfg.content.write_outline(out);
                }
                out.push('}');
            }
        }
    }

    /// Checks every structural invariant, panicking with a description on
    /// the first violation. Test-and-debug aid; mutators uphold these by
    /// construction.
    pub fn validate(&self) {
        assert!(
            matches!(self, NavNode::Stack(_)),
            "root must be a stack, got {}",
            self.outline()
        );
        assert_eq!(self.parent_key(), None, "root must have no parent");
        let mut seen = HashSet::new();
        self.validate_inner(None, &mut seen);
    }

    fn validate_inner(&self, expected_parent: Option<NodeKey>, seen: &mut HashSet<NodeKey>) {
        assert!(
            seen.insert(self.key()),
            "duplicate key {:?} in {}",
            self.key(),
            self.outline()
        );
        assert_eq!(
            self.parent_key(),
            expected_parent,
            "stale parent reference on {:?}",
            self.key()
        );
        match self {
            NavNode::Screen(_) => {}
            NavNode::Stack(n) => {
                for child in &n.children {
                    child.validate_inner(Some(n.key), seen);
                }
            }
            NavNode::Tabs(n) => {
                assert!(!n.stacks.is_empty(), "tab container without stacks");
                assert!(
                    n.active_stack_index < n.stacks.len(),
                    "active tab {} out of range ({} stacks)",
                    n.active_stack_index,
                    n.stacks.len()
                );
                assert!(
                    n.initial_stack_index < n.stacks.len(),
                    "initial tab {} out of range ({} stacks)",
                    n.initial_stack_index,
                    n.stacks.len()
                );
                for stack in &n.stacks {
                    assert!(stack.as_stack().is_some(), "tab child must be a stack");
                    stack.validate_inner(Some(n.key), seen);
                }
            }
            NavNode::Panes(n) => {
                assert!(!n.panes.is_empty(), "pane container without panes");
                assert!(
                    n.has_role(n.active_pane_role),
                    "active pane role {:?} not configured",
                    n.active_pane_role
                );
                for (_, cfg) in &n.panes {
                    assert!(
                        cfg.content.as_stack().is_some(),
                        "pane content must be a stack"
                    );
                    cfg.content.validate_inner(Some(n.key), seen);
                }
            }
        }
    }
}

/// Root-to-leaf active path as shared handles; `path[0]` is the root.
pub fn active_path(root: &Arc<NavNode>) -> Vec<Arc<NavNode>> {
    let mut path = vec![root.clone()];
    loop {
        let next = match path.last().unwrap().active_child() {
            Some(child) => child.clone(),
            None => break,
        };
        path.push(next);
    }
    path
}

/// Pre-order visit of every node.
pub fn walk(node: &Arc<NavNode>, f: &mut impl FnMut(&Arc<NavNode>)) {
    f(node);
    match &**node {
        NavNode::Screen(_) => {}
        NavNode::Stack(n) => {
            for child in &n.children {
                walk(child, f);
            }
        }
        NavNode::Tabs(n) => {
            for stack in &n.stacks {
                walk(stack, f);
            }
        }
        NavNode::Panes(n) => {
            for (_, cfg) in &n.panes {
                walk(&cfg.content, f);
            }
        }
    }
}

/// Post-order visit (children before their container).
pub fn walk_post(node: &Arc<NavNode>, f: &mut impl FnMut(&Arc<NavNode>)) {
    match &**node {
        NavNode::Screen(_) => {}
        NavNode::Stack(n) => {
            for child in &n.children {
                walk_post(child, f);
            }
        }
        NavNode::Tabs(n) => {
            for stack in &n.stacks {
                walk_post(stack, f);
            }
        }
        NavNode::Panes(n) => {
            for (_, cfg) in &n.panes {
                walk_post(&cfg.content, f);
            }
        }
    }
    f(node);
}

/// Every screen key in the tree.
pub fn screen_keys(root: &Arc<NavNode>) -> HashSet<NodeKey> {
    let mut keys = HashSet::new();
    walk(root, &mut |node| {
        if let NavNode::Screen(s) = &**node {
            keys.insert(s.key);
        }
    });
    keys
}

/// Shallow rebuild with a different parent reference. Returns the same
/// handle when nothing changes.
pub fn with_parent_key(node: &Arc<NavNode>, parent_key: Option<NodeKey>) -> Arc<NavNode> {
    if node.parent_key() == parent_key {
        return node.clone();
    }
    let mut rebuilt = (**node).clone();
    match &mut rebuilt {
        NavNode::Screen(n) => n.parent_key = parent_key,
        NavNode::Stack(n) => n.parent_key = parent_key,
        NavNode::Tabs(n) => n.parent_key = parent_key,
        NavNode::Panes(n) => n.parent_key = parent_key,
    }
    Arc::new(rebuilt)
}

/// Fresh root stack holding a single screen for `destination`.
pub fn single_screen_root(destination: DestinationRef, keys: &KeySource) -> Arc<NavNode> {
    let stack = StackNode::with_screen(keys.next(), None, destination, keys);
    Arc::new(NavNode::Stack(stack))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::RouteDestination;

    fn tab_fixture() -> (Arc<NavNode>, KeySource) {
        let keys = KeySource::new();
        let root_key = keys.next();
        let tabs = TabNode::build(
            keys.next(),
            Some(root_key),
            vec![
                (TabItem::new("Home", "home"), RouteDestination::shared("home")),
                (
                    TabItem::new("Search", "search"),
                    RouteDestination::shared("search"),
                ),
            ],
            0,
            Some("MainTabs".into()),
            &keys,
        );
        let mut root = StackNode::new(root_key, None);
        root.children.push(Arc::new(NavNode::Tabs(tabs)));
        (Arc::new(NavNode::Stack(root)), keys)
    }

    #[test]
    fn active_leaf_follows_activity_rules() {
        let (root, _keys) = tab_fixture();
        root.validate();
        assert_eq!(root.active_leaf().unwrap().destination.route(), "home");
        insta::assert_snapshot!(root.outline(), @"[Tabs@0[[home], [search]]]");
    }

    #[test]
    fn active_stack_is_deepest_on_path() {
        let (root, _keys) = tab_fixture();
        let stack = root.active_stack().unwrap();
        assert_eq!(stack.children.len(), 1);
        assert_eq!(
            stack.children[0].as_screen().unwrap().destination.route(),
            "home"
        );
    }

    #[test]
    fn find_by_key_reaches_every_node() {
        let (root, _keys) = tab_fixture();
        let mut count = 0;
        walk(&root, &mut |node| {
            assert!(root.find_by_key(node.key()).is_some());
            count += 1;
        });
        // root stack + tabs + 2 stacks + 2 screens
        assert_eq!(count, 6);
    }

    #[test]
    fn empty_root_stack_has_no_leaf() {
        let keys = KeySource::new();
        let root = Arc::new(NavNode::Stack(StackNode::new(keys.next(), None)));
        assert!(root.active_leaf().is_none());
        assert!(root.active_stack().is_some());
    }

    #[test]
    fn pane_builder_falls_back_to_first_role() {
        let keys = KeySource::new();
        let pane = PaneNode::build(
            keys.next(),
            None,
            vec![(PaneRole::Supporting, RouteDestination::shared("list"))],
            PaneRole::Extra,
            PaneBackBehavior::default(),
            None,
            &keys,
        );
        assert_eq!(pane.active_pane_role, PaneRole::Supporting);
    }

    #[test]
    fn with_parent_key_shares_when_unchanged() {
        let (root, _keys) = tab_fixture();
        let same = with_parent_key(&root, None);
        assert!(Arc::ptr_eq(&root, &same));
    }
}
