//! Host-facing assembly of initial trees.
//!
//! Mutators grow a tree from an existing root; this scaffold builds that
//! first root. Children are appended to the root stack in order, so the
//! last appended entry starts out active.
//!
//! ```rust
//! use switchback_core::*;
//!
//! let (root, keys) = TreeScaffold::new()
//!     .tabs(
//!         Some("MainTabs"),
//!         0,
//!         vec![
//!             (TabItem::new("Home", "home"), RouteDestination::shared("home")),
//!             (TabItem::new("Search", "search"), RouteDestination::shared("search")),
//!         ],
//!     )
//!     .build();
//! assert_eq!(root.active_leaf().unwrap().destination.route(), "home");
//! let _ = keys;
//! ```

use std::sync::Arc;

use crate::destination::DestinationRef;
use crate::key::{KeySource, NodeKey};
use crate::node::{
    NavNode, PaneBackBehavior, PaneNode, PaneRole, ScreenNode, StackNode, TabItem, TabNode,
};

pub struct TreeScaffold {
    keys: KeySource,
    root_key: NodeKey,
    children: Vec<Arc<NavNode>>,
}

impl TreeScaffold {
    pub fn new() -> Self {
        let keys = KeySource::new();
        let root_key = keys.next();
        Self {
            keys,
            root_key,
            children: Vec::new(),
        }
    }

    /// Appends a plain screen to the root stack.
    pub fn screen(mut self, destination: DestinationRef) -> Self {
        let screen = ScreenNode::new(self.keys.next(), Some(self.root_key), destination);
        self.children.push(Arc::new(NavNode::Screen(screen)));
        self
    }

    /// Appends a tab container with one single-screen stack per tab.
    pub fn tabs(
        mut self,
        scope_key: Option<&str>,
        initial_index: usize,
        tabs: Vec<(TabItem, DestinationRef)>,
    ) -> Self {
        let node = TabNode::build(
            self.keys.next(),
            Some(self.root_key),
            tabs,
            initial_index,
            scope_key.map(str::to_owned),
            &self.keys,
        );
        self.children.push(Arc::new(NavNode::Tabs(node)));
        self
    }

    /// Appends a pane container with one single-screen stack per role.
    pub fn panes(
        mut self,
        panes: Vec<(PaneRole, DestinationRef)>,
        active_role: PaneRole,
        back_behavior: PaneBackBehavior,
        scope_key: Option<&str>,
    ) -> Self {
        let node = PaneNode::build(
            self.keys.next(),
            Some(self.root_key),
            panes,
            active_role,
            back_behavior,
            scope_key.map(str::to_owned),
            &self.keys,
        );
        self.children.push(Arc::new(NavNode::Panes(node)));
        self
    }

    /// Finishes the root stack, handing back the tree together with the key
    /// source that numbered it (pass both to the navigator).
    pub fn build(self) -> (Arc<NavNode>, KeySource) {
        let mut root = StackNode::new(self.root_key, None);
        root.children.extend(self.children);
        (Arc::new(NavNode::Stack(root)), self.keys)
    }
}

impl Default for TreeScaffold {
    fn default() -> Self {
        Self::new()
    }
}
