//! # Navigation tree core
//!
//! One immutable tree models every navigation pattern a declarative UI host
//! needs: linear stacks, tab containers with parallel per-tab stacks, and
//! adaptive multi-pane layouts, nested freely.
//!
//! The pieces, leaves first:
//!
//! - [`node`] — the tree itself: four node variants, active-path queries,
//!   structural invariants.
//! - [`registry`] — read-only host-supplied lookups: scope membership,
//!   container declarations, pane-role assignment.
//! - [`mutator`] — pure snapshot-to-snapshot operations (`push`, `pop`,
//!   `switch_tab`, …) with structural sharing.
//! - [`resolver`] — the back-press policy: cascade across stacks, tabs, and
//!   panes, or delegate to the system.
//! - [`diff`] — single-pass comparison of two snapshots yielding removed
//!   screens and lifecycle nodes.
//!
//! ## Snapshots
//!
//! A root is an `Arc<NavNode>`. Mutators never touch it; they hand back a
//! new root sharing every unchanged subtree:
//!
//! ```rust
//! use switchback_core::*;
//!
//! let keys = KeySource::new();
//! let root = single_screen_root(RouteDestination::shared("home"), &keys);
//! let next = mutator::push(
//!     &root,
//!     RouteDestination::shared("home/detail"),
//!     &PermissiveScopes,
//!     &NoPaneRoles,
//!     &keys,
//! );
//! assert_eq!(next.active_leaf().unwrap().destination.route(), "home/detail");
//! assert_eq!(root.active_leaf().unwrap().destination.route(), "home");
//! ```
//!
//! Scope-aware pushes are what keep a tab bar underneath a full-screen
//! flow: a destination the surrounding container refuses to host becomes a
//! sibling stack next to that container instead of a child inside it.

pub mod builder;
pub mod destination;
pub mod diff;
pub mod error;
pub mod iter;
pub mod key;
pub mod mutator;
pub mod node;
pub mod registry;
pub mod resolver;
pub mod tests;

pub use builder::TreeScaffold;
pub use destination::{Destination, DestinationRef, RouteDestination};
pub use diff::{LifecycleDiff, diff_trees};
pub use error::{LogErrorHandler, NavError, NavErrorHandler};
pub use iter::{Descendants, ancestors, descendants, path_to_key};
pub use key::{KeySource, NodeKey};
pub use node::{
    Children, NavNode, PaneBackBehavior, PaneConfiguration, PaneNode, PaneRole, ScreenNode,
    StackNode, TabItem, TabNode, active_path, screen_keys, single_screen_root, walk, walk_post,
    with_parent_key,
};
pub use registry::{
    ContainerFactory, ContainerInfo, ContainerRegistry, ContainerTable, NoContainers, NoPaneRoles,
    PaneRoleRegistry, PaneRoleTable, PermissiveScopes, ScopeRegistry, ScopeTable,
};
pub use resolver::{BackResolution, WindowSizeClass, resolve_back};
