//! Read-only lookup tables supplied by the host.
//!
//! Scope membership, container declarations, and pane-role assignment are
//! all data-driven predicates keyed by a destination's route template —
//! materialised tables (usually emitted by the host's code generator), never
//! runtime type introspection. Every registry is immutable for the lifetime
//! of a navigator and safe to read from any thread.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::destination::Destination;
use crate::key::{KeySource, NodeKey};
use crate::node::{NavNode, PaneRole};

pub trait ScopeRegistry: Send + Sync {
    /// Does `destination` belong to the container's declared set?
    fn is_in_scope(&self, scope_key: &str, destination: &dyn Destination) -> bool;

    /// The scope the destination belongs to, if any.
    fn scope_key_of(&self, destination: &dyn Destination) -> Option<String>;
}

/// Admits every destination into every scope (no enforcement).
#[derive(Clone, Copy, Debug, Default)]
pub struct PermissiveScopes;

impl ScopeRegistry for PermissiveScopes {
    fn is_in_scope(&self, _scope_key: &str, _destination: &dyn Destination) -> bool {
        true
    }

    fn scope_key_of(&self, _destination: &dyn Destination) -> Option<String> {
        None
    }
}

/// Generated-table scope membership keyed by route template. A route belongs
/// to at most one scope.
#[derive(Clone, Debug, Default)]
pub struct ScopeTable {
    members: HashMap<String, HashSet<String>>,
    scope_of_route: HashMap<String, String>,
}

impl ScopeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, scope_key: &str, route: &str) {
        self.members
            .entry(scope_key.to_owned())
            .or_default()
            .insert(route.to_owned());
        self.scope_of_route
            .insert(route.to_owned(), scope_key.to_owned());
    }

    pub fn with_scope<'a>(
        mut self,
        scope_key: &str,
        routes: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        for route in routes {
            self.add(scope_key, route);
        }
        self
    }
}

impl ScopeRegistry for ScopeTable {
    fn is_in_scope(&self, scope_key: &str, destination: &dyn Destination) -> bool {
        self.members
            .get(scope_key)
            .is_some_and(|set| set.contains(destination.route()))
    }

    fn scope_key_of(&self, destination: &dyn Destination) -> Option<String> {
        self.scope_of_route.get(destination.route()).cloned()
    }
}

/// Builds the container node a destination declares: a tab or pane container
/// keyed with `key`, parented by `parent_key`, drawing any inner keys from
/// the shared source.
pub type ContainerFactory =
    Arc<dyn Fn(NodeKey, Option<NodeKey>, &KeySource) -> NavNode + Send + Sync>;

#[derive(Clone)]
pub struct ContainerInfo {
    pub scope_key: String,
    pub build: ContainerFactory,
}

impl ContainerInfo {
    pub fn new(
        scope_key: impl Into<String>,
        build: impl Fn(NodeKey, Option<NodeKey>, &KeySource) -> NavNode + Send + Sync + 'static,
    ) -> Self {
        Self {
            scope_key: scope_key.into(),
            build: Arc::new(build),
        }
    }
}

impl std::fmt::Debug for ContainerInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerInfo")
            .field("scope_key", &self.scope_key)
            .finish_non_exhaustive()
    }
}

pub trait ContainerRegistry: Send + Sync {
    fn container_info_of(&self, destination: &dyn Destination) -> Option<ContainerInfo>;
}

/// No destination declares a container.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoContainers;

impl ContainerRegistry for NoContainers {
    fn container_info_of(&self, _destination: &dyn Destination) -> Option<ContainerInfo> {
        None
    }
}

/// Route-keyed container declarations.
#[derive(Clone, Debug, Default)]
pub struct ContainerTable {
    by_route: HashMap<String, ContainerInfo>,
}

impl ContainerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, route: &str, info: ContainerInfo) {
        self.by_route.insert(route.to_owned(), info);
    }

    pub fn with_container(mut self, route: &str, info: ContainerInfo) -> Self {
        self.register(route, info);
        self
    }
}

impl ContainerRegistry for ContainerTable {
    fn container_info_of(&self, destination: &dyn Destination) -> Option<ContainerInfo> {
        self.by_route.get(destination.route()).cloned()
    }
}

pub trait PaneRoleRegistry: Send + Sync {
    /// The pane a destination prefers when pushed inside a pane container;
    /// `None` falls back to the active pane.
    fn role_of(&self, destination: &dyn Destination) -> Option<PaneRole>;
}

/// Every destination lands in the active pane.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPaneRoles;

impl PaneRoleRegistry for NoPaneRoles {
    fn role_of(&self, _destination: &dyn Destination) -> Option<PaneRole> {
        None
    }
}

/// Route-keyed pane role assignment.
#[derive(Clone, Debug, Default)]
pub struct PaneRoleTable {
    by_route: HashMap<String, PaneRole>,
}

impl PaneRoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, route: &str, role: PaneRole) -> Self {
        self.by_route.insert(route.to_owned(), role);
        self
    }
}

impl PaneRoleRegistry for PaneRoleTable {
    fn role_of(&self, destination: &dyn Destination) -> Option<PaneRole> {
        self.by_route.get(destination.route()).copied()
    }
}
