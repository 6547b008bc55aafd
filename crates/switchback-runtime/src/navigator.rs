//! # Navigator facade
//!
//! The single source of truth for one navigation tree, plus the derived
//! signals a host renders from. Every high-level operation runs as one
//! atomic step on the host's write thread:
//!
//! 1. read the current root,
//! 2. compute the next root through the mutation algebra,
//! 3. diff the two snapshots,
//! 4. publish the root and the derived signals,
//! 5. cancel results of removed screens,
//! 6. fire detach callbacks,
//! 7. emit the transition.
//!
//! Subscribers therefore never observe a transition whose target key the
//! published tree does not contain. The navigator takes no locks around the
//! sequence; serialising writers is the host scheduler's contract.

use std::sync::Arc;

use switchback_core::{
    BackResolution, ContainerRegistry, DestinationRef, KeySource, LogErrorHandler, NavError,
    NavErrorHandler, NavNode, NoContainers, NoPaneRoles, NodeKey, PaneRole, PaneRoleRegistry,
    PermissiveScopes, ScopeRegistry, WindowSizeClass, active_path, diff_trees, mutator,
    resolve_back, single_screen_root,
};

use crate::back::{BackHandlerRegistry, Dispose};
use crate::deeplink::{DeepLinkHandler, DeepLinkRegistry};
use crate::lifecycle::{LifecycleNotifier, LifecycleObserver};
use crate::result::{ResultChannel, ResultHandle};
use crate::signal::{Signal, signal};
use crate::transition::{NavTransition, TransitionDir, TransitionManager, TransitionState};

/// Host-supplied collaborators, fixed at construction.
pub struct NavigatorConfig {
    pub scopes: Arc<dyn ScopeRegistry>,
    pub containers: Arc<dyn ContainerRegistry>,
    pub pane_roles: Arc<dyn PaneRoleRegistry>,
    pub deep_links: DeepLinkRegistry,
    pub error_handler: Arc<dyn NavErrorHandler>,
    pub window_size_class: WindowSizeClass,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            scopes: Arc::new(PermissiveScopes),
            containers: Arc::new(NoContainers),
            pane_roles: Arc::new(NoPaneRoles),
            deep_links: DeepLinkRegistry::new(),
            error_handler: Arc::new(LogErrorHandler),
            window_size_class: WindowSizeClass::Compact,
        }
    }
}

pub struct Navigator {
    state: Signal<Arc<NavNode>>,
    current_destination: Signal<Option<DestinationRef>>,
    previous_destination: Signal<Option<DestinationRef>>,
    can_navigate_back: Signal<bool>,
    transitions: TransitionManager,
    results: ResultChannel,
    back_handlers: BackHandlerRegistry,
    lifecycle: LifecycleNotifier,
    deep_links: DeepLinkRegistry,
    scopes: Arc<dyn ScopeRegistry>,
    containers: Arc<dyn ContainerRegistry>,
    pane_roles: Arc<dyn PaneRoleRegistry>,
    errors: Arc<dyn NavErrorHandler>,
    size_class: WindowSizeClass,
    keys: KeySource,
}

impl Navigator {
    /// Navigator over a fresh single-screen root stack.
    pub fn with_start(destination: DestinationRef, config: NavigatorConfig) -> Self {
        let keys = KeySource::new();
        let root = single_screen_root(destination, &keys);
        Self::with_tree(root, keys, config)
    }

    /// Navigator over a prebuilt tree; `keys` must be the source its keys
    /// came from so freshly generated ones stay unique.
    pub fn with_tree(root: Arc<NavNode>, keys: KeySource, config: NavigatorConfig) -> Self {
        #[cfg(debug_assertions)]
        root.validate();
        let nav = Self {
            state: signal(root.clone()),
            current_destination: signal(None),
            previous_destination: signal(None),
            can_navigate_back: signal(false),
            transitions: TransitionManager::new(),
            results: ResultChannel::new(),
            back_handlers: BackHandlerRegistry::new(),
            lifecycle: LifecycleNotifier::new(),
            deep_links: config.deep_links,
            scopes: config.scopes,
            containers: config.containers,
            pane_roles: config.pane_roles,
            errors: config.error_handler,
            size_class: config.window_size_class,
            keys,
        };
        let (current, previous, can_back) = nav.derived(&root);
        nav.current_destination.set(current);
        nav.previous_destination.set(previous);
        nav.can_navigate_back.set(can_back);
        nav
    }

    // ---- observable surface ----

    pub fn state(&self) -> Signal<Arc<NavNode>> {
        self.state.clone()
    }

    pub fn current_root(&self) -> Arc<NavNode> {
        self.state.get()
    }

    pub fn current_destination(&self) -> Signal<Option<DestinationRef>> {
        self.current_destination.clone()
    }

    pub fn previous_destination(&self) -> Signal<Option<DestinationRef>> {
        self.previous_destination.clone()
    }

    pub fn can_navigate_back(&self) -> Signal<bool> {
        self.can_navigate_back.clone()
    }

    pub fn transition_state(&self) -> Signal<TransitionState> {
        self.transitions.state()
    }

    pub fn results(&self) -> &ResultChannel {
        &self.results
    }

    pub fn keys(&self) -> &KeySource {
        &self.keys
    }

    pub fn window_size_class(&self) -> WindowSizeClass {
        self.size_class
    }

    pub fn register_back_handler(
        &self,
        handler: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Dispose {
        self.back_handlers.register(handler)
    }

    pub fn add_lifecycle_observer(&self, observer: Arc<dyn LifecycleObserver>) {
        self.lifecycle.add(observer);
    }

    pub fn register_deep_link(&self, handler: Arc<dyn DeepLinkHandler>) -> Dispose {
        self.deep_links.register(handler)
    }

    // ---- navigation operations ----

    /// Scope-aware push. A destination that declares its own container gets
    /// that container materialised first (as a sibling of the current one)
    /// unless we are already inside it.
    pub fn navigate(&self, destination: DestinationRef, transition: Option<NavTransition>) {
        let root = self.state.get();
        if root.active_leaf().is_none() {
            self.errors.on_error(&NavError::NoActiveStack {
                op: "navigate",
                detail: format!("recovering with a fresh stack for {destination:?}"),
            });
        }
        let new_root = self.pushed_root(&root, destination);
        self.apply(
            new_root,
            Some((TransitionDir::Push, transition.unwrap_or_default())),
        );
    }

    /// Push that also registers interest in the new screen's result. The
    /// returned handle resolves when the child delivers, or as cancelled
    /// the moment the child's screen leaves the tree.
    pub fn navigate_for_result<T: Send + 'static>(
        &self,
        destination: DestinationRef,
        transition: Option<NavTransition>,
    ) -> ResultHandle<T> {
        let root = self.state.get();
        let new_root = self.pushed_root(&root, destination);
        let key = new_root
            .active_leaf()
            .map(|s| s.key)
            .unwrap_or_else(|| self.keys.next());
        // Subscribe before publishing so removal can never race the slot.
        let handle = self.results.expect(key);
        self.apply(
            new_root,
            Some((TransitionDir::Push, transition.unwrap_or_default())),
        );
        handle
    }

    /// Resolves one back press: screen-registered handlers first, then the
    /// tree. Returns whether anything consumed it.
    pub fn navigate_back(&self) -> bool {
        if self.back_handlers.dispatch() {
            return true;
        }
        let root = self.state.get();
        match self.resolve(&root) {
            BackResolution::Handled(next) => {
                self.apply(next, Some((TransitionDir::Pop, NavTransition::default())));
                true
            }
            BackResolution::CannotHandle | BackResolution::DelegateToSystem => {
                self.errors.on_error(&NavError::EmptyPop);
                false
            }
        }
    }

    /// Pop the active stack to `clear_route` (when given), then push.
    pub fn navigate_and_clear_to(
        &self,
        destination: DestinationRef,
        clear_route: Option<&str>,
        inclusive: bool,
    ) {
        let root = self.state.get();
        let cleared = match clear_route {
            Some(route) => mutator::pop_to_route(&root, route, inclusive),
            None => root,
        };
        let new_root = mutator::push(
            &cleared,
            destination,
            &*self.scopes,
            &*self.pane_roles,
            &self.keys,
        );
        self.apply(new_root, Some((TransitionDir::Push, NavTransition::default())));
    }

    /// Swap the top of the active stack for `destination`.
    pub fn navigate_and_replace(
        &self,
        destination: DestinationRef,
        transition: Option<NavTransition>,
    ) {
        let root = self.state.get();
        let new_root = mutator::replace_current(&root, destination, &self.keys);
        self.apply(
            new_root,
            Some((TransitionDir::Push, transition.unwrap_or_default())),
        );
    }

    /// Reset the active stack to a single screen.
    pub fn navigate_and_clear_all(&self, destination: DestinationRef) {
        let root = self.state.get();
        let new_root = mutator::clear_and_push(&root, destination, &self.keys);
        self.apply(new_root, Some((TransitionDir::Push, NavTransition::default())));
    }

    pub fn switch_tab(&self, tab_key: NodeKey, index: usize) {
        let root = self.state.get();
        match mutator::switch_tab(&root, tab_key, index) {
            Ok(next) => self.apply(next, None),
            Err(err) => self.errors.on_error(&err),
        }
    }

    /// Deep-link helper: activate the tab whose metadata carries `route` on
    /// the tree's first tab container. `false` when no tab matches.
    pub fn switch_tab_to_route(&self, route: &str) -> bool {
        let root = self.state.get();
        let Some(tabs) = root.find_first_tabs() else {
            return false;
        };
        let Some(index) = tabs.index_of_route(route) else {
            return false;
        };
        let tab_key = tabs.key;
        match mutator::switch_tab(&root, tab_key, index) {
            Ok(next) => {
                self.apply(next, None);
                true
            }
            Err(err) => {
                self.errors.on_error(&err);
                false
            }
        }
    }

    /// Push into the named pane role of the nearest pane container and make
    /// that role active. An unconfigured role gets a fresh stack.
    pub fn navigate_to_pane(&self, destination: DestinationRef, role: PaneRole) {
        let root = self.state.get();
        let Some(pane_key) = self.target_pane_key(&root) else {
            self.errors.on_error(&NavError::InvalidPrecondition {
                op: "navigate_to_pane",
                detail: format!("no pane container for {destination:?}"),
            });
            return;
        };
        let pushed = match mutator::push_pane_role(&root, pane_key, role, destination, &self.keys)
        {
            Ok(next) => next,
            Err(err) => {
                self.errors.on_error(&err);
                return;
            }
        };
        let activated = match mutator::switch_active_pane(&pushed, pane_key, role) {
            Ok(next) => next,
            Err(err) => {
                self.errors.on_error(&err);
                pushed
            }
        };
        self.apply(
            activated,
            Some((TransitionDir::Push, NavTransition::default())),
        );
    }

    /// Pop inside one pane role only; `false` when that pane is already at
    /// its root (the caller decides whether to cascade).
    pub fn navigate_back_in_pane(&self, role: PaneRole) -> bool {
        let root = self.state.get();
        let Some(pane_key) = self.target_pane_key(&root) else {
            return false;
        };
        match mutator::pop_pane(&root, pane_key, role) {
            Ok(Some(next)) => {
                self.apply(next, Some((TransitionDir::Pop, NavTransition::default())));
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.errors.on_error(&err);
                false
            }
        }
    }

    /// Drop everything above the bottom entry of one pane role.
    pub fn clear_pane(&self, role: PaneRole) {
        let root = self.state.get();
        let Some(pane_key) = self.target_pane_key(&root) else {
            self.errors.on_error(&NavError::InvalidPrecondition {
                op: "clear_pane",
                detail: "no pane container in the tree".into(),
            });
            return;
        };
        match mutator::clear_pane(&root, pane_key, role) {
            Ok(next) => self.apply(next, None),
            Err(err) => self.errors.on_error(&err),
        }
    }

    pub fn handle_deep_link(&self, uri: &str) -> bool {
        if self.deep_links.dispatch(uri, self) {
            return true;
        }
        self.errors.on_error(&NavError::DeepLinkUnmatched {
            uri: uri.to_owned(),
        });
        false
    }

    pub fn deliver_result<T: Send + 'static>(&self, key: NodeKey, value: T) -> bool {
        self.results.deliver(key, value)
    }

    // ---- transition control (renderer / gesture layer) ----

    pub fn update_transition_progress(&self, progress: f32) {
        self.transitions.update_progress(progress);
    }

    pub fn complete_transition(&self) {
        self.transitions.complete();
    }

    /// Begin a back gesture: no tree change, only the tentative reveal of
    /// what a committed back would show.
    pub fn start_predictive_back(&self) {
        let root = self.state.get();
        let current_key = root.active_leaf().map(|s| s.key);
        let previous_key = match self.resolve(&root) {
            BackResolution::Handled(next) => next.active_leaf().map(|s| s.key),
            _ => None,
        };
        self.transitions.start_predictive_back(current_key, previous_key);
    }

    pub fn update_predictive_back(&self, progress: f32, touch_x: f32, touch_y: f32) {
        self.transitions.update_predictive_back(progress, touch_x, touch_y);
    }

    pub fn cancel_predictive_back(&self) {
        self.transitions.cancel_predictive_back();
    }

    /// Commit the gesture: the tree mutates through the back policy and the
    /// machine settles to idle, in one step.
    pub fn commit_predictive_back(&self) {
        if !self.transitions.mark_back_committed() {
            log::warn!("commit_predictive_back: no gesture active");
            return;
        }
        let root = self.state.get();
        if let BackResolution::Handled(next) = self.resolve(&root) {
            self.apply(next, None);
        }
        self.transitions.settle();
    }

    /// Test-harness scrubbing.
    pub fn seek_transition(&self, transition: NavTransition, progress: f32) {
        self.transitions.seek(transition, progress);
    }

    pub fn end_seek(&self) {
        self.transitions.end_seek();
    }

    // ---- internals ----

    fn pushed_root(&self, root: &Arc<NavNode>, destination: DestinationRef) -> Arc<NavNode> {
        if let Some(info) = self.containers.container_info_of(&*destination) {
            let nearest_scope = active_path(root)
                .iter()
                .rev()
                .find(|n| n.is_container())
                .and_then(|n| match &**n {
                    NavNode::Tabs(t) => t.scope_key.clone(),
                    NavNode::Panes(p) => p.scope_key.clone(),
                    _ => None,
                });
            if nearest_scope.as_deref() != Some(info.scope_key.as_str()) {
                return mutator::push_container(root, &info, &self.keys);
            }
        }
        mutator::push(
            root,
            destination,
            &*self.scopes,
            &*self.pane_roles,
            &self.keys,
        )
    }

    /// Tree-level back resolution with the adaptive fallback: a pane policy
    /// that declines in expanded mode falls back to the compact treatment.
    fn resolve(&self, root: &Arc<NavNode>) -> BackResolution {
        match resolve_back(root, self.size_class) {
            BackResolution::CannotHandle => resolve_back(root, WindowSizeClass::Compact),
            resolution => resolution,
        }
    }

    fn target_pane_key(&self, root: &Arc<NavNode>) -> Option<NodeKey> {
        active_path(root)
            .iter()
            .rev()
            .find_map(|n| n.as_panes().map(|p| p.key))
            .or_else(|| root.find_first_panes().map(|p| p.key))
    }

    fn derived(
        &self,
        root: &Arc<NavNode>,
    ) -> (Option<DestinationRef>, Option<DestinationRef>, bool) {
        let current = root.active_leaf().map(|s| s.destination.clone());
        let (previous, can_back) = match self.resolve(root) {
            BackResolution::Handled(prev) => {
                (prev.active_leaf().map(|s| s.destination.clone()), true)
            }
            _ => (None, false),
        };
        (current, previous, can_back)
    }

    fn apply(&self, new_root: Arc<NavNode>, animate: Option<(TransitionDir, NavTransition)>) {
        let old_root = self.state.get();
        if Arc::ptr_eq(&old_root, &new_root) {
            return;
        }
        #[cfg(debug_assertions)]
        new_root.validate();

        let diff = diff_trees(&old_root, &new_root);
        let from_key = old_root.active_leaf().map(|s| s.key);
        let to_key = new_root.active_leaf().map(|s| s.key);
        let (current, previous, can_back) = self.derived(&new_root);

        // Publication order is part of the contract: tree, derived signals,
        // result cancellation, detach callbacks, transition. Nothing here
        // may interleave with another operation; the host serialises writes.
        self.state.set(new_root);
        self.current_destination.set(current);
        self.previous_destination.set(previous);
        self.can_navigate_back.set(can_back);
        for key in &diff.removed_screen_keys {
            self.results.cancel(*key);
        }
        for node in &diff.removed_lifecycle_nodes {
            self.lifecycle.notify_detached(node);
        }
        if let Some((dir, transition)) = animate
            && from_key != to_key
        {
            self.transitions.begin(transition, dir, from_key, to_key);
        }
    }
}
