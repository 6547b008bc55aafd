//! # The mutation algebra
//!
//! Every operation here is a pure function from one root snapshot to the
//! next. A mutation rebuilds only the chain from the changed node up to the
//! root; every untouched sibling subtree is carried over by `Arc`, so two
//! consecutive snapshots share almost all of their structure. Operations
//! that end up changing nothing hand back the input handle itself.
//!
//! Pushes are scope-aware: a destination a container refuses to host becomes
//! a sibling stack *next to* that container, covering it visually while the
//! container (tab bar and all) stays alive underneath for back-restoration.

use std::sync::Arc;

use crate::destination::DestinationRef;
use crate::error::NavError;
use crate::key::{KeySource, NodeKey};
use crate::node::{
    NavNode, PaneConfiguration, PaneNode, PaneRole, ScreenNode, StackNode, active_path,
    single_screen_root, with_parent_key,
};
use crate::registry::{ContainerInfo, PaneRoleRegistry, ScopeRegistry};

/// Rebuilds the chain from the root down to `target`, substituting
/// `replacement` there and keeping every sibling subtree by reference.
/// `None` when the key is not in the tree.
///
/// The replacement's `parent_key` must already name the target's parent;
/// callers normally rebuild the node in place under the same key.
pub fn replace_node(
    root: &Arc<NavNode>,
    target: NodeKey,
    replacement: Arc<NavNode>,
) -> Option<Arc<NavNode>> {
    if root.key() == target {
        return Some(replacement);
    }
    match &**root {
        NavNode::Screen(_) => None,
        NavNode::Stack(s) => {
            for (i, child) in s.children.iter().enumerate() {
                if let Some(new_child) = replace_node(child, target, replacement.clone()) {
                    let mut next = s.clone();
                    next.children[i] = new_child;
                    return Some(Arc::new(NavNode::Stack(next)));
                }
            }
            None
        }
        NavNode::Tabs(t) => {
            for (i, stack) in t.stacks.iter().enumerate() {
                if let Some(new_child) = replace_node(stack, target, replacement.clone()) {
                    let mut next = t.clone();
                    next.stacks[i] = new_child;
                    return Some(Arc::new(NavNode::Tabs(next)));
                }
            }
            None
        }
        NavNode::Panes(p) => {
            for (i, (_, cfg)) in p.panes.iter().enumerate() {
                if let Some(new_content) = replace_node(&cfg.content, target, replacement.clone()) {
                    let mut next = p.clone();
                    next.panes[i].1.content = new_content;
                    return Some(Arc::new(NavNode::Panes(next)));
                }
            }
            None
        }
    }
}

fn append_child(
    root: &Arc<NavNode>,
    stack_key: NodeKey,
    child: Arc<NavNode>,
) -> Option<Arc<NavNode>> {
    let stack = root.find_by_key(stack_key)?.as_stack()?;
    let mut next = stack.clone();
    next.children.push(child);
    replace_node(root, stack_key, Arc::new(NavNode::Stack(next)))
}

fn innermost_container(path: &[Arc<NavNode>]) -> Option<usize> {
    path.iter().rposition(|n| n.is_container())
}

/// Scope-aware push.
///
/// Inside a pane container the destination lands in the pane its registered
/// role names (defaulting to the active pane). Otherwise the innermost
/// container that declares a scope decides: in scope, the destination goes
/// onto the deepest active stack; out of scope, it becomes a sibling stack
/// next to that container.
pub fn push(
    root: &Arc<NavNode>,
    destination: DestinationRef,
    scopes: &dyn ScopeRegistry,
    pane_roles: &dyn PaneRoleRegistry,
    keys: &KeySource,
) -> Arc<NavNode> {
    if root.as_stack().is_none() {
        log::warn!("push: root is not a stack; starting a fresh root stack");
        return single_screen_root(destination, keys);
    }
    let path = active_path(root);

    if let Some(idx) = innermost_container(&path)
        && let NavNode::Panes(pane) = &*path[idx]
    {
        let role = pane_roles
            .role_of(&*destination)
            .unwrap_or(pane.active_pane_role);
        return push_into_pane(root, pane, role, destination, keys);
    }

    // Walk containers innermost-first; the first one that declares a scope
    // decides for the whole push.
    for i in (0..path.len()).rev() {
        let scope_key = match &*path[i] {
            NavNode::Tabs(t) => t.scope_key.as_deref(),
            NavNode::Panes(p) => p.scope_key.as_deref(),
            _ => None,
        };
        let Some(scope_key) = scope_key else { continue };
        if scopes.is_in_scope(scope_key, &*destination) {
            break;
        }
        return push_sibling(root, &path, i, destination, keys);
    }

    push_onto_active_stack(root, &path, destination, keys)
}

fn push_onto_active_stack(
    root: &Arc<NavNode>,
    path: &[Arc<NavNode>],
    destination: DestinationRef,
    keys: &KeySource,
) -> Arc<NavNode> {
    match path.iter().rev().find_map(|n| n.as_stack().map(|s| s.key)) {
        Some(stack_key) => {
            let screen = ScreenNode::new(keys.next(), Some(stack_key), destination);
            append_child(root, stack_key, Arc::new(NavNode::Screen(screen)))
                .unwrap_or_else(|| root.clone())
        }
        None => single_screen_root(destination, keys),
    }
}

fn push_sibling(
    root: &Arc<NavNode>,
    path: &[Arc<NavNode>],
    container_idx: usize,
    destination: DestinationRef,
    keys: &KeySource,
) -> Arc<NavNode> {
    let anchor = path[..container_idx]
        .iter()
        .rposition(|n| n.as_stack().is_some());
    match anchor {
        Some(j) => {
            let stack_key = path[j].key();
            let sibling =
                StackNode::with_screen(keys.next(), Some(stack_key), destination, keys);
            append_child(root, stack_key, Arc::new(NavNode::Stack(sibling)))
                .unwrap_or_else(|| root.clone())
        }
        None => {
            // The declining container is the root; grow a stack above it.
            let root_key = keys.next();
            let sibling = StackNode::with_screen(keys.next(), Some(root_key), destination, keys);
            let mut new_root = StackNode::new(root_key, None);
            new_root
                .children
                .push(with_parent_key(&path[container_idx], Some(root_key)));
            new_root.children.push(Arc::new(NavNode::Stack(sibling)));
            Arc::new(NavNode::Stack(new_root))
        }
    }
}

fn push_into_pane(
    root: &Arc<NavNode>,
    pane: &PaneNode,
    role: PaneRole,
    destination: DestinationRef,
    keys: &KeySource,
) -> Arc<NavNode> {
    match pane.configuration(role) {
        Some(cfg) => match cfg.content.as_stack() {
            Some(stack) => {
                let screen = ScreenNode::new(keys.next(), Some(stack.key), destination);
                let mut next = stack.clone();
                next.children.push(Arc::new(NavNode::Screen(screen)));
                replace_node(root, stack.key, Arc::new(NavNode::Stack(next)))
                    .unwrap_or_else(|| root.clone())
            }
            None => {
                // Non-stack pane content from a hand-built tree; wrap it so
                // the pane keeps stack semantics.
                log::warn!("push: wrapping non-stack content of pane {role:?} in a stack");
                let stack_key = keys.next();
                let mut stack = StackNode::new(stack_key, Some(pane.key));
                stack
                    .children
                    .push(with_parent_key(&cfg.content, Some(stack_key)));
                let screen = ScreenNode::new(keys.next(), Some(stack_key), destination);
                stack.children.push(Arc::new(NavNode::Screen(screen)));
                let mut next = pane.clone();
                let i = next.panes.iter().position(|(r, _)| *r == role).unwrap();
                next.panes[i].1.content = Arc::new(NavNode::Stack(stack));
                replace_node(root, pane.key, Arc::new(NavNode::Panes(next)))
                    .unwrap_or_else(|| root.clone())
            }
        },
        None => {
            // Nothing configured for this role yet: start a fresh stack. The
            // active role is left alone.
            let stack = StackNode::with_screen(keys.next(), Some(pane.key), destination, keys);
            let mut next = pane.clone();
            next.panes.push((
                role,
                PaneConfiguration {
                    content: Arc::new(NavNode::Stack(stack)),
                },
            ));
            replace_node(root, pane.key, Arc::new(NavNode::Panes(next)))
                .unwrap_or_else(|| root.clone())
        }
    }
}

/// Pops the top screen of the active stack. `None` when that stack holds at
/// most one entry; resolving back across containers is the back resolver's
/// job, not pop's.
pub fn pop(root: &Arc<NavNode>) -> Option<Arc<NavNode>> {
    let stack = root.active_stack()?;
    if stack.children.len() <= 1 {
        return None;
    }
    pop_at(root, stack.key)
}

/// Pops the top child of the named stack, refusing to empty it.
pub fn pop_at(root: &Arc<NavNode>, stack_key: NodeKey) -> Option<Arc<NavNode>> {
    let stack = root.find_by_key(stack_key)?.as_stack()?;
    if stack.children.len() <= 1 {
        return None;
    }
    let mut next = stack.clone();
    next.children.pop();
    replace_node(root, stack_key, Arc::new(NavNode::Stack(next)))
}

/// Truncates the active stack down to the topmost screen whose destination
/// route equals `route` (dropping it too when `inclusive`). No match leaves
/// the tree untouched.
///
/// An inclusive match of the bottom screen leaves the stack transiently
/// empty; callers push a new screen before publishing the snapshot.
pub fn pop_to_route(root: &Arc<NavNode>, route: &str, inclusive: bool) -> Arc<NavNode> {
    let Some(stack) = root.active_stack() else {
        return root.clone();
    };
    let Some(idx) = stack
        .children
        .iter()
        .rposition(|c| c.as_screen().is_some_and(|s| s.destination.route() == route))
    else {
        return root.clone();
    };
    let keep = if inclusive { idx } else { idx + 1 };
    if keep == stack.children.len() {
        return root.clone();
    }
    let mut next = stack.clone();
    next.children.truncate(keep);
    replace_node(root, stack.key, Arc::new(NavNode::Stack(next))).unwrap_or_else(|| root.clone())
}

/// Swaps the top of the active stack for a fresh screen: exactly one key
/// dies and exactly one is born, which the lifecycle diff observes.
pub fn replace_current(
    root: &Arc<NavNode>,
    destination: DestinationRef,
    keys: &KeySource,
) -> Arc<NavNode> {
    let Some(stack) = root.active_stack() else {
        log::warn!("replace_current: no active stack; starting a fresh root stack");
        return single_screen_root(destination, keys);
    };
    let mut next = stack.clone();
    next.children.pop();
    let screen = ScreenNode::new(keys.next(), Some(next.key), destination);
    next.children.push(Arc::new(NavNode::Screen(screen)));
    replace_node(root, stack.key, Arc::new(NavNode::Stack(next))).unwrap_or_else(|| root.clone())
}

/// Replaces the active stack's whole content with a single fresh screen.
/// The stack keeps its key; sibling containers (other tabs, other panes)
/// are untouched.
pub fn clear_and_push(
    root: &Arc<NavNode>,
    destination: DestinationRef,
    keys: &KeySource,
) -> Arc<NavNode> {
    let Some(stack) = root.active_stack() else {
        log::warn!("clear_and_push: no active stack; starting a fresh root stack");
        return single_screen_root(destination, keys);
    };
    let mut next = stack.clone();
    next.children.clear();
    let screen = ScreenNode::new(keys.next(), Some(next.key), destination);
    next.children.push(Arc::new(NavNode::Screen(screen)));
    replace_node(root, stack.key, Arc::new(NavNode::Stack(next))).unwrap_or_else(|| root.clone())
}

/// Activates another tab. The previously active stack is retained verbatim,
/// so tab-local history survives switching away and back.
pub fn switch_tab(
    root: &Arc<NavNode>,
    tab_key: NodeKey,
    index: usize,
) -> Result<Arc<NavNode>, NavError> {
    let Some(tabs) = root.find_by_key(tab_key).and_then(|n| n.as_tabs()) else {
        return Err(NavError::InvalidPrecondition {
            op: "switch_tab",
            detail: format!("{tab_key:?} is not a tab container"),
        });
    };
    if index >= tabs.stacks.len() {
        return Err(NavError::InvalidPrecondition {
            op: "switch_tab",
            detail: format!("tab index {index} out of range ({} tabs)", tabs.stacks.len()),
        });
    }
    if index == tabs.active_stack_index {
        return Ok(root.clone());
    }
    let mut next = tabs.clone();
    next.active_stack_index = index;
    Ok(replace_node(root, tab_key, Arc::new(NavNode::Tabs(next))).unwrap_or_else(|| root.clone()))
}

/// Activates another pane role. The role must already be configured.
pub fn switch_active_pane(
    root: &Arc<NavNode>,
    pane_key: NodeKey,
    role: PaneRole,
) -> Result<Arc<NavNode>, NavError> {
    let Some(pane) = root.find_by_key(pane_key).and_then(|n| n.as_panes()) else {
        return Err(NavError::InvalidPrecondition {
            op: "switch_active_pane",
            detail: format!("{pane_key:?} is not a pane container"),
        });
    };
    if !pane.has_role(role) {
        return Err(NavError::UnknownPaneRole {
            op: "switch_active_pane",
            role,
        });
    }
    if role == pane.active_pane_role {
        return Ok(root.clone());
    }
    let mut next = pane.clone();
    next.active_pane_role = role;
    Ok(replace_node(root, pane_key, Arc::new(NavNode::Panes(next))).unwrap_or_else(|| root.clone()))
}

/// Inserts or replaces the configuration for `role`. A newly added role
/// becomes a candidate for activation but the active role does not change.
/// Non-stack content is wrapped in a fresh stack.
pub fn set_pane_configuration(
    root: &Arc<NavNode>,
    pane_key: NodeKey,
    role: PaneRole,
    content: Arc<NavNode>,
    keys: &KeySource,
) -> Result<Arc<NavNode>, NavError> {
    let Some(pane) = root.find_by_key(pane_key).and_then(|n| n.as_panes()) else {
        return Err(NavError::InvalidPrecondition {
            op: "set_pane_configuration",
            detail: format!("{pane_key:?} is not a pane container"),
        });
    };
    let content = if content.as_stack().is_some() {
        with_parent_key(&content, Some(pane_key))
    } else {
        let stack_key = keys.next();
        let mut stack = StackNode::new(stack_key, Some(pane_key));
        stack.children.push(with_parent_key(&content, Some(stack_key)));
        Arc::new(NavNode::Stack(stack))
    };
    let mut next = pane.clone();
    match next.panes.iter().position(|(r, _)| *r == role) {
        Some(i) => next.panes[i].1 = PaneConfiguration { content },
        None => next.panes.push((role, PaneConfiguration { content })),
    }
    Ok(replace_node(root, pane_key, Arc::new(NavNode::Panes(next))).unwrap_or_else(|| root.clone()))
}

/// Pushes onto the stack backing `role` in the named pane, starting a fresh
/// single-screen stack when the role has no configuration yet. The active
/// role is untouched.
pub fn push_pane_role(
    root: &Arc<NavNode>,
    pane_key: NodeKey,
    role: PaneRole,
    destination: DestinationRef,
    keys: &KeySource,
) -> Result<Arc<NavNode>, NavError> {
    let Some(pane) = root.find_by_key(pane_key).and_then(|n| n.as_panes()) else {
        return Err(NavError::InvalidPrecondition {
            op: "push_pane_role",
            detail: format!("{pane_key:?} is not a pane container"),
        });
    };
    Ok(push_into_pane(root, pane, role, destination, keys))
}

/// Drops everything above the bottom entry of the stack backing `role`.
pub fn clear_pane(
    root: &Arc<NavNode>,
    pane_key: NodeKey,
    role: PaneRole,
) -> Result<Arc<NavNode>, NavError> {
    let Some(pane) = root.find_by_key(pane_key).and_then(|n| n.as_panes()) else {
        return Err(NavError::InvalidPrecondition {
            op: "clear_pane",
            detail: format!("{pane_key:?} is not a pane container"),
        });
    };
    let Some(cfg) = pane.configuration(role) else {
        return Err(NavError::UnknownPaneRole {
            op: "clear_pane",
            role,
        });
    };
    let Some(stack) = cfg.content.as_stack() else {
        return Ok(root.clone());
    };
    if stack.children.len() <= 1 {
        return Ok(root.clone());
    }
    let mut next = stack.clone();
    next.children.truncate(1);
    Ok(replace_node(root, stack.key, Arc::new(NavNode::Stack(next))).unwrap_or_else(|| root.clone()))
}

/// Pops the top screen of the stack backing `role` in the named pane.
/// `Ok(None)` when that stack holds a single entry; the caller decides
/// whether the back keeps cascading.
pub fn pop_pane(
    root: &Arc<NavNode>,
    pane_key: NodeKey,
    role: PaneRole,
) -> Result<Option<Arc<NavNode>>, NavError> {
    let Some(pane) = root.find_by_key(pane_key).and_then(|n| n.as_panes()) else {
        return Err(NavError::InvalidPrecondition {
            op: "pop_pane",
            detail: format!("{pane_key:?} is not a pane container"),
        });
    };
    let Some(cfg) = pane.configuration(role) else {
        return Err(NavError::UnknownPaneRole {
            op: "pop_pane",
            role,
        });
    };
    let Some(stack) = cfg.content.as_stack() else {
        return Ok(None);
    };
    if stack.children.len() <= 1 {
        return Ok(None);
    }
    Ok(pop_at(root, stack.key))
}

/// Materialises a declared container as a sibling of the innermost container
/// on the active path (or on the deepest active stack when there is none).
pub fn push_container(
    root: &Arc<NavNode>,
    info: &ContainerInfo,
    keys: &KeySource,
) -> Arc<NavNode> {
    let path = active_path(root);
    let anchor = match innermost_container(&path) {
        Some(ci) => path[..ci].iter().rposition(|n| n.as_stack().is_some()),
        None => path.iter().rposition(|n| n.as_stack().is_some()),
    };
    match anchor.map(|j| path[j].key()) {
        Some(stack_key) => {
            let container = (info.build)(keys.next(), Some(stack_key), keys);
            append_child(root, stack_key, Arc::new(container)).unwrap_or_else(|| root.clone())
        }
        None => {
            let root_key = keys.next();
            let container = (info.build)(keys.next(), Some(root_key), keys);
            let mut new_root = StackNode::new(root_key, None);
            new_root.children.push(Arc::new(container));
            Arc::new(NavNode::Stack(new_root))
        }
    }
}

/// Detaches the subtree rooted at `key` from the stack that contains it.
/// `None` when the key is absent, names the root, or sits in a tab/pane
/// slot (those children are positional and cannot simply vanish).
pub fn remove_node(root: &Arc<NavNode>, key: NodeKey) -> Option<Arc<NavNode>> {
    if root.key() == key {
        return None;
    }
    match &**root {
        NavNode::Screen(_) => None,
        NavNode::Stack(s) => {
            if let Some(i) = s.children.iter().position(|c| c.key() == key) {
                let mut next = s.clone();
                next.children.remove(i);
                return Some(Arc::new(NavNode::Stack(next)));
            }
            for (i, child) in s.children.iter().enumerate() {
                if let Some(rebuilt) = remove_node(child, key) {
                    let mut next = s.clone();
                    next.children[i] = rebuilt;
                    return Some(Arc::new(NavNode::Stack(next)));
                }
            }
            None
        }
        NavNode::Tabs(t) => {
            for (i, stack) in t.stacks.iter().enumerate() {
                if stack.key() == key {
                    return None;
                }
                if let Some(rebuilt) = remove_node(stack, key) {
                    let mut next = t.clone();
                    next.stacks[i] = rebuilt;
                    return Some(Arc::new(NavNode::Tabs(next)));
                }
            }
            None
        }
        NavNode::Panes(p) => {
            for (i, (_, cfg)) in p.panes.iter().enumerate() {
                if cfg.content.key() == key {
                    return None;
                }
                if let Some(rebuilt) = remove_node(&cfg.content, key) {
                    let mut next = p.clone();
                    next.panes[i].1.content = rebuilt;
                    return Some(Arc::new(NavNode::Panes(next)));
                }
            }
            None
        }
    }
}
