//! # Back resolution
//!
//! Decides *what* a back press does; the mutators perform the change. The
//! policy walks the active path leaf-to-root: pop a deep stack, return a tab
//! container to its initial tab, apply the pane container's configured back
//! behaviour, and finally delegate to the system (close the window) when the
//! walk exhausts the tree.
//!
//! Keeping this separate from the mutation algebra keeps the policy — tab
//! return-to-home, compact-vs-expanded pane adaptation — unit-testable
//! without the transition machinery.

use std::sync::Arc;

use crate::mutator::{pop_at, switch_tab};
use crate::node::{NavNode, PaneBackBehavior, PaneNode, PaneRole, active_path};

/// Width regime the host window is currently in. Chosen at navigator
/// construction; compact windows render a pane container as a single stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WindowSizeClass {
    #[default]
    Compact,
    Medium,
    Expanded,
}

impl WindowSizeClass {
    /// Everything below expanded folds panes into one visual stack.
    pub fn treats_panes_as_stack(self) -> bool {
        !matches!(self, WindowSizeClass::Expanded)
    }
}

#[derive(Clone, Debug)]
pub enum BackResolution {
    /// The tree mutated; a back transition should animate.
    Handled(Arc<NavNode>),
    /// This resolver declined; the caller may try an adaptive fallback.
    CannotHandle,
    /// Nothing left to pop; the host should close the surrounding window.
    DelegateToSystem,
}

enum PaneBack {
    Handled(Arc<NavNode>),
    Declined,
    Continue,
}

/// Resolves one back press against the current tree.
pub fn resolve_back(root: &Arc<NavNode>, size_class: WindowSizeClass) -> BackResolution {
    let path = active_path(root);
    for node in path.iter().rev() {
        match &**node {
            NavNode::Screen(_) => {}
            NavNode::Stack(s) => {
                if s.children.len() > 1
                    && let Some(next) = pop_at(root, s.key)
                {
                    return BackResolution::Handled(next);
                }
            }
            NavNode::Tabs(t) => {
                if t.active_stack_index != t.initial_stack_index
                    && let Ok(next) = switch_tab(root, t.key, t.initial_stack_index)
                {
                    return BackResolution::Handled(next);
                }
                // Already home with nothing beneath: keep walking up.
            }
            NavNode::Panes(p) => match pane_back(root, p, size_class) {
                PaneBack::Handled(next) => return BackResolution::Handled(next),
                PaneBack::Declined => return BackResolution::CannotHandle,
                PaneBack::Continue => {}
            },
        }
    }
    BackResolution::DelegateToSystem
}

fn pane_back(root: &Arc<NavNode>, pane: &PaneNode, size_class: WindowSizeClass) -> PaneBack {
    if size_class.treats_panes_as_stack() {
        // One visual stack: pop the active pane; once it is down to its
        // last screen the walk continues and the pane node itself gets
        // popped from whatever stack contains it.
        if let Some(stack) = pane.active_configuration().and_then(|c| c.content.as_stack())
            && stack.children.len() > 1
            && let Some(next) = pop_at(root, stack.key)
        {
            return PaneBack::Handled(next);
        }
        return PaneBack::Continue;
    }

    match pane.back_behavior {
        PaneBackBehavior::PopUntilLayoutChange => {
            // Prefer the active pane, then any pane with history, then
            // collapse a secondary pane entirely.
            if let Some(stack) = pane.active_configuration().and_then(|c| c.content.as_stack())
                && stack.children.len() > 1
                && let Some(next) = pop_at(root, stack.key)
            {
                return PaneBack::Handled(next);
            }
            for (_, cfg) in &pane.panes {
                if let Some(stack) = cfg.content.as_stack()
                    && stack.children.len() > 1
                    && let Some(next) = pop_at(root, stack.key)
                {
                    return PaneBack::Handled(next);
                }
            }
            if pane.panes.len() > 1
                && let Some(next) = drop_secondary_pane(root, pane)
            {
                return PaneBack::Handled(next);
            }
            PaneBack::Continue
        }
        PaneBackBehavior::PopPrimaryPane => {
            if let Some(stack) = pane
                .configuration(PaneRole::Primary)
                .and_then(|c| c.content.as_stack())
                && stack.children.len() > 1
                && let Some(next) = pop_at(root, stack.key)
            {
                return PaneBack::Handled(next);
            }
            PaneBack::Continue
        }
        PaneBackBehavior::DelegateToPrimary => {
            if let Some(stack) = pane
                .configuration(PaneRole::Primary)
                .and_then(|c| c.content.as_stack())
                && stack.children.len() > 1
                && let Some(next) = pop_at(root, stack.key)
            {
                return PaneBack::Handled(next);
            }
            PaneBack::Declined
        }
    }
}

/// Removes the active secondary pane (or the last one configured), changing
/// the visible layout; the primary pane becomes active.
fn drop_secondary_pane(root: &Arc<NavNode>, pane: &PaneNode) -> Option<Arc<NavNode>> {
    let victim = if pane.active_pane_role != PaneRole::Primary {
        pane.active_pane_role
    } else {
        pane.panes
            .iter()
            .rev()
            .map(|(r, _)| *r)
            .find(|r| *r != PaneRole::Primary)?
    };
    let mut next = pane.clone();
    next.panes.retain(|(r, _)| *r != victim);
    next.active_pane_role = if next.has_role(PaneRole::Primary) {
        PaneRole::Primary
    } else {
        next.panes.first().map(|(r, _)| *r)?
    };
    crate::mutator::replace_node(root, pane.key, Arc::new(NavNode::Panes(next)))
}
