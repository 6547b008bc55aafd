//! Detach notification for removed tree nodes.
//!
//! Screens, tab containers, and pane containers opt into lifecycle; when a
//! snapshot drops one, every observer hears about it exactly once, children
//! before the container that held them, after pending results were already
//! cancelled.

use std::sync::Arc;

use parking_lot::RwLock;

use switchback_core::NavNode;

pub trait LifecycleObserver: Send + Sync {
    fn detached(&self, node: &NavNode);
}

impl<F: Fn(&NavNode) + Send + Sync> LifecycleObserver for F {
    fn detached(&self, node: &NavNode) {
        self(node)
    }
}

#[derive(Clone)]
pub struct LifecycleNotifier {
    observers: Arc<RwLock<Vec<Arc<dyn LifecycleObserver>>>>,
}

impl LifecycleNotifier {
    pub fn new() -> Self {
        Self {
            observers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn add(&self, observer: Arc<dyn LifecycleObserver>) {
        self.observers.write().push(observer);
    }

    pub(crate) fn notify_detached(&self, node: &NavNode) {
        let snapshot: Vec<_> = self.observers.read().iter().cloned().collect();
        for observer in snapshot {
            observer.detached(node);
        }
    }
}

impl Default for LifecycleNotifier {
    fn default() -> Self {
        Self::new()
    }
}
