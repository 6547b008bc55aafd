//! Deep-link dispatch.
//!
//! The registry is a generated table of handlers plus whatever the app
//! registers at runtime. Pattern matching lives in the handlers themselves;
//! the registry only tries them in order and reports whether one claimed
//! the URI.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::back::Dispose;
use crate::navigator::Navigator;

pub trait DeepLinkHandler: Send + Sync {
    /// `true` when this handler claimed the URI and navigated.
    fn handle(&self, uri: &str, navigator: &Navigator) -> bool;
}

impl<F: Fn(&str, &Navigator) -> bool + Send + Sync> DeepLinkHandler for F {
    fn handle(&self, uri: &str, navigator: &Navigator) -> bool {
        self(uri, navigator)
    }
}

#[derive(Clone)]
pub struct DeepLinkRegistry {
    handlers: Arc<RwLock<Vec<(u64, Arc<dyn DeepLinkHandler>)>>>,
    next_id: Arc<AtomicU64>,
}

impl DeepLinkRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Table-building form for generated registrations.
    pub fn with_handler(self, handler: Arc<dyn DeepLinkHandler>) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().push((id, handler));
        self
    }

    /// Runtime registration; run the guard to remove the handler again.
    pub fn register(&self, handler: Arc<dyn DeepLinkHandler>) -> Dispose {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().push((id, handler));
        let handlers = self.handlers.clone();
        Dispose::new(move || handlers.write().retain(|(hid, _)| *hid != id))
    }

    pub(crate) fn dispatch(&self, uri: &str, navigator: &Navigator) -> bool {
        let snapshot: Vec<_> = self
            .handlers
            .read()
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in snapshot {
            if handler.handle(uri, navigator) {
                return true;
            }
        }
        false
    }
}

impl Default for DeepLinkRegistry {
    fn default() -> Self {
        Self::new()
    }
}
