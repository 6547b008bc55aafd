//! Screen-registered back interception.
//!
//! Rendered screens may claim a back press before the tree is consulted at
//! all (a dirty form, an open sheet). Handlers form an ordered collection;
//! the most recently registered one is asked first, and the first to return
//! `true` consumes the press.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Cleanup guard; run it to undo a registration.
pub struct Dispose(Box<dyn FnOnce() + Send>);

impl Dispose {
    pub fn new(f: impl FnOnce() + Send + 'static) -> Self {
        Dispose(Box::new(f))
    }

    pub fn run(self) {
        (self.0)()
    }
}

type BackHandler = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Clone)]
pub struct BackHandlerRegistry {
    handlers: Arc<RwLock<Vec<(u64, BackHandler)>>>,
    next_id: Arc<AtomicU64>,
}

impl BackHandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Registers an interceptor; run the returned guard when the screen
    /// stops being rendered. Register and unregister on the write thread.
    pub fn register(&self, handler: impl Fn() -> bool + Send + Sync + 'static) -> Dispose {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().push((id, Arc::new(handler)));
        let handlers = self.handlers.clone();
        Dispose::new(move || handlers.write().retain(|(hid, _)| *hid != id))
    }

    /// Topmost-first dispatch; `true` when some handler consumed the press.
    pub fn dispatch(&self) -> bool {
        let snapshot: Vec<BackHandler> = self
            .handlers
            .read()
            .iter()
            .rev()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in snapshot {
            if handler() {
                return true;
            }
        }
        false
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }
}

impl Default for BackHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
