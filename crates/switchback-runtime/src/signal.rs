use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

pub type SubId = u64;

/// Observable, reactive value.
///
/// A cloneable handle; the value is stored once and shared. Mutations run on
/// the host's write thread, subscribers may be registered from anywhere.
/// Subscribers are notified in registration order, outside of any lock, with
/// a snapshot of the new value.
pub struct Signal<T>(Arc<Inner<T>>);

struct Inner<T> {
    value: RwLock<T>,
    subs: RwLock<Vec<(SubId, Sub<T>)>>,
    next_sub: AtomicU64,
}

type Sub<T> = Arc<dyn Fn(&T) + Send + Sync>;

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Clone> Signal<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Inner {
            value: RwLock::new(value),
            subs: RwLock::new(Vec::new()),
            next_sub: AtomicU64::new(1),
        }))
    }

    pub fn get(&self) -> T {
        self.0.value.read().clone()
    }

    pub fn set(&self, v: T) {
        *self.0.value.write() = v.clone();
        self.notify(&v);
    }

    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        let v = {
            let mut guard = self.0.value.write();
            f(&mut guard);
            guard.clone()
        };
        self.notify(&v);
    }

    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> SubId {
        let id = self.0.next_sub.fetch_add(1, Ordering::Relaxed);
        self.0.subs.write().push((id, Arc::new(f)));
        id
    }

    pub fn unsubscribe(&self, id: SubId) {
        self.0.subs.write().retain(|(sid, _)| *sid != id);
    }

    fn notify(&self, v: &T) {
        // Snapshot first so a subscriber can subscribe/unsubscribe or read
        // the signal without deadlocking.
        let subs: Vec<Sub<T>> = self.0.subs.read().iter().map(|(_, f)| f.clone()).collect();
        for f in subs {
            f(v);
        }
    }
}

pub fn signal<T: Clone>(t: T) -> Signal<T> {
    Signal::new(t)
}
