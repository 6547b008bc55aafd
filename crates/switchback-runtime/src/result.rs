//! # Result channel
//!
//! A parent screen can await one typed value from a child it launched. The
//! rendezvous is keyed by the child's screen key, one-shot, and cold: the
//! slot is created when the parent registers interest and resolved exactly
//! once — by delivery, by explicit cancellation, or automatically when the
//! child's screen leaves the tree.

use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use switchback_core::NodeKey;

/// The child was removed or the operation was cancelled before delivering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cancelled;

enum Slot {
    Pending,
    Delivered(Box<dyn Any + Send>),
    Cancelled,
}

struct Shared {
    slots: Mutex<HashMap<NodeKey, Slot>>,
    ready: Condvar,
}

#[derive(Clone)]
pub struct ResultChannel {
    shared: Arc<Shared>,
}

impl ResultChannel {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                slots: Mutex::new(HashMap::new()),
                ready: Condvar::new(),
            }),
        }
    }

    /// Registers interest in `key`'s result. Must happen before the child
    /// can possibly deliver; the navigator arranges this when launching a
    /// screen for a result.
    pub fn expect<T: Send + 'static>(&self, key: NodeKey) -> ResultHandle<T> {
        self.shared.slots.lock().entry(key).or_insert(Slot::Pending);
        ResultHandle {
            shared: self.shared.clone(),
            key,
            _marker: PhantomData,
        }
    }

    /// Delivers a value to a pending slot. Unknown or already-resolved keys
    /// are a no-op (the parent may have unsubscribed); returns whether the
    /// value was accepted.
    pub fn deliver<T: Send + 'static>(&self, key: NodeKey, value: T) -> bool {
        let mut slots = self.shared.slots.lock();
        match slots.get_mut(&key) {
            Some(slot @ Slot::Pending) => {
                *slot = Slot::Delivered(Box::new(value));
                self.shared.ready.notify_all();
                true
            }
            _ => false,
        }
    }

    /// Resolves a pending slot as cancelled. Idempotent; unknown keys are a
    /// no-op. Called by the navigator for every removed screen.
    pub fn cancel(&self, key: NodeKey) {
        let mut slots = self.shared.slots.lock();
        if let Some(slot) = slots.get_mut(&key)
            && matches!(slot, Slot::Pending)
        {
            *slot = Slot::Cancelled;
            self.shared.ready.notify_all();
        }
    }

    pub fn is_pending(&self, key: NodeKey) -> bool {
        matches!(self.shared.slots.lock().get(&key), Some(Slot::Pending))
    }
}

impl Default for ResultChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-consumer handle to one pending result.
pub struct ResultHandle<T> {
    shared: Arc<Shared>,
    key: NodeKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + 'static> ResultHandle<T> {
    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Non-blocking poll. `None` while the child is still live and silent;
    /// consuming a resolution removes the slot.
    pub fn try_recv(&self) -> Option<Result<T, Cancelled>> {
        let mut slots = self.shared.slots.lock();
        match slots.get(&self.key) {
            Some(Slot::Pending) => None,
            Some(Slot::Delivered(_)) => {
                let Some(Slot::Delivered(boxed)) = slots.remove(&self.key) else {
                    unreachable!()
                };
                Some(downcast(boxed))
            }
            Some(Slot::Cancelled) | None => {
                slots.remove(&self.key);
                Some(Err(Cancelled))
            }
        }
    }

    /// Blocks until the child delivers or the slot is cancelled. Never call
    /// this from the write thread — delivery happens there.
    pub fn recv(self) -> Result<T, Cancelled> {
        let mut slots = self.shared.slots.lock();
        loop {
            match slots.get(&self.key) {
                Some(Slot::Pending) => self.shared.ready.wait(&mut slots),
                Some(Slot::Delivered(_)) => {
                    let Some(Slot::Delivered(boxed)) = slots.remove(&self.key) else {
                        unreachable!()
                    };
                    return downcast(boxed);
                }
                Some(Slot::Cancelled) | None => {
                    slots.remove(&self.key);
                    return Err(Cancelled);
                }
            }
        }
    }
}

fn downcast<T: 'static>(boxed: Box<dyn Any + Send>) -> Result<T, Cancelled> {
    match boxed.downcast::<T>() {
        Ok(value) => Ok(*value),
        Err(_) => {
            log::warn!("result: delivered value had a different type than expected");
            Err(Cancelled)
        }
    }
}
