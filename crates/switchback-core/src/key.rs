use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a tree node.
///
/// Keys identify a node for its whole lifetime; identity across snapshots is
/// by key, not by structural position. Hosts key their per-screen state
/// (view-models, scroll offsets) off this value.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeKey(u64);

impl NodeKey {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic key generator shared by every mutator of one tree.
///
/// Snapshots cross threads, so this is an atomic counter rather than a cell.
pub struct KeySource {
    next: AtomicU64,
}

impl KeySource {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Resume counting after `raw`; used when adopting a prebuilt tree.
    pub fn starting_at(raw: u64) -> Self {
        Self {
            next: AtomicU64::new(raw),
        }
    }

    pub fn next(&self) -> NodeKey {
        NodeKey(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for KeySource {
    fn default() -> Self {
        Self::new()
    }
}
