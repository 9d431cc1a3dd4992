//! Owner back-reference registry
//!
//! A proxy may be constructed with an "owner": another host object whose
//! liveness the guest-side state depends on. The registry holds one weak
//! reference per owner in a slot table. A sweep pass — run whenever the
//! embedding's collector decides to — releases the slots whose owner has
//! died. Release is exactly-once per slot, performs no guest calls, and is
//! independent of the owning proxy's own disposal; sweeping after the
//! proxy is gone is fine.

use gangway_sdk::{HostValue, WeakHostValue};
use rustc_hash::FxHashMap;

/// Key of one owner slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerKey(u64);

/// Slot table of weak owner references.
#[derive(Debug, Default)]
pub struct OwnerRegistry {
    slots: FxHashMap<OwnerKey, WeakHostValue>,
    next_key: u64,
    released: u64,
}

impl OwnerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a weak back-reference, returning its slot key.
    pub fn insert(&mut self, owner: WeakHostValue) -> OwnerKey {
        let key = OwnerKey(self.next_key);
        self.next_key += 1;
        self.slots.insert(key, owner);
        key
    }

    /// Recover the strong owner value, if it is still alive.
    pub fn upgrade(&self, key: OwnerKey) -> Option<HostValue> {
        self.slots.get(&key).and_then(WeakHostValue::upgrade)
    }

    /// Release every slot whose owner has died.
    ///
    /// Returns how many slots this pass released. Safe to run at any
    /// point, any number of times; a slot is released at most once.
    pub fn sweep(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, weak| !weak.is_dead());
        let released = before - self.slots.len();
        self.released += released as u64;
        released
    }

    /// Total slots released across all sweeps.
    pub fn released_total(&self) -> u64 {
        self.released
    }

    /// Live (unreleased) slot count.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot is live.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
