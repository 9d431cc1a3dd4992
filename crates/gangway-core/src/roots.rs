//! Rooted guest handle registry
//!
//! The bridge tracks which guest handles it has rooted and how many times,
//! rather than leaning on either collector's callback timing. The registry
//! keeps an explicit count per handle and notifies the guest runtime only
//! on the first root and the last unroot of each handle.

use gangway_sdk::{GuestHandle, GuestRuntime};
use rustc_hash::FxHashMap;

/// Explicit root-count table for guest handles.
#[derive(Debug, Default)]
pub struct RootRegistry {
    counts: FxHashMap<GuestHandle, u32>,
}

impl RootRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Root `handle`. The runtime is told on the 0→1 transition only.
    pub fn root(&mut self, runtime: &dyn GuestRuntime, handle: GuestHandle) {
        let count = self.counts.entry(handle).or_insert(0);
        if *count == 0 {
            runtime.root(handle);
        }
        *count += 1;
    }

    /// Drop one root for `handle`. The runtime is told on the 1→0
    /// transition only.
    ///
    /// # Panics
    ///
    /// Unrooting a handle that holds no roots is a programming-contract
    /// violation and panics.
    pub fn unroot(&mut self, runtime: &dyn GuestRuntime, handle: GuestHandle) {
        let Some(count) = self.counts.get_mut(&handle) else {
            panic!("unroot of guest handle {handle:?} that holds no roots");
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&handle);
            runtime.unroot(handle);
        }
    }

    /// Number of distinct rooted handles.
    pub fn rooted_handles(&self) -> usize {
        self.counts.len()
    }

    /// Whether no handle is rooted.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}
