//! Liveness tracking for regions recorded in a scope's side tables.
//!
//! Bindings and retention lists are keyed by [`RegionId`], which outlives
//! nothing. [`RegionTracker`] keeps a [`RegionWatch`] per recorded region so
//! the scope can drop entries once every handle to the region is gone.

use indexmap::IndexMap;
use memref_core::{MemoryRegion, RegionId, RegionWatch};

/// What a [`Scope::prune`](crate::Scope::prune) sweep removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneStats {
    /// Regions forgotten.
    pub regions: usize,
    /// Type bindings dropped.
    pub bindings: usize,
    /// Retained values dropped.
    pub retained: usize,
}

/// Watches every region a scope has recorded something for.
///
/// Requests a sweep once the number of tracked regions reaches a threshold
/// that doubles with the surviving population, so sweeps are amortized over
/// insertions.
#[derive(Debug)]
pub struct RegionTracker {
    watches: IndexMap<RegionId, RegionWatch>,
    sweep_at: usize,
}

impl RegionTracker {
    /// Smallest population that triggers a sweep.
    pub const MIN_SWEEP_AT: usize = 64;

    /// Create an empty tracker.
    pub fn new() -> Self {
        Self {
            watches: IndexMap::new(),
            sweep_at: Self::MIN_SWEEP_AT,
        }
    }

    /// Start watching `region`. Returns `true` when a sweep is due.
    pub fn track<R: MemoryRegion>(&mut self, region: &R) -> bool {
        if self.watches.contains_key(&region.id()) {
            return false;
        }
        self.watches.insert(region.id(), region.watch());
        self.watches.len() >= self.sweep_at
    }

    /// Stop watching `region`.
    pub fn forget(&mut self, region: RegionId) {
        self.watches.shift_remove(&region);
    }

    /// Remove and return every region with no live handle.
    pub fn take_dead(&mut self) -> Vec<RegionId> {
        let dead: Vec<RegionId> = self
            .watches
            .iter()
            .filter(|(_, watch)| !watch.is_alive())
            .map(|(id, _)| *id)
            .collect();
        for id in &dead {
            self.watches.shift_remove(id);
        }
        dead
    }

    /// Reset the sweep threshold after a sweep.
    pub fn rearm(&mut self) {
        self.sweep_at = (self.watches.len() * 2).max(Self::MIN_SWEEP_AT);
    }

    /// Number of regions being watched.
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Whether nothing is being watched.
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }
}

impl Default for RegionTracker {
    fn default() -> Self {
        Self::new()
    }
}
