//! Retention ledger: keeping written references alive.
//!
//! The native layer stores pointers and objects without owning them. Each
//! time the scope writes one into a region, the written value is appended to
//! that region's ledger entry, so it lives at least as long as the region's
//! bookkeeping does. Entries only grow; the whole entry is dropped when the
//! owning region is released.

use std::fmt;

use indexmap::IndexMap;
use memref_core::{HostObject, RegionId};
use smallvec::SmallVec;

/// A value kept alive on behalf of a region.
#[derive(Clone)]
pub enum Retained<R> {
    /// A region a pointer was written to.
    Region(R),
    /// A host object written by reference.
    Object(HostObject),
}

impl<R> Retained<R> {
    /// The retained region, if this is one.
    pub fn as_region(&self) -> Option<&R> {
        match self {
            Self::Region(r) => Some(r),
            Self::Object(_) => None,
        }
    }

    /// The retained object, if this is one.
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            Self::Region(_) => None,
            Self::Object(o) => Some(o),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Retained<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region(r) => f.debug_tuple("Region").field(r).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Most regions retain zero or one value.
type Entries<R> = SmallVec<[Retained<R>; 2]>;

/// Per-region append-only lists of retained values.
pub struct RetentionLedger<R> {
    entries: IndexMap<RegionId, Entries<R>>,
}

impl<R> RetentionLedger<R> {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Append `value` to `region`'s list, creating the list on first use.
    pub fn attach(&mut self, region: RegionId, value: Retained<R>) {
        self.entries.entry(region).or_default().push(value);
    }

    /// Values retained by `region`, oldest first.
    pub fn retained(&self, region: RegionId) -> &[Retained<R>] {
        self.entries
            .get(&region)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Number of values retained by `region`.
    pub fn count(&self, region: RegionId) -> usize {
        self.retained(region).len()
    }

    /// Drop `region`'s list, returning how many values it held.
    ///
    /// Only for regions the surrounding scope is destroying.
    pub fn release(&mut self, region: RegionId) -> usize {
        self.entries
            .shift_remove(&region)
            .map_or(0, |list| list.len())
    }

    /// Number of regions with a list.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no region retains anything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total values retained across all regions.
    pub fn total(&self) -> usize {
        self.entries.values().map(|list| list.len()).sum()
    }
}

impl<R> Default for RetentionLedger<R> {
    fn default() -> Self {
        Self::new()
    }
}
