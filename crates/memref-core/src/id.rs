//! Strongly-typed identifiers: region identity, addresses and object ids.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`RegionId`] allocation.
static REGION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a memory region handle.
///
/// Two regions may alias the same bytes while carrying different ids, and
/// therefore different type bindings. Allocated from a monotonic atomic
/// counter via [`RegionId::next`], so an id is never handed out twice
/// within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(u64);

impl RegionId {
    /// Allocate a fresh, unique region id. Thread-safe.
    pub fn next() -> Self {
        Self(REGION_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A numeric address in the native address space.
///
/// Address `0` is the null address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl Address {
    /// The null address.
    pub const NULL: Address = Address(0);

    /// Whether this is the null address.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Offset this address by `bytes`, returning `None` on overflow.
    pub fn checked_add(self, bytes: usize) -> Option<Address> {
        self.0.checked_add(bytes as u64).map(Address)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Address {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a host object written into memory by the native layer.
///
/// The native layer stores the id in place of the object itself. Id `0`
/// is never issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
