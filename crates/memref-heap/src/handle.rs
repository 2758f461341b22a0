//! Region handles into the simulated heap.

use std::fmt;
use std::sync::Arc;

use memref_core::{Address, MemoryRegion, RegionAnchor, RegionId, RegionWatch};

use crate::block::BlockToken;

/// A handle to a span of heap bytes.
///
/// Cloning a handle keeps the same [`RegionId`]. Holding any handle keeps
/// the underlying block alive across [`Heap::collect`](crate::Heap::collect);
/// null handles hold no token.
#[derive(Clone, Debug)]
#[must_use]
pub struct HeapRegion {
    anchor: RegionAnchor,
    address: Address,
    len: usize,
    token: Option<Arc<BlockToken>>,
}

impl HeapRegion {
    pub(crate) fn new(address: Address, len: usize, token: Arc<BlockToken>) -> Self {
        Self {
            anchor: RegionAnchor::new(),
            address,
            len,
            token: Some(token),
        }
    }

    /// A fresh zero-length handle at the null address.
    pub(crate) fn null() -> Self {
        Self {
            anchor: RegionAnchor::new(),
            address: Address::NULL,
            len: 0,
            token: None,
        }
    }

    /// Base address of the block this handle points into, if not null.
    pub fn block_base(&self) -> Option<Address> {
        self.token.as_ref().map(|t| t.base())
    }
}

impl MemoryRegion for HeapRegion {
    fn id(&self) -> RegionId {
        self.anchor.id()
    }

    fn address(&self) -> Address {
        self.address
    }

    fn len(&self) -> usize {
        self.len
    }

    fn watch(&self) -> RegionWatch {
        self.anchor.watch()
    }
}

impl fmt::Display for HeapRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HeapRegion({}, addr={}, len={})",
            self.anchor.id(), self.address, self.len
        )
    }
}
