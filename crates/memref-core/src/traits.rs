//! The native memory layer the indirection core is written against.
//!
//! Implementations own raw storage. The core never allocates or frees
//! bytes itself: it asks a [`NativeMemory`] for regions, reads and writes
//! through it, and keeps its own bookkeeping on the side.

use std::fmt;

use crate::anchor::RegionWatch;
use crate::error::MemoryError;
use crate::id::{Address, RegionId};
use crate::platform::{Endianness, Platform};
use crate::scalar::{HostObject, ScalarKind};

/// A handle to a fixed-length span of native bytes.
///
/// Handles are cheap to clone; a clone is the *same* region (same
/// [`RegionId`]). Distinct handles produced by the memory layer may alias
/// the same bytes.
pub trait MemoryRegion: Clone + fmt::Debug {
    /// Identity of this region handle.
    fn id(&self) -> RegionId;

    /// Address of the first byte.
    fn address(&self) -> Address;

    /// Length in bytes.
    fn len(&self) -> usize;

    /// Observer that reports whether any clone of this handle is alive.
    fn watch(&self) -> RegionWatch;

    /// Whether the region spans zero bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this region sits at the null address.
    fn is_null(&self) -> bool {
        self.address().is_null()
    }
}

/// Raw allocation, scalar, pointer and object primitives.
///
/// Pointer and object writes do not retain what they store: a pointer
/// written with [`write_pointer`](Self::write_pointer) does not keep its
/// target alive, and [`write_object`](Self::write_object) holds the object
/// weakly. Retention is layered on top by the caller.
pub trait NativeMemory {
    /// The region handle type produced by this layer.
    type Region: MemoryRegion;

    /// Primitive size table and byte order.
    fn platform(&self) -> &Platform;

    /// Allocate a zero-filled region of `len` bytes.
    fn alloc(&mut self, len: usize) -> Result<Self::Region, MemoryError>;

    /// The canonical null region (zero length, null address).
    ///
    /// Every call returns a handle with the same [`RegionId`].
    fn null(&self) -> Self::Region;

    /// Copy `len` bytes out of `region` starting at `offset`.
    fn read_bytes(
        &self,
        region: &Self::Region,
        offset: usize,
        len: usize,
    ) -> Result<Vec<u8>, MemoryError>;

    /// Copy `bytes` into `region` starting at `offset`.
    fn write_bytes(
        &mut self,
        region: &Self::Region,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), MemoryError>;

    /// Read a scalar's raw bit pattern in the given byte order.
    fn read_scalar(
        &self,
        region: &Self::Region,
        offset: usize,
        kind: ScalarKind,
        endianness: Endianness,
    ) -> Result<u64, MemoryError> {
        let bytes = self.read_bytes(region, offset, kind.width())?;
        Ok(endianness.read_uint(&bytes))
    }

    /// Write the low bytes of `bits` as a scalar in the given byte order.
    fn write_scalar(
        &mut self,
        region: &Self::Region,
        offset: usize,
        kind: ScalarKind,
        endianness: Endianness,
        bits: u64,
    ) -> Result<(), MemoryError> {
        let mut bytes = [0u8; 8];
        let out = &mut bytes[..kind.width()];
        endianness.write_uint(bits, out);
        self.write_bytes(region, offset, out)
    }

    /// Decode the pointer stored at `offset` into a new region of `len` bytes.
    ///
    /// A null pointer decodes to a fresh zero-length null region regardless
    /// of `len`.
    fn read_pointer(
        &self,
        region: &Self::Region,
        offset: usize,
        len: usize,
    ) -> Result<Self::Region, MemoryError>;

    /// Store the address of `target` at `offset`. Does not retain `target`.
    fn write_pointer(
        &mut self,
        region: &Self::Region,
        offset: usize,
        target: &Self::Region,
    ) -> Result<(), MemoryError>;

    /// Resolve the object reference stored at `offset`.
    fn read_object(&self, region: &Self::Region, offset: usize) -> Result<HostObject, MemoryError>;

    /// Store a weak reference to `object` at `offset`.
    fn write_object(
        &mut self,
        region: &Self::Region,
        offset: usize,
        object: &HostObject,
    ) -> Result<(), MemoryError>;
}
