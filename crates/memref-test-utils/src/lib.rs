//! Test utilities for memref development.
//!
//! Provides [`FaultyMemory`], a [`NativeMemory`] wrapper that fails a chosen
//! primitive on demand, and heap fixtures for the platform layouts tests
//! care about.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicUsize, Ordering};

use memref_core::{Endianness, HostObject, MemoryError, NativeMemory, Platform};
use memref_heap::{Heap, HeapConfig};

/// A primitive [`FaultyMemory`] can be told to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    Alloc,
    ReadBytes,
    WriteBytes,
    ReadPointer,
    WritePointer,
    ReadObject,
    WriteObject,
}

impl Fault {
    fn operation(self) -> &'static str {
        match self {
            Self::Alloc => "alloc",
            Self::ReadBytes => "read_bytes",
            Self::WriteBytes => "write_bytes",
            Self::ReadPointer => "read_pointer",
            Self::WritePointer => "write_pointer",
            Self::ReadObject => "read_object",
            Self::WriteObject => "write_object",
        }
    }
}

/// Wraps a memory layer and fails one primitive once armed.
///
/// Every call to the armed primitive returns [`MemoryError::Injected`]
/// until [`disarm`](FaultyMemory::disarm) is called. Uses `AtomicUsize` for
/// the failure counter so read-only primitives can count through `&self`.
pub struct FaultyMemory<M> {
    inner: M,
    armed: Option<Fault>,
    injected: AtomicUsize,
}

impl<M: NativeMemory> FaultyMemory<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner,
            armed: None,
            injected: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent call to `fault`'s primitive fail.
    pub fn arm(&mut self, fault: Fault) {
        self.armed = Some(fault);
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    /// Number of failures injected so far.
    pub fn injected(&self) -> usize {
        self.injected.load(Ordering::Relaxed)
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut M {
        &mut self.inner
    }

    fn check(&self, fault: Fault) -> Result<(), MemoryError> {
        if self.armed != Some(fault) {
            return Ok(());
        }
        self.injected.fetch_add(1, Ordering::Relaxed);
        Err(MemoryError::Injected {
            operation: fault.operation(),
        })
    }
}

impl<M: NativeMemory> NativeMemory for FaultyMemory<M> {
    type Region = M::Region;

    fn platform(&self) -> &Platform {
        self.inner.platform()
    }

    fn alloc(&mut self, len: usize) -> Result<M::Region, MemoryError> {
        self.check(Fault::Alloc)?;
        self.inner.alloc(len)
    }

    fn null(&self) -> M::Region {
        self.inner.null()
    }

    fn read_bytes(
        &self,
        region: &M::Region,
        offset: usize,
        len: usize,
    ) -> Result<Vec<u8>, MemoryError> {
        self.check(Fault::ReadBytes)?;
        self.inner.read_bytes(region, offset, len)
    }

    fn write_bytes(
        &mut self,
        region: &M::Region,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), MemoryError> {
        self.check(Fault::WriteBytes)?;
        self.inner.write_bytes(region, offset, bytes)
    }

    fn read_pointer(
        &self,
        region: &M::Region,
        offset: usize,
        len: usize,
    ) -> Result<M::Region, MemoryError> {
        self.check(Fault::ReadPointer)?;
        self.inner.read_pointer(region, offset, len)
    }

    fn write_pointer(
        &mut self,
        region: &M::Region,
        offset: usize,
        target: &M::Region,
    ) -> Result<(), MemoryError> {
        self.check(Fault::WritePointer)?;
        self.inner.write_pointer(region, offset, target)
    }

    fn read_object(&self, region: &M::Region, offset: usize) -> Result<HostObject, MemoryError> {
        self.check(Fault::ReadObject)?;
        self.inner.read_object(region, offset)
    }

    fn write_object(
        &mut self,
        region: &M::Region,
        offset: usize,
        object: &HostObject,
    ) -> Result<(), MemoryError> {
        self.check(Fault::WriteObject)?;
        self.inner.write_object(region, offset, object)
    }
}

/// A heap for an explicit platform layout.
pub fn heap_for(pointer_size: usize, endianness: Endianness) -> Heap {
    match Heap::new(HeapConfig::new(Platform::new(pointer_size, endianness))) {
        Ok(heap) => heap,
        Err(e) => panic!("invalid test heap layout: {e}"),
    }
}

/// Little-endian, 8-byte pointers.
pub fn le64_heap() -> Heap {
    heap_for(8, Endianness::Little)
}

/// Big-endian, 4-byte pointers.
pub fn be32_heap() -> Heap {
    heap_for(4, Endianness::Big)
}

/// A faulty wrapper around the host-platform heap.
pub fn faulty_heap() -> FaultyMemory<Heap> {
    FaultyMemory::new(Heap::native())
}
