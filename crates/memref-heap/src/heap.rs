//! The simulated heap: allocation, raw access and reclamation.

use std::collections::BTreeMap;

use memref_core::{
    Address, HostObject, MemoryError, MemoryRegion, NativeMemory, ObjectId, Platform,
};
use tracing::trace;

use crate::block::Block;
use crate::config::HeapConfig;
use crate::handle::HeapRegion;
use crate::object::ObjectTable;

/// What a [`Heap::collect`] sweep reclaimed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Blocks released.
    pub blocks: usize,
    /// Bytes returned to capacity.
    pub bytes: usize,
    /// Dead object-table entries dropped.
    pub objects: usize,
}

/// A bump-allocated, byte-addressable simulated heap.
///
/// Addresses are never reused, so a pointer to a released block can never
/// silently resolve to a newer allocation.
pub struct Heap {
    config: HeapConfig,
    /// Live and not-yet-collected blocks, keyed by base address.
    blocks: BTreeMap<Address, Block>,
    /// Next address to hand out.
    cursor: u64,
    /// Bytes held by blocks that have not been collected.
    live_bytes: usize,
    objects: ObjectTable,
    /// The canonical null region.
    null: HeapRegion,
}

impl Heap {
    /// Create a heap from a validated config.
    pub fn new(config: HeapConfig) -> Result<Self, MemoryError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    /// Create a heap for the host platform with default settings.
    pub fn native() -> Self {
        Self::from_valid(HeapConfig::default())
    }

    fn from_valid(config: HeapConfig) -> Self {
        let cursor = config.base_address;
        Self {
            config,
            blocks: BTreeMap::new(),
            cursor,
            live_bytes: 0,
            objects: ObjectTable::new(),
            null: HeapRegion::null(),
        }
    }

    /// The configuration this heap was built with.
    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Bytes held by blocks that have not been collected.
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Number of blocks that have not been collected.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether `address` lies in a block some region handle still refers to.
    pub fn is_live(&self, address: Address) -> bool {
        self.block_for(address, 0).is_ok_and(Block::is_live)
    }

    /// Release every block no region handle refers to, and drop dead
    /// object-table entries.
    pub fn collect(&mut self) -> CollectStats {
        let mut stats = CollectStats::default();
        self.blocks.retain(|_, block| {
            if block.is_live() {
                true
            } else {
                stats.blocks += 1;
                stats.bytes += block.len();
                false
            }
        });
        self.live_bytes -= stats.bytes;
        stats.objects = self.objects.sweep();
        trace!(
            blocks = stats.blocks,
            bytes = stats.bytes,
            objects = stats.objects,
            "heap collected"
        );
        stats
    }

    /// Translate a region-relative access into an absolute address,
    /// checking it against the region's length.
    fn locate(
        &self,
        region: &HeapRegion,
        offset: usize,
        len: usize,
    ) -> Result<Address, MemoryError> {
        let out_of_bounds = MemoryError::OutOfBounds {
            offset,
            len,
            region_len: region.len(),
        };
        match offset.checked_add(len) {
            Some(end) if end <= region.len() => {}
            _ => return Err(out_of_bounds),
        }
        region.address().checked_add(offset).ok_or(out_of_bounds)
    }

    fn block_for(&self, address: Address, len: usize) -> Result<&Block, MemoryError> {
        self.blocks
            .range(..=address)
            .next_back()
            .map(|(_, block)| block)
            .filter(|block| block.contains(address, len))
            .ok_or(MemoryError::DanglingPointer { address, len })
    }

    fn block_for_mut(&mut self, address: Address, len: usize) -> Result<&mut Block, MemoryError> {
        self.blocks
            .range_mut(..=address)
            .next_back()
            .map(|(_, block)| block)
            .filter(|block| block.contains(address, len))
            .ok_or(MemoryError::DanglingPointer { address, len })
    }

    fn read_word(&self, region: &HeapRegion, offset: usize) -> Result<u64, MemoryError> {
        let bytes = self.read_bytes(region, offset, self.config.platform.pointer_size())?;
        Ok(self.config.platform.endianness().read_uint(&bytes))
    }

    fn write_word(
        &mut self,
        region: &HeapRegion,
        offset: usize,
        word: u64,
    ) -> Result<(), MemoryError> {
        let pointer_size = self.config.platform.pointer_size();
        if word > self.config.max_address() {
            return Err(MemoryError::AddressOverflow {
                address: Address(word),
                pointer_size,
            });
        }
        let mut bytes = [0u8; 8];
        let out = &mut bytes[..pointer_size];
        self.config.platform.endianness().write_uint(word, out);
        self.write_bytes(region, offset, out)
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::native()
    }
}

impl NativeMemory for Heap {
    type Region = HeapRegion;

    fn platform(&self) -> &Platform {
        &self.config.platform
    }

    fn alloc(&mut self, len: usize) -> Result<HeapRegion, MemoryError> {
        let available = self.config.capacity.saturating_sub(self.live_bytes);
        if len > available {
            return Err(MemoryError::CapacityExceeded {
                requested: len,
                available,
            });
        }

        let base = Address(self.cursor);
        let overflow = MemoryError::AddressOverflow {
            address: base,
            pointer_size: self.config.platform.pointer_size(),
        };
        // Zero-length allocations still consume one aligned slot so every
        // allocation has a distinct address.
        let span = len
            .max(1)
            .checked_next_multiple_of(self.config.alignment)
            .ok_or(overflow.clone())?;
        let next = self
            .cursor
            .checked_add(span as u64)
            .filter(|&end| end - 1 <= self.config.max_address())
            .ok_or(overflow)?;

        let (block, token) = Block::new(base, len);
        self.blocks.insert(base, block);
        self.cursor = next;
        self.live_bytes += len;
        trace!(address = %base, len, "heap alloc");
        Ok(HeapRegion::new(base, len, token))
    }

    fn null(&self) -> HeapRegion {
        self.null.clone()
    }

    fn read_bytes(
        &self,
        region: &HeapRegion,
        offset: usize,
        len: usize,
    ) -> Result<Vec<u8>, MemoryError> {
        let address = self.locate(region, offset, len)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        Ok(self.block_for(address, len)?.slice(address, len).to_vec())
    }

    fn write_bytes(
        &mut self,
        region: &HeapRegion,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), MemoryError> {
        let address = self.locate(region, offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        self.block_for_mut(address, bytes.len())?
            .slice_mut(address, bytes.len())
            .copy_from_slice(bytes);
        Ok(())
    }

    fn read_pointer(
        &self,
        region: &HeapRegion,
        offset: usize,
        len: usize,
    ) -> Result<HeapRegion, MemoryError> {
        let address = Address(self.read_word(region, offset)?);
        if address.is_null() {
            return Ok(HeapRegion::null());
        }
        let token = self
            .block_for(address, len)?
            .token()
            .ok_or(MemoryError::DanglingPointer { address, len })?;
        trace!(%address, len, "heap read pointer");
        Ok(HeapRegion::new(address, len, token))
    }

    fn write_pointer(
        &mut self,
        region: &HeapRegion,
        offset: usize,
        target: &HeapRegion,
    ) -> Result<(), MemoryError> {
        trace!(target = %target.address(), offset, "heap write pointer");
        self.write_word(region, offset, target.address().0)
    }

    fn read_object(&self, region: &HeapRegion, offset: usize) -> Result<HostObject, MemoryError> {
        let id = ObjectId(self.read_word(region, offset)?);
        self.objects.get(id)
    }

    fn write_object(
        &mut self,
        region: &HeapRegion,
        offset: usize,
        object: &HostObject,
    ) -> Result<(), MemoryError> {
        // Bounds are checked before the table records anything.
        self.locate(region, offset, self.config.platform.pointer_size())?;
        let id = self.objects.insert(object);
        self.write_word(region, offset, id.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memref_core::{host_object, Endianness, ScalarKind};

    fn heap_with(pointer_size: usize, endianness: Endianness) -> Heap {
        Heap::new(HeapConfig::new(Platform::new(pointer_size, endianness))).unwrap()
    }

    #[test]
    fn alloc_returns_zeroed_distinct_aligned_regions() {
        let mut heap = Heap::native();
        let a = heap.alloc(3).unwrap();
        let b = heap.alloc(3).unwrap();
        assert_ne!(a.address(), b.address());
        assert_eq!(a.address().0 % 8, 0);
        assert_eq!(b.address().0 % 8, 0);
        assert_eq!(heap.read_bytes(&a, 0, 3).unwrap(), vec![0, 0, 0]);
        assert_eq!(heap.live_bytes(), 6);
    }

    #[test]
    fn zero_length_allocs_get_distinct_addresses() {
        let mut heap = Heap::native();
        let a = heap.alloc(0).unwrap();
        let b = heap.alloc(0).unwrap();
        assert_ne!(a.address(), b.address());
        assert!(heap.read_bytes(&a, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn capacity_exceeded() {
        let mut heap = Heap::new(HeapConfig::default().with_capacity(16)).unwrap();
        heap.alloc(10).unwrap();
        let err = heap.alloc(10).unwrap_err();
        assert_eq!(
            err,
            MemoryError::CapacityExceeded {
                requested: 10,
                available: 6
            }
        );
    }

    #[test]
    fn out_of_bounds_access_rejected() {
        let mut heap = Heap::native();
        let r = heap.alloc(4).unwrap();
        assert!(matches!(
            heap.read_bytes(&r, 2, 4),
            Err(MemoryError::OutOfBounds { offset: 2, len: 4, region_len: 4 })
        ));
        assert!(heap.write_bytes(&r, usize::MAX, &[1]).is_err());
    }

    #[test]
    fn scalar_round_trip_uses_requested_byte_order() {
        let mut heap = Heap::native();
        let r = heap.alloc(4).unwrap();
        heap.write_scalar(&r, 0, ScalarKind::U32, Endianness::Big, 0x0102_0304)
            .unwrap();
        assert_eq!(heap.read_bytes(&r, 0, 4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(
            heap.read_scalar(&r, 0, ScalarKind::U32, Endianness::Little)
                .unwrap(),
            0x0403_0201
        );
    }

    #[test]
    fn pointer_read_aliases_target_bytes() {
        let mut heap = Heap::native();
        let target = heap.alloc(2).unwrap();
        heap.write_bytes(&target, 0, &[0xAB, 0xCD]).unwrap();
        let slot = heap.alloc(8).unwrap();
        heap.write_pointer(&slot, 0, &target).unwrap();

        let alias = heap.read_pointer(&slot, 0, 2).unwrap();
        assert_ne!(alias.id(), target.id());
        assert_eq!(alias.address(), target.address());
        assert_eq!(heap.read_bytes(&alias, 0, 2).unwrap(), vec![0xAB, 0xCD]);

        heap.write_bytes(&alias, 1, &[0xEF]).unwrap();
        assert_eq!(heap.read_bytes(&target, 0, 2).unwrap(), vec![0xAB, 0xEF]);
    }

    #[test]
    fn pointer_read_beyond_target_is_dangling() {
        let mut heap = Heap::native();
        let target = heap.alloc(2).unwrap();
        let slot = heap.alloc(8).unwrap();
        heap.write_pointer(&slot, 0, &target).unwrap();
        assert!(matches!(
            heap.read_pointer(&slot, 0, 16),
            Err(MemoryError::DanglingPointer { len: 16, .. })
        ));
    }

    #[test]
    fn null_pointer_reads_as_fresh_null_region() {
        let mut heap = Heap::native();
        let slot = heap.alloc(8).unwrap();
        let r = heap.read_pointer(&slot, 0, 4).unwrap();
        assert!(r.is_null());
        assert_eq!(r.len(), 0);
        assert_ne!(r.id(), heap.null().id());
    }

    #[test]
    fn canonical_null_has_stable_identity() {
        let heap = Heap::native();
        assert_eq!(heap.null().id(), heap.null().id());
        assert!(heap.null().is_null());
    }

    #[test]
    fn pointer_write_does_not_retain_target() {
        let mut heap = Heap::native();
        let slot = heap.alloc(8).unwrap();
        let target = heap.alloc(4).unwrap();
        let address = target.address();
        heap.write_pointer(&slot, 0, &target).unwrap();
        drop(target);

        assert!(!heap.is_live(address));
        assert!(matches!(
            heap.read_pointer(&slot, 0, 4),
            Err(MemoryError::DanglingPointer { .. })
        ));
        let stats = heap.collect();
        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.bytes, 4);
        assert_eq!(heap.live_bytes(), 8);
    }

    #[test]
    fn collect_keeps_referenced_blocks() {
        let mut heap = Heap::native();
        let keep = heap.alloc(4).unwrap();
        let alias_source = heap.alloc(8).unwrap();
        heap.write_pointer(&alias_source, 0, &keep).unwrap();
        let alias = heap.read_pointer(&alias_source, 0, 4).unwrap();
        drop(keep);
        assert_eq!(heap.collect().blocks, 0);
        assert!(heap.is_live(alias.address()));
    }

    #[test]
    fn collect_restores_capacity() {
        let mut heap = Heap::new(HeapConfig::default().with_capacity(8)).unwrap();
        drop(heap.alloc(8).unwrap());
        assert!(heap.alloc(1).is_err());
        heap.collect();
        assert!(heap.alloc(8).is_ok());
    }

    #[test]
    fn object_write_is_weak() {
        let mut heap = Heap::native();
        let slot = heap.alloc(8).unwrap();
        let obj = host_object(42u32);
        heap.write_object(&slot, 0, &obj).unwrap();

        let back = heap.read_object(&slot, 0).unwrap();
        assert_eq!(back.downcast_ref::<u32>(), Some(&42));
        drop(back);
        drop(obj);
        assert!(matches!(
            heap.read_object(&slot, 0),
            Err(MemoryError::ObjectReclaimed { .. })
        ));
        assert_eq!(heap.collect().objects, 1);
    }

    #[test]
    fn object_write_out_of_bounds_records_nothing() {
        let mut heap = Heap::native();
        let slot = heap.alloc(2).unwrap();
        let obj = host_object(1u8);
        assert!(heap.write_object(&slot, 0, &obj).is_err());
        assert!(heap.objects.is_empty());
    }

    #[test]
    fn big_endian_32_bit_pointer_layout() {
        let mut heap = heap_with(4, Endianness::Big);
        let slot = heap.alloc(4).unwrap();
        let target = heap.alloc(1).unwrap();
        heap.write_pointer(&slot, 0, &target).unwrap();
        let expected = (target.address().0 as u32).to_be_bytes().to_vec();
        assert_eq!(heap.read_bytes(&slot, 0, 4).unwrap(), expected);
    }

    #[test]
    fn narrow_pointers_overflow_address_space() {
        let mut config = HeapConfig::new(Platform::new(4, Endianness::Little));
        config.base_address = 0xFFFF_FFF0;
        let mut heap = Heap::new(config).unwrap();
        assert!(heap.alloc(8).is_ok());
        assert!(matches!(
            heap.alloc(16),
            Err(MemoryError::AddressOverflow { pointer_size: 4, .. })
        ));
    }

    #[test]
    fn invalid_config_rejected() {
        let result = Heap::new(HeapConfig::new(Platform::new(3, Endianness::Little)));
        assert!(matches!(result, Err(MemoryError::InvalidConfig { .. })));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn written_bytes_read_back(
                len in 1usize..64,
                data in proptest::collection::vec(any::<u8>(), 0..64),
                offset in 0usize..64,
            ) {
                let mut heap = Heap::native();
                let r = heap.alloc(len).unwrap();
                let fits = offset + data.len() <= len;
                let result = heap.write_bytes(&r, offset, &data);
                prop_assert_eq!(result.is_ok(), fits);
                if fits {
                    prop_assert_eq!(heap.read_bytes(&r, offset, data.len()).unwrap(), data);
                }
            }

            #[test]
            fn allocations_never_overlap(lens in proptest::collection::vec(0usize..32, 1..16)) {
                let mut heap = Heap::native();
                let regions: Vec<_> = lens.iter().map(|&l| heap.alloc(l).unwrap()).collect();
                for pair in regions.windows(2) {
                    prop_assert!(pair[0].address().0 + pair[0].len() as u64 <= pair[1].address().0);
                }
            }
        }
    }
}
