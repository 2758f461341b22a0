//! Heap configuration parameters.

use memref_core::{MemoryError, Platform};

/// Configuration for the simulated heap.
///
/// Validated at construction by [`Heap::new`](crate::Heap::new); all values
/// are immutable after creation.
#[derive(Clone, Debug)]
pub struct HeapConfig {
    /// Pointer width and byte order of the simulated platform.
    ///
    /// Default: the host platform. Pointer size must be 4 or 8.
    pub platform: Platform,

    /// First address handed out by the allocator.
    ///
    /// Default: `0x1000`. Must be non-zero (zero is the null address) and a
    /// multiple of `alignment`.
    pub base_address: u64,

    /// Alignment of every allocation in bytes.
    ///
    /// Default: 8. Must be a power of two.
    pub alignment: usize,

    /// Maximum number of live (not yet collected) bytes.
    ///
    /// Default: 64MB.
    pub capacity: usize,
}

impl HeapConfig {
    /// Default first address.
    pub const DEFAULT_BASE_ADDRESS: u64 = 0x1000;

    /// Default allocation alignment.
    pub const DEFAULT_ALIGNMENT: usize = 8;

    /// Default live-byte capacity: 64MB.
    pub const DEFAULT_CAPACITY: usize = 64 * 1024 * 1024;

    /// Create a config for the given platform, with defaults elsewhere.
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            base_address: Self::DEFAULT_BASE_ADDRESS,
            alignment: Self::DEFAULT_ALIGNMENT,
            capacity: Self::DEFAULT_CAPACITY,
        }
    }

    /// Set the live-byte capacity.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Check all invariants.
    pub fn validate(&self) -> Result<(), MemoryError> {
        let pointer_size = self.platform.pointer_size();
        if pointer_size != 4 && pointer_size != 8 {
            return Err(MemoryError::InvalidConfig {
                reason: format!("pointer size must be 4 or 8, got {pointer_size}"),
            });
        }
        if !self.alignment.is_power_of_two() {
            return Err(MemoryError::InvalidConfig {
                reason: format!("alignment must be a power of two, got {}", self.alignment),
            });
        }
        if self.base_address == 0 {
            return Err(MemoryError::InvalidConfig {
                reason: "base address must be non-zero".to_string(),
            });
        }
        if self.base_address % self.alignment as u64 != 0 {
            return Err(MemoryError::InvalidConfig {
                reason: format!(
                    "base address {:#x} is not aligned to {}",
                    self.base_address, self.alignment
                ),
            });
        }
        if self.base_address > self.max_address() {
            return Err(MemoryError::InvalidConfig {
                reason: format!(
                    "base address {:#x} does not fit in a {pointer_size}-byte pointer",
                    self.base_address
                ),
            });
        }
        Ok(())
    }

    /// Highest address representable by the platform's pointers.
    pub fn max_address(&self) -> u64 {
        if self.platform.pointer_size() >= 8 {
            u64::MAX
        } else {
            (1u64 << (self.platform.pointer_size() * 8)) - 1
        }
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Platform::native())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memref_core::Endianness;

    #[test]
    fn default_is_valid() {
        assert!(HeapConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_odd_pointer_size() {
        let config = HeapConfig::new(Platform::new(2, Endianness::Little));
        assert!(matches!(
            config.validate(),
            Err(MemoryError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn rejects_null_base() {
        let mut config = HeapConfig::default();
        config.base_address = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unaligned_base() {
        let mut config = HeapConfig::default();
        config.base_address = 0x1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_power_of_two_alignment() {
        let mut config = HeapConfig::default();
        config.alignment = 12;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_base_beyond_32_bit_pointers() {
        let mut config = HeapConfig::new(Platform::new(4, Endianness::Big));
        config.base_address = 1 << 33;
        assert!(config.validate().is_err());
    }

    #[test]
    fn max_address_follows_pointer_width() {
        let narrow = HeapConfig::new(Platform::new(4, Endianness::Little));
        assert_eq!(narrow.max_address(), u32::MAX as u64);
        let wide = HeapConfig::new(Platform::new(8, Endianness::Little));
        assert_eq!(wide.max_address(), u64::MAX);
    }
}
