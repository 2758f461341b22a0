//! Heap blocks: the byte storage behind each allocation.
//!
//! A [`Block`] owns its bytes and a weak reference to a [`BlockToken`].
//! Region handles hold the token strongly, so the block is live exactly as
//! long as some handle into it exists.

use std::sync::{Arc, Weak};

use memref_core::Address;

/// Liveness token shared by every region handle into one block.
#[derive(Debug)]
pub struct BlockToken {
    base: Address,
}

impl BlockToken {
    /// Base address of the block this token keeps alive.
    pub fn base(&self) -> Address {
        self.base
    }
}

/// A single zero-initialised allocation.
pub struct Block {
    base: Address,
    bytes: Vec<u8>,
    token: Weak<BlockToken>,
}

impl Block {
    /// Create a block of `len` zero bytes at `base`.
    ///
    /// Returns the block and the first strong reference to its token.
    pub fn new(base: Address, len: usize) -> (Self, Arc<BlockToken>) {
        let token = Arc::new(BlockToken { base });
        let block = Self {
            base,
            bytes: vec![0; len],
            token: Arc::downgrade(&token),
        };
        (block, token)
    }

    /// Base address.
    pub fn base(&self) -> Address {
        self.base
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the block is zero-length.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether `len` bytes starting at `address` lie entirely inside this block.
    pub fn contains(&self, address: Address, len: usize) -> bool {
        address.0 >= self.base.0
            && (address.0 - self.base.0)
                .checked_add(len as u64)
                .is_some_and(|end| end <= self.bytes.len() as u64)
    }

    /// Upgrade the liveness token, if any handle still holds it.
    pub fn token(&self) -> Option<Arc<BlockToken>> {
        self.token.upgrade()
    }

    /// Whether any region handle still refers to this block.
    pub fn is_live(&self) -> bool {
        self.token.strong_count() > 0
    }

    /// Shared slice of `len` bytes at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the range is not [`contained`](Self::contains) in the block.
    pub fn slice(&self, address: Address, len: usize) -> &[u8] {
        let start = (address.0 - self.base.0) as usize;
        &self.bytes[start..start + len]
    }

    /// Mutable slice of `len` bytes at `address`.
    ///
    /// # Panics
    ///
    /// Panics if the range is not [`contained`](Self::contains) in the block.
    pub fn slice_mut(&mut self, address: Address, len: usize) -> &mut [u8] {
        let start = (address.0 - self.base.0) as usize;
        &mut self.bytes[start..start + len]
    }
}
