//! Simulated native heap for memref.
//!
//! Implements [`NativeMemory`](memref_core::NativeMemory) without `unsafe`:
//! addresses are plain integers handed out by a bump allocator, each
//! allocation is a zero-filled byte [`Block`](block::Block), pointers are
//! stored as platform-sized integers in platform byte order, and host
//! objects are stored as ids into a weak [`ObjectTable`](object::ObjectTable).
//!
//! # Reclamation
//!
//! ```text
//! Heap
//! ├── blocks: Address → Block { bytes, Weak<BlockToken> }
//! ├── objects: ObjectId → Weak<dyn Any>
//! └── null: HeapRegion (canonical, zero length)
//!
//! HeapRegion { id, address, len, Arc<BlockToken> }
//! ```
//!
//! A block lives while any [`HeapRegion`] holds its token. Neither pointer
//! writes nor object writes hold a strong reference, so a block or object
//! only reachable through stored bytes is reclaimed by the next
//! [`Heap::collect`], and reading through the stale pointer fails with
//! [`MemoryError::DanglingPointer`](memref_core::MemoryError::DanglingPointer).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod block;
pub mod config;
pub mod handle;
pub mod heap;
pub mod object;

pub use config::HeapConfig;
pub use handle::HeapRegion;
pub use heap::{CollectStats, Heap};
