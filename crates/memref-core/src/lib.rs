//! Core types and traits for memref.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the native memory layer and the indirection core:
//! identifiers, the platform size table, scalar kinds and decoded values,
//! error types, and the [`NativeMemory`] trait the core is written against.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod anchor;
pub mod error;
pub mod id;
pub mod platform;
pub mod scalar;
pub mod traits;

pub use anchor::{RegionAnchor, RegionWatch};
pub use error::{MemoryError, RefError};
pub use id::{Address, ObjectId, RegionId};
pub use platform::{Endianness, Platform};
pub use scalar::{host_object, HostObject, ScalarKind, Value};
pub use traits::{MemoryRegion, NativeMemory};
