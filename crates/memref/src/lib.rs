//! memref: typed pointers over raw memory regions.
//!
//! Given an opaque byte region, describe what lives there and at what level
//! of indirection, then add a level ([`Scope::reference`]) or strip one
//! ([`Scope::deref`]) until the base value is decoded. Pointers and objects
//! written through a [`Scope`] are retained on the region they were written
//! into, because the native layer itself keeps no strong reference to them.
//!
//! # Quick start
//!
//! ```rust
//! use memref::prelude::*;
//!
//! let mut scope = Scope::new(Heap::native()).unwrap();
//! let char_ty = scope.types().char.clone();
//!
//! // A 1-byte region holding 'A'.
//! let r = scope.alloc_value(&char_ty, 65u8).unwrap();
//! assert_eq!(scope.load(&r, 0).unwrap(), Value::UInt(65));
//!
//! // char* pointing at it.
//! let p = scope.reference(&r).unwrap();
//! assert_eq!(scope.try_get_type(&p).unwrap().indirection, 2);
//!
//! // Back to the char region, then to the value.
//! let back = scope.deref(&p).unwrap().into_region().unwrap();
//! assert_eq!(back.address(), r.address());
//! let value = scope.deref(&back).unwrap().into_value().unwrap();
//! assert_eq!(value, Value::UInt(65));
//! ```
//!
//! # Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`descriptor`] | [`TypeDescriptor`], [`Codec`], [`clone_type`] |
//! | [`binding`] | [`TypeBindings`]: region → type side table |
//! | [`ledger`] | [`RetentionLedger`], [`Retained`] |
//! | [`scope`] | [`Scope`]: ref/deref and retaining writes |
//! | [`tracker`] | [`RegionTracker`], [`PruneStats`]: forgetting dead regions |
//! | [`types`] | [`PrimitiveTypes`] registry |
//! | [`common`] | IDs, platform table, values, errors, memory traits (`memref-core`) |
//! | [`heap`] | Simulated native heap (`memref-heap`) |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod binding;
pub mod descriptor;
pub mod ledger;
pub mod scope;
pub mod tracker;
pub mod types;

/// Core types, traits and errors (`memref-core`).
pub use memref_core as common;

/// The simulated native heap (`memref-heap`).
pub use memref_heap as heap;

pub use binding::TypeBindings;
pub use descriptor::{clone_type, Codec, TypeDescriptor};
pub use ledger::{Retained, RetentionLedger};
pub use scope::{Scope, Target};
pub use tracker::{PruneStats, RegionTracker};
pub use types::PrimitiveTypes;

/// Common imports for working with memref.
///
/// ```rust
/// use memref::prelude::*;
/// ```
pub mod prelude {
    pub use crate::descriptor::{clone_type, Codec, TypeDescriptor};
    pub use crate::ledger::Retained;
    pub use crate::scope::{Scope, Target};
    pub use crate::tracker::PruneStats;
    pub use crate::types::PrimitiveTypes;
    pub use memref_core::{
        host_object, Address, Endianness, HostObject, MemoryError, MemoryRegion, NativeMemory,
        Platform, RefError, ScalarKind, Value,
    };
    pub use memref_heap::{Heap, HeapConfig, HeapRegion};
}
