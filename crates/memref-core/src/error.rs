//! Error types for memref.
//!
//! [`MemoryError`] covers failures raised by the native memory layer.
//! [`RefError`] is what the indirection core returns: its own conditions
//! plus native failures propagated unchanged.

use std::error::Error;
use std::fmt;

use crate::id::{Address, ObjectId};
use crate::scalar::ScalarKind;

/// Failures raised by a native memory layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryError {
    /// An access fell outside the bounds of the region it was made through.
    OutOfBounds {
        /// Byte offset of the access within the region.
        offset: usize,
        /// Number of bytes accessed.
        len: usize,
        /// Length of the region.
        region_len: usize,
    },
    /// The allocator cannot satisfy a request.
    CapacityExceeded {
        /// Number of bytes requested.
        requested: usize,
        /// Bytes still available.
        available: usize,
    },
    /// An address does not lie within any live allocation.
    DanglingPointer {
        /// The unresolvable address.
        address: Address,
        /// Number of bytes that were to be accessed there.
        len: usize,
    },
    /// An address does not fit in the platform's pointer width.
    AddressOverflow {
        /// The address that did not fit.
        address: Address,
        /// Platform pointer size in bytes.
        pointer_size: usize,
    },
    /// No live object is recorded under the id stored in memory.
    ObjectReclaimed {
        /// The id read from memory.
        object: ObjectId,
    },
    /// The memory layer was configured with invalid parameters.
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
    /// A failure injected by a test harness.
    Injected {
        /// Name of the operation that was made to fail.
        operation: &'static str,
    },
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds {
                offset,
                len,
                region_len,
            } => write!(
                f,
                "access of {len} bytes at offset {offset} exceeds region of {region_len} bytes"
            ),
            Self::CapacityExceeded {
                requested,
                available,
            } => write!(
                f,
                "capacity exceeded: requested {requested} bytes, {available} bytes available"
            ),
            Self::DanglingPointer { address, len } => {
                write!(f, "dangling pointer: {len} bytes at {address} are not allocated")
            }
            Self::AddressOverflow {
                address,
                pointer_size,
            } => write!(
                f,
                "address {address} does not fit in a {pointer_size}-byte pointer"
            ),
            Self::ObjectReclaimed { object } => {
                write!(f, "object {object} has been reclaimed")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid memory config: {reason}"),
            Self::Injected { operation } => write!(f, "injected failure in {operation}"),
        }
    }
}

impl Error for MemoryError {}

/// Failures raised by the indirection core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefError {
    /// `get` was invoked on a synthesized default type. A real type must be
    /// bound before the region can be decoded.
    UnknownType {
        /// Size recorded on the default type (the region's length).
        size: usize,
    },
    /// An integer does not fit the scalar it is being written as.
    ValueOutOfRange {
        /// Target scalar kind.
        kind: ScalarKind,
        /// The rejected value, formatted.
        value: String,
    },
    /// A value of the wrong shape was written through a type.
    TypeMismatch {
        /// What the type accepts.
        expected: &'static str,
        /// What was supplied.
        found: &'static str,
    },
    /// A failure from the native memory layer, propagated unchanged.
    Memory(MemoryError),
}

impl fmt::Display for RefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownType { size } => {
                write!(f, "unknown \"type\" on {size}-byte region")
            }
            Self::ValueOutOfRange { kind, value } => {
                write!(f, "value {value} out of range for {kind}")
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            Self::Memory(e) => write!(f, "memory error: {e}"),
        }
    }
}

impl Error for RefError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Memory(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MemoryError> for RefError {
    fn from(e: MemoryError) -> Self {
        Self::Memory(e)
    }
}
