//! Type descriptors: how to interpret the bytes of a region.
//!
//! A [`TypeDescriptor`] records the element size, the indirection depth and
//! a [`Codec`] that decodes (`get`) and encodes (`set`) values. Descriptors
//! are plain values: every region owns its own copy, and the indirection
//! engine adjusts a [`clone_type`] copy rather than anything shared.

use std::fmt;

use memref_core::{NativeMemory, Platform, RefError, ScalarKind, Value};

/// Decode/encode strategy of a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Placeholder for regions nobody has typed yet. Both directions fail
    /// with [`RefError::UnknownType`].
    Unknown,
    /// A fixed-width scalar in platform byte order.
    Scalar(ScalarKind),
    /// A host object stored by reference through the native object primitives.
    Object,
}

impl Codec {
    /// Short name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Scalar(kind) => kind.name(),
            Self::Object => "Object",
        }
    }
}

/// Describes how to interpret a memory region.
///
/// `indirection == 1` means the region holds a value of the base type;
/// each further level means "pointer to" one more time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Byte size of one element of the base type.
    pub size: usize,
    /// Number of pointer hops to the base value. At least 1.
    pub indirection: u32,
    /// Decoder/encoder for the base type.
    pub codec: Codec,
}

impl TypeDescriptor {
    /// Build a descriptor from its parts.
    pub fn new(size: usize, indirection: u32, codec: Codec) -> Self {
        Self {
            size,
            indirection,
            codec,
        }
    }

    /// The default type synthesized for an untyped region of `size` bytes.
    pub fn unknown(size: usize) -> Self {
        Self::new(size, 1, Codec::Unknown)
    }

    /// A fixed-width scalar type at indirection 1.
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::new(kind.width(), 1, Codec::Scalar(kind))
    }

    /// A host-object slot: one pointer-sized reference.
    pub fn object(platform: &Platform) -> Self {
        Self::new(platform.pointer_size(), 1, Codec::Object)
    }

    /// Whether this is a synthesized default type.
    pub fn is_unknown(&self) -> bool {
        self.codec == Codec::Unknown
    }

    /// Decode the base value stored at `offset`.
    pub fn get<M: NativeMemory>(
        &self,
        memory: &M,
        region: &M::Region,
        offset: usize,
    ) -> Result<Value, RefError> {
        match self.codec {
            Codec::Unknown => Err(RefError::UnknownType { size: self.size }),
            Codec::Scalar(kind) => {
                let endianness = memory.platform().endianness();
                let bits = memory.read_scalar(region, offset, kind, endianness)?;
                Ok(kind.decode(bits))
            }
            Codec::Object => Ok(Value::Object(memory.read_object(region, offset)?)),
        }
    }

    /// Encode `value` as the base type at `offset`.
    ///
    /// Objects are written through the raw native primitive, which does not
    /// retain them; use [`Scope::store`](crate::Scope::store) to keep them
    /// alive alongside the region.
    pub fn set<M: NativeMemory>(
        &self,
        memory: &mut M,
        region: &M::Region,
        offset: usize,
        value: &Value,
    ) -> Result<(), RefError> {
        match self.codec {
            Codec::Unknown => Err(RefError::UnknownType { size: self.size }),
            Codec::Scalar(kind) => {
                let bits = kind.encode(value)?;
                let endianness = memory.platform().endianness();
                memory.write_scalar(region, offset, kind, endianness, bits)?;
                Ok(())
            }
            Codec::Object => {
                let object = value.as_object().ok_or(RefError::TypeMismatch {
                    expected: "object",
                    found: value.kind_name(),
                })?;
                memory.write_object(region, offset, object)?;
                Ok(())
            }
        }
    }
}

/// Renders C-style: the base name followed by one `*` per pointer hop
/// beyond the first (`int32`, `int32*`, `int32**`).
impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codec.name())?;
        for _ in 1..self.indirection {
            f.write_str("*")?;
        }
        Ok(())
    }
}

/// Copy a descriptor so its `indirection` can be adjusted without touching
/// the original.
pub fn clone_type(ty: &TypeDescriptor) -> TypeDescriptor {
    TypeDescriptor {
        size: ty.size,
        indirection: ty.indirection,
        codec: ty.codec,
    }
}
