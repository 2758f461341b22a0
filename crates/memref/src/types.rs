//! Built-in descriptors for primitive scalar types.

use memref_core::{Platform, ScalarKind};

use crate::descriptor::{Codec, TypeDescriptor};

/// The primitive type registry.
///
/// Every descriptor has `indirection == 1` and a size taken from the
/// platform size table. Multi-byte values are encoded in the platform's
/// byte order. `char` is an unsigned byte.
#[derive(Clone, Debug)]
pub struct PrimitiveTypes {
    /// 1-byte character, read as an unsigned byte.
    pub char: TypeDescriptor,
    /// Signed 8-bit integer.
    pub int8: TypeDescriptor,
    /// Unsigned 8-bit integer.
    pub uint8: TypeDescriptor,
    /// Signed 16-bit integer.
    pub int16: TypeDescriptor,
    /// Unsigned 16-bit integer.
    pub uint16: TypeDescriptor,
    /// Signed 32-bit integer.
    pub int32: TypeDescriptor,
    /// Unsigned 32-bit integer.
    pub uint32: TypeDescriptor,
    /// Signed 64-bit integer.
    pub int64: TypeDescriptor,
    /// Unsigned 64-bit integer.
    pub uint64: TypeDescriptor,
    /// IEEE-754 single precision.
    pub float: TypeDescriptor,
    /// IEEE-754 double precision.
    pub double: TypeDescriptor,
    /// Unsigned integer as wide as a pointer.
    pub size_t: TypeDescriptor,
    /// A host object stored by reference.
    pub object: TypeDescriptor,
}

impl PrimitiveTypes {
    /// Registry names, in the order [`iter`](Self::iter) yields them.
    pub const NAMES: [&'static str; 13] = [
        "char", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64",
        "float", "double", "size_t", "Object",
    ];

    /// Build the registry for a platform.
    pub fn new(platform: &Platform) -> Self {
        let sized = |name: &str, kind: ScalarKind| {
            let size = platform.sizeof(name).unwrap_or(kind.width());
            TypeDescriptor::new(size, 1, Codec::Scalar(kind))
        };
        // Pointer widths with no matching integer kind get a 64-bit size_t,
        // sized by its codec rather than the size table.
        let size_t = ScalarKind::unsigned_of_width(platform.pointer_size())
            .map_or(TypeDescriptor::scalar(ScalarKind::U64), |kind| {
                sized("size_t", kind)
            });
        Self {
            char: sized("char", ScalarKind::U8),
            int8: sized("int8", ScalarKind::I8),
            uint8: sized("uint8", ScalarKind::U8),
            int16: sized("int16", ScalarKind::I16),
            uint16: sized("uint16", ScalarKind::U16),
            int32: sized("int32", ScalarKind::I32),
            uint32: sized("uint32", ScalarKind::U32),
            int64: sized("int64", ScalarKind::I64),
            uint64: sized("uint64", ScalarKind::U64),
            float: sized("float", ScalarKind::F32),
            double: sized("double", ScalarKind::F64),
            size_t,
            object: TypeDescriptor::object(platform),
        }
    }

    /// Look up a descriptor by registry name.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        let ty = match name {
            "char" => &self.char,
            "int8" => &self.int8,
            "uint8" => &self.uint8,
            "int16" => &self.int16,
            "uint16" => &self.uint16,
            "int32" => &self.int32,
            "uint32" => &self.uint32,
            "int64" => &self.int64,
            "uint64" => &self.uint64,
            "float" => &self.float,
            "double" => &self.double,
            "size_t" => &self.size_t,
            "Object" => &self.object,
            _ => return None,
        };
        Some(ty)
    }

    /// Iterate over `(name, descriptor)` pairs in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &TypeDescriptor)> {
        Self::NAMES
            .into_iter()
            .filter_map(move |name| self.get(name).map(|ty| (name, ty)))
    }
}
