//! Platform primitive sizes and byte order.

use std::fmt;

/// Byte order of multi-byte values in native memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endianness {
    /// Least significant byte first (`"LE"`).
    Little,
    /// Most significant byte first (`"BE"`).
    Big,
}

impl Endianness {
    /// Byte order of the host this crate was compiled for.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// The short tag used by native primitive names: `"LE"` or `"BE"`.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Little => "LE",
            Self::Big => "BE",
        }
    }

    /// Decode an unsigned integer of `bytes.len()` bytes (at most 8).
    pub fn read_uint(self, bytes: &[u8]) -> u64 {
        debug_assert!(bytes.len() <= 8);
        match self {
            Self::Little => bytes
                .iter()
                .rev()
                .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
            Self::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        }
    }

    /// Encode the low `out.len()` bytes of `bits` (at most 8) into `out`.
    pub fn write_uint(self, bits: u64, out: &mut [u8]) {
        debug_assert!(out.len() <= 8);
        let width = out.len();
        for (i, slot) in out.iter_mut().enumerate() {
            let shift = match self {
                Self::Little => i * 8,
                Self::Big => (width - 1 - i) * 8,
            };
            *slot = (bits >> shift) as u8;
        }
    }
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// The primitive size table and byte order of a (possibly simulated) platform.
///
/// Fixed-width scalars have fixed sizes; only `pointer` and `size_t` vary
/// with [`Platform::pointer_size`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Platform {
    pointer_size: usize,
    endianness: Endianness,
}

impl Platform {
    /// Names accepted by [`Platform::sizeof`], in table order.
    pub const PRIMITIVES: [&'static str; 13] = [
        "char", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64",
        "float", "double", "size_t", "pointer",
    ];

    /// Build a platform description explicitly.
    ///
    /// `pointer_size` is validated by the memory layer's configuration, not
    /// here.
    pub fn new(pointer_size: usize, endianness: Endianness) -> Self {
        Self {
            pointer_size,
            endianness,
        }
    }

    /// The platform this crate was compiled for.
    pub fn native() -> Self {
        Self::new(std::mem::size_of::<usize>(), Endianness::native())
    }

    /// Byte order used for multi-byte values.
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Size of a native pointer in bytes.
    pub fn pointer_size(&self) -> usize {
        self.pointer_size
    }

    /// Look up the byte size of a primitive by name.
    pub fn sizeof(&self, primitive: &str) -> Option<usize> {
        let size = match primitive {
            "char" | "int8" | "uint8" => 1,
            "int16" | "uint16" => 2,
            "int32" | "uint32" | "float" => 4,
            "int64" | "uint64" | "double" => 8,
            "size_t" | "pointer" => self.pointer_size,
            _ => return None,
        };
        Some(size)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::native()
    }
}
