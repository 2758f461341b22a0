//! Scalar kinds, decoded values and host objects.
//!
//! The native layer moves raw bit patterns of a given width; this module
//! owns the conversion between those bit patterns and typed [`Value`]s,
//! including range checks on the way in and sign extension on the way out.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::RefError;

/// An opaque host-level object that can be written into memory by reference.
///
/// The native layer keeps only a weak reference to objects it stores; the
/// strong count is what keeps them alive.
pub type HostObject = Arc<dyn Any + Send + Sync>;

/// Wrap a value as a [`HostObject`].
pub fn host_object<T: Any + Send + Sync>(value: T) -> HostObject {
    Arc::new(value)
}

/// Width, signedness and representation of a primitive scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 8-bit integer.
    I8,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 32-bit integer.
    U32,
    /// Signed 32-bit integer.
    I32,
    /// Unsigned 64-bit integer.
    U64,
    /// Signed 64-bit integer.
    I64,
    /// IEEE-754 single precision.
    F32,
    /// IEEE-754 double precision.
    F64,
}

impl ScalarKind {
    /// Width in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Whether this is a signed integer kind.
    pub fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Whether this is a floating-point kind.
    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    /// The unsigned integer kind of the given byte width, if one exists.
    pub fn unsigned_of_width(width: usize) -> Option<Self> {
        match width {
            1 => Some(Self::U8),
            2 => Some(Self::U16),
            4 => Some(Self::U32),
            8 => Some(Self::U64),
            _ => None,
        }
    }

    /// Short lowercase name (`"int32"`, `"uint8"`, `"double"`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::F32 => "float",
            Self::F64 => "double",
        }
    }

    fn int_range(self) -> (i128, i128) {
        let bits = self.width() as u32 * 8;
        if self.is_signed() {
            (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
        } else {
            (0, (1i128 << bits) - 1)
        }
    }

    /// Convert a value into the bit pattern stored for this kind.
    ///
    /// Only the low [`width`](Self::width) bytes of the result are
    /// significant. Integers outside the kind's range fail with
    /// [`RefError::ValueOutOfRange`]; floats written to integer kinds and
    /// objects written anywhere fail with [`RefError::TypeMismatch`].
    pub fn encode(self, value: &Value) -> Result<u64, RefError> {
        match self {
            Self::F32 | Self::F64 => {
                let f = match value {
                    Value::Int(i) => *i as f64,
                    Value::UInt(u) => *u as f64,
                    Value::Float(f) => *f,
                    Value::Object(_) => {
                        return Err(RefError::TypeMismatch {
                            expected: self.name(),
                            found: value.kind_name(),
                        })
                    }
                };
                Ok(if self == Self::F32 {
                    u64::from((f as f32).to_bits())
                } else {
                    f.to_bits()
                })
            }
            _ => {
                let wide = match value {
                    Value::Int(i) => i128::from(*i),
                    Value::UInt(u) => i128::from(*u),
                    Value::Float(_) | Value::Object(_) => {
                        return Err(RefError::TypeMismatch {
                            expected: self.name(),
                            found: value.kind_name(),
                        })
                    }
                };
                let (min, max) = self.int_range();
                if wide < min || wide > max {
                    return Err(RefError::ValueOutOfRange {
                        kind: self,
                        value: wide.to_string(),
                    });
                }
                Ok(wide as u64)
            }
        }
    }

    /// Interpret the low [`width`](Self::width) bytes of `bits` as this kind.
    pub fn decode(self, bits: u64) -> Value {
        let width_bits = self.width() as u32 * 8;
        let masked = if width_bits == 64 {
            bits
        } else {
            bits & ((1u64 << width_bits) - 1)
        };
        match self {
            Self::F32 => Value::Float(f64::from(f32::from_bits(masked as u32))),
            Self::F64 => Value::Float(f64::from_bits(masked)),
            _ if self.is_signed() => {
                let shift = 64 - width_bits;
                Value::Int(((masked << shift) as i64) >> shift)
            }
            _ => Value::UInt(masked),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded value produced by a type's `get`, or accepted by its `set`.
#[derive(Clone, Debug)]
pub enum Value {
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    UInt(u64),
    /// A floating-point number.
    Float(f64),
    /// A host object read back by reference.
    Object(HostObject),
}

impl Value {
    /// Short name of the variant, used in type-mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Object(_) => "object",
        }
    }

    /// The value as an `i64`, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// The value as a `u64`, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(i) => u64::try_from(*i).ok(),
            Self::UInt(u) => Some(*u),
            _ => None,
        }
    }

    /// The value as an `f64`, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::UInt(u) => Some(*u as f64),
            Self::Float(f) => Some(*f),
            Self::Object(_) => None,
        }
    }

    /// The contained host object, if any.
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Integers compare by numeric value across `Int`/`UInt`; objects compare
/// by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Int(_) | Self::UInt(_), Self::Int(_) | Self::UInt(_)) => {
                let wide = |v: &Value| match v {
                    Value::Int(i) => i128::from(*i),
                    Value::UInt(u) => i128::from(*u),
                    _ => 0,
                };
                wide(self) == wide(other)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Object(_) => f.write_str("[object]"),
        }
    }
}

macro_rules! value_from {
    ($variant:ident: $($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

value_from!(Int: i8, i16, i32, i64);
value_from!(UInt: u8, u16, u32, u64);
value_from!(Float: f32, f64);

impl From<HostObject> for Value {
    fn from(v: HostObject) -> Self {
        Self::Object(v)
    }
}
