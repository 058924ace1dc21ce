//! Field codec.
//!
//! A block body is an untagged sequence of fields. Scalars are stored as
//! their raw host-order bytes; strings are stored as their bytes plus a
//! terminating zero. Both ends must agree on the field order out of band.

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};

/// Wire text stored in place of a null string.
pub const NULL_MARKER: &str = "NULL";

/// Returns true if a decoded string is the null-string marker.
pub fn is_null_marker(s: &str) -> bool {
    s == NULL_MARKER
}

/// Every kind of field the buffer can carry.
///
/// One-byte characters travel as `U8` (or `I8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    Str,
}

impl FieldKind {
    pub const ALL: [FieldKind; 11] = [
        FieldKind::I8,
        FieldKind::U8,
        FieldKind::I16,
        FieldKind::U16,
        FieldKind::I32,
        FieldKind::U32,
        FieldKind::I64,
        FieldKind::U64,
        FieldKind::F32,
        FieldKind::F64,
        FieldKind::Str,
    ];

    /// Encoded size of a scalar kind, `None` for strings.
    pub fn fixed_size(self) -> Option<usize> {
        match self {
            FieldKind::I8 | FieldKind::U8 => Some(1),
            FieldKind::I16 | FieldKind::U16 => Some(2),
            FieldKind::I32 | FieldKind::U32 | FieldKind::F32 => Some(4),
            FieldKind::I64 | FieldKind::U64 | FieldKind::F64 => Some(8),
            FieldKind::Str => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKind::I8 => "i8",
            FieldKind::U8 => "u8",
            FieldKind::I16 => "i16",
            FieldKind::U16 => "u16",
            FieldKind::I32 => "i32",
            FieldKind::U32 => "u32",
            FieldKind::I64 => "i64",
            FieldKind::U64 => "u64",
            FieldKind::F32 => "f32",
            FieldKind::F64 => "f64",
            FieldKind::Str => "str",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown field kind name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field kind: {0}")]
pub struct UnknownFieldKind(pub String);

impl FromStr for FieldKind {
    type Err = UnknownFieldKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownFieldKind(s.to_string()))
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    /// `None` is the null string, carried as [`NULL_MARKER`].
    Str(Option<String>),
}

impl Field {
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::I8(_) => FieldKind::I8,
            Field::U8(_) => FieldKind::U8,
            Field::I16(_) => FieldKind::I16,
            Field::U16(_) => FieldKind::U16,
            Field::I32(_) => FieldKind::I32,
            Field::U32(_) => FieldKind::U32,
            Field::I64(_) => FieldKind::I64,
            Field::U64(_) => FieldKind::U64,
            Field::F32(_) => FieldKind::F32,
            Field::F64(_) => FieldKind::F64,
            Field::Str(_) => FieldKind::Str,
        }
    }

    /// Bytes this field occupies on the wire, terminator included.
    pub fn encoded_len(&self) -> usize {
        match self {
            Field::Str(s) => string_payload(s.as_deref()).len() + 1,
            other => other.kind().fixed_size().unwrap_or_default(),
        }
    }

    /// Encode into `dst`, which must be exactly `encoded_len()` bytes.
    pub(crate) fn encode(&self, mut dst: &mut [u8]) {
        match self {
            Field::I8(v) => dst.put_i8(*v),
            Field::U8(v) => dst.put_u8(*v),
            Field::I16(v) => dst.put_i16_ne(*v),
            Field::U16(v) => dst.put_u16_ne(*v),
            Field::I32(v) => dst.put_i32_ne(*v),
            Field::U32(v) => dst.put_u32_ne(*v),
            Field::I64(v) => dst.put_i64_ne(*v),
            Field::U64(v) => dst.put_u64_ne(*v),
            Field::F32(v) => dst.put_f32_ne(*v),
            Field::F64(v) => dst.put_f64_ne(*v),
            Field::Str(s) => {
                dst.put_slice(string_payload(s.as_deref()));
                dst.put_u8(0);
            }
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::I8(v) => write!(f, "{v}"),
            Field::U8(v) => write!(f, "{v}"),
            Field::I16(v) => write!(f, "{v}"),
            Field::U16(v) => write!(f, "{v}"),
            Field::I32(v) => write!(f, "{v}"),
            Field::U32(v) => write!(f, "{v}"),
            Field::I64(v) => write!(f, "{v}"),
            Field::U64(v) => write!(f, "{v}"),
            Field::F32(v) => write!(f, "{v}"),
            Field::F64(v) => write!(f, "{v}"),
            Field::Str(Some(s)) => f.write_str(s),
            Field::Str(None) => f.write_str(NULL_MARKER),
        }
    }
}

fn string_payload(s: Option<&str>) -> &[u8] {
    s.unwrap_or(NULL_MARKER).as_bytes()
}

/// Decode a scalar of `kind` from exactly `fixed_size()` bytes.
///
/// Returns `None` for `FieldKind::Str`.
pub(crate) fn decode_scalar(kind: FieldKind, mut src: &[u8]) -> Option<Field> {
    let field = match kind {
        FieldKind::I8 => Field::I8(src.get_i8()),
        FieldKind::U8 => Field::U8(src.get_u8()),
        FieldKind::I16 => Field::I16(src.get_i16_ne()),
        FieldKind::U16 => Field::U16(src.get_u16_ne()),
        FieldKind::I32 => Field::I32(src.get_i32_ne()),
        FieldKind::U32 => Field::U32(src.get_u32_ne()),
        FieldKind::I64 => Field::I64(src.get_i64_ne()),
        FieldKind::U64 => Field::U64(src.get_u64_ne()),
        FieldKind::F32 => Field::F32(src.get_f32_ne()),
        FieldKind::F64 => Field::F64(src.get_f64_ne()),
        FieldKind::Str => return None,
    };
    Some(field)
}

mod sealed {
    pub trait Sealed {}
}

/// Fixed-size values that can be written with `write` and read with `read`.
///
/// Sealed: the implementations below are the complete wire-compatible set.
pub trait Scalar: sealed::Sealed + Copy {
    const KIND: FieldKind;

    fn into_field(self) -> Field;

    fn from_field(field: Field) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Scalar for $ty {
                const KIND: FieldKind = FieldKind::$variant;

                fn into_field(self) -> Field {
                    Field::$variant(self)
                }

                fn from_field(field: Field) -> Option<Self> {
                    match field {
                        Field::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_scalar! {
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}
