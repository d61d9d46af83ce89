//! Element types, runtime type tags, and blank-value sentinels.
//!
//! Arrays carry their element type either statically (the `T` of an
//! [`NdArray<T>`](crate::NdArray)) or as a runtime [`DType`] tag when the
//! type is only known after reading a file. Both views agree on the blank
//! sentinel: the in-band value that marks a missing or masked element.
//! Floats use NaN; unsigned integers reserve their maximum value and signed
//! integers their minimum, which shrinks the usable range of each integer
//! type by one value.

use std::fmt;

use crate::util::{ConvError, ConvResult};

/// Runtime tag for the element type of an array buffer.
///
/// The numeric tags map one-to-one onto Rust primitives. `Bit`, `Str`, and
/// `Complex64` name types that appear in astronomical data files and are
/// recognized so callers get a precise error instead of a silent
/// misinterpretation; no array operations accept them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    /// Bit-packed data. Recognized but not usable as an element type.
    Bit,
    Uint8,
    Int8,
    Uint16,
    Int16,
    Uint32,
    Int32,
    Uint64,
    Int64,
    Float32,
    Float64,
    /// Complex number stored as two `f32` components.
    Complex64,
    /// Variable-length string data. Recognized but not usable as an element
    /// type.
    Str,
}

impl DType {
    /// Fixed per-element width in bytes.
    ///
    /// Fails for `Bit` (sub-byte) and `Str` (variable length).
    pub fn size_of(self) -> ConvResult<usize> {
        match self {
            DType::Bit | DType::Str => Err(ConvError::UnsupportedType {
                dtype: self,
                op: "size query",
            }),
            DType::Uint8 | DType::Int8 => Ok(1),
            DType::Uint16 | DType::Int16 => Ok(2),
            DType::Uint32 | DType::Int32 | DType::Float32 => Ok(4),
            DType::Uint64 | DType::Int64 | DType::Float64 => Ok(8),
            DType::Complex64 => Ok(8),
        }
    }

    /// The blank sentinel of this type as a runtime scalar.
    ///
    /// Fails for `Bit`, `Complex64`, and `Str`, which have no defined blank.
    pub fn blank(self) -> ConvResult<Scalar> {
        match self {
            DType::Uint8 => Ok(Scalar::Uint8(u8::blank())),
            DType::Int8 => Ok(Scalar::Int8(i8::blank())),
            DType::Uint16 => Ok(Scalar::Uint16(u16::blank())),
            DType::Int16 => Ok(Scalar::Int16(i16::blank())),
            DType::Uint32 => Ok(Scalar::Uint32(u32::blank())),
            DType::Int32 => Ok(Scalar::Int32(i32::blank())),
            DType::Uint64 => Ok(Scalar::Uint64(u64::blank())),
            DType::Int64 => Ok(Scalar::Int64(i64::blank())),
            DType::Float32 => Ok(Scalar::Float32(f32::blank())),
            DType::Float64 => Ok(Scalar::Float64(f64::blank())),
            DType::Bit | DType::Complex64 | DType::Str => Err(ConvError::UnsupportedType {
                dtype: self,
                op: "blank sentinel",
            }),
        }
    }

    /// Parses a decimal literal as a value of this type.
    ///
    /// Surrounding whitespace is ignored. Out-of-range or malformed input
    /// fails with [`ConvError::ParseValue`]; `Bit`, `Complex64`, and `Str`
    /// have no literal form and fail with [`ConvError::UnsupportedType`].
    pub fn parse(self, text: &str) -> ConvResult<Scalar> {
        let trimmed = text.trim();
        let malformed = || ConvError::ParseValue {
            dtype: self,
            value: text.to_string(),
        };
        match self {
            DType::Uint8 => trimmed.parse().map(Scalar::Uint8).map_err(|_| malformed()),
            DType::Int8 => trimmed.parse().map(Scalar::Int8).map_err(|_| malformed()),
            DType::Uint16 => trimmed.parse().map(Scalar::Uint16).map_err(|_| malformed()),
            DType::Int16 => trimmed.parse().map(Scalar::Int16).map_err(|_| malformed()),
            DType::Uint32 => trimmed.parse().map(Scalar::Uint32).map_err(|_| malformed()),
            DType::Int32 => trimmed.parse().map(Scalar::Int32).map_err(|_| malformed()),
            DType::Uint64 => trimmed.parse().map(Scalar::Uint64).map_err(|_| malformed()),
            DType::Int64 => trimmed.parse().map(Scalar::Int64).map_err(|_| malformed()),
            DType::Float32 => trimmed.parse().map(Scalar::Float32).map_err(|_| malformed()),
            DType::Float64 => trimmed.parse().map(Scalar::Float64).map_err(|_| malformed()),
            DType::Bit | DType::Complex64 | DType::Str => Err(ConvError::UnsupportedType {
                dtype: self,
                op: "value parsing",
            }),
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::Bit => "bit",
            DType::Uint8 => "uint8",
            DType::Int8 => "int8",
            DType::Uint16 => "uint16",
            DType::Int16 => "int16",
            DType::Uint32 => "uint32",
            DType::Int32 => "int32",
            DType::Uint64 => "uint64",
            DType::Int64 => "int64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Complex64 => "complex64",
            DType::Str => "str",
        };
        f.write_str(name)
    }
}

/// One value of any supported element type.
///
/// Used at the seams where the element type is chosen at run time, such as
/// parsed command-line values and [`DynamicArray`](crate::DynamicArray)
/// element access.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar {
    Uint8(u8),
    Int8(i8),
    Uint16(u16),
    Int16(i16),
    Uint32(u32),
    Int32(i32),
    Uint64(u64),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    /// Tag of the contained value.
    pub fn dtype(self) -> DType {
        match self {
            Scalar::Uint8(_) => DType::Uint8,
            Scalar::Int8(_) => DType::Int8,
            Scalar::Uint16(_) => DType::Uint16,
            Scalar::Int16(_) => DType::Int16,
            Scalar::Uint32(_) => DType::Uint32,
            Scalar::Int32(_) => DType::Int32,
            Scalar::Uint64(_) => DType::Uint64,
            Scalar::Int64(_) => DType::Int64,
            Scalar::Float32(_) => DType::Float32,
            Scalar::Float64(_) => DType::Float64,
        }
    }

    /// True when the value equals the blank sentinel of its type.
    pub fn is_blank(self) -> bool {
        match self {
            Scalar::Uint8(v) => v.is_blank(),
            Scalar::Int8(v) => v.is_blank(),
            Scalar::Uint16(v) => v.is_blank(),
            Scalar::Int16(v) => v.is_blank(),
            Scalar::Uint32(v) => v.is_blank(),
            Scalar::Int32(v) => v.is_blank(),
            Scalar::Uint64(v) => v.is_blank(),
            Scalar::Int64(v) => v.is_blank(),
            Scalar::Float32(v) => v.is_blank(),
            Scalar::Float64(v) => v.is_blank(),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Uint8(v) => write!(f, "{v}"),
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Uint16(v) => write!(f, "{v}"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::Uint32(v) => write!(f, "{v}"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Uint64(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::Float32(v) => write!(f, "{v}"),
            Scalar::Float64(v) => write!(f, "{v}"),
        }
    }
}

/// An array element type with a defined blank sentinel.
///
/// Implemented for the eight integer widths and the two float widths. The
/// bounds make elements usable from worker threads and let containers
/// zero-initialize storage.
pub trait Element: Copy + Default + PartialEq + Send + Sync + fmt::Debug + 'static {
    /// Runtime tag for this type.
    const DTYPE: DType;

    /// The blank sentinel of this type.
    fn blank() -> Self;

    /// True when `self` marks missing data.
    ///
    /// For floats this is a NaN test, so it holds for every NaN payload, not
    /// just the one `blank()` returns.
    fn is_blank(&self) -> bool;

    /// Wraps the value for runtime-typed callers.
    fn to_scalar(self) -> Scalar;
}

macro_rules! impl_int_element {
    ($($ty:ty => $tag:ident, $blank:expr;)+) => {$(
        impl Element for $ty {
            const DTYPE: DType = DType::$tag;

            #[inline]
            fn blank() -> Self {
                $blank
            }

            #[inline]
            fn is_blank(&self) -> bool {
                *self == $blank
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::$tag(self)
            }
        }
    )+};
}

impl_int_element! {
    u8 => Uint8, u8::MAX;
    i8 => Int8, i8::MIN;
    u16 => Uint16, u16::MAX;
    i16 => Int16, i16::MIN;
    u32 => Uint32, u32::MAX;
    i32 => Int32, i32::MIN;
    u64 => Uint64, u64::MAX;
    i64 => Int64, i64::MIN;
}

macro_rules! impl_float_element {
    ($($ty:ty => $tag:ident;)+) => {$(
        impl Element for $ty {
            const DTYPE: DType = DType::$tag;

            #[inline]
            fn blank() -> Self {
                <$ty>::NAN
            }

            #[inline]
            fn is_blank(&self) -> bool {
                self.is_nan()
            }

            #[inline]
            fn to_scalar(self) -> Scalar {
                Scalar::$tag(self)
            }
        }
    )+};
}

impl_float_element! {
    f32 => Float32;
    f64 => Float64;
}

/// A floating-point element the convolution engine can accumulate over.
///
/// The engine does all arithmetic in `f64` regardless of the storage width,
/// so results are reproducible and per-element rounding does not depend on
/// how the work is split.
pub trait Real: Element {
    /// Widens the value for accumulation.
    fn to_f64(self) -> f64;

    /// Narrows an accumulated value back to the storage type.
    fn from_f64(value: f64) -> Self;
}

impl Real for f32 {
    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Real for f64 {
    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }
}
