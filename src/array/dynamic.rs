//! Runtime-typed array wrapper.

use crate::dtype::{DType, Element, Scalar};
use crate::util::{ConvError, ConvResult};

use super::NdArray;

/// An [`NdArray`] whose element type is chosen at run time.
///
/// File loaders and dynamic pipelines learn their element type from the data
/// they read; this enum closes over the ten supported element types so such
/// callers can still hand arrays to statically typed code. Operations that
/// do not depend on the element type are forwarded to the wrapped array with
/// one match arm per variant, so adding a type is a compile-checked change
/// rather than a runtime switch on a tag number.
#[derive(Clone)]
pub enum DynamicArray {
    Uint8(NdArray<u8>),
    Int8(NdArray<i8>),
    Uint16(NdArray<u16>),
    Int16(NdArray<i16>),
    Uint32(NdArray<u32>),
    Int32(NdArray<i32>),
    Uint64(NdArray<u64>),
    Int64(NdArray<i64>),
    Float32(NdArray<f32>),
    Float64(NdArray<f64>),
}

/// Applies `$body` to the wrapped array, whatever its element type.
macro_rules! for_each_variant {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            DynamicArray::Uint8($inner) => $body,
            DynamicArray::Int8($inner) => $body,
            DynamicArray::Uint16($inner) => $body,
            DynamicArray::Int16($inner) => $body,
            DynamicArray::Uint32($inner) => $body,
            DynamicArray::Int32($inner) => $body,
            DynamicArray::Uint64($inner) => $body,
            DynamicArray::Int64($inner) => $body,
            DynamicArray::Float32($inner) => $body,
            DynamicArray::Float64($inner) => $body,
        }
    };
}

impl DynamicArray {
    /// Allocates a zero-initialized array of the given runtime type.
    ///
    /// Fails with [`UnsupportedType`](crate::ConvError::UnsupportedType) for
    /// tags that have no element representation (`Bit`, `Complex64`, `Str`).
    pub fn zeros(dtype: DType, dims: &[usize]) -> ConvResult<Self> {
        Ok(match dtype {
            DType::Uint8 => NdArray::<u8>::zeros(dims)?.into(),
            DType::Int8 => NdArray::<i8>::zeros(dims)?.into(),
            DType::Uint16 => NdArray::<u16>::zeros(dims)?.into(),
            DType::Int16 => NdArray::<i16>::zeros(dims)?.into(),
            DType::Uint32 => NdArray::<u32>::zeros(dims)?.into(),
            DType::Int32 => NdArray::<i32>::zeros(dims)?.into(),
            DType::Uint64 => NdArray::<u64>::zeros(dims)?.into(),
            DType::Int64 => NdArray::<i64>::zeros(dims)?.into(),
            DType::Float32 => NdArray::<f32>::zeros(dims)?.into(),
            DType::Float64 => NdArray::<f64>::zeros(dims)?.into(),
            DType::Bit | DType::Complex64 | DType::Str => {
                return Err(ConvError::UnsupportedType {
                    dtype,
                    op: "array allocation",
                })
            }
        })
    }

    /// Runtime tag of the wrapped element type.
    pub fn dtype(&self) -> DType {
        for_each_variant!(self, array => array.dtype())
    }

    /// Extent along each dimension, slowest-varying first.
    pub fn dims(&self) -> &[usize] {
        for_each_variant!(self, array => array.dims())
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        for_each_variant!(self, array => array.ndim())
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        for_each_variant!(self, array => array.len())
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        for_each_variant!(self, array => array.is_empty())
    }

    /// Element at `pos` as a runtime scalar, or `None` when out of bounds.
    pub fn get(&self, pos: &[usize]) -> Option<Scalar> {
        for_each_variant!(self, array => array.get(pos).map(|v| v.to_scalar()))
    }

    /// Number of blank elements. Always a full scan.
    pub fn count_blank(&self) -> usize {
        for_each_variant!(self, array => array.count_blank())
    }

    /// True when any element is blank, using the wrapped array's cache.
    pub fn has_blank(&self) -> bool {
        for_each_variant!(self, array => array.has_blank())
    }

    /// Scans, stores the blank-presence result, and returns it.
    pub fn refresh_blank_status(&mut self) -> bool {
        for_each_variant!(self, array => array.refresh_blank_status())
    }

    /// Discards blank elements; see [`NdArray::remove_blanks`].
    pub fn remove_blanks(&mut self) {
        for_each_variant!(self, array => array.remove_blanks())
    }

    /// Borrows the wrapped `f32` array, if that is the runtime type.
    pub fn as_f32(&self) -> Option<&NdArray<f32>> {
        match self {
            DynamicArray::Float32(array) => Some(array),
            _ => None,
        }
    }

    /// Borrows the wrapped `f64` array, if that is the runtime type.
    pub fn as_f64(&self) -> Option<&NdArray<f64>> {
        match self {
            DynamicArray::Float64(array) => Some(array),
            _ => None,
        }
    }
}

macro_rules! impl_from_ndarray {
    ($($ty:ty => $variant:ident,)+) => {$(
        impl From<NdArray<$ty>> for DynamicArray {
            fn from(array: NdArray<$ty>) -> Self {
                DynamicArray::$variant(array)
            }
        }
    )+};
}

impl_from_ndarray! {
    u8 => Uint8,
    i8 => Int8,
    u16 => Uint16,
    i16 => Int16,
    u32 => Uint32,
    i32 => Int32,
    u64 => Uint64,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

#[cfg(test)]
mod tests {
    use super::{DynamicArray, NdArray};
    use crate::dtype::{DType, Scalar};
    use crate::util::ConvError;

    #[test]
    fn forwards_shape_queries_to_the_wrapped_array() {
        let array = DynamicArray::from(
            NdArray::from_vec(vec![1u16, 2, 3, 4, 5, 6], &[2, 3]).unwrap(),
        );
        assert_eq!(array.dtype(), DType::Uint16);
        assert_eq!(array.dims(), &[2, 3]);
        assert_eq!(array.ndim(), 2);
        assert_eq!(array.len(), 6);
        assert_eq!(array.get(&[1, 2]), Some(Scalar::Uint16(6)));
        assert_eq!(array.get(&[2, 0]), None);
    }

    #[test]
    fn blank_operations_work_through_the_wrapper() {
        let mut array = DynamicArray::from(
            NdArray::from_vec(vec![1.0f64, f64::NAN, 3.0], &[3]).unwrap(),
        );
        assert_eq!(array.count_blank(), 1);
        assert!(array.refresh_blank_status());
        array.remove_blanks();
        assert_eq!(array.dims(), &[2]);
        assert!(!array.has_blank());
    }

    #[test]
    fn zeros_rejects_tags_without_elements() {
        let array = DynamicArray::zeros(DType::Int32, &[2, 2]).unwrap();
        assert_eq!(array.dtype(), DType::Int32);
        assert_eq!(array.get(&[0, 0]), Some(Scalar::Int32(0)));
        assert_eq!(
            DynamicArray::zeros(DType::Str, &[2]).err(),
            Some(ConvError::UnsupportedType {
                dtype: DType::Str,
                op: "array allocation",
            })
        );
    }

    #[test]
    fn typed_borrows_match_the_variant() {
        let floats = DynamicArray::from(NdArray::<f32>::zeros(&[2]).unwrap());
        assert!(floats.as_f32().is_some());
        assert!(floats.as_f64().is_none());
    }
}
