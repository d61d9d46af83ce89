//! Owning N-dimensional arrays and borrowed tile views.
//!
//! [`NdArray`] owns a contiguous row-major buffer: the first dimension
//! varies slowest and the last varies fastest, so a 2-D array of shape
//! `[rows, columns]` stores whole rows back to back. [`ArrayView`] borrows a
//! rectangular sub-box of a parent array without copying, and
//! [`DynamicArray`] wraps an `NdArray` whose element type is only known at
//! run time.

mod dynamic;
mod view;

pub use dynamic::DynamicArray;
pub use view::{ArrayView, Runs};

use crate::dtype::{DType, Element};
use crate::util::math::checked_product;
use crate::util::{ConvError, ConvResult};

/// Owning N-dimensional array with contiguous row-major storage.
///
/// Shapes always have at least one dimension and no zero extents; the only
/// exception is the 1-D empty shape `[0]` left behind by
/// [`remove_blanks`](Self::remove_blanks). The array keeps a lazy
/// blank-presence cache that mutating accessors invalidate.
#[derive(Clone)]
pub struct NdArray<T> {
    data: Vec<T>,
    dims: Vec<usize>,
    blank_status: Option<bool>,
}

/// Validates a shape and returns its element count.
fn validate_dims(dims: &[usize]) -> ConvResult<usize> {
    if dims.is_empty() || dims.contains(&0) {
        return Err(ConvError::InvalidDims {
            dims: dims.to_vec(),
        });
    }
    checked_product(dims).ok_or(ConvError::InvalidDims {
        dims: dims.to_vec(),
    })
}

impl<T: Element> NdArray<T> {
    /// Allocates a zero-initialized array of the given shape.
    pub fn zeros(dims: &[usize]) -> ConvResult<Self> {
        Self::full(T::default(), dims)
    }

    /// Allocates an array filled with `value`.
    pub fn full(value: T, dims: &[usize]) -> ConvResult<Self> {
        let len = validate_dims(dims)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ConvError::OutOfMemory {
                bytes: len.saturating_mul(std::mem::size_of::<T>()),
            })?;
        data.resize(len, value);
        Ok(Self {
            data,
            dims: dims.to_vec(),
            blank_status: Some(value.is_blank()),
        })
    }

    /// Wraps an existing buffer without copying.
    ///
    /// The buffer length must equal the product of the extents exactly.
    pub fn from_vec(data: Vec<T>, dims: &[usize]) -> ConvResult<Self> {
        let len = validate_dims(dims)?;
        if data.len() != len {
            return Err(ConvError::LengthMismatch {
                expected: len,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            dims: dims.to_vec(),
            blank_status: None,
        })
    }

    /// 1-D empty array, the shape `remove_blanks` leaves behind when every
    /// element was blank.
    pub(crate) fn empty_1d() -> Self {
        Self {
            data: Vec::new(),
            dims: vec![0],
            blank_status: Some(false),
        }
    }

    /// Extent along each dimension, slowest-varying first.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Runtime tag of the element type.
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// The underlying buffer in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Mutable access to the underlying buffer.
    ///
    /// Invalidates the blank-presence cache since the caller may write or
    /// erase blanks.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.blank_status = None;
        &mut self.data
    }

    /// Row-major flat index of `pos`, or `None` when out of bounds or of the
    /// wrong dimensionality.
    pub fn flat_index(&self, pos: &[usize]) -> Option<usize> {
        if pos.len() != self.dims.len() {
            return None;
        }
        let mut index = 0usize;
        for (&p, &extent) in pos.iter().zip(&self.dims) {
            if p >= extent {
                return None;
            }
            index = index * extent + p;
        }
        Some(index)
    }

    /// Element at `pos`, or `None` when out of bounds.
    pub fn get(&self, pos: &[usize]) -> Option<&T> {
        self.flat_index(pos).map(|index| &self.data[index])
    }

    /// Overwrites every element with `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
        self.blank_status = Some(value.is_blank() && !self.data.is_empty());
    }

    /// Borrows the whole array as a view.
    pub fn view(&self) -> ArrayView<'_, T> {
        ArrayView::full(self)
    }

    /// Borrows a rectangular sub-box as a view sharing this array's storage.
    ///
    /// `offset` and `dims` are per-dimension; the box must lie fully inside
    /// the array.
    pub fn slice(&self, offset: &[usize], dims: &[usize]) -> ConvResult<ArrayView<'_, T>> {
        ArrayView::new(self, offset, dims)
    }

    /// Number of blank elements. Always a full scan.
    pub fn count_blank(&self) -> usize {
        self.data.iter().filter(|v| v.is_blank()).count()
    }

    /// True when any element is blank.
    ///
    /// Answers from the cache when the status is known; otherwise scans the
    /// buffer without storing the result. Use
    /// [`refresh_blank_status`](Self::refresh_blank_status) to pay the scan
    /// once and remember the answer.
    pub fn has_blank(&self) -> bool {
        match self.blank_status {
            Some(status) => status,
            None => self.data.iter().any(|v| v.is_blank()),
        }
    }

    /// Scans the buffer, stores the blank-presence result, and returns it.
    pub fn refresh_blank_status(&mut self) -> bool {
        let has = self.data.iter().any(|v| v.is_blank());
        self.blank_status = Some(has);
        has
    }

    /// Cached blank presence: `None` when not yet computed or invalidated.
    pub fn blank_status(&self) -> Option<bool> {
        self.blank_status
    }

    /// Discards blank elements, compacting the rest in row-major order.
    ///
    /// The survivors no longer form a meaningful multi-dimensional grid, so
    /// the array becomes 1-D with a single extent equal to the remaining
    /// element count, possibly zero.
    pub fn remove_blanks(&mut self) {
        self.data.retain(|v| !v.is_blank());
        self.dims = vec![self.data.len()];
        self.blank_status = Some(false);
    }

    /// Moves the buffer out of the array.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::NdArray;
    use crate::util::ConvError;

    #[test]
    fn constructors_validate_shape() {
        assert_eq!(
            NdArray::<f32>::zeros(&[]).err(),
            Some(ConvError::InvalidDims { dims: vec![] })
        );
        assert_eq!(
            NdArray::<f32>::zeros(&[3, 0, 2]).err(),
            Some(ConvError::InvalidDims {
                dims: vec![3, 0, 2],
            })
        );
        assert_eq!(
            NdArray::<u8>::zeros(&[usize::MAX, 8]).err(),
            Some(ConvError::InvalidDims {
                dims: vec![usize::MAX, 8],
            })
        );
        assert_eq!(
            NdArray::from_vec(vec![0u8; 5], &[2, 3]).err(),
            Some(ConvError::LengthMismatch {
                expected: 6,
                got: 5,
            })
        );
    }

    #[test]
    fn flat_index_walks_row_major() {
        let array = NdArray::from_vec((0..24i32).collect(), &[2, 3, 4]).unwrap();
        assert_eq!(array.flat_index(&[0, 0, 0]), Some(0));
        assert_eq!(array.flat_index(&[1, 2, 3]), Some(23));
        assert_eq!(array.flat_index(&[0, 1, 2]), Some(6));
        assert_eq!(array.flat_index(&[0, 3, 0]), None);
        assert_eq!(array.flat_index(&[0, 0]), None);
        assert_eq!(array.get(&[1, 0, 1]), Some(&13));
    }

    #[test]
    fn fill_tracks_blank_status() {
        let mut array = NdArray::<f32>::zeros(&[2, 2]).unwrap();
        assert_eq!(array.blank_status(), Some(false));
        array.fill(f32::NAN);
        assert_eq!(array.blank_status(), Some(true));
        assert_eq!(array.count_blank(), 4);
        array.fill(1.0);
        assert_eq!(array.blank_status(), Some(false));
    }

    #[test]
    fn mutable_access_invalidates_the_cache() {
        let mut array = NdArray::from_vec(vec![1.0f32, 2.0, 3.0], &[3]).unwrap();
        assert_eq!(array.blank_status(), None);
        assert!(!array.refresh_blank_status());
        assert_eq!(array.blank_status(), Some(false));
        array.as_mut_slice()[1] = f32::NAN;
        assert_eq!(array.blank_status(), None);
        assert!(array.has_blank());
        assert!(array.refresh_blank_status());
    }

    #[test]
    fn remove_blanks_compacts_to_one_dimension() {
        let mut array =
            NdArray::from_vec(vec![1.0f32, f32::NAN, 2.0, f32::NAN], &[2, 2]).unwrap();
        array.remove_blanks();
        assert_eq!(array.dims(), &[2]);
        assert_eq!(array.as_slice(), &[1.0, 2.0]);
        assert_eq!(array.blank_status(), Some(false));

        let mut all_blank = NdArray::full(f64::NAN, &[3]).unwrap();
        all_blank.remove_blanks();
        assert_eq!(all_blank.dims(), &[0]);
        assert!(all_blank.is_empty());
    }

    #[test]
    fn integer_sentinels_count_as_blank() {
        let mut array = NdArray::from_vec(vec![0u8, 255, 7, 255], &[4]).unwrap();
        assert_eq!(array.count_blank(), 2);
        array.remove_blanks();
        assert_eq!(array.as_slice(), &[0, 7]);

        let ints = NdArray::from_vec(vec![i16::MIN, 0, -5], &[3]).unwrap();
        assert_eq!(ints.count_blank(), 1);
        assert!(ints.has_blank());
    }
}
