//! Borrowed rectangular views over a parent array.

use crate::dtype::Element;
use crate::util::math::strides_for;
use crate::util::{ConvError, ConvResult};

use super::NdArray;

/// Borrowed rectangular sub-box of a parent [`NdArray`].
///
/// A view records the parent's strides and the flat index of its own origin,
/// so element access is plain stride arithmetic and creating one never
/// copies data. The viewed box is contiguous only along the fastest
/// dimension; consumers that want raw slices walk it one run at a time via
/// [`runs`](Self::runs).
#[derive(Clone)]
pub struct ArrayView<'a, T> {
    data: &'a [T],
    parent_strides: Vec<usize>,
    parent_dims: Vec<usize>,
    base: usize,
    dims: Vec<usize>,
}

impl<'a, T: Element> ArrayView<'a, T> {
    /// Builds a view of the box at `offset` with the given extents.
    pub(crate) fn new(
        parent: &'a NdArray<T>,
        offset: &[usize],
        dims: &[usize],
    ) -> ConvResult<Self> {
        let parent_dims = parent.dims();
        let out_of_bounds = || ConvError::ViewOutOfBounds {
            offset: offset.to_vec(),
            dims: dims.to_vec(),
            parent: parent_dims.to_vec(),
        };
        if offset.len() != parent_dims.len() || dims.len() != parent_dims.len() {
            return Err(out_of_bounds());
        }
        if dims.contains(&0) {
            return Err(ConvError::InvalidDims {
                dims: dims.to_vec(),
            });
        }
        for d in 0..dims.len() {
            let fits = offset[d]
                .checked_add(dims[d])
                .is_some_and(|end| end <= parent_dims[d]);
            if !fits {
                return Err(out_of_bounds());
            }
        }
        let parent_strides = strides_for(parent_dims);
        let base = offset.iter().zip(&parent_strides).map(|(o, s)| o * s).sum();
        Ok(Self {
            data: parent.as_slice(),
            parent_strides,
            parent_dims: parent_dims.to_vec(),
            base,
            dims: dims.to_vec(),
        })
    }

    /// View covering the whole parent. Never fails, even for the empty
    /// post-`remove_blanks` shape.
    pub(crate) fn full(parent: &'a NdArray<T>) -> Self {
        Self {
            data: parent.as_slice(),
            parent_strides: strides_for(parent.dims()),
            parent_dims: parent.dims().to_vec(),
            base: 0,
            dims: parent.dims().to_vec(),
        }
    }

    /// Extent along each dimension of the viewed box.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Shape of the parent array this view borrows from.
    pub fn parent_dims(&self) -> &[usize] {
        &self.parent_dims
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of elements in the viewed box.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    /// True when the viewed box holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a view-relative position, or `None` when out of bounds.
    ///
    /// The returned reference borrows the parent, not the view, so it stays
    /// valid after the view is dropped.
    pub fn get(&self, pos: &[usize]) -> Option<&'a T> {
        if pos.len() != self.dims.len() {
            return None;
        }
        let mut index = self.base;
        for d in 0..pos.len() {
            if pos[d] >= self.dims[d] {
                return None;
            }
            index += pos[d] * self.parent_strides[d];
        }
        self.data.get(index)
    }

    /// Iterates the view's contiguous runs along the fastest dimension.
    ///
    /// Every element of the box appears in exactly one run, in row-major
    /// order.
    pub fn runs(&self) -> Runs<'_, 'a, T> {
        Runs {
            view: self,
            outer: vec![0; self.dims.len().saturating_sub(1)],
            done: self.is_empty(),
        }
    }

    /// Iterates the elements of the box in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.runs().flatten()
    }

    /// Number of blank elements in the viewed box.
    pub fn count_blank(&self) -> usize {
        self.iter().filter(|v| v.is_blank()).count()
    }

    /// Copies the viewed box into a new owned array.
    pub fn to_array(&self) -> ConvResult<NdArray<T>> {
        if self.is_empty() {
            return Ok(NdArray::empty_1d());
        }
        let len = self.len();
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ConvError::OutOfMemory {
                bytes: len.saturating_mul(std::mem::size_of::<T>()),
            })?;
        for run in self.runs() {
            data.extend_from_slice(run);
        }
        NdArray::from_vec(data, &self.dims)
    }
}

/// Iterator over the contiguous fastest-dimension runs of an [`ArrayView`].
pub struct Runs<'v, 'a, T> {
    view: &'v ArrayView<'a, T>,
    outer: Vec<usize>,
    done: bool,
}

impl<'v, 'a, T: Element> Iterator for Runs<'v, 'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let view = self.view;
        let ndim = view.dims.len();
        let run_len = view.dims[ndim - 1];
        let mut start = view.base;
        for d in 0..ndim - 1 {
            start += self.outer[d] * view.parent_strides[d];
        }
        let run = &view.data[start..start + run_len];

        self.done = true;
        for d in (0..ndim - 1).rev() {
            self.outer[d] += 1;
            if self.outer[d] < view.dims[d] {
                self.done = false;
                break;
            }
            self.outer[d] = 0;
        }
        Some(run)
    }
}

#[cfg(test)]
mod tests {
    use super::super::NdArray;
    use crate::util::ConvError;

    fn counting(dims: &[usize]) -> NdArray<f32> {
        let len: usize = dims.iter().product();
        NdArray::from_vec((0..len).map(|v| v as f32).collect(), dims).unwrap()
    }

    #[test]
    fn slice_exposes_the_expected_box() {
        let array = counting(&[4, 4]);
        let view = array.slice(&[1, 1], &[2, 2]).unwrap();
        assert_eq!(view.dims(), &[2, 2]);
        assert_eq!(view.len(), 4);
        let runs: Vec<&[f32]> = view.runs().collect();
        assert_eq!(runs, vec![&[5.0, 6.0][..], &[9.0, 10.0][..]]);
        assert_eq!(view.get(&[0, 0]), Some(&5.0));
        assert_eq!(view.get(&[1, 1]), Some(&10.0));
        assert_eq!(view.get(&[2, 0]), None);
        assert_eq!(view.get(&[0]), None);
    }

    #[test]
    fn slice_rejects_out_of_bounds_boxes() {
        let array = counting(&[4, 4]);
        assert_eq!(
            array.slice(&[3, 0], &[2, 2]).err(),
            Some(ConvError::ViewOutOfBounds {
                offset: vec![3, 0],
                dims: vec![2, 2],
                parent: vec![4, 4],
            })
        );
        assert_eq!(
            array.slice(&[0], &[2, 2]).err(),
            Some(ConvError::ViewOutOfBounds {
                offset: vec![0],
                dims: vec![2, 2],
                parent: vec![4, 4],
            })
        );
        assert_eq!(
            array.slice(&[0, 0], &[2, 0]).err(),
            Some(ConvError::InvalidDims { dims: vec![2, 0] })
        );
    }

    #[test]
    fn runs_cover_a_three_dimensional_box() {
        let array = counting(&[3, 4, 5]);
        let view = array.slice(&[1, 1, 2], &[2, 2, 3]).unwrap();
        let collected: Vec<f32> = view.iter().copied().collect();
        assert_eq!(
            collected,
            vec![27.0, 28.0, 29.0, 32.0, 33.0, 34.0, 47.0, 48.0, 49.0, 52.0, 53.0, 54.0]
        );
        assert_eq!(view.runs().count(), 4);
    }

    #[test]
    fn one_dimensional_view_is_a_single_run() {
        let array = counting(&[6]);
        let view = array.slice(&[2], &[3]).unwrap();
        let runs: Vec<&[f32]> = view.runs().collect();
        assert_eq!(runs, vec![&[2.0, 3.0, 4.0][..]]);
    }

    #[test]
    fn to_array_copies_the_box() {
        let array = counting(&[4, 4]);
        let copy = array.slice(&[0, 2], &[3, 2]).unwrap().to_array().unwrap();
        assert_eq!(copy.dims(), &[3, 2]);
        assert_eq!(copy.as_slice(), &[2.0, 3.0, 6.0, 7.0, 10.0, 11.0]);
    }

    #[test]
    fn view_counts_blanks_inside_the_box_only() {
        let mut array = counting(&[3, 3]);
        array.as_mut_slice()[0] = f32::NAN;
        array.as_mut_slice()[4] = f32::NAN;
        let view = array.slice(&[1, 1], &[2, 2]).unwrap();
        assert_eq!(view.count_blank(), 1);
        assert_eq!(array.count_blank(), 2);
    }

    #[test]
    fn full_view_of_emptied_array_is_empty() {
        let mut array = NdArray::full(f32::NAN, &[2, 2]).unwrap();
        array.remove_blanks();
        let view = array.view();
        assert!(view.is_empty());
        assert_eq!(view.runs().count(), 0);
        assert!(view.to_array().unwrap().is_empty());
    }
}
