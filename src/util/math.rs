//! Shape arithmetic shared by the array, tile, and convolution modules.

/// Product of the extents, or `None` when it overflows `usize`.
pub(crate) fn checked_product(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

/// Row-major strides for `dims`: the last dimension varies fastest and has
/// stride 1.
pub(crate) fn strides_for(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; dims.len()];
    for d in (0..dims.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * dims[d + 1];
    }
    strides
}

/// Decomposes a row-major flat index into per-dimension coordinates.
///
/// `coords` must have one slot per dimension; `index` must be in range for
/// the shape.
pub(crate) fn flat_to_coords(mut index: usize, dims: &[usize], coords: &mut [usize]) {
    debug_assert_eq!(dims.len(), coords.len());
    for d in (0..dims.len()).rev() {
        coords[d] = index % dims[d];
        index /= dims[d];
    }
    debug_assert_eq!(index, 0);
}

#[cfg(test)]
mod tests {
    use super::{checked_product, flat_to_coords, strides_for};

    #[test]
    fn checked_product_handles_overflow() {
        assert_eq!(checked_product(&[2, 3, 4]), Some(24));
        assert_eq!(checked_product(&[]), Some(1));
        assert_eq!(checked_product(&[usize::MAX, 2]), None);
    }

    #[test]
    fn strides_are_row_major() {
        assert_eq!(strides_for(&[4, 3, 2]), vec![6, 2, 1]);
        assert_eq!(strides_for(&[5]), vec![1]);
    }

    #[test]
    fn flat_to_coords_round_trips() {
        let dims = [4, 3, 2];
        let strides = strides_for(&dims);
        let mut coords = [0usize; 3];
        for index in 0..24 {
            flat_to_coords(index, &dims, &mut coords);
            let back: usize = coords.iter().zip(&strides).map(|(c, s)| c * s).sum();
            assert_eq!(back, index);
            assert!(coords.iter().zip(&dims).all(|(c, d)| c < d));
        }
    }
}
