//! Kernel preprocessing shared by repeated convolutions.

use crate::array::NdArray;
use crate::dtype::Real;
use crate::util::{ConvError, ConvResult};

/// Precomputed kernel geometry and weights for spatial convolution.
///
/// Building a plan validates the kernel shape (every extent must be odd so
/// exactly one center cell exists) and flattens the kernel into per-cell
/// signed coordinate offsets plus `f64` weights, in row-major cell order.
/// The engine walks that flat form directly, so a plan built once can be
/// reused across many inputs with the same dimensionality.
///
/// Non-finite kernel weights are stored as zero; a blank kernel cell then
/// contributes neither signal nor weight, without a separate check in the
/// inner loop.
pub struct KernelPlan {
    dims: Vec<usize>,
    center: Vec<usize>,
    /// `ndim` signed offsets per cell, relative to the center.
    offsets: Vec<isize>,
    weights: Vec<f64>,
}

impl KernelPlan {
    /// Builds a plan from a kernel array.
    pub fn new<T: Real>(kernel: &NdArray<T>) -> ConvResult<Self> {
        let dims = kernel.dims().to_vec();
        for (axis, &extent) in dims.iter().enumerate() {
            if extent % 2 == 0 {
                return Err(ConvError::InvalidKernel { axis, extent });
            }
        }
        let center: Vec<usize> = dims.iter().map(|&e| e / 2).collect();

        let ndim = dims.len();
        let cells = kernel.len();
        let mut offsets = Vec::with_capacity(cells * ndim);
        let mut weights = Vec::with_capacity(cells);
        let mut pos = vec![0usize; ndim];
        for &value in kernel.as_slice() {
            for d in 0..ndim {
                offsets.push(pos[d] as isize - center[d] as isize);
            }
            let weight = value.to_f64();
            weights.push(if weight.is_finite() { weight } else { 0.0 });

            for d in (0..ndim).rev() {
                pos[d] += 1;
                if pos[d] < dims[d] {
                    break;
                }
                pos[d] = 0;
            }
        }
        Ok(Self {
            dims,
            center,
            offsets,
            weights,
        })
    }

    /// Kernel extent along each dimension.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of dimensions the plan convolves over.
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Number of kernel cells.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// True when the plan has no cells; cannot happen for a validated plan.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Center coordinate along each dimension.
    pub fn center(&self) -> &[usize] {
        &self.center
    }

    /// Flat per-cell offsets, `ndim` entries per cell.
    pub(crate) fn offsets(&self) -> &[isize] {
        &self.offsets
    }

    /// Per-cell weights in the same order as [`offsets`](Self::offsets).
    pub(crate) fn weights(&self) -> &[f64] {
        &self.weights
    }
}
