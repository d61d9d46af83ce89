//! The per-range convolution worker.
//!
//! One worker owns a contiguous range of output flat indices. It tracks the
//! matching coordinate with an odometer and evaluates the full kernel
//! footprint for every element, in kernel-cell order. All geometry (input
//! strides, kernel offsets, channel tiles) is precomputed by the caller and
//! the scratch coordinates are allocated once per range, so the loop itself
//! never allocates.
//!
//! Because each output element is a pure function of the input and the
//! accumulation order inside a footprint is fixed, results do not depend on
//! how the output was split into ranges.

use std::ops::Range;

use crate::dtype::Real;
use crate::tile::ChannelGrid;
use crate::util::math::flat_to_coords;

use super::plan::KernelPlan;

/// Read-only state shared by every worker of one convolution call.
pub(super) struct EngineContext<'a, T> {
    pub input: &'a [T],
    pub dims: &'a [usize],
    pub strides: &'a [usize],
    pub plan: &'a KernelPlan,
    /// Channel restriction; `None` when the footprint may cross channels.
    pub grid: Option<&'a ChannelGrid>,
    pub edge_correction: bool,
    /// Skips the per-neighbor blank test when the input has none.
    pub input_has_blank: bool,
}

/// Convolves the elements in `range`, writing into the matching `out` slice.
pub(super) fn convolve_range<T: Real>(
    ctx: &EngineContext<'_, T>,
    range: Range<usize>,
    out: &mut [T],
) {
    debug_assert_eq!(range.len(), out.len());
    let ndim = ctx.dims.len();
    let offsets = ctx.plan.offsets();
    let weights = ctx.plan.weights();

    let mut pos = vec![0usize; ndim];
    let mut neighbor_pos = vec![0usize; ndim];
    flat_to_coords(range.start, ctx.dims, &mut pos);

    for slot in out.iter_mut() {
        let mut sum = 0.0f64;
        let mut weight_sum = 0.0f64;

        'cells: for (cell, &weight) in weights.iter().enumerate() {
            let cell_offsets = &offsets[cell * ndim..(cell + 1) * ndim];
            let mut neighbor = 0usize;
            for d in 0..ndim {
                let coord = pos[d] as isize + cell_offsets[d];
                if coord < 0 || coord >= ctx.dims[d] as isize {
                    continue 'cells;
                }
                let coord = coord as usize;
                neighbor_pos[d] = coord;
                neighbor += coord * ctx.strides[d];
            }
            if let Some(grid) = ctx.grid {
                if !grid.same_channel(&pos, &neighbor_pos) {
                    continue;
                }
            }
            let value = ctx.input[neighbor];
            if ctx.input_has_blank && value.is_blank() {
                continue;
            }
            sum += value.to_f64() * weight;
            weight_sum += weight;
        }

        *slot = if weight_sum == 0.0 {
            // Nothing contributed: every candidate was out of bounds, in
            // another channel, or blank.
            T::blank()
        } else if ctx.edge_correction {
            T::from_f64(sum / weight_sum)
        } else {
            T::from_f64(sum)
        };

        for d in (0..ndim).rev() {
            pos[d] += 1;
            if pos[d] < ctx.dims[d] {
                break;
            }
            pos[d] = 0;
        }
    }
}
