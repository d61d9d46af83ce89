//! Spatial convolution of N-dimensional arrays.
//!
//! Each output element is the weighted sum of the input elements under the
//! kernel footprint centered on it. Three things can exclude a neighbor
//! from that sum: falling outside the image, being blank, or lying in a
//! different mosaic channel when channel crossing is disabled. By default
//! the remaining weighted sum is renormalized by the sum of the weights
//! that actually contributed, so a partial footprint does not dim the
//! output; [`ConvolveOptions::edge_correction`] turns that off. An element
//! whose footprint contributes nothing at all becomes blank.
//!
//! The input is never written and the output is freshly allocated, with
//! every element computed independently, so results are byte-identical for
//! any thread count.

mod engine;
mod plan;

pub use plan::KernelPlan;

use crate::array::{DynamicArray, NdArray};
use crate::dispatch;
use crate::dtype::Real;
use crate::tile::ChannelGrid;
use crate::trace::{trace_event, trace_span};
use crate::util::math::strides_for;
use crate::util::{ConvError, ConvResult};

use engine::{convolve_range, EngineContext};

/// Options for one spatial convolution call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvolveOptions {
    /// Number of worker threads. 1 (the default) runs on the calling
    /// thread and 0 is treated as 1. Counts above 1 need the `rayon`
    /// feature; without it the call silently runs sequentially.
    pub num_threads: usize,
    /// Channels along each dimension; every count must evenly divide the
    /// matching input extent. `None` disables channel handling entirely.
    pub channels: Option<Vec<usize>>,
    /// Renormalize by the sum of contributing weights wherever part of the
    /// footprint was excluded. On by default; turning it off keeps the raw
    /// weighted sum, which dims the output near edges, blanks, and channel
    /// seams.
    pub edge_correction: bool,
    /// Let the footprint mix values across channel boundaries while
    /// `channels` stays set. Useful when the channel layout matters to the
    /// caller but the detector seams are already calibrated out.
    pub convolve_over_channels: bool,
}

impl Default for ConvolveOptions {
    fn default() -> Self {
        Self {
            num_threads: 1,
            channels: None,
            edge_correction: true,
            convolve_over_channels: false,
        }
    }
}

/// Convolves `input` with `kernel`, returning a new array of the same shape.
///
/// The kernel must have the input's dimensionality and odd extents; it may
/// be larger than the input along any dimension, in which case the
/// out-of-bounds part of the footprint is simply excluded everywhere.
pub fn convolve_spatial<T: Real>(
    input: &NdArray<T>,
    kernel: &NdArray<T>,
    options: &ConvolveOptions,
) -> ConvResult<NdArray<T>> {
    let plan = KernelPlan::new(kernel)?;
    convolve_with_plan(input, &plan, options)
}

/// Convolves `input` with a prebuilt [`KernelPlan`].
///
/// Skips kernel preprocessing, which pays off when one kernel is applied to
/// many arrays.
pub fn convolve_with_plan<T: Real>(
    input: &NdArray<T>,
    plan: &KernelPlan,
    options: &ConvolveOptions,
) -> ConvResult<NdArray<T>> {
    if input.ndim() != plan.ndim() {
        return Err(ConvError::DimensionMismatch {
            expected: input.ndim(),
            got: plan.ndim(),
        });
    }
    let grid = match &options.channels {
        Some(channels) => Some(ChannelGrid::new(input.dims(), channels)?),
        None => None,
    };
    // The grid only restricts footprints when crossing is disabled; a
    // single-channel grid restricts nothing either way.
    let restrict = grid.as_ref().filter(|_| !options.convolve_over_channels);

    let _span = trace_span!(
        "convolve_spatial",
        elements = input.len(),
        kernel_cells = plan.len(),
        threads = options.num_threads
    )
    .entered();

    let strides = strides_for(input.dims());
    let input_has_blank = input.has_blank();
    trace_event!("blank_prescan", has_blank = input_has_blank);
    let mut output = NdArray::zeros(input.dims())?;

    let ctx = EngineContext {
        input: input.as_slice(),
        dims: input.dims(),
        strides: &strides,
        plan,
        grid: restrict,
        edge_correction: options.edge_correction,
        input_has_blank,
    };
    dispatch::run_ranges(
        output.as_mut_slice(),
        options.num_threads.max(1),
        |range, chunk| {
            convolve_range(&ctx, range, chunk);
            Ok(())
        },
    )?;
    Ok(output)
}

/// Convolves a runtime-typed input with a runtime-typed kernel.
///
/// Convolution arithmetic is defined for the float element types only;
/// integer inputs fail with [`ConvError::UnsupportedType`] rather than
/// being converted behind the caller's back. The kernel must share the
/// input's element type.
pub fn convolve_spatial_dyn(
    input: &DynamicArray,
    kernel: &DynamicArray,
    options: &ConvolveOptions,
) -> ConvResult<DynamicArray> {
    match (input, kernel) {
        (DynamicArray::Float32(input), DynamicArray::Float32(kernel)) => {
            convolve_spatial(input, kernel, options).map(DynamicArray::from)
        }
        (DynamicArray::Float64(input), DynamicArray::Float64(kernel)) => {
            convolve_spatial(input, kernel, options).map(DynamicArray::from)
        }
        (DynamicArray::Float32(_) | DynamicArray::Float64(_), mismatched) => {
            Err(ConvError::TypeMismatch {
                input: input.dtype(),
                kernel: mismatched.dtype(),
            })
        }
        _ => Err(ConvError::UnsupportedType {
            dtype: input.dtype(),
            op: "spatial convolution",
        }),
    }
}
