//! astroconv is a CPU-first spatial convolution library for astronomical
//! images.
//!
//! The engine convolves N-dimensional row-major arrays with odd-sized
//! kernels, renormalizing partial footprints at image edges, skipping blank
//! (missing-data) elements, and optionally keeping the kernel footprint
//! from crossing mosaic channel boundaries. Work is split over a
//! fixed-size thread pool via the `rayon` feature (on by default), and the
//! output is byte-identical for any thread count.

pub mod array;
pub mod convolve;
pub mod dtype;
#[cfg(feature = "image-io")]
pub mod io;
pub mod tile;
pub mod util;

mod dispatch;
mod trace;

pub use array::{ArrayView, DynamicArray, NdArray};
pub use convolve::{
    convolve_spatial, convolve_spatial_dyn, convolve_with_plan, ConvolveOptions, KernelPlan,
};
pub use dtype::{DType, Element, Real, Scalar};
pub use tile::ChannelGrid;
pub use util::{ConvError, ConvResult};
