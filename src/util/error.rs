//! Error types for astroconv.

use thiserror::Error;

use crate::dtype::DType;

/// Result alias for astroconv operations.
pub type ConvResult<T> = std::result::Result<T, ConvError>;

/// Errors that can occur when building arrays or running a convolution.
///
/// Every variant carries the concrete values that failed validation so the
/// message names both the precondition and what was actually seen. All
/// validation errors are raised before any worker thread starts.
#[derive(Debug, Error, PartialEq)]
pub enum ConvError {
    /// Dimension list is empty, has a zero extent, or its product overflows.
    #[error("invalid array dimensions {dims:?}")]
    InvalidDims {
        /// The offending dimension list.
        dims: Vec<usize>,
    },
    /// A wrapped buffer does not match the product of the dimensions.
    #[error("buffer holds {got} elements but the shape needs {expected}")]
    LengthMismatch {
        /// Element count implied by the dimensions.
        expected: usize,
        /// Element count actually supplied.
        got: usize,
    },
    /// A tile view does not fit inside its parent array.
    #[error("view at offset {offset:?} with shape {dims:?} exceeds parent shape {parent:?}")]
    ViewOutOfBounds {
        offset: Vec<usize>,
        dims: Vec<usize>,
        parent: Vec<usize>,
    },
    /// Two shapes that must share a dimensionality do not.
    #[error("dimensionality mismatch: expected {expected} dimensions, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// A kernel extent is even, so no single center cell exists.
    #[error("kernel axis {axis} has even extent {extent}; kernel extents must be odd")]
    InvalidKernel { axis: usize, extent: usize },
    /// A channel count does not evenly divide the matching image extent.
    #[error("channel count {channels} does not evenly divide axis {axis} extent {extent}")]
    InvalidChannels {
        axis: usize,
        extent: usize,
        channels: usize,
    },
    /// The element type cannot be used for the requested operation.
    #[error("unsupported element type {dtype} for {op}")]
    UnsupportedType {
        dtype: DType,
        /// The operation that was attempted.
        op: &'static str,
    },
    /// Input and kernel element types disagree.
    #[error("input element type {input} does not match kernel element type {kernel}")]
    TypeMismatch { input: DType, kernel: DType },
    /// Text could not be parsed as a value of the given type.
    #[error("cannot parse {value:?} as {dtype}")]
    ParseValue { dtype: DType, value: String },
    /// Buffer allocation failed.
    #[error("allocation of {bytes} bytes failed")]
    OutOfMemory { bytes: usize },
    /// The worker thread pool could not be constructed.
    #[error("thread pool construction failed: {reason}")]
    ThreadPool { reason: String },
    /// Reading or writing an image file failed.
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}
