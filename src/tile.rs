//! Channel partitioning for mosaicked detector images.
//!
//! Large astronomical cameras read out through several amplifier channels,
//! stitching the final image from physically independent sub-detectors with
//! slightly different gain and noise. A [`ChannelGrid`] describes that
//! partition arithmetically: only the per-dimension channel counts and the
//! derived tile extents are stored, so membership queries are integer
//! divisions with no mask storage and no per-query allocation. That keeps
//! the grid cheap enough to consult for every candidate neighbor in the
//! convolution inner loop.

use crate::array::{ArrayView, NdArray};
use crate::dtype::Element;
use crate::util::{ConvError, ConvResult};

/// Partition of an image into a regular grid of same-shaped channels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelGrid {
    channels: Vec<usize>,
    tile_dims: Vec<usize>,
}

impl ChannelGrid {
    /// Builds a grid with `channels[d]` channels along dimension `d` of an
    /// image of shape `dims`.
    ///
    /// Every channel count must be nonzero and evenly divide the matching
    /// image extent; a remainder would leave a partial channel with no
    /// physical meaning.
    pub fn new(dims: &[usize], channels: &[usize]) -> ConvResult<Self> {
        if channels.len() != dims.len() {
            return Err(ConvError::DimensionMismatch {
                expected: dims.len(),
                got: channels.len(),
            });
        }
        for (axis, (&extent, &count)) in dims.iter().zip(channels).enumerate() {
            if count == 0 || extent % count != 0 {
                return Err(ConvError::InvalidChannels {
                    axis,
                    extent,
                    channels: count,
                });
            }
        }
        let tile_dims = dims.iter().zip(channels).map(|(e, c)| e / c).collect();
        Ok(Self {
            channels: channels.to_vec(),
            tile_dims,
        })
    }

    /// Number of channels along each dimension.
    pub fn channels(&self) -> &[usize] {
        &self.channels
    }

    /// Extent of one channel tile along each dimension.
    pub fn tile_dims(&self) -> &[usize] {
        &self.tile_dims
    }

    /// Total number of channels in the grid.
    pub fn channel_count(&self) -> usize {
        self.channels.iter().product()
    }

    /// True when a single channel covers the whole image.
    ///
    /// Such a grid never separates two positions, so convolving with it is
    /// identical to convolving with no grid at all.
    pub fn is_single(&self) -> bool {
        self.channels.iter().all(|&c| c == 1)
    }

    /// Shape of the image this grid was built for.
    pub fn image_dims(&self) -> Vec<usize> {
        self.channels.iter().zip(&self.tile_dims).map(|(c, t)| c * t).collect()
    }

    /// True when positions `a` and `b` fall in the same channel.
    ///
    /// Callers must pass full-dimensionality in-bounds positions; the check
    /// is one integer division per dimension.
    #[inline]
    pub fn same_channel(&self, a: &[usize], b: &[usize]) -> bool {
        debug_assert_eq!(a.len(), self.tile_dims.len());
        debug_assert_eq!(b.len(), self.tile_dims.len());
        a.iter()
            .zip(b)
            .zip(&self.tile_dims)
            .all(|((&x, &y), &tile)| x / tile == y / tile)
    }

    /// Per-dimension index of the channel containing `pos`.
    pub fn channel_of(&self, pos: &[usize]) -> Vec<usize> {
        debug_assert_eq!(pos.len(), self.tile_dims.len());
        pos.iter().zip(&self.tile_dims).map(|(&p, &t)| p / t).collect()
    }

    /// Borrows the tile of one channel from `array`.
    ///
    /// `channel` is the per-dimension channel index; the array must have the
    /// shape the grid was built for.
    pub fn channel_slice<'a, T: Element>(
        &self,
        array: &'a NdArray<T>,
        channel: &[usize],
    ) -> ConvResult<ArrayView<'a, T>> {
        let in_range = channel.len() == self.channels.len()
            && channel.iter().zip(&self.channels).all(|(&c, &n)| c < n);
        if !in_range {
            return Err(ConvError::ViewOutOfBounds {
                offset: channel.to_vec(),
                dims: self.tile_dims.clone(),
                parent: self.image_dims(),
            });
        }
        let offset: Vec<usize> = channel
            .iter()
            .zip(&self.tile_dims)
            .map(|(&c, &t)| c * t)
            .collect();
        array.slice(&offset, &self.tile_dims)
    }
}
