//! Convenience helpers for moving 2-D arrays through the `image` crate.
//!
//! Available when the `image-io` feature is enabled. Astronomical data
//! normally arrives through dedicated formats; these helpers exist so the
//! engine can be exercised end to end with ordinary grayscale images.

use std::path::Path;

use crate::array::NdArray;
use crate::util::{ConvError, ConvResult};

/// Converts a grayscale image buffer into an `f32` array of shape
/// `[height, width]`.
pub fn array_from_gray_image(img: &image::GrayImage) -> ConvResult<NdArray<f32>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img.as_raw().iter().map(|&v| f32::from(v)).collect();
    NdArray::from_vec(data, &[height, width])
}

/// Loads an image from disk, converting to grayscale `f32`.
pub fn load_gray_f32<P: AsRef<Path>>(path: P) -> ConvResult<NdArray<f32>> {
    let img = image::open(path).map_err(|err| ConvError::ImageIo {
        reason: err.to_string(),
    })?;
    array_from_gray_image(&img.to_luma8())
}

/// Writes a 2-D `f32` array as an 8-bit grayscale image.
///
/// Values are rounded and clamped to `[0, 255]`; blank elements are written
/// as 0. The format is chosen from the file extension by the `image` crate.
pub fn save_gray_f32<P: AsRef<Path>>(array: &NdArray<f32>, path: P) -> ConvResult<()> {
    if array.ndim() != 2 {
        return Err(ConvError::ImageIo {
            reason: format!("expected a 2-D array, got {} dimensions", array.ndim()),
        });
    }
    let height = array.dims()[0];
    let width = array.dims()[1];
    let data: Vec<u8> = array
        .as_slice()
        .iter()
        .map(|&v| {
            if v.is_nan() {
                0
            } else {
                v.round().clamp(0.0, 255.0) as u8
            }
        })
        .collect();
    let img = image::GrayImage::from_raw(width as u32, height as u32, data).ok_or_else(|| {
        ConvError::ImageIo {
            reason: "image dimensions exceed the supported range".to_string(),
        }
    })?;
    img.save(path).map_err(|err| ConvError::ImageIo {
        reason: err.to_string(),
    })
}
