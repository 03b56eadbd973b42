//! Gaussian blur for images and masks.
//!
//! Uses separable 2-pass convolution. Color channels are blurred
//! independently; the blur never mixes channels.

use rayon::prelude::*;

use super::channels::{merge_channels, split_channels};
use super::core::blur_plane_u8;
use crate::config::check_sigma;
use crate::error::Result;
use crate::raster::{Image, Mask, Plane};

/// Apply Gaussian blur to an RGB image.
///
/// # Arguments
/// * `image` - Source image
/// * `sigma` - Standard deviation of the Gaussian kernel, must be >= 0
///
/// # Returns
/// Blurred image with same dimensions. Sigma 0 returns an identical copy.
pub fn gaussian_blur_image(image: &Image, sigma: f32) -> Result<Image> {
    check_sigma(sigma)?;
    if sigma == 0.0 {
        return Ok(image.clone());
    }

    let planes = split_channels(image);
    let blurred: Vec<Plane> = planes
        .par_iter()
        .map(|plane| blur_plane_u8(plane.view(), sigma))
        .collect();

    merge_channels(&blurred)
}

/// Apply Gaussian blur to an opacity mask.
pub fn gaussian_blur_mask(mask: &Mask, sigma: f32) -> Result<Mask> {
    check_sigma(sigma)?;
    if sigma == 0.0 {
        return Ok(mask.clone());
    }

    Ok(Mask::new(blur_plane_u8(mask.view(), sigma)))
}
