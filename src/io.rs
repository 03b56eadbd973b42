//! Image decode/encode at the edge of the pipeline.
//!
//! Everything is normalized to 8-bit RGB on the way in. The numeric pipeline
//! never sees paths or byte streams; only this module and the binary do.

use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbImage};
use rayon::prelude::*;

use crate::error::{MontageError, Result};
use crate::raster::Image;

/// Convert a decoded `image` buffer into an [`Image`].
pub fn from_rgb_image(rgb: RgbImage) -> Result<Image> {
    let (width, height) = rgb.dimensions();
    Image::from_raw(height as usize, width as usize, rgb.into_raw())
}

/// Convert an [`Image`] into an `image` buffer ready for encoding.
pub fn to_rgb_image(image: &Image) -> Result<RgbImage> {
    let (height, width) = image.dims();
    let too_large =
        || MontageError::InvalidInput(format!("{width}x{height} is too large to encode"));
    let width = u32::try_from(width).map_err(|_| too_large())?;
    let height = u32::try_from(height).map_err(|_| too_large())?;

    RgbImage::from_raw(width, height, image.clone().into_raw()).ok_or_else(too_large)
}

/// Decode one file, converting any pixel format to 8-bit RGB.
pub fn load_image(path: &Path) -> Result<Image> {
    log::debug!("Loading {}", path.display());

    let decoded = image::open(path).map_err(|source| MontageError::Decode {
        origin: path.display().to_string(),
        source,
    })?;

    from_rgb_image(decoded.into_rgb8())
}

/// Decode several files in parallel, preserving their order.
pub fn load_images<P>(paths: &[P]) -> Result<Vec<Image>>
where
    P: AsRef<Path> + Sync,
{
    paths.par_iter().map(|p| load_image(p.as_ref())).collect()
}

/// Encode an image to `path`; the format follows the file extension.
pub fn save_image(image: &Image, path: &Path) -> Result<()> {
    log::debug!("Saving {}", path.display());

    to_rgb_image(image)?
        .save(path)
        .map_err(|source| MontageError::Encode {
            target: path.display().to_string(),
            source,
        })
}

/// Encode an image into an in-memory buffer.
pub fn encode_image(image: &Image, format: ImageFormat) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    to_rgb_image(image)?
        .write_to(&mut Cursor::new(&mut bytes), format)
        .map_err(|source| MontageError::Encode {
            target: format!("{format:?} buffer"),
            source,
        })?;
    Ok(bytes)
}

/// Decode an in-memory buffer of any supported format.
pub fn decode_image(bytes: &[u8]) -> Result<Image> {
    let decoded = image::load_from_memory(bytes).map_err(|source| MontageError::Decode {
        origin: "memory buffer".to_string(),
        source,
    })?;
    from_rgb_image(decoded.into_rgb8())
}
