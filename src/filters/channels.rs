//! Split an image into per-channel planes and merge them back.

use ndarray::{stack, ArrayView2, Axis};

use crate::error::{MontageError, Result};
use crate::raster::{Image, Plane, CHANNELS};

/// Extract the red, green and blue planes of an image.
pub fn split_channels(image: &Image) -> [Plane; CHANNELS] {
    let pixels = image.pixels();
    [0, 1, 2].map(|c| pixels.index_axis(Axis(2), c).to_owned())
}

/// Stack three equally-sized planes into one RGB image.
pub fn merge_channels(planes: &[Plane]) -> Result<Image> {
    if planes.len() != CHANNELS {
        return Err(MontageError::InvalidInput(format!(
            "expected {CHANNELS} planes, got {}",
            planes.len()
        )));
    }

    let views: Vec<ArrayView2<u8>> = planes.iter().map(|p| p.view()).collect();
    let pixels = stack(Axis(2), &views)
        .map_err(|e| MontageError::InvalidInput(format!("planes differ in shape: {e}")))?;

    Image::new(pixels)
}
