//! In-memory raster types.
//!
//! ## Layout
//!
//! | Type | Shape | Type | Description |
//! |------|-------|------|-------------|
//! | [`Image`] | (H, W, 3) | u8 | Red, green, blue, 0-255 |
//! | [`Plane`] | (H, W) | u8 | One color channel of an image |
//! | [`Mask`] | (H, W) | u8 | Blend weight, 0 = background |
//!
//! Shape invariants are checked when an [`Image`] is built, so the filters
//! downstream can index without re-validating.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use crate::error::{MontageError, Result};

/// Number of color channels in an [`Image`].
pub const CHANNELS: usize = 3;

/// A single color channel extracted from an [`Image`].
pub type Plane = Array2<u8>;

/// An 8-bit RGB image of shape (height, width, 3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pixels: Array3<u8>,
}

impl Image {
    /// Wrap an (height, width, 3) array.
    ///
    /// Fails with [`MontageError::InvalidInput`] if the channel count is not 3
    /// or the image has no pixels.
    pub fn new(pixels: Array3<u8>) -> Result<Self> {
        let (height, width, channels) = pixels.dim();
        if channels != CHANNELS {
            return Err(MontageError::InvalidInput(format!(
                "expected {CHANNELS} channels, got {channels}"
            )));
        }
        if height == 0 || width == 0 {
            return Err(MontageError::InvalidInput(format!(
                "image must not be empty, got {width}x{height}"
            )));
        }

        let pixels = if pixels.is_standard_layout() {
            pixels
        } else {
            pixels.as_standard_layout().into_owned()
        };

        Ok(Self { pixels })
    }

    /// Build an image from a flat row-major RGB buffer.
    pub fn from_raw(height: usize, width: usize, data: Vec<u8>) -> Result<Self> {
        let pixels = Array3::from_shape_vec((height, width, CHANNELS), data).map_err(|e| {
            MontageError::InvalidInput(format!("buffer does not match {width}x{height} RGB: {e}"))
        })?;
        Self::new(pixels)
    }

    /// Image of the given size where every pixel has the color `rgb`.
    pub fn filled(height: usize, width: usize, rgb: [u8; 3]) -> Result<Self> {
        Self::new(Array3::from_shape_fn((height, width, CHANNELS), |(_, _, c)| {
            rgb[c]
        }))
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    /// (height, width)
    pub fn dims(&self) -> (usize, usize) {
        let (height, width, _) = self.pixels.dim();
        (height, width)
    }

    pub fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    pub fn into_pixels(self) -> Array3<u8> {
        self.pixels
    }

    /// Flat row-major RGB buffer.
    pub fn into_raw(self) -> Vec<u8> {
        // Standard layout is enforced by `new`, so the offset is always zero.
        self.pixels.into_raw_vec_and_offset().0
    }
}

/// Single-channel opacity mask of shape (height, width).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    values: Array2<u8>,
}

impl Mask {
    pub fn new(values: Array2<u8>) -> Self {
        Self { values }
    }

    pub fn zeros(height: usize, width: usize) -> Self {
        Self::new(Array2::zeros((height, width)))
    }

    pub fn filled(height: usize, width: usize, value: u8) -> Self {
        Self::new(Array2::from_elem((height, width), value))
    }

    /// (height, width)
    pub fn dims(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn values(&self) -> &Array2<u8> {
        &self.values
    }

    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.values.view()
    }

    pub fn into_values(self) -> Array2<u8> {
        self.values
    }

    /// Largest value in the mask.
    pub fn max(&self) -> u8 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// Number of pixels with a non-zero weight.
    pub fn coverage(&self) -> usize {
        self.values.iter().filter(|&&v| v > 0).count()
    }
}

/// Shared (height, width) of a stack of images.
///
/// Fails if the stack is empty or any image differs in size from the first.
pub fn common_dims(images: &[Image]) -> Result<(usize, usize)> {
    let first = images
        .first()
        .ok_or_else(|| MontageError::InvalidInput("no images provided".to_string()))?;
    let dims = first.dims();

    for (index, image) in images.iter().enumerate().skip(1) {
        if image.dims() != dims {
            return Err(MontageError::InvalidInput(format!(
                "image {index} is {}x{}, expected {}x{}",
                image.width(),
                image.height(),
                dims.1,
                dims.0
            )));
        }
    }

    Ok(dims)
}

/// Byte length of `count` concatenated `width`x`height` RGB frames.
///
/// Fails on empty frames and on sizes that overflow `usize`.
pub fn stack_buffer_len(height: usize, width: usize, count: usize) -> Result<usize> {
    let frame_len = height
        .checked_mul(width)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
        .ok_or_else(|| MontageError::InvalidInput(format!("{width}x{height} is too large")))?;
    if frame_len == 0 {
        return Err(MontageError::InvalidInput(
            "image must not be empty".to_string(),
        ));
    }

    frame_len.checked_mul(count).ok_or_else(|| {
        MontageError::InvalidInput(format!(
            "{count} frames of {width}x{height} RGB do not fit in memory"
        ))
    })
}
