//! Alpha compositing of the foreground layers onto the background.
//!
//! Layers are applied strictly in input order: each blend reads the canvas
//! produced by the previous one, so later images paint over earlier ones
//! wherever their masks overlap. Only the per-pixel work inside one blend is
//! parallel.

use ndarray::{Array3, Zip};

use crate::error::{MontageError, Result};
use crate::raster::{Image, Mask};

/// Blend one foreground over a canvas.
///
/// Per pixel and channel: `out = m/255 * fg + (1 - m/255) * canvas`, rounded
/// to the nearest integer. A mask value of 0 keeps the canvas, 255 takes the
/// foreground.
pub fn alpha_blend(foreground: &Image, canvas: &Image, mask: &Mask) -> Result<Image> {
    if foreground.dims() != canvas.dims() || mask.dims() != canvas.dims() {
        return Err(MontageError::InvalidInput(format!(
            "cannot blend {:?} foreground with {:?} mask onto {:?} canvas",
            foreground.dims(),
            mask.dims(),
            canvas.dims()
        )));
    }

    let weights = mask.values();
    let mut output = Array3::<u8>::zeros(canvas.pixels().raw_dim());

    Zip::indexed(&mut output)
        .and(foreground.pixels())
        .and(canvas.pixels())
        .par_for_each(|(y, x, _), out, &fg, &dst| {
            *out = blend_u8(fg, dst, weights[[y, x]]);
        });

    Image::new(output)
}

/// Composite every foreground over the background, in order.
///
/// # Arguments
/// * `background` - Starting canvas
/// * `foregrounds` - Layers, bottom first
/// * `masks` - One mask per layer, same order as `foregrounds`
pub fn composite(background: &Image, foregrounds: &[Image], masks: &[Mask]) -> Result<Image> {
    if foregrounds.len() != masks.len() {
        return Err(MontageError::InvalidInput(format!(
            "{} foregrounds but {} masks",
            foregrounds.len(),
            masks.len()
        )));
    }

    let mut canvas = background.clone();
    for (index, (foreground, mask)) in foregrounds.iter().zip(masks).enumerate() {
        log::debug!(
            "Compositing layer {} ({} masked pixels)",
            index,
            mask.coverage()
        );
        canvas = alpha_blend(foreground, &canvas, mask)?;
    }

    Ok(canvas)
}

/// `(fg * m + dst * (255 - m)) / 255`, rounded.
#[inline]
fn blend_u8(fg: u8, dst: u8, m: u8) -> u8 {
    let m = u32::from(m);
    let sum = u32::from(fg) * m + u32::from(dst) * (255 - m);
    ((sum + 127) / 255) as u8
}
