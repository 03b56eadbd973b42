//! WebAssembly exports for the montage pipeline.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Images travel
//! as flat row-major RGB byte buffers (length = width * height * 3).

use wasm_bindgen::prelude::*;

use crate::config::MontageConfig;
use crate::error::MontageError;
use crate::raster::{stack_buffer_len, Image};

fn to_js(err: MontageError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Split `count` concatenated RGB images out of one flat buffer.
fn split_stack(
    data: &[u8],
    width: usize,
    height: usize,
    count: usize,
) -> Result<Vec<Image>, JsValue> {
    let frame_len = stack_buffer_len(height, width, 1).map_err(to_js)?;
    let expected = stack_buffer_len(height, width, count).map_err(to_js)?;
    if data.len() != expected {
        return Err(JsValue::from_str(&format!(
            "expected {count} frames of {width}x{height} RGB ({expected} bytes), got {} bytes",
            data.len()
        )));
    }

    data.chunks_exact(frame_len)
        .map(|frame| Image::from_raw(height, width, frame.to_vec()).map_err(to_js))
        .collect()
}

// ============================================================================
// Montage
// ============================================================================

/// Build a montage from a stack of RGB images.
///
/// # Arguments
/// * `data` - `count` RGB images of equal size, concatenated
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `count` - Number of images in `data`
/// * `blur_sigma` - Gaussian sigma for differencing and mask feathering
/// * `threshold` - Summed RGB difference at which a pixel is foreground
/// * `alpha` - Foreground opacity (0.0-1.0)
///
/// # Returns
/// Flat RGB buffer of the montage
#[wasm_bindgen]
pub fn montage_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    count: usize,
    blur_sigma: f32,
    threshold: i32,
    alpha: f32,
) -> Result<Vec<u8>, JsValue> {
    let images = split_stack(data, width, height, count)?;
    let config = MontageConfig {
        blur_sigma,
        threshold: i64::from(threshold),
        alpha,
    };

    let montage = crate::pipeline::build_montage(&images, &config).map_err(to_js)?;
    Ok(montage.image.into_raw())
}

/// Estimate the background plate of a stack of RGB images.
#[wasm_bindgen]
pub fn background_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    count: usize,
) -> Result<Vec<u8>, JsValue> {
    let images = split_stack(data, width, height, count)?;
    let background = crate::background::estimate_background(&images).map_err(to_js)?;
    Ok(background.into_raw())
}
