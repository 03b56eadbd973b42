//! Difference masking.
//!
//! Constructs a per-image opacity mask via the following method:
//! 1. blur foreground and background with the same sigma
//! 1. sum the absolute per-channel difference of the blurred images
//! 1. threshold: below `threshold` is background (0), otherwise `opacity`
//! 1. blur the two-level mask again to feather its edges
//!
//! Masks for different images only read their own image and the shared
//! background, so [`difference_masks`] computes them in parallel.

use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;

use crate::config::MaskParams;
use crate::error::{MontageError, Result};
use crate::filters::blur::{gaussian_blur_image, gaussian_blur_mask};
use crate::raster::{Image, Mask, CHANNELS};

/// Opacity mask marking where `foreground` deviates from `background`.
///
/// # Arguments
/// * `foreground` - One image of the stack
/// * `background` - The estimated background plate, same size as `foreground`
/// * `params` - Blur sigma, foreground threshold and opacity
///
/// # Returns
/// Mask with values in `[0, params.opacity]`
pub fn difference_mask(
    foreground: &Image,
    background: &Image,
    params: &MaskParams,
) -> Result<Mask> {
    if foreground.dims() != background.dims() {
        return Err(MontageError::InvalidInput(format!(
            "foreground is {}x{} but background is {}x{}",
            foreground.width(),
            foreground.height(),
            background.width(),
            background.height()
        )));
    }

    let fg = gaussian_blur_image(foreground, params.blur_sigma)?;
    let bg = gaussian_blur_image(background, params.blur_sigma)?;

    let diff = difference_sum(&fg, &bg);
    let step = threshold_step(diff.view(), params.threshold, params.opacity);

    log::trace!(
        "{} of {} pixels at or above threshold {}",
        step.coverage(),
        diff.len(),
        params.threshold
    );

    gaussian_blur_mask(&step, params.blur_sigma)
}

/// Masks for every image of a stack against one shared background.
///
/// The returned masks follow the order of `images`.
pub fn difference_masks(
    images: &[Image],
    background: &Image,
    params: &MaskParams,
) -> Result<Vec<Mask>> {
    log::debug!("Generating {} difference masks", images.len());

    images
        .par_iter()
        .map(|image| difference_mask(image, background, params))
        .collect()
}

/// Absolute difference per pixel, summed over the color channels (0-765).
///
/// Both images must have the same dimensions.
pub fn difference_sum(a: &Image, b: &Image) -> Array2<u16> {
    let (pa, pb) = (a.pixels(), b.pixels());
    Array2::from_shape_fn(a.dims(), |(y, x)| {
        (0..CHANNELS)
            .map(|c| u16::from(pa[[y, x, c]].abs_diff(pb[[y, x, c]])))
            .sum()
    })
}

/// Hard two-level step: 0 below `threshold`, `opacity` at or above it.
pub fn threshold_step(diff: ArrayView2<u16>, threshold: u32, opacity: u8) -> Mask {
    Mask::new(diff.mapv(|d| {
        if u32::from(d) < threshold {
            0
        } else {
            opacity
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn params(blur_sigma: f32, threshold: u32, opacity: u8) -> MaskParams {
        MaskParams::new(blur_sigma, threshold, opacity).unwrap()
    }

    fn gray_with_square(size: usize, top: usize, left: usize, side: usize) -> Image {
        let mut pixels = Array3::<u8>::from_elem((size, size, 3), 120);
        for y in top..top + side {
            for x in left..left + side {
                pixels[[y, x, 0]] = 240;
                pixels[[y, x, 1]] = 30;
                pixels[[y, x, 2]] = 30;
            }
        }
        Image::new(pixels).unwrap()
    }

    #[test]
    fn test_identical_images_give_empty_mask() {
        let image = gray_with_square(8, 2, 2, 3);
        let mask = difference_mask(&image, &image, &MaskParams::default()).unwrap();
        assert_eq!(mask, Mask::zeros(8, 8));
    }

    #[test]
    fn test_difference_sum_spans_channels() {
        let a = Image::filled(1, 1, [0, 255, 10]).unwrap();
        let b = Image::filled(1, 1, [255, 0, 20]).unwrap();
        assert_eq!(difference_sum(&a, &b)[[0, 0]], 520);

        let black = Image::filled(1, 1, [0, 0, 0]).unwrap();
        let white = Image::filled(1, 1, [255, 255, 255]).unwrap();
        assert_eq!(difference_sum(&black, &white)[[0, 0]], 765);
    }

    #[test]
    fn test_threshold_step_is_two_level() {
        let diff = Array2::from_shape_vec((1, 5), vec![0u16, 9, 10, 11, 765]).unwrap();
        let step = threshold_step(diff.view(), 10, 229);
        assert_eq!(step.values().as_slice().unwrap(), &[0, 0, 229, 229, 229]);
    }

    #[test]
    fn test_unblurred_mask_marks_square_exactly() {
        let background = Image::filled(6, 6, [120, 120, 120]).unwrap();
        let foreground = gray_with_square(6, 1, 2, 2);

        let mask = difference_mask(&foreground, &background, &params(0.0, 16, 255)).unwrap();

        for y in 0..6 {
            for x in 0..6 {
                let inside = (1..3).contains(&y) && (2..4).contains(&x);
                assert_eq!(mask.values()[[y, x]], if inside { 255 } else { 0 });
            }
        }
    }

    #[test]
    fn test_blurred_mask_stays_within_opacity() {
        let background = Image::filled(48, 48, [120, 120, 120]).unwrap();
        let foreground = gray_with_square(48, 16, 16, 16);

        let mask = difference_mask(&foreground, &background, &params(2.0, 16, 229)).unwrap();

        assert!(mask.max() <= 229);
        assert_eq!(mask.values()[[24, 24]], 229);
        assert_eq!(mask.values()[[0, 0]], 0);
        // feathered transition band around the square's edge
        let row = mask.values().row(24);
        assert!(row.iter().any(|&v| v > 0 && v < 229));
    }

    #[test]
    fn test_high_threshold_ignores_small_changes() {
        let background = Image::filled(4, 4, [100, 100, 100]).unwrap();
        let foreground = Image::filled(4, 4, [103, 103, 103]).unwrap();

        let quiet = difference_mask(&foreground, &background, &params(0.0, 10, 255)).unwrap();
        assert_eq!(quiet.coverage(), 0);

        let sensitive = difference_mask(&foreground, &background, &params(0.0, 9, 255)).unwrap();
        assert_eq!(sensitive.coverage(), 16);
    }

    #[test]
    fn test_masks_follow_input_order() {
        let background = Image::filled(6, 6, [120, 120, 120]).unwrap();
        let images = vec![
            background.clone(),
            gray_with_square(6, 0, 0, 2),
            gray_with_square(6, 3, 3, 3),
        ];

        let masks = difference_masks(&images, &background, &params(0.0, 16, 200)).unwrap();

        assert_eq!(masks.len(), 3);
        assert_eq!(masks[0].coverage(), 0);
        assert_eq!(masks[1].coverage(), 4);
        assert_eq!(masks[2].coverage(), 9);
    }

    #[test]
    fn test_rejects_size_mismatch() {
        let a = Image::filled(2, 2, [0, 0, 0]).unwrap();
        let b = Image::filled(3, 2, [0, 0, 0]).unwrap();
        assert!(matches!(
            difference_mask(&a, &b, &MaskParams::default()),
            Err(MontageError::InvalidInput(_))
        ));
    }
}
