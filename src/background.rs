//! Background plate estimation.
//!
//! Constructs the background via the following method:
//! 1. split every image of the stack into its color planes
//! 1. for every channel, take the per-pixel median across the stack
//! 1. merge the three median planes back into one image
//!
//! A pixel comes out clean as long as it shows background in a strict
//! majority of the stack.

use ndarray::{Array2, ArrayView2, Axis};
use rayon::prelude::*;

use crate::error::Result;
use crate::filters::channels::{merge_channels, split_channels};
use crate::raster::{common_dims, Image, Plane, CHANNELS};

/// Estimate the subject-free background of a stack of aligned images.
///
/// Fails with `InvalidInput` if the stack is empty or the images differ in
/// size.
pub fn estimate_background(images: &[Image]) -> Result<Image> {
    let (height, width) = common_dims(images)?;

    log::debug!(
        "Computing the median background of {} images ({}x{})",
        images.len(),
        width,
        height
    );

    let split: Vec<[Plane; CHANNELS]> = images.iter().map(split_channels).collect();

    let medians: Vec<Plane> = (0..CHANNELS)
        .map(|c| {
            let planes: Vec<ArrayView2<u8>> = split.iter().map(|p| p[c].view()).collect();
            median_stack(&planes)
        })
        .collect();

    merge_channels(&medians)
}

/// Per-pixel median across equally-sized planes.
///
/// Rows are computed in parallel. The planes must be non-empty and share one
/// shape; [`estimate_background`] checks both before calling in.
pub fn median_stack(planes: &[ArrayView2<u8>]) -> Plane {
    let (height, width) = planes.first().map(|p| p.dim()).unwrap_or((0, 0));
    let mut output = Array2::<u8>::zeros((height, width));

    output
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(y, mut row)| {
            let mut samples: Vec<u8> = Vec::with_capacity(planes.len());
            for x in 0..width {
                samples.clear();
                samples.extend(planes.iter().map(|plane| plane[[y, x]]));
                row[x] = median(&mut samples);
            }
        });

    output
}

/// Median of a sample set; the mean of the two middle values (truncated) for
/// even counts. Reorders `samples`.
pub fn median(samples: &mut [u8]) -> u8 {
    if samples.is_empty() {
        return 0;
    }

    samples.sort_unstable();
    let mid = samples.len() / 2;
    if samples.len() % 2 == 1 {
        samples[mid]
    } else {
        ((u16::from(samples[mid - 1]) + u16::from(samples[mid])) / 2) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MontageError;
    use ndarray::Array3;

    fn gradient_image(seed: u8) -> Image {
        Image::new(Array3::from_shape_fn((3, 4, 3), |(y, x, c)| {
            seed.wrapping_mul(37)
                .wrapping_add((y * 11 + x * 5 + c * 3) as u8)
        }))
        .unwrap()
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&mut [9, 1, 5]), 5);
        assert_eq!(median(&mut [10, 20]), 15);
        assert_eq!(median(&mut [10, 21]), 15);
        assert_eq!(median(&mut [255, 255, 254, 254]), 254);
        assert_eq!(median(&mut [4]), 4);
    }

    #[test]
    fn test_identical_images_give_same_background() {
        let image = Image::filled(3, 2, [12, 130, 250]).unwrap();
        let stack = vec![image.clone(); 4];
        assert_eq!(estimate_background(&stack).unwrap(), image);
    }

    #[test]
    fn test_single_image_is_its_own_background() {
        let image = gradient_image(3);
        assert_eq!(estimate_background(&[image.clone()]).unwrap(), image);
    }

    #[test]
    fn test_background_ignores_input_order() {
        let stack = vec![
            gradient_image(1),
            gradient_image(2),
            gradient_image(5),
            gradient_image(9),
            gradient_image(4),
        ];
        let expected = estimate_background(&stack).unwrap();

        let mut reversed = stack.clone();
        reversed.reverse();
        assert_eq!(estimate_background(&reversed).unwrap(), expected);

        let mut rotated = stack.clone();
        rotated.rotate_left(2);
        assert_eq!(estimate_background(&rotated).unwrap(), expected);
    }

    #[test]
    fn test_transient_subject_is_removed() {
        let gray = Image::filled(2, 2, [128, 128, 128]).unwrap();
        let mut occluded = gray.clone().into_pixels();
        occluded[[0, 1, 0]] = 255;
        occluded[[0, 1, 1]] = 0;
        occluded[[0, 1, 2]] = 0;
        let occluded = Image::new(occluded).unwrap();

        let background = estimate_background(&[gray.clone(), occluded, gray.clone()]).unwrap();
        assert_eq!(background, gray);
    }

    #[test]
    fn test_even_stack_averages_middle_values() {
        let dark = Image::filled(1, 1, [10, 0, 100]).unwrap();
        let light = Image::filled(1, 1, [21, 255, 101]).unwrap();

        let background = estimate_background(&[dark, light]).unwrap();
        assert_eq!(background.pixels()[[0, 0, 0]], 15);
        assert_eq!(background.pixels()[[0, 0, 1]], 127);
        assert_eq!(background.pixels()[[0, 0, 2]], 100);
    }

    #[test]
    fn test_rejects_bad_stacks() {
        assert!(matches!(
            estimate_background(&[]),
            Err(MontageError::InvalidInput(_))
        ));

        let small = Image::filled(2, 2, [0, 0, 0]).unwrap();
        let large = Image::filled(2, 3, [0, 0, 0]).unwrap();
        assert!(matches!(
            estimate_background(&[small, large]),
            Err(MontageError::InvalidInput(_))
        ));
    }
}
