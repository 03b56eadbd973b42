//! Core utilities for the smoothing filter.
//!
//! This module provides the shared convolution machinery:
//! - Gaussian kernel generation
//! - Border reflection
//! - Separable convolution of a single plane
//! - Quantization back to 8-bit

use ndarray::{Array2, ArrayView2};

/// Kernel half-width in multiples of sigma.
pub const TRUNCATE: f32 = 4.0;

/// Upper bound on the kernel half-width. At this radius the truncated
/// Gaussian is already flat across any realistic image.
pub const MAX_KERNEL_RADIUS: usize = 4096;

/// Tolerance added before truncating to u8, so a kernel whose weights sum to
/// slightly under 1.0 does not turn 255 into 254.
const QUANTIZE_EPSILON: f32 = 1e-3;

/// Generate a 1D Gaussian kernel.
///
/// # Arguments
/// * `sigma` - Standard deviation of the Gaussian
///
/// # Returns
/// Normalized kernel of length `2 * floor(TRUNCATE * sigma + 0.5) + 1`, with
/// the half-width capped at [`MAX_KERNEL_RADIUS`].
/// A non-positive sigma yields the identity kernel `[1.0]`.
pub fn gaussian_kernel_1d(sigma: f32) -> Vec<f32> {
    if sigma <= 0.0 {
        return vec![1.0];
    }

    let half = kernel_radius(sigma);

    let mut kernel: Vec<f32> = (0..=2 * half)
        .map(|i| {
            let x = i as f32 - half as f32;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    // Normalize
    let sum: f32 = kernel.iter().sum();
    for v in kernel.iter_mut() {
        *v /= sum;
    }

    kernel
}

/// Kernel half-width for `sigma`, saturating at [`MAX_KERNEL_RADIUS`].
pub fn kernel_radius(sigma: f32) -> usize {
    (TRUNCATE * sigma + 0.5).min(MAX_KERNEL_RADIUS as f32) as usize
}

/// Map an out-of-range index back into `0..len` by half-sample symmetric
/// reflection (`d c b a | a b c d | d c b a`).
///
/// `len` must be non-zero.
#[inline]
pub fn reflect_index(index: isize, len: usize) -> usize {
    let len = len as isize;
    let period = 2 * len;
    let folded = index.rem_euclid(period);
    if folded < len {
        folded as usize
    } else {
        (period - 1 - folded) as usize
    }
}

/// Convolve a plane with `kernel` along both axes (horizontal pass, then
/// vertical pass).
pub fn convolve_separable(plane: ArrayView2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (height, width) = plane.dim();
    let half = (kernel.len() / 2) as isize;

    let mut temp = Array2::<f32>::zeros((height, width));
    let mut result = Array2::<f32>::zeros((height, width));

    // Horizontal pass
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = reflect_index(x as isize + ki as isize - half, width);
                sum += plane[[y, sx]] * kv;
            }
            temp[[y, x]] = sum;
        }
    }

    // Vertical pass
    for y in 0..height {
        for x in 0..width {
            let mut sum = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = reflect_index(y as isize + ki as isize - half, height);
                sum += temp[[sy, x]] * kv;
            }
            result[[y, x]] = sum;
        }
    }

    result
}

/// Clamp to [0, 255] and truncate to u8.
#[inline]
pub fn quantize_u8(value: f32) -> u8 {
    (value + QUANTIZE_EPSILON).clamp(0.0, 255.0) as u8
}

/// Gaussian blur of a single u8 plane. Sigma 0 returns a copy.
pub fn blur_plane_u8(plane: ArrayView2<u8>, sigma: f32) -> Array2<u8> {
    if sigma <= 0.0 {
        return plane.to_owned();
    }

    let kernel = gaussian_kernel_1d(sigma);
    let input = plane.mapv(f32::from);
    convolve_separable(input.view(), &kernel).mapv(quantize_u8)
}
