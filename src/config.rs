//! Pipeline configuration.
//!
//! [`MontageConfig`] holds the user-facing knobs as they arrive from the
//! command line or a binding. [`MaskParams`] is the validated form consumed by
//! the difference masker, with alpha already mapped to an 8-bit opacity.

use crate::error::{MontageError, Result};

/// Default Gaussian sigma, applied before differencing and to the mask.
pub const DEFAULT_BLUR_SIGMA: f32 = 3.0;
/// Default summed RGB difference at which a pixel counts as foreground.
pub const DEFAULT_THRESHOLD: i64 = 16;
/// Default foreground opacity as a 0-1 fraction.
pub const DEFAULT_ALPHA: f32 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MontageConfig {
    pub blur_sigma: f32,
    pub threshold: i64,
    pub alpha: f32,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_BLUR_SIGMA,
            threshold: DEFAULT_THRESHOLD,
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl MontageConfig {
    /// Validate the configuration and derive the masking parameters.
    pub fn mask_params(&self) -> Result<MaskParams> {
        let threshold = u32::try_from(self.threshold).map_err(|_| {
            MontageError::InvalidConfig(format!(
                "threshold must be between 0 and {}, got {}",
                u32::MAX,
                self.threshold
            ))
        })?;

        MaskParams::new(self.blur_sigma, threshold, opacity_from_alpha(self.alpha)?)
    }
}

/// Validated parameters for the difference masker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskParams {
    pub blur_sigma: f32,
    pub threshold: u32,
    pub opacity: u8,
}

impl MaskParams {
    pub fn new(blur_sigma: f32, threshold: u32, opacity: u8) -> Result<Self> {
        check_sigma(blur_sigma)?;
        Ok(Self {
            blur_sigma,
            threshold,
            opacity,
        })
    }
}

impl Default for MaskParams {
    fn default() -> Self {
        Self {
            blur_sigma: DEFAULT_BLUR_SIGMA,
            threshold: DEFAULT_THRESHOLD as u32,
            opacity: (DEFAULT_ALPHA * 255.0) as u8,
        }
    }
}

/// Map an alpha fraction in [0, 1] to an 8-bit opacity (truncating).
pub fn opacity_from_alpha(alpha: f32) -> Result<u8> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(MontageError::InvalidConfig(format!(
            "alpha must be within [0, 1], got {alpha}"
        )));
    }
    Ok((alpha * 255.0) as u8)
}

/// Gaussian sigma must be finite and non-negative.
pub fn check_sigma(sigma: f32) -> Result<()> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(MontageError::InvalidConfig(format!(
            "blur sigma must be a non-negative number, got {sigma}"
        )));
    }
    Ok(())
}
