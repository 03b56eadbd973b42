//! End-to-end montage pipeline: background, masks, composite.

use crate::background::estimate_background;
use crate::composite::composite;
use crate::config::MontageConfig;
use crate::error::Result;
use crate::mask::difference_masks;
use crate::raster::{common_dims, Image, Mask};

/// Everything the pipeline derives from one stack of images.
#[derive(Debug, Clone)]
pub struct Montage {
    /// Estimated subject-free plate.
    pub background: Image,
    /// One opacity mask per input, in input order.
    pub masks: Vec<Mask>,
    /// Final composite.
    pub image: Image,
}

/// Build a montage from a stack of aligned images.
///
/// The configuration and the stack are validated before any work is done;
/// any failure aborts the whole run.
pub fn build_montage(images: &[Image], config: &MontageConfig) -> Result<Montage> {
    let params = config.mask_params()?;
    let (height, width) = common_dims(images)?;

    log::info!(
        "Building montage from {} images of {}x{} (sigma {}, threshold {}, opacity {})",
        images.len(),
        width,
        height,
        params.blur_sigma,
        params.threshold,
        params.opacity
    );

    let background = estimate_background(images)?;
    let masks = difference_masks(images, &background, &params)?;
    let image = composite(&background, images, &masks)?;

    log::info!("Montage complete");

    Ok(Montage {
        background,
        masks,
        image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MontageError;

    #[test]
    fn test_invalid_config_aborts_before_work() {
        let images = vec![Image::filled(2, 2, [0, 0, 0]).unwrap()];
        let config = MontageConfig {
            alpha: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            build_montage(&images, &config),
            Err(MontageError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_stack_is_rejected() {
        assert!(matches!(
            build_montage(&[], &MontageConfig::default()),
            Err(MontageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_static_scene_is_unchanged() {
        let image = Image::filled(5, 4, [90, 140, 200]).unwrap();
        let stack = vec![image.clone(); 3];

        let montage = build_montage(&stack, &MontageConfig::default()).unwrap();

        assert_eq!(montage.background, image);
        assert!(montage.masks.iter().all(|m| m.coverage() == 0));
        assert_eq!(montage.image, image);
    }
}
