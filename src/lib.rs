//! Montage: merge the subjects of several photos of one scene onto a single
//! shared background.
//!
//! Given a stack of pixel-aligned photos taken from a fixed camera, the
//! pipeline
//! 1. estimates a subject-free background with a per-pixel median
//!    ([`background`]),
//! 2. masks where each photo differs from that background ([`mask`]),
//! 3. alpha-composites every photo over the background in input order
//!    ([`composite`]).
//!
//! ## Image Format
//! - **Image**: (height, width, 3) RGB, `u8` per channel
//! - **Mask**: (height, width), `u8` blend weight (0 = background)
//!
//! All images of one run must share their dimensions.
//!
//! ## Bindings
//! - `python` feature: PyO3 module `montage` over numpy `uint8` arrays
//! - `wasm` feature: wasm-bindgen exports over flat RGB buffers

pub mod background;
pub mod composite;
pub mod config;
pub mod error;
pub mod filters;
pub mod io;
pub mod mask;
pub mod pipeline;
pub mod raster;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use config::{MaskParams, MontageConfig};
pub use error::{MontageError, Result};
pub use pipeline::{build_montage, Montage};
pub use raster::{Image, Mask};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use numpy::{IntoPyArray, PyArray2, PyArray3, PyReadonlyArray2, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::config::{MaskParams, MontageConfig};
    use crate::error::MontageError;
    use crate::raster::{Image, Mask};

    impl From<MontageError> for PyErr {
        fn from(err: MontageError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    fn to_images(arrays: Vec<PyReadonlyArray3<'_, u8>>) -> PyResult<Vec<Image>> {
        arrays
            .iter()
            .map(|a| Image::new(a.as_array().to_owned()).map_err(PyErr::from))
            .collect()
    }

    fn mask_params(blur_sigma: f32, threshold: i64, alpha: f32) -> PyResult<MaskParams> {
        let config = MontageConfig {
            blur_sigma,
            threshold,
            alpha,
        };
        Ok(config.mask_params()?)
    }

    // ========================================================================
    // Pipeline Stages
    // ========================================================================

    /// Estimate the subject-free background of a stack of (H, W, 3) images.
    #[pyfunction]
    pub fn estimate_background<'py>(
        py: Python<'py>,
        images: Vec<PyReadonlyArray3<'py, u8>>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let images = to_images(images)?;
        let background = crate::background::estimate_background(&images)?;
        Ok(background.into_pixels().into_pyarray(py))
    }

    /// Opacity mask (H, W) of where `foreground` differs from `background`.
    #[pyfunction]
    #[pyo3(signature = (foreground, background, blur_sigma=3.0, threshold=16, alpha=0.9))]
    pub fn difference_mask<'py>(
        py: Python<'py>,
        foreground: PyReadonlyArray3<'py, u8>,
        background: PyReadonlyArray3<'py, u8>,
        blur_sigma: f32,
        threshold: i64,
        alpha: f32,
    ) -> PyResult<Bound<'py, PyArray2<u8>>> {
        let params = mask_params(blur_sigma, threshold, alpha)?;
        let foreground = Image::new(foreground.as_array().to_owned())?;
        let background = Image::new(background.as_array().to_owned())?;

        let mask = crate::mask::difference_mask(&foreground, &background, &params)?;
        Ok(mask.into_values().into_pyarray(py))
    }

    /// Composite foregrounds over the background in order, using their masks.
    #[pyfunction]
    pub fn composite<'py>(
        py: Python<'py>,
        background: PyReadonlyArray3<'py, u8>,
        foregrounds: Vec<PyReadonlyArray3<'py, u8>>,
        masks: Vec<PyReadonlyArray2<'py, u8>>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let background = Image::new(background.as_array().to_owned())?;
        let foregrounds = to_images(foregrounds)?;
        let masks: Vec<Mask> = masks
            .iter()
            .map(|m| Mask::new(m.as_array().to_owned()))
            .collect();

        let result = crate::composite::composite(&background, &foregrounds, &masks)?;
        Ok(result.into_pixels().into_pyarray(py))
    }

    // ========================================================================
    // Full Pipeline
    // ========================================================================

    /// Background, masks and composite in one call.
    ///
    /// Returns the montage image.
    #[pyfunction]
    #[pyo3(signature = (images, blur_sigma=3.0, threshold=16, alpha=0.9))]
    pub fn build_montage<'py>(
        py: Python<'py>,
        images: Vec<PyReadonlyArray3<'py, u8>>,
        blur_sigma: f32,
        threshold: i64,
        alpha: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let images = to_images(images)?;
        let config = MontageConfig {
            blur_sigma,
            threshold,
            alpha,
        };
        let montage = crate::pipeline::build_montage(&images, &config)?;
        Ok(montage.image.into_pixels().into_pyarray(py))
    }

    /// Montage Rust extension module
    #[pymodule]
    pub fn montage(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(estimate_background, m)?)?;
        m.add_function(wrap_pyfunction!(difference_mask, m)?)?;
        m.add_function(wrap_pyfunction!(composite, m)?)?;
        m.add_function(wrap_pyfunction!(build_montage, m)?)?;
        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::montage;
