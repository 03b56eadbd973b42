//! Filter modules used by the montage pipeline.
//!
//! ## Architecture
//!
//! - **core** - Gaussian kernel, border reflection, separable convolution
//! - **blur** - Gaussian blur of whole images and masks
//! - **channels** - Split an image into planes and merge them back
//!
//! All filters take `sigma` as an explicit argument; there is no module-level
//! default. Planes are processed in `f32` and truncated back to `u8`.

pub mod blur;
pub mod channels;
pub mod core;
