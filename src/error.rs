//! Error type shared by every stage of the montage pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MontageError {
    /// Images of differing shape, an empty stack, or mismatched layer lists.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value outside its allowed range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to decode image from {origin}: {source}")]
    Decode {
        origin: String,
        source: image::ImageError,
    },

    #[error("Failed to encode image to {target}: {source}")]
    Encode {
        target: String,
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, MontageError>;
