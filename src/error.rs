//! Error types for the photo editing pipeline

use thiserror::Error;

/// Result type alias for photo editing operations
pub type Result<T> = std::result::Result<T, PhotoEditError>;

/// Error taxonomy for the segmentation and composition pipeline
#[derive(Error, Debug)]
pub enum PhotoEditError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input bytes could not be interpreted as an image
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    /// Segmentation ran but found no subject, or the underlying capability
    /// failed internally. Both collapse to the same user-visible outcome.
    #[error("no person detected in image")]
    NoPersonDetected,

    /// The blend/render step could not materialize an output buffer
    #[error("Composition error: {0}")]
    Composition(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PhotoEditError {
    /// Create a new composition error
    pub fn composition<S: Into<String>>(msg: S) -> Self {
        Self::Composition(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Composition error for a mask/source dimension contract violation
    pub fn mask_mismatch(mask_dims: (u32, u32), source_dims: (u32, u32)) -> Self {
        Self::Composition(format!(
            "mask dimensions {}x{} exceed source dimensions {}x{}",
            mask_dims.0, mask_dims.1, source_dims.0, source_dims.1
        ))
    }
}
