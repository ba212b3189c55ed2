//! Face detection collaborator
//!
//! Face detection is an independent, stateless transform that never touches
//! the masking pipeline. The detector itself is an external capability
//! behind [`FaceDetector`]; this module normalizes orientation, runs the
//! detector off the interactive thread, and converts detector-native
//! bottom-left-origin rectangles into top-left-origin pixel coordinates.

use crate::error::{PhotoEditError, Result};
use crate::orientation;
use image::metadata::Orientation;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// An axis-aligned face bounding box in top-left-origin pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FaceRegion {
    /// Convert a bottom-left-origin rectangle (as produced by detectors with
    /// mathematical coordinate conventions) into top-left-origin pixel
    /// coordinates for an image of the given height.
    #[must_use]
    pub fn from_bottom_left(x: u32, y: u32, width: u32, height: u32, image_height: u32) -> Self {
        Self {
            x,
            y: image_height.saturating_sub(y.saturating_add(height)),
            width,
            height,
        }
    }
}

/// External face-detection capability
///
/// Returns zero or more face rectangles in top-left-origin pixel
/// coordinates of the (already orientation-normalized) input image. An
/// empty result is not an error.
pub trait FaceDetector: Send + Sync {
    /// Detect faces in the image
    ///
    /// # Errors
    ///
    /// Detector-internal failures (model load, inference).
    fn detect(&self, image: &DynamicImage) -> Result<Vec<FaceRegion>>;

    /// Detector name, for logging
    fn name(&self) -> &'static str;
}

/// Detect faces in `image`, off the caller's executor thread.
///
/// The image's orientation is normalized first so detector output is always
/// in canonical pixel coordinates.
///
/// # Errors
///
/// Detector failures surface unchanged; a worker task that fails to
/// complete is reported as an error as well.
#[instrument(skip(image, detector), fields(detector = detector.name()))]
pub async fn detect_faces(
    image: DynamicImage,
    orientation: Orientation,
    detector: Arc<dyn FaceDetector>,
) -> Result<Vec<FaceRegion>> {
    let image = orientation::normalize(image, orientation);
    let outcome = tokio::task::spawn_blocking(move || detector.detect(&image)).await;
    match outcome {
        Ok(Ok(regions)) => {
            debug!(count = regions.len(), "face detection finished");
            Ok(regions)
        },
        Ok(Err(e)) => Err(e),
        Err(e) => Err(PhotoEditError::composition(format!(
            "face detection task did not complete: {e}"
        ))),
    }
}
