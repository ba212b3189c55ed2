#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # photoedit
//!
//! Core library for a photo-editing application: person-segmentation based
//! background removal and replacement, stylistic filters, auto-enhance, and
//! face detection. The ML capabilities (person segmentation, face detection)
//! live behind narrow traits and are injected by the embedding application;
//! this crate carries the pipeline around them:
//!
//! 1. **Orientation normalization** — every image is re-rendered into
//!    canonical pixel layout at the decode boundary, so coordinate math
//!    downstream never special-cases rotation or mirroring.
//! 2. **Segmentation** — runs the injected backend once per photo on a
//!    blocking worker and caches the normalized source plus its 8-bit
//!    probability mask.
//! 3. **Composition** — a pure, synchronous blend of the masked subject
//!    over a transparent, solid-color, or photo background, re-invoked on
//!    every selection change for live preview.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use photoedit::{
//!     BackgroundSelection, EditSession, MockSegmenter, Orientation, SegmentationConfig,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> photoedit::Result<()> {
//! let photo = photoedit::decode_normalized("portrait.jpg")?;
//!
//! let session = EditSession::new(Arc::new(MockSegmenter::new()), SegmentationConfig::default());
//! session.remove_background(photo, Orientation::NoTransforms).await?;
//!
//! // Every selection change triggers one composite; stale results are
//! // discarded, so the preview always reflects the latest request.
//! session.select_background(BackgroundSelection::color(255, 255, 255))?.await.ok();
//! let edited = session.apply();
//! # Ok(())
//! # }
//! ```
//!
//! For one-shot use without a session, [`segment_bytes`] and
//! [`replace_background_bytes`] go straight from encoded bytes to a result.

pub mod backends;
pub mod compose;
pub mod config;
pub mod error;
pub mod faces;
pub mod filters;
pub mod orientation;
pub mod segmentation;
pub mod session;
pub mod types;

use std::sync::Arc;

// Public API exports
pub use backends::MockSegmenter;
pub use compose::composite;
pub use config::{MaskFormat, QualityLevel, SegmentationConfig, SegmentationConfigBuilder};
pub use error::{PhotoEditError, Result};
pub use faces::{detect_faces, FaceDetector, FaceRegion};
pub use filters::{auto_enhance, PhotoFilter, ALL_FILTERS};
pub use orientation::{decode_normalized, decode_normalized_bytes, normalize};
pub use segmentation::{compute_mask, SegmentationBackend};
pub use session::{EditSession, Preview, SessionPhase};
pub use types::{BackgroundSelection, SegmentationMask, SegmentationResult};

/// Canonical orientation metadata type, re-exported from the image crate
pub use image::metadata::Orientation;

/// Segment a person out of encoded image bytes.
///
/// Decodes the bytes, normalizes orientation, and runs the segmentation
/// backend once. The returned result pairs the normalized source with its
/// mask and can feed any number of [`composite`] calls.
///
/// # Errors
///
/// [`PhotoEditError::Decode`] for malformed bytes,
/// [`PhotoEditError::NoPersonDetected`] when no subject is found.
pub async fn segment_bytes(
    image_bytes: &[u8],
    backend: Arc<dyn SegmentationBackend>,
    config: &SegmentationConfig,
) -> Result<SegmentationResult> {
    let image = orientation::decode_normalized_bytes(image_bytes)?;
    // Orientation already applied at the decode boundary
    segmentation::compute_mask(image, Orientation::NoTransforms, backend, config).await
}

/// Remove and replace the background of encoded image bytes in one call.
///
/// Equivalent to [`segment_bytes`] followed by one [`composite`] call with
/// the given background selection.
///
/// # Errors
///
/// [`PhotoEditError::Decode`], [`PhotoEditError::NoPersonDetected`], or
/// [`PhotoEditError::Composition`] from the respective stage.
pub async fn replace_background_bytes(
    image_bytes: &[u8],
    background: &BackgroundSelection,
    backend: Arc<dyn SegmentationBackend>,
    config: &SegmentationConfig,
) -> Result<image::RgbaImage> {
    let result = segment_bytes(image_bytes, backend, config).await?;
    compose::composite(background, &result.mask, &result.image)
}
