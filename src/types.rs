//! Core types for the segmentation and composition pipeline

use crate::error::{PhotoEditError, Result};
use image::{DynamicImage, GenericImageView, ImageBuffer, Luma, Rgba};
use serde::{Deserialize, Serialize};

/// Single-channel segmentation mask
///
/// Each byte is a per-pixel foreground probability (0 = background,
/// 255 = foreground). The mask resolution may be smaller than the source
/// image it was computed from; composition scales it back up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationMask {
    /// Mask data as grayscale values (0-255), row-major
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create a mask from a grayscale image
    #[must_use]
    pub fn from_image(image: &ImageBuffer<Luma<u8>, Vec<u8>>) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.as_raw().clone(), (width, height))
    }

    /// Convert the mask to a grayscale image
    pub fn to_image(&self) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            PhotoEditError::composition("mask data length does not match its dimensions")
        })
    }

    /// Fraction of pixels considered foreground (probability > 127)
    #[must_use]
    pub fn foreground_ratio(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let foreground = self.data.iter().filter(|&&v| v > 127).count();
        foreground as f32 / self.data.len() as f32
    }

    /// Whether the mask is valid for compositing over a source of the given
    /// dimensions: non-empty, internally consistent, and no larger than the
    /// source on either axis.
    pub fn validate_for_source(&self, source_dims: (u32, u32)) -> Result<()> {
        let (mw, mh) = self.dimensions;
        if mw == 0 || mh == 0 {
            return Err(PhotoEditError::composition("mask has zero-size extent"));
        }
        if self.data.len() != (mw as usize) * (mh as usize) {
            return Err(PhotoEditError::composition(format!(
                "mask data length {} does not match dimensions {}x{}",
                self.data.len(),
                mw,
                mh
            )));
        }
        if mw > source_dims.0 || mh > source_dims.1 {
            return Err(PhotoEditError::mask_mismatch(self.dimensions, source_dims));
        }
        Ok(())
    }
}

/// Background chosen for composition. Exactly one variant is active at a
/// time; there are no combination semantics.
#[derive(Debug, Clone)]
pub enum BackgroundSelection {
    /// Zero-coverage field: the subject is cut out onto transparency
    Transparent,
    /// Constant color field covering the source frame
    Color(Rgba<u8>),
    /// Another photo, stretched to fill the source frame
    Photo(DynamicImage),
}

impl BackgroundSelection {
    /// Convenience constructor for an opaque solid color background
    #[must_use]
    pub fn color(r: u8, g: u8, b: u8) -> Self {
        Self::Color(Rgba([r, g, b, 255]))
    }

    /// Decode a background photo from raw bytes, normalizing its orientation
    /// so downstream pixel math never sees rotation/mirroring metadata.
    pub fn photo_from_bytes(bytes: &[u8]) -> Result<Self> {
        let image = crate::orientation::decode_normalized_bytes(bytes)?;
        Ok(Self::Photo(image))
    }

    /// Variant name, for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::Color(_) => "color",
            Self::Photo(_) => "photo",
        }
    }
}

/// Result of a successful segmentation call
///
/// Pairs the orientation-normalized source image with the mask computed from
/// it. Both originate from the same call; the pipeline never mixes a mask
/// from one photo with the pixels of another. Immutable after construction,
/// so it is safe to share across concurrent composite calls via `Arc`.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    /// The orientation-normalized source image the mask was computed from
    pub image: DynamicImage,

    /// The segmentation mask
    pub mask: SegmentationMask,
}

impl SegmentationResult {
    /// Create a new segmentation result, checking the mask/source contract
    pub fn new(image: DynamicImage, mask: SegmentationMask) -> Result<Self> {
        mask.validate_for_source(image.dimensions())?;
        Ok(Self { image, mask })
    }

    /// Source image dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}
