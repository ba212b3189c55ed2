//! Orientation normalization
//!
//! Canonicalizes an image's pixel layout before any geometric operation
//! touches it, so pixel-buffer coordinate math downstream never special-cases
//! rotation or mirroring. Orientation metadata is consumed here, at the
//! decode boundary, and never travels further into the pipeline.

use crate::error::Result;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Re-render `image` into canonical (no-rotation, no-mirroring) layout.
///
/// Returns the image unchanged when it is already canonical. Pure; every
/// call with the same inputs produces the same pixels.
#[must_use]
pub fn normalize(mut image: DynamicImage, orientation: Orientation) -> DynamicImage {
    if orientation != Orientation::NoTransforms {
        image.apply_orientation(orientation);
    }
    image
}

/// Decode an image from raw bytes and normalize its orientation.
///
/// The EXIF orientation tag (if any) is read from the decoder and applied,
/// so the returned image is always in canonical layout.
///
/// # Errors
///
/// Returns `PhotoEditError::Decode` if the bytes cannot be interpreted as an
/// image in a supported format.
pub fn decode_normalized_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let mut decoder = reader.into_decoder()?;
    // A decoder that cannot report orientation is treated as canonical.
    let orientation = decoder
        .orientation()
        .unwrap_or(Orientation::NoTransforms);
    let image = DynamicImage::from_decoder(decoder)?;
    Ok(normalize(image, orientation))
}

/// Decode an image file and normalize its orientation.
///
/// # Errors
///
/// Returns `PhotoEditError::Io` if the file cannot be read, or
/// `PhotoEditError::Decode` if its contents are not a supported image.
pub fn decode_normalized<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
    let bytes = std::fs::read(path)?;
    decode_normalized_bytes(&bytes)
}
