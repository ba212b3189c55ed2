//! Composition stage
//!
//! Given the cached segmentation result and a background selection, produce
//! the final composited image. Pure and synchronous: identical inputs always
//! yield identical output bytes, so it can be re-invoked at interactive
//! rates on every background-selection change.

use crate::error::{PhotoEditError, Result};
use crate::types::{BackgroundSelection, SegmentationMask};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, GrayImage, Rgba, RgbaImage};
use tracing::{debug, instrument};

/// Per-channel linear interpolation with round-to-nearest.
///
/// `m == 255` reproduces the source byte exactly and `m == 0` the background
/// byte, which is what makes the hard-mask testable properties hold.
#[inline]
fn blend_channel(m: u32, src: u8, bg: u8) -> u8 {
    ((m * u32::from(src) + (255 - m) * u32::from(bg) + 127) / 255) as u8
}

/// Resample the mask onto the source pixel grid.
///
/// Horizontal and vertical scale factors are independent: the mask grid may
/// differ from the source in aspect, and the resize target is the source's
/// exact dimensions on both axes. Catmull-Rom keeps partial probabilities
/// continuous instead of snapping to nearest-neighbor blocks.
fn resample_mask(mask: &SegmentationMask, width: u32, height: u32) -> Result<GrayImage> {
    let gray = mask.to_image()?;
    if mask.dimensions == (width, height) {
        return Ok(gray);
    }
    Ok(image::imageops::resize(
        &gray,
        width,
        height,
        FilterType::CatmullRom,
    ))
}

/// Composite the masked subject over the selected background.
///
/// The mask is scaled up to the source's pixel grid (never the source down
/// to the mask's), the background is resolved to a full-frame field clipped
/// to the source extent, and the two are blended per pixel with the mask as
/// interpolation weight. Partial mask values produce partial blending, the
/// intended soft-matte behavior for hair and edges.
///
/// # Errors
///
/// Returns [`PhotoEditError::Composition`] for degenerate extents or a mask
/// that violates the mask/source contract (absent, inconsistent, or larger
/// than the source on either axis).
#[instrument(
    skip(background, mask, source),
    fields(
        background = background.kind(),
        mask = %format!("{}x{}", mask.dimensions.0, mask.dimensions.1),
        source = %format!("{}x{}", source.width(), source.height())
    )
)]
pub fn composite(
    background: &BackgroundSelection,
    mask: &SegmentationMask,
    source: &DynamicImage,
) -> Result<RgbaImage> {
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return Err(PhotoEditError::composition("source has zero-size extent"));
    }
    mask.validate_for_source((width, height))?;

    let weights = resample_mask(mask, width, height)?;
    let source_rgba = source.to_rgba8();

    // Resolve the background selection to a full-frame color field. Photo
    // backgrounds are stretched to fill on each axis independently; aspect
    // ratio is not preserved, and nothing is cropped or padded.
    let background_pixels: Option<RgbaImage> = match background {
        BackgroundSelection::Transparent | BackgroundSelection::Color(_) => None,
        BackgroundSelection::Photo(photo) => {
            if photo.width() == 0 || photo.height() == 0 {
                return Err(PhotoEditError::composition(
                    "background photo has zero-size extent",
                ));
            }
            debug!(
                from = %format!("{}x{}", photo.width(), photo.height()),
                to = %format!("{width}x{height}"),
                "stretching background photo to source frame"
            );
            Some(
                photo
                    .resize_exact(width, height, FilterType::CatmullRom)
                    .to_rgba8(),
            )
        },
    };
    let constant = match background {
        BackgroundSelection::Transparent => Rgba([0, 0, 0, 0]),
        BackgroundSelection::Color(c) => *c,
        BackgroundSelection::Photo(_) => Rgba([0, 0, 0, 0]),
    };

    let output = RgbaImage::from_fn(width, height, |x, y| {
        let m = u32::from(weights.get_pixel(x, y)[0]);
        let s = source_rgba.get_pixel(x, y);
        let b = background_pixels
            .as_ref()
            .map_or(constant, |bg| *bg.get_pixel(x, y));
        Rgba([
            blend_channel(m, s[0], b[0]),
            blend_channel(m, s[1], b[1]),
            blend_channel(m, s[2], b[2]),
            blend_channel(m, s[3], b[3]),
        ])
    });

    Ok(output)
}
