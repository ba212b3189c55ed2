//! Stylistic filters and auto-enhance
//!
//! Stateless per-pixel color transforms, independent of the masking
//! pipeline. Each filter takes an image and returns a new one; nothing is
//! mutated in place.

use image::{DynamicImage, Rgba, RgbaImage};

/// The built-in filter strip, in display order
pub const ALL_FILTERS: [PhotoFilter; 8] = [
    PhotoFilter::Original,
    PhotoFilter::Vivid,
    PhotoFilter::Mono,
    PhotoFilter::Fade,
    PhotoFilter::Chrome,
    PhotoFilter::Noir,
    PhotoFilter::Warm,
    PhotoFilter::Cool,
];

/// A stylistic filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoFilter {
    /// Identity
    Original,
    /// Saturation boost
    Vivid,
    /// Neutral grayscale
    Mono,
    /// Washed-out look: desaturated with lifted blacks
    Fade,
    /// Punchy contrast and saturation
    Chrome,
    /// High-contrast grayscale
    Noir,
    /// Warmer color temperature
    Warm,
    /// Cooler color temperature
    Cool,
}

impl PhotoFilter {
    /// Display name for the filter strip
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Original => "Original",
            Self::Vivid => "Vivid",
            Self::Mono => "Mono",
            Self::Fade => "Fade",
            Self::Chrome => "Chrome",
            Self::Noir => "Noir",
            Self::Warm => "Warm",
            Self::Cool => "Cool",
        }
    }

    /// Apply the filter, returning a new image of the same dimensions
    #[must_use]
    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Self::Original => image.clone(),
            Self::Vivid => map_rgb(image, |r, g, b| saturate(r, g, b, 1.35)),
            Self::Mono => map_rgb(image, |r, g, b| saturate(r, g, b, 0.0)),
            Self::Fade => map_rgb(image, |r, g, b| {
                let (r, g, b) = saturate(r, g, b, 0.6);
                (lift(r), lift(g), lift(b))
            }),
            Self::Chrome => map_rgb(image, |r, g, b| {
                let (r, g, b) = saturate(r, g, b, 1.2);
                (contrast(r, 1.15), contrast(g, 1.15), contrast(b, 1.15))
            }),
            Self::Noir => map_rgb(image, |r, g, b| {
                let (r, g, b) = saturate(r, g, b, 0.0);
                (contrast(r, 1.3), contrast(g, 1.3), contrast(b, 1.3))
            }),
            Self::Warm => map_rgb(image, |r, g, b| (r + 0.047, g, b - 0.047)),
            Self::Cool => map_rgb(image, |r, g, b| (r - 0.047, g, b + 0.047)),
        }
    }
}

/// Rec. 709 luma
fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Scale saturation around the pixel's luma. `amount` of 0 is grayscale,
/// 1 is identity, above 1 boosts.
fn saturate(r: f32, g: f32, b: f32, amount: f32) -> (f32, f32, f32) {
    let l = luma(r, g, b);
    (
        l + (r - l) * amount,
        l + (g - l) * amount,
        l + (b - l) * amount,
    )
}

/// Scale contrast around mid-gray
fn contrast(v: f32, amount: f32) -> f32 {
    (v - 0.5) * amount + 0.5
}

/// Lift blacks and compress highlights slightly
fn lift(v: f32) -> f32 {
    v * 0.85 + 0.12
}

/// Apply a per-pixel RGB transform in normalized f32 space, preserving the
/// alpha channel and image dimensions.
fn map_rgb(
    image: &DynamicImage,
    f: impl Fn(f32, f32, f32) -> (f32, f32, f32),
) -> DynamicImage {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let out = RgbaImage::from_fn(width, height, |x, y| {
        let p = rgba.get_pixel(x, y);
        let (r, g, b) = f(
            f32::from(p[0]) / 255.0,
            f32::from(p[1]) / 255.0,
            f32::from(p[2]) / 255.0,
        );
        Rgba([to_byte(r), to_byte(g), to_byte(b), p[3]])
    });
    DynamicImage::ImageRgba8(out)
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Automatic tone enhancement: per-channel percentile contrast stretch.
///
/// Maps each channel's 1st percentile to 0 and 99th percentile to 255,
/// linearly. Channels with no usable range are left untouched.
#[must_use]
pub fn auto_enhance(image: &DynamicImage) -> DynamicImage {
    let rgba = image.to_rgba8();
    let pixel_count = (rgba.width() as usize) * (rgba.height() as usize);
    if pixel_count == 0 {
        return image.clone();
    }

    // Per-channel histograms
    let mut histograms = [[0usize; 256]; 3];
    for p in rgba.pixels() {
        for (c, hist) in histograms.iter_mut().enumerate() {
            hist[p[c] as usize] += 1;
        }
    }

    let low_count = pixel_count / 100;
    let high_count = pixel_count - pixel_count / 100;
    let mut bounds = [(0u8, 255u8); 3];
    for (c, hist) in histograms.iter().enumerate() {
        let mut cumulative = 0usize;
        let mut low = 0u8;
        let mut high = 255u8;
        let mut low_found = false;
        for (value, &count) in hist.iter().enumerate() {
            cumulative += count;
            if !low_found && cumulative > low_count {
                low = value as u8;
                low_found = true;
            }
            if cumulative >= high_count {
                high = value as u8;
                break;
            }
        }
        bounds[c] = (low, high);
    }

    let (width, height) = rgba.dimensions();
    let out = RgbaImage::from_fn(width, height, |x, y| {
        let p = rgba.get_pixel(x, y);
        let mut stretched = [0u8; 4];
        stretched[3] = p[3];
        for c in 0..3 {
            let (low, high) = bounds[c];
            stretched[c] = if high > low {
                let v = (f32::from(p[c]) - f32::from(low)) / (f32::from(high) - f32::from(low));
                to_byte(v)
            } else {
                p[c]
            };
        }
        Rgba(stretched)
    });
    DynamicImage::ImageRgba8(out)
}
