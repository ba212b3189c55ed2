//! End-to-end workflows: encoded bytes in, composited image out

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use photoedit::{
    replace_background_bytes, segment_bytes, BackgroundSelection, MockSegmenter, PhotoEditError,
    SegmentationConfig,
};
use std::io::Cursor;
use std::sync::Arc;

/// White field with a dark subject covering the middle third, PNG-encoded
fn subject_png(width: u32, height: u32) -> Vec<u8> {
    let mut img = RgbImage::from_pixel(width, height, Rgb([240, 240, 240]));
    for y in height / 3..2 * height / 3 {
        for x in width / 3..2 * width / 3 {
            img.put_pixel(x, y, Rgb([20, 20, 60]));
        }
    }
    encode_png(&DynamicImage::ImageRgb8(img))
}

fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn backend() -> Arc<MockSegmenter> {
    Arc::new(MockSegmenter::new())
}

#[tokio::test]
async fn test_segment_bytes_mask_within_source_bounds() {
    let result = segment_bytes(
        &subject_png(96, 72),
        backend(),
        &SegmentationConfig::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.dimensions(), (96, 72));
    let (mw, mh) = result.mask.dimensions;
    assert!(mw <= 96 && mh <= 72);
    assert!(result.mask.foreground_ratio() > 0.0);
}

#[tokio::test]
async fn test_blank_field_reports_no_person() {
    let blank = encode_png(&DynamicImage::ImageRgb8(RgbImage::from_pixel(
        64,
        64,
        Rgb([180, 180, 180]),
    )));

    let err = segment_bytes(&blank, backend(), &SegmentationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PhotoEditError::NoPersonDetected));
}

#[tokio::test]
async fn test_malformed_bytes_fail_at_decode() {
    let err = segment_bytes(b"not an image", backend(), &SegmentationConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PhotoEditError::Decode(_)));
}

#[tokio::test]
async fn test_replace_background_all_variants() {
    let png = subject_png(120, 90);
    let config = SegmentationConfig::default();

    let selections = [
        BackgroundSelection::Transparent,
        BackgroundSelection::color(255, 0, 0),
        BackgroundSelection::Photo(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            50,
            50,
            Rgb([0, 0, 200]),
        ))),
    ];

    for selection in selections {
        let out = replace_background_bytes(&png, &selection, backend(), &config)
            .await
            .unwrap();
        assert_eq!(out.dimensions(), (120, 90), "{}", selection.kind());
    }
}

#[tokio::test]
async fn test_transparent_background_cuts_out_edges() {
    let png = subject_png(96, 96);
    let out = replace_background_bytes(
        &png,
        &BackgroundSelection::Transparent,
        backend(),
        &SegmentationConfig::default(),
    )
    .await
    .unwrap();

    // Border pixels are background and end up (nearly) transparent; the
    // subject's center stays (nearly) opaque.
    assert!(out.get_pixel(0, 0)[3] < 40);
    assert!(out.get_pixel(48, 48)[3] > 215);
}

#[tokio::test]
async fn test_output_survives_png_round_trip() -> anyhow::Result<()> {
    let png = subject_png(64, 48);
    let out = replace_background_bytes(
        &png,
        &BackgroundSelection::color(10, 20, 30),
        backend(),
        &SegmentationConfig::default(),
    )
    .await?;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("edited.png");
    out.save(&path)?;

    let reloaded = photoedit::decode_normalized(&path)?;
    assert_eq!(reloaded.dimensions(), (64, 48));
    assert_eq!(reloaded.to_rgba8().as_raw(), out.as_raw());
    Ok(())
}

#[tokio::test]
async fn test_capped_input_still_yields_valid_mask() {
    let config = SegmentationConfig::builder()
        .max_input_dimension(48)
        .build()
        .unwrap();

    let result = segment_bytes(&subject_png(192, 144), backend(), &config)
        .await
        .unwrap();

    // Source keeps full resolution; the mask comes from the capped input
    // and stays within the source's bounds.
    assert_eq!(result.dimensions(), (192, 144));
    let (mw, mh) = result.mask.dimensions;
    assert!(mw <= 48 && mh <= 48);
}
