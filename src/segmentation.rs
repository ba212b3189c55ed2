//! Segmentation stage
//!
//! Runs the external person-segmentation capability on an image and yields
//! the normalized source pixels plus the raw probability mask. The capability
//! itself lives behind [`SegmentationBackend`]; model inference is the one
//! high-latency operation in the pipeline and always runs on a blocking
//! worker, never on the caller's executor thread.

use crate::config::SegmentationConfig;
use crate::error::{PhotoEditError, Result};
use crate::orientation;
use crate::types::{SegmentationMask, SegmentationResult};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, RgbImage};
use instant::Instant;
use ndarray::{Array2, Array3};
use std::sync::Arc;
use tracing::{debug, instrument};

/// External person-segmentation capability
///
/// Input is a normalized CHW tensor of RGB values in `[0, 1]`; output is a
/// per-pixel foreground probability grid in `[0, 1]` whose resolution must
/// not exceed the input's on either axis. Returning `Ok(None)` signals that
/// no person was found. Invoked at most once per segmentation request.
pub trait SegmentationBackend: Send + Sync {
    /// Run segmentation on the input tensor
    ///
    /// # Errors
    ///
    /// Backend-internal failures (model load, inference, invalid state).
    /// The stage collapses these to [`PhotoEditError::NoPersonDetected`].
    fn segment(
        &self,
        input: &Array3<f32>,
        config: &SegmentationConfig,
    ) -> Result<Option<Array2<f32>>>;

    /// Backend name, for logging
    fn name(&self) -> &'static str;
}

/// Convert an RGB image to a normalized CHW tensor
#[must_use]
pub fn image_to_tensor(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array3::<f32>::zeros((3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        let (xi, yi) = (x as usize, y as usize);
        tensor[[0, yi, xi]] = f32::from(pixel[0]) / 255.0;
        tensor[[1, yi, xi]] = f32::from(pixel[1]) / 255.0;
        tensor[[2, yi, xi]] = f32::from(pixel[2]) / 255.0;
    }
    tensor
}

/// Quantize a probability grid into an 8-bit segmentation mask
#[must_use]
pub fn grid_to_mask(grid: &Array2<f32>) -> SegmentationMask {
    let (height, width) = grid.dim();
    let data = grid
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    SegmentationMask::new(data, (width as u32, height as u32))
}

/// Compute a segmentation mask for `image`.
///
/// Normalizes the image's orientation, invokes the backend once on a
/// blocking worker, and pairs the resulting mask with the normalized source
/// pixels. The result is not cached here; the caller owns its lifetime.
///
/// # Errors
///
/// Returns [`PhotoEditError::NoPersonDetected`] when the backend reports no
/// subject or fails internally. The underlying cause is logged at debug
/// level; both collapse to the same user-visible outcome.
#[instrument(
    skip(image, backend, config),
    fields(
        backend = backend.name(),
        quality = ?config.quality,
        dimensions = %format!("{}x{}", image.width(), image.height())
    )
)]
pub async fn compute_mask(
    image: DynamicImage,
    orientation: Orientation,
    backend: Arc<dyn SegmentationBackend>,
    config: &SegmentationConfig,
) -> Result<SegmentationResult> {
    let image = orientation::normalize(image, orientation);
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        debug!("degenerate zero-size input");
        return Err(PhotoEditError::NoPersonDetected);
    }

    // Downscale the inference input if configured; the cached source keeps
    // its full resolution, so the mask stays <= source on both axes.
    let tensor = match config.max_input_dimension {
        Some(max) if width.max(height) > max => {
            image_to_tensor(&image.resize(max, max, FilterType::Triangle).to_rgb8())
        },
        _ => image_to_tensor(&image.to_rgb8()),
    };

    let task_config = config.clone();
    let inference_start = Instant::now();
    let outcome =
        tokio::task::spawn_blocking(move || backend.segment(&tensor, &task_config)).await;
    debug!(
        inference_ms = inference_start.elapsed().as_millis() as u64,
        "segmentation inference finished"
    );

    let grid = match outcome {
        Ok(Ok(Some(grid))) => grid,
        Ok(Ok(None)) => {
            debug!("backend found no subject");
            return Err(PhotoEditError::NoPersonDetected);
        },
        Ok(Err(e)) => {
            debug!(error = %e, "segmentation backend failed");
            return Err(PhotoEditError::NoPersonDetected);
        },
        Err(e) => {
            debug!(error = %e, "segmentation task did not complete");
            return Err(PhotoEditError::NoPersonDetected);
        },
    };

    let mask = grid_to_mask(&grid);
    match SegmentationResult::new(image, mask) {
        Ok(result) => Ok(result),
        Err(e) => {
            // Capability contract violation (grid larger than the source)
            debug!(error = %e, "backend returned an oversized mask grid");
            Err(PhotoEditError::NoPersonDetected)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use ndarray::Array2;

    struct FixedGridBackend {
        grid: Option<Array2<f32>>,
        fail: bool,
    }

    impl SegmentationBackend for FixedGridBackend {
        fn segment(
            &self,
            _input: &Array3<f32>,
            _config: &SegmentationConfig,
        ) -> Result<Option<Array2<f32>>> {
            if self.fail {
                return Err(PhotoEditError::composition("backend exploded"));
            }
            Ok(self.grid.clone())
        }

        fn name(&self) -> &'static str {
            "fixed-grid"
        }
    }

    fn test_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 200, 30])))
    }

    #[test]
    fn test_image_to_tensor_layout() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));

        let tensor = image_to_tensor(&img);
        assert_eq!(tensor.dim(), (3, 1, 2));
        assert!((tensor[[0, 0, 0]] - 1.0).abs() < f32::EPSILON);
        assert!((tensor[[2, 0, 1]] - 1.0).abs() < f32::EPSILON);
        assert!(tensor[[1, 0, 0]].abs() < f32::EPSILON);
    }

    #[test]
    fn test_grid_to_mask_quantization() {
        let grid = Array2::from_shape_vec((1, 4), vec![0.0, 0.5, 1.0, 2.5]).unwrap();
        let mask = grid_to_mask(&grid);
        assert_eq!(mask.dimensions, (4, 1));
        assert_eq!(mask.data, vec![0, 128, 255, 255]);
    }

    #[tokio::test]
    async fn test_compute_mask_success() {
        let backend = Arc::new(FixedGridBackend {
            grid: Some(Array2::from_elem((4, 5), 0.8)),
            fail: false,
        });
        let config = SegmentationConfig::default();

        let result = compute_mask(test_image(10, 8), Orientation::NoTransforms, backend, &config)
            .await
            .unwrap();

        assert_eq!(result.dimensions(), (10, 8));
        assert_eq!(result.mask.dimensions, (5, 4));
        assert!(result.mask.data.iter().all(|&v| v == 204));
    }

    #[tokio::test]
    async fn test_compute_mask_no_subject() {
        let backend = Arc::new(FixedGridBackend {
            grid: None,
            fail: false,
        });
        let config = SegmentationConfig::default();

        let err = compute_mask(test_image(4, 4), Orientation::NoTransforms, backend, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoEditError::NoPersonDetected));
    }

    #[tokio::test]
    async fn test_backend_failure_collapses_to_no_person() {
        let backend = Arc::new(FixedGridBackend {
            grid: None,
            fail: true,
        });
        let config = SegmentationConfig::default();

        let err = compute_mask(test_image(4, 4), Orientation::NoTransforms, backend, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoEditError::NoPersonDetected));
    }

    #[tokio::test]
    async fn test_oversized_grid_rejected() {
        let backend = Arc::new(FixedGridBackend {
            grid: Some(Array2::from_elem((16, 16), 1.0)),
            fail: false,
        });
        let config = SegmentationConfig::default();

        let err = compute_mask(test_image(4, 4), Orientation::NoTransforms, backend, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoEditError::NoPersonDetected));
    }

    #[tokio::test]
    async fn test_orientation_normalized_before_masking() {
        // 8x4 source rotated 90° becomes 4x8; the mask grid must be checked
        // against the normalized dimensions, not the raw ones.
        let backend = Arc::new(FixedGridBackend {
            grid: Some(Array2::from_elem((8, 4), 0.5)),
            fail: false,
        });
        let config = SegmentationConfig::default();

        let result = compute_mask(test_image(8, 4), Orientation::Rotate90, backend, &config)
            .await
            .unwrap();
        assert_eq!(result.dimensions(), (4, 8));
    }
}
