//! Mock segmentation backend for testing and debugging
//!
//! Scores each pixel by its color distance from the image border, on the
//! assumption that the border is background. No model files required, and
//! the output is fully deterministic for a given input.

use crate::config::{QualityLevel, SegmentationConfig};
use crate::error::Result;
use crate::segmentation::SegmentationBackend;
use ndarray::{Array2, Array3};

/// Color distance below which a pixel counts as background
const BACKGROUND_TOLERANCE: f32 = 0.05;

/// Color distance at which a pixel counts as fully foreground
const FOREGROUND_SATURATION: f32 = 0.35;

/// Minimum peak distance for the image to contain a subject at all
const SUBJECT_THRESHOLD: f32 = 0.08;

/// Deterministic heuristic segmenter
///
/// Useful for exercising the full pipeline without a real model: a uniform
/// color field yields no subject, while any region that deviates from the
/// border color gets a soft foreground probability.
#[derive(Debug, Default)]
pub struct MockSegmenter;

impl MockSegmenter {
    /// Create a new mock segmenter
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Output grid stride for the requested quality level
    fn stride(quality: QualityLevel) -> usize {
        match quality {
            QualityLevel::Fast => 8,
            QualityLevel::Balanced => 6,
            QualityLevel::Accurate => 4,
        }
    }

    /// Mean RGB color of the one-pixel border ring
    fn border_mean(input: &Array3<f32>) -> [f32; 3] {
        let (_, height, width) = input.dim();
        let mut sum = [0.0f32; 3];
        let mut count = 0u32;
        for y in 0..height {
            for x in 0..width {
                if y != 0 && y != height - 1 && x != 0 && x != width - 1 {
                    continue;
                }
                for (c, acc) in sum.iter_mut().enumerate() {
                    *acc += input[[c, y, x]];
                }
                count += 1;
            }
        }
        if count > 0 {
            for acc in &mut sum {
                *acc /= count as f32;
            }
        }
        sum
    }

    /// RMS color distance from the border mean at (y, x)
    fn distance(input: &Array3<f32>, border: [f32; 3], y: usize, x: usize) -> f32 {
        let mut sq = 0.0f32;
        for (c, b) in border.iter().enumerate() {
            let d = input[[c, y, x]] - b;
            sq += d * d;
        }
        (sq / 3.0).sqrt()
    }
}

impl SegmentationBackend for MockSegmenter {
    fn segment(
        &self,
        input: &Array3<f32>,
        config: &SegmentationConfig,
    ) -> Result<Option<Array2<f32>>> {
        let (_, height, width) = input.dim();
        if height == 0 || width == 0 {
            return Ok(None);
        }

        let stride = Self::stride(config.quality);
        let grid_h = height.div_ceil(stride);
        let grid_w = width.div_ceil(stride);
        let border = Self::border_mean(input);

        let mut grid = Array2::<f32>::zeros((grid_h, grid_w));
        let mut peak = 0.0f32;
        for gy in 0..grid_h {
            for gx in 0..grid_w {
                // Mean distance over the stride x stride block
                let y0 = gy * stride;
                let x0 = gx * stride;
                let y1 = (y0 + stride).min(height);
                let x1 = (x0 + stride).min(width);
                let mut acc = 0.0f32;
                for y in y0..y1 {
                    for x in x0..x1 {
                        acc += Self::distance(input, border, y, x);
                    }
                }
                let dist = acc / ((y1 - y0) * (x1 - x0)) as f32;
                peak = peak.max(dist);
                grid[[gy, gx]] = ((dist - BACKGROUND_TOLERANCE)
                    / (FOREGROUND_SATURATION - BACKGROUND_TOLERANCE))
                    .clamp(0.0, 1.0);
            }
        }

        if peak < SUBJECT_THRESHOLD {
            return Ok(None);
        }
        Ok(Some(grid))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
