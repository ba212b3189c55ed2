//! Configuration for the segmentation stage

use crate::error::{PhotoEditError, Result};
use serde::{Deserialize, Serialize};

/// Quality level requested from the segmentation capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QualityLevel {
    /// Fastest available model path
    Fast,
    /// Balanced quality/latency
    Balanced,
    /// Highest available quality (default for still-photo editing)
    #[default]
    Accurate,
}

/// Output format requested from the segmentation capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaskFormat {
    /// Single-channel 8-bit probability mask
    #[default]
    EightBit,
}

/// Configuration for [`compute_mask`](crate::segmentation::compute_mask)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Quality level requested from the backend
    pub quality: QualityLevel,

    /// Mask output format requested from the backend
    pub mask_format: MaskFormat,

    /// Optional cap on the longest input axis fed to the backend. Inputs
    /// larger than this are downscaled (aspect preserved) before tensor
    /// conversion; the cached source image keeps its full resolution.
    pub max_input_dimension: Option<u32>,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            quality: QualityLevel::Accurate,
            mask_format: MaskFormat::EightBit,
            max_input_dimension: None,
        }
    }
}

impl SegmentationConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> SegmentationConfigBuilder {
        SegmentationConfigBuilder::new()
    }
}

/// Builder for [`SegmentationConfig`]
#[derive(Debug, Default)]
pub struct SegmentationConfigBuilder {
    config: SegmentationConfig,
}

impl SegmentationConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: SegmentationConfig::default(),
        }
    }

    #[must_use]
    pub fn quality(mut self, quality: QualityLevel) -> Self {
        self.config.quality = quality;
        self
    }

    #[must_use]
    pub fn mask_format(mut self, format: MaskFormat) -> Self {
        self.config.mask_format = format;
        self
    }

    #[must_use]
    pub fn max_input_dimension(mut self, max: u32) -> Self {
        self.config.max_input_dimension = Some(max);
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `PhotoEditError::InvalidConfig` if `max_input_dimension` is
    /// too small to carry any usable signal.
    pub fn build(self) -> Result<SegmentationConfig> {
        if let Some(max) = self.config.max_input_dimension {
            if max < 16 {
                return Err(PhotoEditError::invalid_config(format!(
                    "max_input_dimension must be >= 16, got {max}"
                )));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_requests_highest_quality() {
        let config = SegmentationConfig::default();
        assert_eq!(config.quality, QualityLevel::Accurate);
        assert_eq!(config.mask_format, MaskFormat::EightBit);
        assert_eq!(config.max_input_dimension, None);
    }

    #[test]
    fn test_builder_validation() {
        let config = SegmentationConfig::builder()
            .quality(QualityLevel::Fast)
            .max_input_dimension(512)
            .build()
            .unwrap();
        assert_eq!(config.quality, QualityLevel::Fast);
        assert_eq!(config.max_input_dimension, Some(512));

        let err = SegmentationConfig::builder()
            .max_input_dimension(8)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_input_dimension"));
    }
}
