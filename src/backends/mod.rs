//! Segmentation backend implementations
//!
//! Real model backends (ONNX and friends) are injected by the embedding
//! application through the [`SegmentationBackend`] trait; this crate only
//! bundles a deterministic heuristic backend for tests and model-free use.
//!
//! [`SegmentationBackend`]: crate::segmentation::SegmentationBackend

pub mod mock;

pub use mock::MockSegmenter;
