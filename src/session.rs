//! Editing-session orchestration
//!
//! Owns the `Idle -> Segmenting -> Ready` state machine, caches the
//! segmentation result for the duration of the session, and fans composite
//! requests out to background workers. Results are delivered to a single
//! preview slot with stale-result suppression: rapid-fire selection changes
//! are not serialized, so each request carries a monotonically increasing
//! sequence number and a result whose sequence is no longer the latest
//! issued is discarded on arrival instead of overwriting a newer preview.

use crate::compose;
use crate::config::SegmentationConfig;
use crate::error::{PhotoEditError, Result};
use crate::segmentation::{compute_mask, SegmentationBackend};
use crate::types::{BackgroundSelection, SegmentationResult};
use image::metadata::Orientation;
use image::{DynamicImage, RgbaImage};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Session phase, without the cached data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No segmentation in progress or cached
    Idle,
    /// Segmentation running on a background worker
    Segmenting,
    /// Segmentation result cached; composite requests accepted
    Ready,
}

enum SessionState {
    Idle,
    Segmenting,
    Ready(Arc<SegmentationResult>),
}

/// A composited preview frame, tagged with its request sequence number
#[derive(Debug, Clone)]
pub struct Preview {
    /// Sequence number of the request that produced this frame
    pub seq: u64,
    /// The composited image
    pub image: RgbaImage,
}

/// One photo-editing session
///
/// Segmentation runs once per photo; the result is written exactly once and
/// shared read-only (via `Arc`) across every composite call the session
/// triggers afterwards, so background changes never re-run the model.
pub struct EditSession {
    backend: Arc<dyn SegmentationBackend>,
    config: SegmentationConfig,
    state: Arc<Mutex<SessionState>>,
    last_issued: Arc<AtomicU64>,
    preview: Arc<watch::Sender<Option<Preview>>>,
}

impl EditSession {
    /// Create a new idle session using the given segmentation backend
    #[must_use]
    pub fn new(backend: Arc<dyn SegmentationBackend>, config: SegmentationConfig) -> Self {
        let (preview, _) = watch::channel(None);
        Self {
            backend,
            config,
            state: Arc::new(Mutex::new(SessionState::Idle)),
            last_issued: Arc::new(AtomicU64::new(0)),
            preview: Arc::new(preview),
        }
    }

    /// Current session phase
    pub fn phase(&self) -> SessionPhase {
        match *self.state.lock().expect("session state lock poisoned") {
            SessionState::Idle => SessionPhase::Idle,
            SessionState::Segmenting => SessionPhase::Segmenting,
            SessionState::Ready(_) => SessionPhase::Ready,
        }
    }

    /// The cached segmentation result, if the session is ready
    pub fn segmentation(&self) -> Option<Arc<SegmentationResult>> {
        match *self.state.lock().expect("session state lock poisoned") {
            SessionState::Ready(ref result) => Some(Arc::clone(result)),
            _ => None,
        }
    }

    /// Subscribe to preview updates
    pub fn subscribe(&self) -> watch::Receiver<Option<Preview>> {
        self.preview.subscribe()
    }

    /// Run segmentation for this session's photo.
    ///
    /// On success the session moves to `Ready`, caches the result, and
    /// immediately issues a transparent-background composite so the caller
    /// has an initial cutout preview. On failure the session returns to
    /// `Idle` and the error is surfaced to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoEditError::NoPersonDetected`] when segmentation finds
    /// no subject; the caller surfaces this as a user-facing notice and must
    /// not proceed to composition.
    pub async fn remove_background(
        &self,
        image: DynamicImage,
        orientation: Orientation,
    ) -> Result<()> {
        {
            let mut state = self.state.lock().expect("session state lock poisoned");
            *state = SessionState::Segmenting;
        }

        match compute_mask(image, orientation, Arc::clone(&self.backend), &self.config).await {
            Ok(result) => {
                info!(
                    foreground_ratio = result.mask.foreground_ratio(),
                    "segmentation succeeded"
                );
                {
                    let mut state = self.state.lock().expect("session state lock poisoned");
                    *state = SessionState::Ready(Arc::new(result));
                }
                // Initial preview: subject cut out onto transparency
                let handle = self.select_background(BackgroundSelection::Transparent)?;
                let _ = handle.await;
                Ok(())
            },
            Err(e) => {
                let mut state = self.state.lock().expect("session state lock poisoned");
                *state = SessionState::Idle;
                Err(e)
            },
        }
    }

    /// Trigger one composite call for a new background selection.
    ///
    /// Returns a handle resolving to the request's sequence number. The
    /// composite itself runs on a blocking worker; its result lands in the
    /// preview slot only if the request is still the latest issued when the
    /// result arrives. Composition failures during live preview are logged
    /// and dropped so the prior preview stays on screen.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoEditError::Composition`] when the session holds no
    /// cached segmentation result (a contract violation, not tolerated
    /// silently).
    pub fn select_background(
        &self,
        selection: BackgroundSelection,
    ) -> Result<JoinHandle<u64>> {
        let cached = self.segmentation().ok_or_else(|| {
            PhotoEditError::composition("composite requested without a segmentation result")
        })?;

        let seq = self.last_issued.fetch_add(1, Ordering::SeqCst) + 1;
        let last_issued = Arc::clone(&self.last_issued);
        let preview = Arc::clone(&self.preview);
        debug!(seq, background = selection.kind(), "composite request issued");

        let handle = tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || {
                compose::composite(&selection, &cached.mask, &cached.image)
            })
            .await;

            match outcome {
                Ok(Ok(image)) => {
                    if seq != last_issued.load(Ordering::SeqCst) {
                        debug!(seq, "discarding stale composite result");
                    } else {
                        preview.send_if_modified(|slot| match slot {
                            // Never let an older frame overwrite a newer one
                            Some(current) if current.seq >= seq => false,
                            _ => {
                                *slot = Some(Preview { seq, image });
                                true
                            },
                        });
                    }
                },
                Ok(Err(e)) => {
                    // Recoverable: keep the previous preview on screen
                    warn!(seq, error = %e, "composite failed; keeping prior preview");
                },
                Err(e) => {
                    warn!(seq, error = %e, "composite task did not complete");
                },
            }
            seq
        });

        Ok(handle)
    }

    /// Current preview frame, if any
    pub fn preview(&self) -> Option<Preview> {
        self.preview.borrow().clone()
    }

    /// Apply the edit: hand back the current preview and reset to `Idle`
    pub fn apply(&self) -> Option<RgbaImage> {
        let applied = self.preview.send_replace(None).map(|p| p.image);
        let mut state = self.state.lock().expect("session state lock poisoned");
        *state = SessionState::Idle;
        applied
    }

    /// Cancel the edit: drop the cached result and preview, reset to `Idle`
    pub fn cancel(&self) {
        self.preview.send_replace(None);
        let mut state = self.state.lock().expect("session state lock poisoned");
        *state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MockSegmenter;
    use image::{Rgb, RgbImage};

    fn subject_image() -> DynamicImage {
        let mut img = RgbImage::from_pixel(96, 72, Rgb([240, 240, 240]));
        for y in 24..48 {
            for x in 32..64 {
                img.put_pixel(x, y, Rgb([20, 20, 60]));
            }
        }
        DynamicImage::ImageRgb8(img)
    }

    fn new_session() -> EditSession {
        EditSession::new(Arc::new(MockSegmenter::new()), SegmentationConfig::default())
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let session = new_session();
        assert_eq!(session.phase(), SessionPhase::Idle);

        session
            .remove_background(subject_image(), Orientation::NoTransforms)
            .await
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::Ready);
        assert!(session.segmentation().is_some());

        // Initial cutout preview was issued automatically
        let preview = session.preview().expect("initial preview");
        assert_eq!(preview.image.dimensions(), (96, 72));

        let applied = session.apply();
        assert!(applied.is_some());
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.preview().is_none());
    }

    #[tokio::test]
    async fn test_no_person_returns_to_idle() {
        let session = new_session();
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([200, 200, 200])));

        let err = session
            .remove_background(blank, Orientation::NoTransforms)
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoEditError::NoPersonDetected));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.preview().is_none());
    }

    #[tokio::test]
    async fn test_composite_without_segmentation_rejected() {
        let session = new_session();
        let err = session
            .select_background(BackgroundSelection::Transparent)
            .unwrap_err();
        assert!(matches!(err, PhotoEditError::Composition(_)));
    }

    #[tokio::test]
    async fn test_cancel_clears_cached_result() {
        let session = new_session();
        session
            .remove_background(subject_image(), Orientation::NoTransforms)
            .await
            .unwrap();

        session.cancel();
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.segmentation().is_none());
        assert!(session.preview().is_none());
    }
}
