//! Deterministic capture backend for tests and demos.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::capture::CaptureBackend;
use crate::error::{MediaError, Result};
use crate::handle::DeviceTrack;
use crate::types::{MediaConstraints, SourceId, TrackKind};

/// A capture backend that fabricates tracks instead of touching devices.
///
/// Failure modes (permission denial, missing devices, unsupported display
/// capture) are switchable per instance so tests can drive every error path,
/// and the most recent display video track is kept reachable so a test can
/// end it "externally" the way a platform's stop-sharing chrome would.
pub struct SimulatedCapture {
    deny_user_media: AtomicBool,
    no_devices: AtomicBool,
    deny_display: AtomicBool,
    display_unsupported: AtomicBool,
    counter: AtomicU64,
    last_display_video: Mutex<Option<Arc<DeviceTrack>>>,
}

impl SimulatedCapture {
    pub fn new() -> Self {
        Self {
            deny_user_media: AtomicBool::new(false),
            no_devices: AtomicBool::new(false),
            deny_display: AtomicBool::new(false),
            display_unsupported: AtomicBool::new(false),
            counter: AtomicU64::new(0),
            last_display_video: Mutex::new(None),
        }
    }

    pub fn deny_user_media(&self, deny: bool) {
        self.deny_user_media.store(deny, Ordering::SeqCst);
    }

    pub fn set_no_devices(&self, missing: bool) {
        self.no_devices.store(missing, Ordering::SeqCst);
    }

    pub fn deny_display(&self, deny: bool) {
        self.deny_display.store(deny, Ordering::SeqCst);
    }

    pub fn set_display_unsupported(&self, unsupported: bool) {
        self.display_unsupported.store(unsupported, Ordering::SeqCst);
    }

    /// End the most recently opened display video track, as if the user hit
    /// the platform's own "stop sharing" control.
    pub fn end_display_track(&self) {
        if let Some(track) = self.last_display_video.lock().as_ref() {
            track.end();
        }
    }

    fn next_source(&self, prefix: &str) -> SourceId {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        SourceId(format!("sim-{}-{}", prefix, n))
    }
}

impl Default for SimulatedCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureBackend for SimulatedCapture {
    async fn open_user_media(&self, constraints: MediaConstraints) -> Result<Vec<Arc<DeviceTrack>>> {
        if self.deny_user_media.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied);
        }
        if self.no_devices.load(Ordering::SeqCst) {
            return Err(MediaError::DeviceUnavailable(
                "no capture devices present".to_string(),
            ));
        }
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(DeviceTrack::new(TrackKind::Audio, self.next_source("mic")));
        }
        if constraints.video {
            tracks.push(DeviceTrack::new(TrackKind::Video, self.next_source("cam")));
        }
        if tracks.is_empty() {
            return Err(MediaError::DeviceUnavailable(
                "constraints requested no tracks".to_string(),
            ));
        }
        Ok(tracks)
    }

    async fn open_display_media(&self) -> Result<Vec<Arc<DeviceTrack>>> {
        if self.display_unsupported.load(Ordering::SeqCst) {
            return Err(MediaError::Unsupported);
        }
        if self.deny_display.load(Ordering::SeqCst) {
            return Err(MediaError::PermissionDenied);
        }
        let track = DeviceTrack::new(TrackKind::Video, self.next_source("screen"));
        *self.last_display_video.lock() = Some(track.clone());
        Ok(vec![track])
    }
}
