//! Device track and media handle ownership.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::types::{CaptureKind, SourceId, TrackKind, TrackRef};

/// Identifier of an acquired [`MediaHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live device-level track.
///
/// Enablement is a device-level flag: a disabled track keeps its resources
/// but produces silence/black frames, mirroring how capture platforms treat
/// `enabled = false`. Stopping is terminal and happens at most once.
pub struct DeviceTrack {
    kind: TrackKind,
    source_id: SourceId,
    enabled: AtomicBool,
    stopped: AtomicBool,
    ended_tx: watch::Sender<bool>,
}

impl DeviceTrack {
    pub fn new(kind: TrackKind, source_id: SourceId) -> Arc<Self> {
        let (ended_tx, _ended_rx) = watch::channel(false);
        Arc::new(Self {
            kind,
            source_id,
            enabled: AtomicBool::new(true),
            stopped: AtomicBool::new(false),
            ended_tx,
        })
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn source_id(&self) -> &SourceId {
        &self.source_id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flip the enabled flag; returns the new value.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    /// Stop the track. Returns `true` only for the call that actually stopped
    /// it; later calls are no-ops.
    pub fn stop(&self) -> bool {
        let first = !self.stopped.swap(true, Ordering::SeqCst);
        if first {
            tracing::debug!("stopping {} track {}", self.kind, self.source_id);
            self.ended_tx.send_replace(true);
        }
        first
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Mark the track as ended by its source (device unplugged, the platform's
    /// "stop sharing" chrome, ...). The track is not stopped by this; whoever
    /// watches [`DeviceTrack::ended`] decides what to do.
    pub fn end(&self) {
        self.ended_tx.send_replace(true);
    }

    pub fn has_ended(&self) -> bool {
        *self.ended_tx.borrow()
    }

    /// Watch for the ended signal.
    pub fn ended(&self) -> watch::Receiver<bool> {
        self.ended_tx.subscribe()
    }

    /// A view of this track's current state.
    pub fn track_ref(&self) -> TrackRef {
        TrackRef {
            kind: self.kind,
            enabled: self.is_enabled(),
            source_id: self.source_id.clone(),
        }
    }
}

impl std::fmt::Debug for DeviceTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTrack")
            .field("kind", &self.kind)
            .field("source_id", &self.source_id)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// A set of device tracks acquired together (camera+microphone, or display).
///
/// Scoped acquisition: the underlying tracks are stopped exactly once on
/// every exit path. Explicit release goes through
/// [`MediaNegotiator`](crate::negotiator::MediaNegotiator); dropping the last
/// reference stops whatever is still running.
pub struct MediaHandle {
    id: HandleId,
    kind: CaptureKind,
    tracks: Vec<Arc<DeviceTrack>>,
}

impl MediaHandle {
    pub fn new(kind: CaptureKind, tracks: Vec<Arc<DeviceTrack>>) -> Self {
        Self {
            id: HandleId::new(),
            kind,
            tracks,
        }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn capture_kind(&self) -> CaptureKind {
        self.kind
    }

    pub fn tracks(&self) -> &[Arc<DeviceTrack>] {
        &self.tracks
    }

    /// First track of the given kind, if any.
    pub fn track(&self, kind: TrackKind) -> Option<&Arc<DeviceTrack>> {
        self.tracks.iter().find(|t| t.kind() == kind)
    }

    /// View of the first track of the given kind.
    pub fn track_ref(&self, kind: TrackKind) -> Option<TrackRef> {
        self.track(kind).map(|t| t.track_ref())
    }

    /// Stop all tracks; idempotent per track.
    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.tracks.iter().all(|t| t.is_stopped())
    }
}

impl Drop for MediaHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for MediaHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHandle")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("tracks", &self.tracks)
            .finish()
    }
}
