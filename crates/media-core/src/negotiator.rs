//! The media negotiator: acquisition, release, and in-place track swaps.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::capture::CaptureBackend;
use crate::error::{MediaError, Result};
use crate::handle::MediaHandle;
use crate::types::{CaptureKind, MediaConstraints, OutboundSenders, TrackKind, TrackRef};

/// Owns local capture resources and performs outbound track replacement
/// without renegotiating the session.
///
/// Holds at most one camera/microphone handle and one display handle. The
/// negotiator is the sole mutator of device-level enablement; the session
/// layer above decides *when* handles are acquired and released.
pub struct MediaNegotiator {
    backend: Arc<dyn CaptureBackend>,
    local: Mutex<Option<Arc<MediaHandle>>>,
    display: Mutex<Option<Arc<MediaHandle>>>,
}

impl MediaNegotiator {
    pub fn new(backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            backend,
            local: Mutex::new(None),
            display: Mutex::new(None),
        }
    }

    /// Acquire camera/microphone capture.
    ///
    /// A successful acquisition supersedes any previously held local handle:
    /// the old handle's tracks are stopped before the new one is exposed.
    pub async fn acquire_local_media(
        &self,
        constraints: MediaConstraints,
    ) -> Result<Arc<MediaHandle>> {
        let tracks = self.backend.open_user_media(constraints).await?;
        let handle = Arc::new(MediaHandle::new(CaptureKind::Camera, tracks));
        tracing::info!("acquired local media handle {}", handle.id());
        if let Some(previous) = self.local.lock().replace(handle.clone()) {
            tracing::debug!("superseding local media handle {}", previous.id());
            previous.stop();
        }
        Ok(handle)
    }

    /// Acquire display/screen capture; supersedes any held display handle.
    pub async fn acquire_display_media(&self) -> Result<Arc<MediaHandle>> {
        let tracks = self.backend.open_display_media().await?;
        let handle = Arc::new(MediaHandle::new(CaptureKind::Display, tracks));
        tracing::info!("acquired display media handle {}", handle.id());
        if let Some(previous) = self.display.lock().replace(handle.clone()) {
            previous.stop();
        }
        Ok(handle)
    }

    /// Stop and drop the local handle; safe to call on every exit path.
    pub fn release_local_media(&self) -> Option<Arc<MediaHandle>> {
        let released = self.local.lock().take();
        if let Some(handle) = &released {
            handle.stop();
            tracing::info!("released local media handle {}", handle.id());
        }
        released
    }

    /// Stop and drop the display handle; safe to call on every exit path.
    pub fn release_display_media(&self) -> Option<Arc<MediaHandle>> {
        let released = self.display.lock().take();
        if let Some(handle) = &released {
            handle.stop();
            tracing::info!("released display media handle {}", handle.id());
        }
        released
    }

    pub fn local_handle(&self) -> Option<Arc<MediaHandle>> {
        self.local.lock().clone()
    }

    pub fn display_handle(&self) -> Option<Arc<MediaHandle>> {
        self.display.lock().clone()
    }

    /// The handle currently feeding the local preview: the display handle
    /// while screen-sharing, the camera handle otherwise.
    pub fn preview_source(&self) -> Option<Arc<MediaHandle>> {
        self.display_handle().or_else(|| self.local_handle())
    }

    /// Flip the enabled flag of the local track of `kind`; returns the new
    /// value. Requires a held local handle with a track of that kind.
    pub fn toggle_track(&self, kind: TrackKind) -> Result<bool> {
        let handle = self.local_handle().ok_or(MediaError::NoLocalMedia)?;
        let track = handle
            .track(kind)
            .ok_or_else(|| MediaError::DeviceUnavailable(format!("no local {} track", kind)))?;
        let enabled = track.toggle();
        tracing::debug!("local {} track now enabled={}", kind, enabled);
        Ok(enabled)
    }

    /// Set the enabled flag of the local track of `kind`; returns the
    /// previous value.
    pub fn set_track_enabled(&self, kind: TrackKind, enabled: bool) -> Result<bool> {
        let handle = self.local_handle().ok_or(MediaError::NoLocalMedia)?;
        let track = handle
            .track(kind)
            .ok_or_else(|| MediaError::DeviceUnavailable(format!("no local {} track", kind)))?;
        let previous = track.is_enabled();
        track.set_enabled(enabled);
        Ok(previous)
    }

    /// Swap the sender of matching `kind` in place, returning the previous
    /// track. Fails with [`MediaError::NoActiveSender`] if no sender of that
    /// kind is attached.
    pub fn replace_outbound_track(
        &self,
        senders: &mut OutboundSenders,
        kind: TrackKind,
        new_track: TrackRef,
    ) -> Result<TrackRef> {
        match senders.slot_mut(kind) {
            Some(current) => {
                let previous = std::mem::replace(current, new_track);
                tracing::debug!(
                    "replaced outbound {} sender {} -> {}",
                    kind,
                    previous.source_id,
                    current.source_id
                );
                Ok(previous)
            }
            None => Err(MediaError::NoActiveSender { kind }),
        }
    }

    /// Release everything this negotiator holds.
    pub fn release_all(&self) {
        self.release_display_media();
        self.release_local_media();
    }
}
