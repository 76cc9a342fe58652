//! Media toggles: mute, camera, and screen share.

use std::sync::Arc;

use peercall_media_core::{HandleId, MediaError, TrackKind};

use crate::errors::Result;
use crate::events::SessionEvent;

use super::{CallSessionManager, CallSlot};

impl CallSessionManager {
    /// Flip the local audio track's enabled flag. Returns the new muted
    /// state. Valid whenever a local media handle exists; effective in and
    /// out of calls.
    pub async fn toggle_mute(&self) -> Result<bool> {
        let mut slot = self.slot.lock().await;
        let enabled = self.negotiator.toggle_track(TrackKind::Audio)?;
        if let Some(session) = slot.session.as_mut() {
            session.senders.set_enabled(TrackKind::Audio, enabled);
        }
        drop(slot);
        self.bus
            .publish(SessionEvent::MicrophoneStateChanged { muted: !enabled })
            .await;
        Ok(!enabled)
    }

    /// Flip the local video track's enabled flag. Returns the new enabled
    /// state.
    pub async fn toggle_video(&self) -> Result<bool> {
        let mut slot = self.slot.lock().await;
        let enabled = self.negotiator.toggle_track(TrackKind::Video)?;
        if let Some(session) = slot.session.as_mut() {
            session.senders.set_enabled(TrackKind::Video, enabled);
        }
        drop(slot);
        self.bus
            .publish(SessionEvent::CameraStateChanged { enabled })
            .await;
        Ok(enabled)
    }

    /// Toggle screen sharing. Returns whether sharing is active afterwards.
    ///
    /// Starting acquires display media, swaps the outbound video sender in
    /// place when a session has one (a missing sender downgrades to a
    /// [`SessionEvent::MediaWarning`]; the preview still switches), and
    /// watches the display track so an external stop funnels into the same
    /// stop path. Stopping reverses every step.
    pub async fn toggle_screen_share(self: &Arc<Self>) -> Result<bool> {
        let mut slot = self.slot.lock().await;

        if self.negotiator.display_handle().is_some() {
            let mut events = Vec::new();
            self.stop_screen_share_locked(&mut slot, &mut events);
            drop(slot);
            self.publish_all(events).await;
            return Ok(false);
        }

        if self.negotiator.local_handle().is_none() {
            return Err(MediaError::NoLocalMedia.into());
        }

        let display = self.negotiator.acquire_display_media().await?;
        let Some(screen_track) = display.track(TrackKind::Video).cloned() else {
            self.negotiator.release_display_media();
            return Err(MediaError::Unsupported.into());
        };

        let mut events = Vec::new();
        let replaced = match slot.session.as_mut() {
            Some(session) => self
                .negotiator
                .replace_outbound_track(
                    &mut session.senders,
                    TrackKind::Video,
                    screen_track.track_ref(),
                )
                .map(Some),
            None => Ok(None),
        };
        match replaced {
            Ok(Some(previous)) => {
                tracing::debug!("screen share replaced outbound video {}", previous.source_id);
            }
            // No session or no video sender: the preview still switches, the
            // replace step is skipped, and the caller learns via a warning.
            Ok(None) => {
                events.push(SessionEvent::MediaWarning {
                    message: "screen share switched the preview only: no active call".to_string(),
                });
            }
            Err(e) => {
                events.push(SessionEvent::MediaWarning {
                    message: format!("screen share switched the preview only: {}", e),
                });
            }
        }

        // An external stop (the platform's own "stop sharing" control) must
        // re-enter the same stop path as a manual toggle.
        let handle_id = display.id();
        let manager = Arc::clone(self);
        let mut ended = screen_track.ended();
        slot.share_watch = Some(tokio::spawn(async move {
            if ended.changed().await.is_ok() && *ended.borrow() {
                manager.on_display_ended(handle_id).await;
            }
        }));

        events.push(SessionEvent::ScreenShareStateChanged { active: true });
        drop(slot);

        tracing::info!("screen sharing started");
        self.publish_all(events).await;
        Ok(true)
    }

    /// The shared stop path: release the display handle, restore the camera
    /// track on the outbound sender if a session has one, and let the
    /// preview fall back to the camera handle.
    pub(crate) fn stop_screen_share_locked(
        &self,
        slot: &mut CallSlot,
        events: &mut Vec<SessionEvent>,
    ) {
        if let Some(watcher) = slot.share_watch.take() {
            watcher.abort();
        }
        if self.negotiator.release_display_media().is_none() {
            return;
        }
        if let Some(session) = slot.session.as_mut() {
            if let Some(camera) = self
                .negotiator
                .local_handle()
                .and_then(|h| h.track_ref(TrackKind::Video))
            {
                match self.negotiator.replace_outbound_track(
                    &mut session.senders,
                    TrackKind::Video,
                    camera,
                ) {
                    Ok(previous) => {
                        tracing::debug!(
                            "restored outbound video after screen share ({})",
                            previous.source_id
                        );
                    }
                    Err(MediaError::NoActiveSender { .. }) => {}
                    Err(e) => {
                        tracing::warn!("could not restore outbound video: {}", e);
                    }
                }
            }
        }
        tracing::info!("screen sharing stopped");
        events.push(SessionEvent::ScreenShareStateChanged { active: false });
    }

    /// The display track ended on its own. Keyed by handle id so a stale
    /// watcher (stopped manually, restarted since) cannot unwind a newer
    /// share.
    pub(crate) async fn on_display_ended(&self, handle_id: HandleId) {
        let mut events = Vec::new();
        {
            let mut slot = self.slot.lock().await;
            match self.negotiator.display_handle() {
                Some(display) if display.id() == handle_id => {
                    tracing::info!("display track ended externally");
                    // This runs on the watcher task itself: detach the handle
                    // rather than aborting mid-teardown.
                    slot.share_watch.take();
                    self.stop_screen_share_locked(&mut slot, &mut events);
                }
                _ => {
                    tracing::debug!("stale display-ended signal for handle {}", handle_id);
                    return;
                }
            }
        }
        self.publish_all(events).await;
    }
}
