//! Call lifecycle operations: initiation, accept/decline, signal handling,
//! ring timers, and convergent teardown.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use peercall_media_core::{MediaHandle, OutboundSenders, TrackKind};
use peercall_presence_core::{PeerId, PeerStatus};

use crate::errors::{Result, SessionError};
use crate::events::SessionEvent;
use crate::negotiation::NegotiationRole;
use crate::session::CallSession;
use crate::signaling::{DeclineReason, PresenceMessage, SdpKind, SignalMessage};
use crate::types::{CallDirection, CallId, CallState, TerminationReason};

use super::{CallSessionManager, CallSlot};

/// Which ring timer fired.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RingKind {
    /// Waiting for the remote peer to accept or decline our offer.
    Outgoing,
    /// The local incoming-call prompt's bounded lifetime.
    Incoming,
}

impl CallSessionManager {
    /// Place an outgoing call to `target`.
    ///
    /// Valid only while idle; fails with [`SessionError::AlreadyInCall`]
    /// otherwise, or [`SessionError::UnknownPeer`] if `target` is not
    /// announced. On success the session moves `Dialing → RingingRemote` and
    /// the outgoing ring timeout is armed.
    pub async fn initiate_call(self: &Arc<Self>, target: &PeerId) -> Result<CallId> {
        let local = self
            .local_peer
            .read()
            .await
            .clone()
            .ok_or(SessionError::NotLoggedIn)?;

        let mut slot = self.slot.lock().await;
        if slot.session.is_some() {
            return Err(SessionError::AlreadyInCall);
        }
        let remote = self
            .presence
            .get(target)
            .ok_or_else(|| SessionError::UnknownPeer {
                peer: target.to_string(),
            })?;

        let mut session = CallSession::outgoing(local.clone(), remote.id.clone());
        let call_id = session.id;
        tracing::info!("call {} dialing '{}'", call_id, remote.id);

        // Nothing has been stored yet; a transport failure leaves no state.
        self.transport
            .send(
                &remote.id,
                SignalMessage::CallOffer {
                    call_id,
                    from: local,
                    to: remote.id.clone(),
                },
            )
            .await?;

        let mut events = vec![SessionEvent::CallStateChanged {
            call_id,
            previous: None,
            new: CallState::Dialing,
        }];
        let previous = session.set_state(CallState::RingingRemote);
        events.push(SessionEvent::CallStateChanged {
            call_id,
            previous: Some(previous),
            new: CallState::RingingRemote,
        });

        slot.session = Some(session);
        slot.ring_timer = Some(self.spawn_ring_timer(
            call_id,
            self.config().ring_timeout,
            RingKind::Outgoing,
        ));
        drop(slot);

        self.publish_all(events).await;
        Ok(call_id)
    }

    /// Accept the ringing incoming call.
    ///
    /// Valid only in `RingingLocal`. Acquires local media if none is held;
    /// an acquisition failure aborts the setup (the caller is notified and
    /// the session is destroyed).
    pub async fn accept_call(self: &Arc<Self>) -> Result<()> {
        let mut slot = self.slot.lock().await;
        let (call_id, remote) = match slot.session.as_ref() {
            Some(s) if s.direction == CallDirection::Incoming && s.state == CallState::RingingLocal => {
                (s.id, s.remote_peer.clone())
            }
            Some(s) => {
                return Err(SessionError::InvalidTransition {
                    operation: "accept_call",
                    state: s.state.to_string(),
                })
            }
            None => {
                return Err(SessionError::InvalidTransition {
                    operation: "accept_call",
                    state: "Idle".to_string(),
                })
            }
        };
        if let Some(timer) = slot.ring_timer.take() {
            timer.abort();
        }

        let handle = match self.ensure_local_media().await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("media acquisition failed while accepting {}: {}", call_id, e);
                let events = self
                    .abort_setup_locked(
                        &mut slot,
                        SignalMessage::CallDecline {
                            call_id,
                            reason: DeclineReason::Declined,
                        },
                        TerminationReason::MediaFailed,
                        Some(e.to_string()),
                    )
                    .await;
                drop(slot);
                self.publish_all(events).await;
                return Err(e.into());
            }
        };

        if let Some(session) = slot.session.as_mut() {
            session.senders = senders_from(&handle);
        }
        let senders = slot
            .session
            .as_ref()
            .map(|s| s.senders.clone())
            .unwrap_or_default();

        if let Err(e) = self
            .transport
            .send(&remote, SignalMessage::CallAccept { call_id })
            .await
        {
            let events = self
                .abort_setup_locked(
                    &mut slot,
                    SignalMessage::CallEnd { call_id },
                    TerminationReason::NegotiationFailed,
                    None,
                )
                .await;
            drop(slot);
            self.publish_all(events).await;
            return Err(e.into());
        }

        if let Err(e) = self
            .engine
            .start(call_id, NegotiationRole::Answerer, &senders)
            .await
        {
            let events = self
                .abort_setup_locked(
                    &mut slot,
                    SignalMessage::CallEnd { call_id },
                    TerminationReason::NegotiationFailed,
                    None,
                )
                .await;
            drop(slot);
            self.engine.close(call_id).await;
            self.publish_all(events).await;
            return Err(e.into());
        }

        tracing::info!("call {} accepted; negotiating", call_id);
        Ok(())
    }

    /// Decline the ringing incoming call. Valid only in `RingingLocal`.
    pub async fn decline_call(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        let (call_id, remote) = match slot.session.as_ref() {
            Some(s) if s.direction == CallDirection::Incoming && s.state == CallState::RingingLocal => {
                (s.id, s.remote_peer.clone())
            }
            Some(s) => {
                return Err(SessionError::InvalidTransition {
                    operation: "decline_call",
                    state: s.state.to_string(),
                })
            }
            None => {
                return Err(SessionError::InvalidTransition {
                    operation: "decline_call",
                    state: "Idle".to_string(),
                })
            }
        };

        let mut events = Vec::new();
        self.teardown_locked(&mut slot, &mut events);
        events.push(SessionEvent::CallEnded {
            call_id,
            reason: TerminationReason::Declined,
        });
        drop(slot);

        if let Err(e) = self
            .transport
            .send(
                &remote,
                SignalMessage::CallDecline {
                    call_id,
                    reason: DeclineReason::Declined,
                },
            )
            .await
        {
            tracing::warn!("decline notification failed: {}", e);
        }
        tracing::info!("call {} declined locally", call_id);
        self.publish_all(events).await;
        Ok(())
    }

    /// Tear down whatever call exists; a no-op when idle.
    ///
    /// Always converges to idle: timers are cancelled, screen share is
    /// unwound, per-call toggles reset to defaults, the engine and the remote
    /// peer are notified, and the session is destroyed.
    pub async fn end_call(&self) -> Result<()> {
        let mut slot = self.slot.lock().await;
        let Some((call_id, remote)) = slot
            .session
            .as_ref()
            .map(|s| (s.id, s.remote_peer.clone()))
        else {
            return Ok(());
        };

        let mut events = Vec::new();
        self.teardown_locked(&mut slot, &mut events);
        events.push(SessionEvent::CallEnded {
            call_id,
            reason: TerminationReason::HungUp,
        });
        drop(slot);

        if let Err(e) = self
            .transport
            .send(&remote, SignalMessage::CallEnd { call_id })
            .await
        {
            tracing::warn!("end-of-call notification failed: {}", e);
        }
        self.engine.close(call_id).await;
        tracing::info!("call {} ended locally", call_id);
        self.publish_all(events).await;
        Ok(())
    }

    /// Feed one inbound signaling message into the state machine.
    ///
    /// Late, duplicate, or out-of-order messages whose call id no longer
    /// matches the live session are no-ops.
    pub async fn handle_signal(self: &Arc<Self>, message: SignalMessage) -> Result<()> {
        match message {
            SignalMessage::CallOffer { call_id, from, .. } => {
                self.on_call_offer(call_id, from).await
            }
            SignalMessage::CallAccept { call_id } => self.on_call_accept(call_id).await,
            SignalMessage::CallDecline { call_id, reason } => {
                self.on_call_decline(call_id, reason).await
            }
            SignalMessage::CallEnd { call_id } => self.on_call_end(call_id).await,
            SignalMessage::IceCandidate { call_id, candidate } => {
                self.on_remote_candidate(call_id, candidate).await
            }
            SignalMessage::SessionDescription { call_id, sdp, kind } => {
                self.on_remote_description(call_id, sdp, kind).await
            }
        }
    }

    /// Feed one inbound presence message.
    pub async fn handle_presence(&self, message: PresenceMessage) -> Result<()> {
        match message {
            PresenceMessage::Announce { peer } => {
                let fresh = !self.presence.contains(&peer.id);
                match self.presence.announce(peer.clone()) {
                    Ok(()) => {
                        if fresh {
                            self.bus.publish(SessionEvent::PeerOnline { peer }).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("ignoring announcement for '{}': {}", peer.id, e);
                    }
                }
            }
            PresenceMessage::Withdraw { peer_id } => {
                if self.presence.withdraw(&peer_id) {
                    self.bus
                        .publish(SessionEvent::PeerOffline { peer_id })
                        .await;
                }
            }
        }
        Ok(())
    }

    /// An offer arrived. From idle this creates the incoming session; in any
    /// other state the caller gets an automatic busy decline.
    async fn on_call_offer(self: &Arc<Self>, call_id: CallId, caller: PeerId) -> Result<()> {
        let Some(local) = self.local_peer.read().await.clone() else {
            tracing::debug!("dropping offer {} while logged out", call_id);
            return Ok(());
        };

        let mut slot = self.slot.lock().await;
        if slot.session.is_some() {
            drop(slot);
            tracing::info!("busy; auto-declining call {} from '{}'", call_id, caller);
            if let Err(e) = self
                .transport
                .send(
                    &caller,
                    SignalMessage::CallDecline {
                        call_id,
                        reason: DeclineReason::Busy,
                    },
                )
                .await
            {
                tracing::warn!("busy decline failed: {}", e);
            }
            return Ok(());
        }

        let expires_in = self.config().incoming_ring_timeout;
        let session = CallSession::incoming(call_id, local, caller.clone());
        slot.session = Some(session);
        slot.ring_timer = Some(self.spawn_ring_timer(call_id, expires_in, RingKind::Incoming));
        drop(slot);

        tracing::info!("incoming call {} from '{}'", call_id, caller);
        self.publish_all(vec![
            SessionEvent::CallStateChanged {
                call_id,
                previous: None,
                new: CallState::RingingLocal,
            },
            SessionEvent::IncomingCall {
                call_id,
                from: caller,
                expires_in,
            },
        ])
        .await;
        Ok(())
    }

    /// The remote peer accepted our offer: begin negotiation. `Active` comes
    /// later, once the engine reports `Connected`.
    async fn on_call_accept(self: &Arc<Self>, call_id: CallId) -> Result<()> {
        let mut slot = self.slot.lock().await;
        match slot.session.as_ref() {
            Some(s)
                if s.id == call_id
                    && s.direction == CallDirection::Outgoing
                    && s.state == CallState::RingingRemote => {}
            _ => {
                tracing::debug!("ignoring stale accept for call {}", call_id);
                return Ok(());
            }
        }
        if let Some(timer) = slot.ring_timer.take() {
            timer.abort();
        }

        let handle = match self.ensure_local_media().await {
            Ok(handle) => handle,
            Err(e) => {
                tracing::warn!("media acquisition failed on accept of {}: {}", call_id, e);
                let events = self
                    .abort_setup_locked(
                        &mut slot,
                        SignalMessage::CallEnd { call_id },
                        TerminationReason::MediaFailed,
                        Some(e.to_string()),
                    )
                    .await;
                drop(slot);
                self.publish_all(events).await;
                return Ok(());
            }
        };

        if let Some(session) = slot.session.as_mut() {
            session.senders = senders_from(&handle);
        }
        let senders = slot
            .session
            .as_ref()
            .map(|s| s.senders.clone())
            .unwrap_or_default();

        if let Err(e) = self
            .engine
            .start(call_id, NegotiationRole::Offerer, &senders)
            .await
        {
            tracing::warn!("negotiation start failed for {}: {}", call_id, e);
            let events = self
                .abort_setup_locked(
                    &mut slot,
                    SignalMessage::CallEnd { call_id },
                    TerminationReason::NegotiationFailed,
                    None,
                )
                .await;
            drop(slot);
            self.engine.close(call_id).await;
            self.publish_all(events).await;
            return Ok(());
        }

        tracing::info!("call {} accepted by remote; negotiating", call_id);
        Ok(())
    }

    /// The remote peer declined our offer.
    async fn on_call_decline(&self, call_id: CallId, reason: DeclineReason) -> Result<()> {
        let mut events = Vec::new();
        {
            let mut slot = self.slot.lock().await;
            let remote = match slot.session.as_ref() {
                Some(s)
                    if s.id == call_id
                        && s.direction == CallDirection::Outgoing
                        && matches!(s.state, CallState::Dialing | CallState::RingingRemote) =>
                {
                    s.remote_peer.clone()
                }
                _ => {
                    tracing::debug!("ignoring stale decline for call {}", call_id);
                    return Ok(());
                }
            };
            tracing::info!("call {} declined by '{}' ({:?})", call_id, remote, reason);
            self.teardown_locked(&mut slot, &mut events);
            events.push(SessionEvent::CallDeclined {
                call_id,
                peer_id: remote,
            });
        }
        self.publish_all(events).await;
        Ok(())
    }

    /// The remote peer tore the call down. Duplicate or out-of-order ends
    /// once idle are no-ops.
    async fn on_call_end(&self, call_id: CallId) -> Result<()> {
        let mut events = Vec::new();
        {
            let mut slot = self.slot.lock().await;
            match slot.session.as_ref() {
                Some(s) if s.id == call_id => {}
                _ => {
                    tracing::debug!("ignoring stale end for call {}", call_id);
                    return Ok(());
                }
            }
            self.teardown_locked(&mut slot, &mut events);
            events.push(SessionEvent::CallEnded {
                call_id,
                reason: TerminationReason::RemoteHungUp,
            });
        }
        self.engine.close(call_id).await;
        tracing::info!("call {} ended by remote", call_id);
        self.publish_all(events).await;
        Ok(())
    }

    async fn on_remote_candidate(&self, call_id: CallId, candidate: String) -> Result<()> {
        if !self.is_current_call(call_id).await {
            tracing::debug!("dropping candidate for stale call {}", call_id);
            return Ok(());
        }
        if let Err(e) = self.engine.remote_candidate(call_id, candidate).await {
            tracing::debug!("engine rejected remote candidate: {}", e);
        }
        Ok(())
    }

    async fn on_remote_description(
        &self,
        call_id: CallId,
        sdp: String,
        kind: SdpKind,
    ) -> Result<()> {
        if !self.is_current_call(call_id).await {
            tracing::debug!("dropping description for stale call {}", call_id);
            return Ok(());
        }
        if let Err(e) = self.engine.remote_description(call_id, sdp, kind).await {
            tracing::debug!("engine rejected remote description: {}", e);
        }
        Ok(())
    }

    pub(crate) async fn is_current_call(&self, call_id: CallId) -> bool {
        self.slot
            .lock()
            .await
            .session
            .as_ref()
            .map_or(false, |s| s.id == call_id)
    }

    /// Acquire local media unless a handle is already held.
    async fn ensure_local_media(&self) -> peercall_media_core::Result<Arc<MediaHandle>> {
        if let Some(handle) = self.negotiator.local_handle() {
            return Ok(handle);
        }
        self.negotiator.acquire_local_media(self.config().media).await
    }

    /// Abort a half-built call: notify the peer, tear down, and report.
    async fn abort_setup_locked(
        &self,
        slot: &mut CallSlot,
        notify: SignalMessage,
        reason: TerminationReason,
        media_error: Option<String>,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let remote = slot.session.as_ref().map(|s| s.remote_peer.clone());
        let call_id = slot.session.as_ref().map(|s| s.id);
        self.teardown_locked(slot, &mut events);
        if let Some(error) = media_error {
            events.push(SessionEvent::MediaFailure { error });
        }
        if let Some(call_id) = call_id {
            events.push(SessionEvent::CallEnded { call_id, reason });
        }
        if let Some(remote) = remote {
            if let Err(e) = self.transport.send(&remote, notify).await {
                tracing::warn!("setup-abort notification failed: {}", e);
            }
        }
        events
    }

    /// The shared teardown path. Cancels timers, unwinds screen share,
    /// resets per-call toggles to defaults, detaches tracks, restores the
    /// remote peer's presence status, and destroys the session.
    pub(crate) fn teardown_locked(
        &self,
        slot: &mut CallSlot,
        events: &mut Vec<SessionEvent>,
    ) -> Option<CallSession> {
        let mut session = slot.session.take()?;

        if let Some(timer) = slot.ring_timer.take() {
            timer.abort();
        }
        if let Some(watcher) = slot.share_watch.take() {
            watcher.abort();
        }
        if self.negotiator.release_display_media().is_some() {
            events.push(SessionEvent::ScreenShareStateChanged { active: false });
        }

        // Per-call toggles return to their defaults: audio and video enabled.
        for kind in [TrackKind::Audio, TrackKind::Video] {
            // Ok(false) means the track had been disabled by a toggle.
            if let Ok(false) = self.negotiator.set_track_enabled(kind, true) {
                events.push(match kind {
                    TrackKind::Audio => SessionEvent::MicrophoneStateChanged { muted: false },
                    TrackKind::Video => SessionEvent::CameraStateChanged { enabled: true },
                });
            }
        }

        session.remote_tracks.clear();
        session.senders.clear();
        let previous = session.set_state(CallState::Ending);
        events.push(SessionEvent::CallStateChanged {
            call_id: session.id,
            previous: Some(previous),
            new: CallState::Ending,
        });
        self.presence
            .set_status(&session.remote_peer, PeerStatus::Online);
        tracing::debug!("session {} torn down", session.id);
        Some(session)
    }

    fn spawn_ring_timer(
        self: &Arc<Self>,
        call_id: CallId,
        after: Duration,
        kind: RingKind,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            manager.on_ring_expired(call_id, kind).await;
        })
    }

    /// A ring timer fired. Outgoing: nobody answered our offer. Incoming:
    /// the prompt expired, which is an implicit decline.
    async fn on_ring_expired(&self, call_id: CallId, kind: RingKind) {
        let mut events = Vec::new();
        let notify;
        {
            let mut slot = self.slot.lock().await;
            let remote = match slot.session.as_ref() {
                Some(s) if s.id == call_id && ring_state_admits(kind, s.state) => {
                    s.remote_peer.clone()
                }
                _ => {
                    tracing::debug!("stale ring timer for call {}", call_id);
                    return;
                }
            };
            tracing::info!("call {} timed out ({:?} ring)", call_id, kind);
            // This runs on the ring-timer task itself: detach the handle so
            // teardown does not abort us mid-flight.
            slot.ring_timer.take();
            notify = Some((
                remote.clone(),
                match kind {
                    RingKind::Outgoing => SignalMessage::CallEnd { call_id },
                    RingKind::Incoming => SignalMessage::CallDecline {
                        call_id,
                        reason: DeclineReason::Declined,
                    },
                },
            ));
            self.teardown_locked(&mut slot, &mut events);
            events.push(SessionEvent::CallTimedOut {
                call_id,
                peer_id: remote,
            });
        }
        if let Some((to, message)) = notify {
            if let Err(e) = self.transport.send(&to, message).await {
                tracing::warn!("ring-timeout notification failed: {}", e);
            }
        }
        self.publish_all(events).await;
    }
}

fn ring_state_admits(kind: RingKind, state: CallState) -> bool {
    match kind {
        RingKind::Outgoing => matches!(state, CallState::Dialing | CallState::RingingRemote),
        RingKind::Incoming => state == CallState::RingingLocal,
    }
}

fn senders_from(handle: &MediaHandle) -> OutboundSenders {
    OutboundSenders {
        audio: handle.track_ref(TrackKind::Audio),
        video: handle.track_ref(TrackKind::Video),
    }
}
