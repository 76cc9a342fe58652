//! The negotiation engine event pump.

use chrono::Utc;

use peercall_media_core::TrackRef;
use peercall_presence_core::PeerStatus;

use crate::events::SessionEvent;
use crate::negotiation::{NegotiationEvent, NegotiationUpdate};
use crate::signaling::SignalMessage;
use crate::types::{CallId, CallState, ConnectionState, TerminationReason};

use super::CallSessionManager;

impl CallSessionManager {
    /// Route one engine event. Everything is checked against the live
    /// session id first; an event for a call that no longer exists is
    /// dropped rather than reviving stale state.
    pub(crate) async fn on_negotiation_update(&self, update: NegotiationUpdate) {
        let NegotiationUpdate { call_id, event } = update;
        match event {
            NegotiationEvent::IceCandidateProduced(candidate) => {
                self.forward_to_remote(call_id, SignalMessage::IceCandidate { call_id, candidate })
                    .await;
            }
            NegotiationEvent::DescriptionProduced { sdp, kind } => {
                self.forward_to_remote(
                    call_id,
                    SignalMessage::SessionDescription { call_id, sdp, kind },
                )
                .await;
            }
            NegotiationEvent::ConnectionStateChanged(state) => {
                self.on_connection_state(call_id, state).await;
            }
            NegotiationEvent::RemoteTrackAdded(track) => {
                self.on_remote_track(call_id, track).await;
            }
        }
    }

    /// Ship engine output (candidates, descriptions) to the remote peer over
    /// signaling.
    async fn forward_to_remote(&self, call_id: CallId, message: SignalMessage) {
        let remote = {
            let slot = self.slot.lock().await;
            match slot.session.as_ref() {
                Some(s) if s.id == call_id => Some(s.remote_peer.clone()),
                _ => None,
            }
        };
        let Some(remote) = remote else {
            tracing::debug!("dropping engine output for stale call {}", call_id);
            return;
        };
        if let Err(e) = self.transport.send(&remote, message).await {
            tracing::warn!("failed to forward engine output: {}", e);
        }
    }

    async fn on_connection_state(&self, call_id: CallId, state: ConnectionState) {
        let mut events = Vec::new();
        let mut close_engine = false;
        {
            let mut slot = self.slot.lock().await;
            if slot.session.as_ref().map(|s| s.id) != Some(call_id) {
                tracing::debug!(
                    "ignoring connection state {:?} for stale call {}",
                    state,
                    call_id
                );
                return;
            }
            match state {
                ConnectionState::Connected => {
                    if let Some(session) = slot.session.as_mut() {
                        if session.state != CallState::Active {
                            let previous = session.set_state(CallState::Active);
                            session.connected_at = Some(Utc::now());
                            let remote = session.remote_peer.clone();
                            self.presence.set_status(&remote, PeerStatus::Busy);
                            tracing::info!("call {} connected", call_id);
                            events.push(SessionEvent::CallStateChanged {
                                call_id,
                                previous: Some(previous),
                                new: CallState::Active,
                            });
                            events.push(SessionEvent::CallConnected {
                                call_id,
                                peer_id: remote,
                            });
                        }
                    }
                }
                ConnectionState::Disconnected | ConnectionState::Failed => {
                    let reason = if state == ConnectionState::Failed {
                        TerminationReason::NegotiationFailed
                    } else {
                        TerminationReason::ConnectionLost
                    };
                    tracing::warn!("call {} degraded: {:?}", call_id, state);
                    if self.teardown_locked(&mut slot, &mut events).is_some() {
                        events.push(SessionEvent::CallEnded { call_id, reason });
                        close_engine = true;
                    }
                }
                ConnectionState::New | ConnectionState::Connecting | ConnectionState::Closed => {
                    tracing::debug!("call {} connection state {:?}", call_id, state);
                }
            }
        }
        if close_engine {
            self.engine.close(call_id).await;
        }
        self.publish_all(events).await;
    }

    async fn on_remote_track(&self, call_id: CallId, track: TrackRef) {
        let mut events = Vec::new();
        {
            let mut slot = self.slot.lock().await;
            match slot.session.as_mut() {
                Some(s) if s.id == call_id => {
                    tracing::debug!("remote {} track added to call {}", track.kind, call_id);
                    s.remote_tracks.push(track.clone());
                    events.push(SessionEvent::RemoteTrackAdded { call_id, track });
                }
                _ => {
                    tracing::debug!("ignoring remote track for stale call {}", call_id);
                    return;
                }
            }
        }
        self.publish_all(events).await;
    }
}
