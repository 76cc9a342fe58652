//! The call session record.

use chrono::{DateTime, Utc};

use peercall_media_core::{OutboundSenders, TrackRef};
use peercall_presence_core::PeerId;

use crate::types::{CallDirection, CallId, CallState};

/// The stateful record of one in-progress or pending call between two peers.
///
/// Owned exclusively by the
/// [`CallSessionManager`](crate::CallSessionManager); at most one exists per
/// manager at a time. Created on call initiation or on an incoming offer,
/// destroyed on every terminal path.
#[derive(Debug, Clone)]
pub struct CallSession {
    pub id: CallId,
    pub local_peer: PeerId,
    pub remote_peer: PeerId,
    pub direction: CallDirection,
    pub state: CallState,
    /// Tracks attached to the outbound direction once negotiation begins.
    pub senders: OutboundSenders,
    /// Views of the remote peer's tracks as the engine reports them.
    pub remote_tracks: Vec<TrackRef>,
    pub created_at: DateTime<Utc>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl CallSession {
    /// Create an outgoing session in `Dialing`; allocates the call id.
    pub fn outgoing(local_peer: PeerId, remote_peer: PeerId) -> Self {
        Self {
            id: CallId::new(),
            local_peer,
            remote_peer,
            direction: CallDirection::Outgoing,
            state: CallState::Dialing,
            senders: OutboundSenders::default(),
            remote_tracks: Vec::new(),
            created_at: Utc::now(),
            connected_at: None,
        }
    }

    /// Create an incoming session in `RingingLocal`, adopting the caller's
    /// call id.
    pub fn incoming(id: CallId, local_peer: PeerId, remote_peer: PeerId) -> Self {
        Self {
            id,
            local_peer,
            remote_peer,
            direction: CallDirection::Incoming,
            state: CallState::RingingLocal,
            senders: OutboundSenders::default(),
            remote_tracks: Vec::new(),
            created_at: Utc::now(),
            connected_at: None,
        }
    }

    /// Move to `state`, returning the previous state.
    pub fn set_state(&mut self, state: CallState) -> CallState {
        std::mem::replace(&mut self.state, state)
    }
}
