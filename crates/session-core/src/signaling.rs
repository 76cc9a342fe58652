//! Signaling message types and the transport seam.
//!
//! The real transport (websocket, datagram, carrier pigeon) is an external
//! collaborator behind [`SignalingTransport`]. Messages are serde-
//! serializable so any wire encoding can carry them. Delivery is at-most-once
//! per send: the state machine tolerates duplicates and reordering by
//! correlating everything on [`CallId`] and ignoring what no longer matches.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use peercall_presence_core::{Peer, PeerId};

use crate::types::CallId;

/// Why a call was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeclineReason {
    /// The callee (or their prompt timeout) said no.
    Declined,
    /// The callee was already in a call.
    Busy,
}

/// Whether a session description is an offer or an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Call-signaling messages exchanged between two peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SignalMessage {
    /// Invitation to a call; the caller allocates the id.
    CallOffer {
        call_id: CallId,
        from: PeerId,
        to: PeerId,
    },
    /// The callee accepted.
    CallAccept { call_id: CallId },
    /// The callee declined (explicitly, implicitly, or because busy).
    CallDecline {
        call_id: CallId,
        reason: DeclineReason,
    },
    /// Either side tore the call down.
    CallEnd { call_id: CallId },
    /// Trickle ICE candidate from the negotiation engine.
    IceCandidate { call_id: CallId, candidate: String },
    /// Session description from the negotiation engine.
    SessionDescription {
        call_id: CallId,
        sdp: String,
        kind: SdpKind,
    },
}

impl SignalMessage {
    /// The call this message belongs to.
    pub fn call_id(&self) -> CallId {
        match self {
            SignalMessage::CallOffer { call_id, .. }
            | SignalMessage::CallAccept { call_id }
            | SignalMessage::CallDecline { call_id, .. }
            | SignalMessage::CallEnd { call_id }
            | SignalMessage::IceCandidate { call_id, .. }
            | SignalMessage::SessionDescription { call_id, .. } => *call_id,
        }
    }
}

/// Presence messages, broadcast and consumed independently of call state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PresenceMessage {
    Announce { peer: Peer },
    Withdraw { peer_id: PeerId },
}

/// Errors from the signaling transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalingError {
    #[error("peer '{0}' is unreachable")]
    Unreachable(String),
    #[error("signaling transport is closed")]
    Closed,
    #[error("signaling transport failure: {0}")]
    Transport(String),
}

/// Outbound signaling, injected into the session manager.
///
/// Inbound messages are pushed by the embedding application into
/// [`CallSessionManager::handle_signal`](crate::CallSessionManager::handle_signal)
/// and
/// [`CallSessionManager::handle_presence`](crate::CallSessionManager::handle_presence).
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    /// Deliver a call-signaling message to one peer. At-most-once.
    async fn send(&self, to: &PeerId, message: SignalMessage) -> Result<(), SignalingError>;

    /// Broadcast a presence message to every reachable peer.
    async fn broadcast(&self, message: PresenceMessage) -> Result<(), SignalingError>;
}
