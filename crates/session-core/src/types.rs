//! Core identifier and state types for call sessions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Call identifier.
///
/// Allocated by the calling side and carried on every signaling message so
/// both peers, their negotiation engines, and late-arriving events can be
/// correlated against the live session.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CallId(Uuid);

impl CallId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a call from the local peer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallDirection {
    /// We dialed.
    Outgoing,
    /// They dialed.
    Incoming,
}

/// State of a live call session.
///
/// `Idle` is not listed: it is the absence of a session. The lifecycle is
/// `Dialing → RingingRemote` (outgoing) or `RingingLocal` (incoming), then
/// `Active → Ending`, with the declined/timed-out paths skipping `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallState {
    /// Outgoing call created, offer not yet on the wire.
    Dialing,
    /// Offer sent, waiting for the remote peer's accept/decline.
    RingingRemote,
    /// Incoming offer received, waiting for the local user's decision.
    RingingLocal,
    /// Connection established; media is flowing.
    Active,
    /// Teardown in progress.
    Ending,
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CallState::Dialing => "Dialing",
            CallState::RingingRemote => "RingingRemote",
            CallState::RingingLocal => "RingingLocal",
            CallState::Active => "Active",
            CallState::Ending => "Ending",
        };
        write!(f, "{}", s)
    }
}

/// Connection state reported by the negotiation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Why a call session was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    /// The local user ended the call.
    HungUp,
    /// The remote peer ended the call.
    RemoteHungUp,
    /// The local user declined an incoming call.
    Declined,
    /// The connection degraded while active.
    ConnectionLost,
    /// The negotiation engine reported failure.
    NegotiationFailed,
    /// Local media could not be acquired during setup.
    MediaFailed,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::HungUp => "hung up",
            TerminationReason::RemoteHungUp => "remote hung up",
            TerminationReason::Declined => "declined",
            TerminationReason::ConnectionLost => "connection lost",
            TerminationReason::NegotiationFailed => "negotiation failed",
            TerminationReason::MediaFailed => "media acquisition failed",
        };
        write!(f, "{}", s)
    }
}
