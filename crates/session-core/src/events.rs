//! Session lifecycle events.
//!
//! Everything a presentation surface needs to render flows through these
//! events, published on the manager's
//! [`NotificationBus`](peercall_infra_common::NotificationBus). Each event
//! maps to an [`EventSeverity`] so a renderer can pick a toast/notification
//! style without matching on every variant.

use std::time::Duration;

use peercall_media_core::TrackRef;
use peercall_presence_core::{Peer, PeerId};

use crate::types::{CallId, CallState, TerminationReason};

/// How a renderer should grade an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// Events published by the [`CallSessionManager`](crate::CallSessionManager).
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The local peer registered and is reachable.
    LoggedIn { peer_id: PeerId },
    /// The local peer left; presence was cleared.
    LoggedOut { peer_id: PeerId },
    /// A remote peer was announced.
    PeerOnline { peer: Peer },
    /// A remote peer withdrew.
    PeerOffline { peer_id: PeerId },
    /// An incoming call is ringing; accept or decline before `expires_in`.
    IncomingCall {
        call_id: CallId,
        from: PeerId,
        expires_in: Duration,
    },
    /// The call session moved between states.
    CallStateChanged {
        call_id: CallId,
        previous: Option<CallState>,
        new: CallState,
    },
    /// The connection is established; media is flowing.
    CallConnected { call_id: CallId, peer_id: PeerId },
    /// The remote peer declined our outgoing call.
    CallDeclined { call_id: CallId, peer_id: PeerId },
    /// Nobody answered within the allotted time (outgoing ring timeout or
    /// incoming prompt expiry).
    CallTimedOut { call_id: CallId, peer_id: PeerId },
    /// The call session was destroyed.
    CallEnded {
        call_id: CallId,
        reason: TerminationReason,
    },
    /// The remote peer's media arrived.
    RemoteTrackAdded { call_id: CallId, track: TrackRef },
    /// Microphone mute state changed.
    MicrophoneStateChanged { muted: bool },
    /// Camera enablement changed.
    CameraStateChanged { enabled: bool },
    /// Screen sharing started or stopped.
    ScreenShareStateChanged { active: bool },
    /// A degraded-but-not-fatal media condition.
    MediaWarning { message: String },
    /// A media failure that aborted an operation.
    MediaFailure { error: String },
}

impl SessionEvent {
    pub fn severity(&self) -> EventSeverity {
        match self {
            SessionEvent::LoggedIn { .. }
            | SessionEvent::CallConnected { .. } => EventSeverity::Success,
            SessionEvent::CallDeclined { .. }
            | SessionEvent::CallTimedOut { .. }
            | SessionEvent::MediaWarning { .. } => EventSeverity::Warning,
            SessionEvent::MediaFailure { .. } => EventSeverity::Error,
            SessionEvent::CallEnded { reason, .. } => match reason {
                TerminationReason::HungUp
                | TerminationReason::RemoteHungUp
                | TerminationReason::Declined => EventSeverity::Info,
                TerminationReason::ConnectionLost
                | TerminationReason::NegotiationFailed
                | TerminationReason::MediaFailed => EventSeverity::Error,
            },
            _ => EventSeverity::Info,
        }
    }
}
