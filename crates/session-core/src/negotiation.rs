//! The negotiation engine seam.
//!
//! The engine owns connection establishment (descriptions, candidates, the
//! media path) and reports progress as a typed event stream. This replaces
//! callback-per-concern wiring with one dispatch discipline: the manager
//! pumps [`NegotiationUpdate`]s and routes them through the same notification
//! bus as every other event source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use peercall_media_core::{OutboundSenders, TrackRef};

use crate::signaling::SdpKind;
use crate::types::{CallId, ConnectionState};

/// Which side of the offer/answer exchange this engine instance plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NegotiationRole {
    /// We sent the call offer.
    Offerer,
    /// We accepted an incoming call.
    Answerer,
}

/// Asynchronous output of the negotiation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiationEvent {
    /// A locally gathered ICE candidate, ready for the signaling channel.
    IceCandidateProduced(String),
    /// A locally produced session description, ready for the signaling
    /// channel.
    DescriptionProduced { sdp: String, kind: SdpKind },
    /// The connection state moved.
    ConnectionStateChanged(ConnectionState),
    /// The remote peer's media arrived.
    RemoteTrackAdded(TrackRef),
}

/// One engine event, tagged with the call it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct NegotiationUpdate {
    pub call_id: CallId,
    pub event: NegotiationEvent,
}

/// Errors from the negotiation engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("negotiation already running for call {0}")]
    AlreadyStarted(CallId),
    #[error("no negotiation running for call {0}")]
    NotStarted(CallId),
    #[error("negotiation failure: {0}")]
    Failed(String),
}

/// The subsystem establishing a direct media connection between two peers.
///
/// Injected into the session manager; a deterministic, manually driven
/// implementation lives with the integration tests.
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    /// Begin negotiating `call_id` with the given role and outbound tracks.
    async fn start(
        &self,
        call_id: CallId,
        role: NegotiationRole,
        senders: &OutboundSenders,
    ) -> Result<(), NegotiationError>;

    /// Feed a remote session description received over signaling.
    async fn remote_description(
        &self,
        call_id: CallId,
        sdp: String,
        kind: SdpKind,
    ) -> Result<(), NegotiationError>;

    /// Feed a remote ICE candidate received over signaling.
    async fn remote_candidate(
        &self,
        call_id: CallId,
        candidate: String,
    ) -> Result<(), NegotiationError>;

    /// Tear down the connection for `call_id`; idempotent.
    async fn close(&self, call_id: CallId);

    /// Take the engine's event stream. Yields `Some` exactly once; the
    /// manager's pump owns the receiver afterwards.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<NegotiationUpdate>>;
}
