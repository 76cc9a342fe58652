//! Call session management for the peercall stack.
//!
//! This crate is the coordination layer between a presentation surface and
//! the injected collaborators (signaling transport, negotiation engine,
//! capture backend). Its centerpiece is the [`CallSessionManager`]: a state
//! machine owning at most one active or pending [`CallSession`] at a time,
//! driving call setup, acceptance/decline, connection supervision, media
//! toggles, and teardown.
//!
//! # Overview
//!
//! ```text
//! ┌──────────────────────────┐
//! │  Presentation surface    │  login / initiate_call / accept_call /
//! └────────────┬─────────────┘  toggle_* / end_call ...
//!              │
//! ┌────────────▼─────────────┐       events        ┌─────────────────┐
//! │    CallSessionManager    ├────────────────────►│ NotificationBus │
//! └──┬─────────┬──────────┬──┘                     └─────────────────┘
//!    │         │          │
//! ┌──▼───────┐ │ ┌────────▼────────┐
//! │ Presence │ │ │ MediaNegotiator │
//! │Directory │ │ └─────────────────┘
//! └──────────┘ │
//!    ┌─────────▼──────────┐   ┌────────────────────┐
//!    │ SignalingTransport │   │ NegotiationEngine  │
//!    └────────────────────┘   └────────────────────┘
//! ```
//!
//! All caller-initiated operations are serialized: the manager processes one
//! operation to completion before accepting the next, and every asynchronous
//! completion (signal, timer, negotiation event) is checked against the live
//! session id before it may touch state.

pub mod config;
pub mod errors;
pub mod events;
pub mod manager;
pub mod negotiation;
pub mod session;
pub mod signaling;
pub mod types;

pub use config::CallConfig;
pub use errors::{Result, SessionError};
pub use events::{EventSeverity, SessionEvent};
pub use manager::{CallSessionManager, CallSessionManagerBuilder};
pub use negotiation::{
    NegotiationEngine, NegotiationError, NegotiationEvent, NegotiationRole, NegotiationUpdate,
};
pub use session::CallSession;
pub use signaling::{
    DeclineReason, PresenceMessage, SdpKind, SignalMessage, SignalingError, SignalingTransport,
};
pub use types::{CallDirection, CallId, CallState, ConnectionState, TerminationReason};

// Re-export the collaborating crates' surface the way applications consume it.
pub use peercall_infra_common::{EventHandler, NotificationBus, SubscriptionToken};
pub use peercall_media_core::{
    CaptureBackend, MediaConstraints, MediaError, MediaNegotiator, OutboundSenders, TrackKind,
    TrackRef,
};
pub use peercall_presence_core::{Peer, PeerId, PeerStatus, PresenceDirectory, PresenceError};
