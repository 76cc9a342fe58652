//! Peercall: peer-to-peer call signaling and session management.
//!
//! This is the umbrella crate; it re-exports the public surface of the
//! peercall stack:
//!
//! - [`infra`] — notification bus and logging setup
//! - [`presence`] — the peer presence directory
//! - [`media`] — local media acquisition and track management
//! - [`session`] — the call session manager and its collaborator seams
//!
//! Most applications only need the [`prelude`]:
//!
//! ```no_run
//! use std::sync::Arc;
//! use peercall::prelude::*;
//! # use peercall::session::{NegotiationEngine, SignalingTransport};
//!
//! # async fn example(
//! #     engine: Arc<dyn NegotiationEngine>,
//! #     transport: Arc<dyn SignalingTransport>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = CallSessionManager::builder()
//!     .with_capture_backend(Arc::new(SimulatedCapture::new()))
//!     .with_engine(engine)
//!     .with_transport(transport)
//!     .build()?;
//! manager.start();
//!
//! manager.login("alice").await?;
//! let bob = PeerId::from("bob");
//! # let _ = &bob;
//! let call_id = manager.initiate_call(&bob).await?;
//! # let _ = call_id;
//! # Ok(())
//! # }
//! ```

pub use peercall_infra_common as infra;
pub use peercall_media_core as media;
pub use peercall_presence_core as presence;
pub use peercall_session_core as session;

/// The types most applications touch.
pub mod prelude {
    pub use peercall_infra_common::{EventHandler, NotificationBus, SubscriptionToken};
    pub use peercall_media_core::{
        MediaConstraints, MediaNegotiator, SimulatedCapture, TrackKind, TrackRef,
    };
    pub use peercall_presence_core::{Peer, PeerId, PeerStatus, PresenceDirectory};
    pub use peercall_session_core::{
        CallConfig, CallId, CallSession, CallSessionManager, CallState, EventSeverity,
        SessionError, SessionEvent,
    };
}
