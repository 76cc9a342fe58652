//! Peer presence tracking for the peercall stack.
//!
//! This crate owns the answer to one question: which peers are currently
//! reachable, and under what names? The [`PresenceDirectory`] holds the local
//! peer's registered name and every announced remote peer in a single
//! case-insensitive namespace, so no two live participants can ever claim
//! names that differ only in case.
//!
//! The directory is process-wide state scoped to the logged-in lifetime; the
//! session layer clears it on logout.

pub mod directory;
pub mod error;
pub mod types;

pub use directory::PresenceDirectory;
pub use error::{PresenceError, Result};
pub use types::{Peer, PeerId, PeerStatus};
