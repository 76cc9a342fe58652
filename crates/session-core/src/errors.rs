//! Error types for session operations.

use thiserror::Error;

use peercall_media_core::MediaError;
use peercall_presence_core::PresenceError;

use crate::negotiation::NegotiationError;
use crate::signaling::SignalingError;

/// Errors surfaced by [`CallSessionManager`](crate::CallSessionManager)
/// operations.
///
/// Usage errors (`AlreadyInCall`, `UnknownPeer`, `InvalidTransition`) are
/// returned synchronously and leave no state behind; failures of injected
/// collaborators are wrapped and tear the session down first where setup was
/// already underway.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The username does not satisfy the naming rules.
    #[error("invalid username: {reason}")]
    InvalidUsername { reason: String },

    /// The username collides (case-insensitively) with a live peer.
    #[error("username '{name}' is already taken")]
    UsernameTaken { name: String },

    /// A local identity is already registered.
    #[error("already logged in")]
    AlreadyLoggedIn,

    /// The operation requires a logged-in local peer.
    #[error("not logged in")]
    NotLoggedIn,

    /// A call session already exists; only one call at a time is allowed.
    #[error("already in a call")]
    AlreadyInCall,

    /// The target peer is not present in the directory.
    #[error("unknown peer '{peer}'")]
    UnknownPeer { peer: String },

    /// The operation is not valid in the current call state.
    #[error("{operation} is not valid in the {state} state")]
    InvalidTransition {
        operation: &'static str,
        state: String,
    },

    /// A media acquisition or manipulation failure.
    #[error(transparent)]
    Media(#[from] MediaError),

    /// The signaling transport failed to deliver a message.
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    /// The negotiation engine rejected an operation.
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    /// A required collaborator was not supplied to the builder.
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
}

impl From<PresenceError> for SessionError {
    fn from(err: PresenceError) -> Self {
        match err {
            PresenceError::NameTaken(name) => SessionError::UsernameTaken { name },
            PresenceError::InvalidName { reason } => SessionError::InvalidUsername { reason },
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
