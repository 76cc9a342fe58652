//! Error types for media operations.

use thiserror::Error;

use crate::types::TrackKind;

/// Errors produced while acquiring or manipulating media.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MediaError {
    /// The user or platform denied access to the requested capture source.
    #[error("capture permission denied")]
    PermissionDenied,

    /// No usable capture device was found.
    #[error("capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Display capture is not supported by the backend.
    #[error("display capture is not supported")]
    Unsupported,

    /// No outbound sender of the given kind exists on the current session.
    #[error("no active {kind} sender on the current session")]
    NoActiveSender { kind: TrackKind },

    /// The operation requires a held local media handle.
    #[error("no local media handle is held")]
    NoLocalMedia,
}

pub type Result<T> = std::result::Result<T, MediaError>;
