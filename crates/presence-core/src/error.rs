//! Error types for presence operations.

use thiserror::Error;

/// Errors produced by the presence directory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PresenceError {
    /// The requested name collides (case-insensitively) with a live entry.
    #[error("name '{0}' is already taken")]
    NameTaken(String),

    /// The requested name does not satisfy the naming rules.
    #[error("invalid name: {reason}")]
    InvalidName { reason: String },
}

pub type Result<T> = std::result::Result<T, PresenceError>;
