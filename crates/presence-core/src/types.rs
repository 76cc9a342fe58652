//! Peer identity and status types.

use serde::{Deserialize, Serialize};

/// Identifier of an addressable peer.
///
/// The display form is preserved as entered; equality, hashing and namespace
/// membership all use the Unicode-lowercased form, so `"Alice"` and `"alice"`
/// are the same peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as entered.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The case-folded form used as the namespace key.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }
}

impl PartialEq for PeerId {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}

impl Eq for PeerId {}

impl std::hash::Hash for PeerId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for PeerId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Reachability status of a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerStatus {
    /// Reachable and available for calls.
    Online,
    /// Reachable but currently in a call.
    Busy,
    /// No longer reachable.
    Offline,
}

/// An addressable participant known to the presence directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// Unique (case-insensitive) identifier.
    pub id: PeerId,
    /// Name to render; defaults to the id's display form.
    pub display_name: String,
    /// Current reachability status.
    pub status: PeerStatus,
}

impl Peer {
    /// Create an online peer whose display name is the id itself.
    pub fn new(id: impl Into<PeerId>) -> Self {
        let id = id.into();
        let display_name = id.as_str().to_string();
        Self {
            id,
            display_name,
            status: PeerStatus::Online,
        }
    }

    pub fn with_status(mut self, status: PeerStatus) -> Self {
        self.status = status;
        self
    }
}
