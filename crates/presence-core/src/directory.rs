//! The presence directory.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::error::{PresenceError, Result};
use crate::types::{Peer, PeerId, PeerStatus};

/// Minimum length of a registered name, in characters.
const MIN_NAME_LEN: usize = 3;

struct PeerEntry {
    peer: Peer,
    /// Monotonic announcement order, for stable listing.
    seq: u64,
}

/// Tracks which peer identities are currently reachable.
///
/// One case-insensitive namespace covers both the local registration and all
/// announced remote peers: a peer cannot register a name matching any
/// currently-announced remote peer, and an announcement cannot shadow the
/// local registration.
pub struct PresenceDirectory {
    /// The locally registered identity, if logged in.
    local: RwLock<Option<PeerId>>,
    /// Announced remote peers, keyed by normalized id.
    peers: DashMap<String, PeerEntry>,
    seq: AtomicU64,
}

impl PresenceDirectory {
    pub fn new() -> Self {
        Self {
            local: RwLock::new(None),
            peers: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    /// Claim `name` as the local identity.
    ///
    /// Fails with [`PresenceError::InvalidName`] if the trimmed name is empty
    /// or shorter than three characters, and with [`PresenceError::NameTaken`]
    /// if any live entry (local or announced) matches case-insensitively.
    pub fn register(&self, name: &str) -> Result<PeerId> {
        let name = validate_name(name)?;
        let id = PeerId::new(name);
        let key = id.normalized();

        // Holding the local slot's write lock while probing the map keeps
        // register/announce from racing each other into a duplicate.
        let mut local = self.local.write();
        if local.as_ref().map_or(false, |l| l.normalized() == key) || self.peers.contains_key(&key)
        {
            return Err(PresenceError::NameTaken(name.to_string()));
        }
        *local = Some(id.clone());
        tracing::info!("registered local peer '{}'", id);
        Ok(id)
    }

    /// Release the local registration; idempotent.
    pub fn deregister(&self) -> Option<PeerId> {
        self.local.write().take()
    }

    /// The locally registered identity, if any.
    pub fn local_id(&self) -> Option<PeerId> {
        self.local.read().clone()
    }

    /// Insert or refresh an announced remote peer; idempotent.
    ///
    /// Re-announcing updates the display name and status but keeps the
    /// original listing position. An announcement colliding with the local
    /// registration is rejected.
    pub fn announce(&self, peer: Peer) -> Result<()> {
        let key = peer.id.normalized();
        let local = self.local.read();
        if local.as_ref().map_or(false, |l| l.normalized() == key) {
            return Err(PresenceError::NameTaken(peer.id.as_str().to_string()));
        }
        match self.peers.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.peer.display_name = peer.display_name;
                existing.peer.status = peer.status;
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                tracing::debug!("peer '{}' announced", peer.id);
                entry.insert(PeerEntry {
                    peer,
                    seq: self.seq.fetch_add(1, Ordering::Relaxed),
                });
            }
        }
        Ok(())
    }

    /// Remove an announced peer; idempotent. Returns whether an entry existed.
    pub fn withdraw(&self, id: &PeerId) -> bool {
        let removed = self.peers.remove(&id.normalized()).is_some();
        if removed {
            tracing::debug!("peer '{}' withdrawn", id);
        }
        removed
    }

    /// Update an announced peer's status. Returns `false` if the peer is
    /// unknown.
    pub fn set_status(&self, id: &PeerId, status: PeerStatus) -> bool {
        match self.peers.get_mut(&id.normalized()) {
            Some(mut entry) => {
                entry.peer.status = status;
                true
            }
            None => false,
        }
    }

    /// Whether `id` names an announced remote peer.
    pub fn contains(&self, id: &PeerId) -> bool {
        self.peers.contains_key(&id.normalized())
    }

    /// Look up an announced peer.
    pub fn get(&self, id: &PeerId) -> Option<Peer> {
        self.peers.get(&id.normalized()).map(|e| e.peer.clone())
    }

    /// Announced remote peers in stable announcement order.
    pub fn list(&self) -> Vec<Peer> {
        let mut entries: Vec<(u64, Peer)> = self
            .peers
            .iter()
            .map(|e| (e.seq, e.peer.clone()))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, peer)| peer).collect()
    }

    /// Number of announced remote peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Drop every announced peer. The local registration is untouched; use
    /// [`PresenceDirectory::deregister`] for that.
    pub fn clear(&self) {
        self.peers.clear();
    }
}

impl Default for PresenceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_name(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(PresenceError::InvalidName {
            reason: "name must not be empty".to_string(),
        });
    }
    if name.chars().count() < MIN_NAME_LEN {
        return Err(PresenceError::InvalidName {
            reason: format!("name must be at least {} characters", MIN_NAME_LEN),
        });
    }
    Ok(name)
}
