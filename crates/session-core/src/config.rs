//! Session manager configuration.

use std::time::Duration;

use peercall_media_core::MediaConstraints;

/// Configuration for a [`CallSessionManager`](crate::CallSessionManager).
#[derive(Debug, Clone)]
pub struct CallConfig {
    /// How long an outgoing call rings before it times out.
    pub ring_timeout: Duration,
    /// Lifetime of the incoming-call prompt; expiry is an implicit decline.
    pub incoming_ring_timeout: Duration,
    /// Capture constraints for the initial local media acquisition.
    pub media: MediaConstraints,
    /// Whether to acquire local media immediately on login.
    pub acquire_media_on_login: bool,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            ring_timeout: Duration::from_secs(30),
            incoming_ring_timeout: Duration::from_secs(15),
            media: MediaConstraints::default(),
            acquire_media_on_login: true,
        }
    }
}

impl CallConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ring_timeout(mut self, timeout: Duration) -> Self {
        self.ring_timeout = timeout;
        self
    }

    pub fn with_incoming_ring_timeout(mut self, timeout: Duration) -> Self {
        self.incoming_ring_timeout = timeout;
        self
    }

    pub fn with_media(mut self, media: MediaConstraints) -> Self {
        self.media = media;
        self
    }

    pub fn with_acquire_media_on_login(mut self, acquire: bool) -> Self {
        self.acquire_media_on_login = acquire;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_override_defaults() {
        let config = CallConfig::new()
            .with_ring_timeout(Duration::from_secs(5))
            .with_acquire_media_on_login(false);
        assert_eq!(config.ring_timeout, Duration::from_secs(5));
        assert_eq!(config.incoming_ring_timeout, Duration::from_secs(15));
        assert!(!config.acquire_media_on_login);
    }
}
