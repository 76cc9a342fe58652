//! The call session manager.
//!
//! Construction, identity (login/logout), and event subscriptions live here;
//! call lifecycle operations are in `calls`, media toggles in `media`, and
//! the negotiation event pump in `negotiation`.

mod calls;
mod media;
mod negotiation;

use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use peercall_infra_common::{EventHandler, NotificationBus, SubscriptionToken};
use peercall_media_core::{CaptureBackend, MediaNegotiator};
use peercall_presence_core::{Peer, PeerId, PresenceDirectory};

use crate::config::CallConfig;
use crate::errors::{Result, SessionError};
use crate::events::SessionEvent;
use crate::negotiation::NegotiationEngine;
use crate::session::CallSession;
use crate::signaling::{PresenceMessage, SignalingTransport};
use crate::types::CallState;

/// Everything guarded by the manager's single operation lock.
///
/// Holding this mutex *is* the manager's concurrency model: one
/// caller-initiated operation (or asynchronous completion) runs to completion
/// before the next is admitted.
pub(crate) struct CallSlot {
    /// The at-most-one live call session.
    pub(crate) session: Option<CallSession>,
    /// Armed ring/prompt expiry timer, aborted when the ring resolves.
    pub(crate) ring_timer: Option<JoinHandle<()>>,
    /// Watcher for the display track's ended signal.
    pub(crate) share_watch: Option<JoinHandle<()>>,
}

impl CallSlot {
    fn new() -> Self {
        Self {
            session: None,
            ring_timer: None,
            share_watch: None,
        }
    }
}

/// The central state machine: owns at most one active or pending call,
/// drives call setup, acceptance/decline, connection-state transitions, and
/// teardown. Consumes the [`PresenceDirectory`] and [`MediaNegotiator`],
/// emits through the [`NotificationBus`].
pub struct CallSessionManager {
    config: CallConfig,
    pub(crate) presence: Arc<PresenceDirectory>,
    pub(crate) negotiator: Arc<MediaNegotiator>,
    pub(crate) engine: Arc<dyn NegotiationEngine>,
    pub(crate) transport: Arc<dyn SignalingTransport>,
    pub(crate) bus: Arc<NotificationBus<SessionEvent>>,
    pub(crate) local_peer: RwLock<Option<PeerId>>,
    pub(crate) slot: Mutex<CallSlot>,
    pump: SyncMutex<Option<JoinHandle<()>>>,
}

impl CallSessionManager {
    pub fn new(
        config: CallConfig,
        presence: Arc<PresenceDirectory>,
        negotiator: Arc<MediaNegotiator>,
        engine: Arc<dyn NegotiationEngine>,
        transport: Arc<dyn SignalingTransport>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            presence,
            negotiator,
            engine,
            transport,
            bus: Arc::new(NotificationBus::new()),
            local_peer: RwLock::new(None),
            slot: Mutex::new(CallSlot::new()),
            pump: SyncMutex::new(None),
        })
    }

    pub fn builder() -> CallSessionManagerBuilder {
        CallSessionManagerBuilder::new()
    }

    /// Start pumping the negotiation engine's event stream.
    ///
    /// Idempotent; the second and later calls are no-ops.
    pub fn start(self: &Arc<Self>) {
        let mut pump = self.pump.lock();
        if pump.is_some() {
            return;
        }
        let Some(mut events) = self.engine.take_events() else {
            tracing::warn!("negotiation engine event stream was already taken");
            return;
        };
        let manager = Arc::clone(self);
        *pump = Some(tokio::spawn(async move {
            while let Some(update) = events.recv().await {
                manager.on_negotiation_update(update).await;
            }
            tracing::debug!("negotiation event stream closed");
        }));
    }

    /// Stop the negotiation event pump. Live calls are untouched; use
    /// [`CallSessionManager::logout`] for a full shutdown.
    pub fn stop(&self) {
        if let Some(pump) = self.pump.lock().take() {
            pump.abort();
        }
    }

    /// Register the local identity and announce it.
    ///
    /// The username must be non-empty after trimming, at least 3 characters,
    /// and case-insensitively unique across the local peer and all announced
    /// remote peers. Initial media acquisition failure does not fail the
    /// login; it is surfaced as a [`SessionEvent::MediaFailure`].
    pub async fn login(&self, username: &str) -> Result<PeerId> {
        if self.local_peer.read().await.is_some() {
            return Err(SessionError::AlreadyLoggedIn);
        }
        let peer_id = self.presence.register(username)?;
        *self.local_peer.write().await = Some(peer_id.clone());
        tracing::info!("logged in as '{}'", peer_id);

        let announcement = PresenceMessage::Announce {
            peer: Peer::new(peer_id.clone()),
        };
        if let Err(e) = self.transport.broadcast(announcement).await {
            tracing::warn!("presence announcement failed: {}", e);
        }

        let mut events = vec![SessionEvent::LoggedIn {
            peer_id: peer_id.clone(),
        }];
        if self.config.acquire_media_on_login {
            if let Err(e) = self.negotiator.acquire_local_media(self.config.media).await {
                tracing::warn!("initial media acquisition failed: {}", e);
                events.push(SessionEvent::MediaFailure {
                    error: e.to_string(),
                });
            }
        }
        self.publish_all(events).await;
        Ok(peer_id)
    }

    /// Leave: converge any live call to idle, release all media, withdraw
    /// presence, and clear the directory. Idempotent.
    pub async fn logout(&self) -> Result<()> {
        let Some(peer_id) = self.local_peer.write().await.take() else {
            return Ok(());
        };
        self.end_call().await?;
        self.negotiator.release_all();

        let withdrawal = PresenceMessage::Withdraw {
            peer_id: peer_id.clone(),
        };
        if let Err(e) = self.transport.broadcast(withdrawal).await {
            tracing::warn!("presence withdrawal failed: {}", e);
        }
        self.presence.deregister();
        self.presence.clear();
        tracing::info!("logged out '{}'", peer_id);
        self.bus.publish(SessionEvent::LoggedOut { peer_id }).await;
        Ok(())
    }

    /// Subscribe to session lifecycle and presence events.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler<SessionEvent>>) -> SubscriptionToken {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.bus.unsubscribe(token)
    }

    pub fn bus(&self) -> &Arc<NotificationBus<SessionEvent>> {
        &self.bus
    }

    pub fn config(&self) -> &CallConfig {
        &self.config
    }

    pub fn presence(&self) -> &Arc<PresenceDirectory> {
        &self.presence
    }

    pub fn negotiator(&self) -> &Arc<MediaNegotiator> {
        &self.negotiator
    }

    /// The logged-in identity, if any.
    pub async fn local_peer(&self) -> Option<PeerId> {
        self.local_peer.read().await.clone()
    }

    /// Snapshot of the live call session, if any.
    pub async fn current_call(&self) -> Option<CallSession> {
        self.slot.lock().await.session.clone()
    }

    /// State of the live call session; `None` means idle.
    pub async fn call_state(&self) -> Option<CallState> {
        self.slot.lock().await.session.as_ref().map(|s| s.state)
    }

    pub fn is_screen_sharing(&self) -> bool {
        self.negotiator.display_handle().is_some()
    }

    /// Announced remote peers, in stable order.
    pub fn online_peers(&self) -> Vec<Peer> {
        self.presence.list()
    }

    pub(crate) async fn publish_all(&self, events: Vec<SessionEvent>) {
        for event in events {
            self.bus.publish(event).await;
        }
    }
}

/// Builder for a [`CallSessionManager`].
///
/// The negotiation engine, signaling transport, and a capture backend (or a
/// prebuilt negotiator) are required; presence and configuration default.
pub struct CallSessionManagerBuilder {
    config: CallConfig,
    presence: Option<Arc<PresenceDirectory>>,
    negotiator: Option<Arc<MediaNegotiator>>,
    engine: Option<Arc<dyn NegotiationEngine>>,
    transport: Option<Arc<dyn SignalingTransport>>,
}

impl CallSessionManagerBuilder {
    pub fn new() -> Self {
        Self {
            config: CallConfig::default(),
            presence: None,
            negotiator: None,
            engine: None,
            transport: None,
        }
    }

    pub fn with_config(mut self, config: CallConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_presence(mut self, presence: Arc<PresenceDirectory>) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn with_capture_backend(mut self, backend: Arc<dyn CaptureBackend>) -> Self {
        self.negotiator = Some(Arc::new(MediaNegotiator::new(backend)));
        self
    }

    pub fn with_negotiator(mut self, negotiator: Arc<MediaNegotiator>) -> Self {
        self.negotiator = Some(negotiator);
        self
    }

    pub fn with_engine(mut self, engine: Arc<dyn NegotiationEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn SignalingTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Arc<CallSessionManager>> {
        let negotiator = self
            .negotiator
            .ok_or(SessionError::MissingCollaborator("capture backend"))?;
        let engine = self
            .engine
            .ok_or(SessionError::MissingCollaborator("negotiation engine"))?;
        let transport = self
            .transport
            .ok_or(SessionError::MissingCollaborator("signaling transport"))?;
        Ok(CallSessionManager::new(
            self.config,
            self.presence
                .unwrap_or_else(|| Arc::new(PresenceDirectory::new())),
            negotiator,
            engine,
            transport,
        ))
    }
}

impl Default for CallSessionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
