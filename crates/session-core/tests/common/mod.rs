//! Shared test collaborators: a recording signaling transport, a manually
//! driven negotiation engine, and a recording event handler.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use peercall_session_core::{
    CallConfig, CallId, CallSessionManager, CallState, ConnectionState, EventHandler,
    MediaNegotiator, NegotiationEngine, NegotiationError, NegotiationEvent, NegotiationRole,
    NegotiationUpdate, OutboundSenders, Peer, PeerId, PresenceDirectory, PresenceMessage, SdpKind,
    SessionEvent, SignalMessage, SignalingError, SignalingTransport,
};
use peercall_media_core::SimulatedCapture;

/// Records every outbound message instead of delivering it.
pub struct MockTransport {
    pub sent: Mutex<Vec<(PeerId, SignalMessage)>>,
    pub broadcasts: Mutex<Vec<PresenceMessage>>,
    fail_sends: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            broadcasts: Mutex::new(Vec::new()),
            fail_sends: Mutex::new(false),
        })
    }

    pub fn fail_sends(&self, fail: bool) {
        *self.fail_sends.lock() = fail;
    }

    pub fn sent_messages(&self) -> Vec<(PeerId, SignalMessage)> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, peer: &PeerId) -> Vec<SignalMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|(to, _)| to == peer)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

#[async_trait]
impl SignalingTransport for MockTransport {
    async fn send(&self, to: &PeerId, message: SignalMessage) -> Result<(), SignalingError> {
        if *self.fail_sends.lock() {
            return Err(SignalingError::Unreachable(to.to_string()));
        }
        self.sent.lock().push((to.clone(), message));
        Ok(())
    }

    async fn broadcast(&self, message: PresenceMessage) -> Result<(), SignalingError> {
        if *self.fail_sends.lock() {
            return Err(SignalingError::Closed);
        }
        self.broadcasts.lock().push(message);
        Ok(())
    }
}

/// A negotiation engine the test drives by hand.
pub struct ManualEngine {
    events_tx: mpsc::UnboundedSender<NegotiationUpdate>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<NegotiationUpdate>>>,
    pub started: Mutex<Vec<(CallId, NegotiationRole, OutboundSenders)>>,
    pub closed: Mutex<Vec<CallId>>,
    pub remote_descriptions: Mutex<Vec<(CallId, String, SdpKind)>>,
    pub remote_candidates: Mutex<Vec<(CallId, String)>>,
    fail_start: Mutex<bool>,
}

impl ManualEngine {
    pub fn new() -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            started: Mutex::new(Vec::new()),
            closed: Mutex::new(Vec::new()),
            remote_descriptions: Mutex::new(Vec::new()),
            remote_candidates: Mutex::new(Vec::new()),
            fail_start: Mutex::new(false),
        })
    }

    pub fn fail_start(&self, fail: bool) {
        *self.fail_start.lock() = fail;
    }

    /// Push one event into the manager's pump.
    pub fn emit(&self, call_id: CallId, event: NegotiationEvent) {
        self.events_tx
            .send(NegotiationUpdate { call_id, event })
            .expect("manager pump gone");
    }

    pub fn report_connected(&self, call_id: CallId) {
        self.emit(
            call_id,
            NegotiationEvent::ConnectionStateChanged(ConnectionState::Connected),
        );
    }

    pub fn started_calls(&self) -> Vec<CallId> {
        self.started.lock().iter().map(|(id, _, _)| *id).collect()
    }
}

#[async_trait]
impl NegotiationEngine for ManualEngine {
    async fn start(
        &self,
        call_id: CallId,
        role: NegotiationRole,
        senders: &OutboundSenders,
    ) -> Result<(), NegotiationError> {
        if *self.fail_start.lock() {
            return Err(NegotiationError::Failed("injected start failure".into()));
        }
        self.started.lock().push((call_id, role, senders.clone()));
        Ok(())
    }

    async fn remote_description(
        &self,
        call_id: CallId,
        sdp: String,
        kind: SdpKind,
    ) -> Result<(), NegotiationError> {
        self.remote_descriptions.lock().push((call_id, sdp, kind));
        Ok(())
    }

    async fn remote_candidate(
        &self,
        call_id: CallId,
        candidate: String,
    ) -> Result<(), NegotiationError> {
        self.remote_candidates.lock().push((call_id, candidate));
        Ok(())
    }

    async fn close(&self, call_id: CallId) {
        self.closed.lock().push(call_id);
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<NegotiationUpdate>> {
        self.events_rx.lock().take()
    }
}

/// Collects every published session event.
pub struct RecordingHandler {
    pub events: Mutex<Vec<SessionEvent>>,
}

impl RecordingHandler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub fn count<F: Fn(&SessionEvent) -> bool>(&self, predicate: F) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }

    pub fn has<F: Fn(&SessionEvent) -> bool>(&self, predicate: F) -> bool {
        self.count(predicate) > 0
    }
}

#[async_trait]
impl EventHandler<SessionEvent> for RecordingHandler {
    async fn handle_event(&self, event: &SessionEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Everything a test needs, wired together.
pub struct Harness {
    pub manager: Arc<CallSessionManager>,
    pub capture: Arc<SimulatedCapture>,
    pub transport: Arc<MockTransport>,
    pub engine: Arc<ManualEngine>,
    pub handler: Arc<RecordingHandler>,
}

impl Harness {
    pub fn new(config: CallConfig) -> Self {
        let capture = Arc::new(SimulatedCapture::new());
        let transport = MockTransport::new();
        let engine = ManualEngine::new();
        let handler = RecordingHandler::new();
        let manager = CallSessionManager::new(
            config,
            Arc::new(PresenceDirectory::new()),
            Arc::new(MediaNegotiator::new(capture.clone())),
            engine.clone(),
            transport.clone(),
        );
        manager.subscribe(handler.clone());
        manager.start();
        Self {
            manager,
            capture,
            transport,
            engine,
            handler,
        }
    }

    /// Log in and announce a remote peer, the usual test opening.
    pub async fn login_with_peer(&self, username: &str, peer: &str) -> PeerId {
        self.manager.login(username).await.expect("login failed");
        let peer_id = PeerId::from(peer);
        self.manager
            .handle_presence(PresenceMessage::Announce {
                peer: Peer::new(peer_id.clone()),
            })
            .await
            .expect("announce failed");
        peer_id
    }

    /// Dial `peer` and have them accept; returns once the call is `Active`.
    pub async fn establish_call(&self, peer: &PeerId) -> CallId {
        let call_id = self
            .manager
            .initiate_call(peer)
            .await
            .expect("initiate failed");
        self.manager
            .handle_signal(SignalMessage::CallAccept { call_id })
            .await
            .expect("accept signal failed");
        self.engine.report_connected(call_id);
        self.wait_for_state(Some(CallState::Active)).await;
        call_id
    }

    /// Poll until the call state matches, or panic after the deadline.
    pub async fn wait_for_state(&self, expected: Option<CallState>) {
        for _ in 0..200 {
            if self.manager.call_state().await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("call state never reached {:?}", expected);
    }

    /// Poll until an event matching `predicate` was published.
    pub async fn wait_for_event<F: Fn(&SessionEvent) -> bool>(&self, predicate: F) {
        for _ in 0..200 {
            if self.handler.events().iter().any(&predicate) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected event never published");
    }
}
