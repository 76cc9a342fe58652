//! Single-call invariant, teardown convergence, and staleness tolerance.

mod common;

use std::time::Duration;

use common::Harness;
use peercall_session_core::{
    CallConfig, CallId, CallState, ConnectionState, MediaError, NegotiationEvent, PeerId,
    SessionError, SessionEvent, SignalMessage, TerminationReason,
};

#[tokio::test]
async fn initiate_call_fails_from_every_non_idle_state() {
    let harness = Harness::new(CallConfig::default());
    let bob = harness.login_with_peer("ali", "bob").await;
    harness
        .manager
        .handle_presence(peercall_session_core::PresenceMessage::Announce {
            peer: peercall_session_core::Peer::new("carol"),
        })
        .await
        .unwrap();
    let carol = PeerId::from("carol");

    // RingingRemote.
    let call_id = harness.manager.initiate_call(&bob).await.unwrap();
    assert!(matches!(
        harness.manager.initiate_call(&carol).await,
        Err(SessionError::AlreadyInCall)
    ));

    // Active.
    harness
        .manager
        .handle_signal(SignalMessage::CallAccept { call_id })
        .await
        .unwrap();
    harness.engine.report_connected(call_id);
    harness.wait_for_state(Some(CallState::Active)).await;
    assert!(matches!(
        harness.manager.initiate_call(&carol).await,
        Err(SessionError::AlreadyInCall)
    ));

    // Still exactly one session, unchanged.
    assert_eq!(harness.manager.current_call().await.unwrap().id, call_id);

    // RingingLocal on a fresh manager.
    let harness2 = Harness::new(CallConfig::default());
    let bob2 = harness2.login_with_peer("ali", "bob").await;
    harness2
        .manager
        .handle_signal(SignalMessage::CallOffer {
            call_id: CallId::new(),
            from: bob2,
            to: PeerId::from("ali"),
        })
        .await
        .unwrap();
    assert!(matches!(
        harness2.manager.initiate_call(&carol).await,
        Err(SessionError::AlreadyInCall)
    ));
}

#[tokio::test]
async fn initiate_call_requires_known_peer_and_login() {
    let harness = Harness::new(CallConfig::default());
    let ghost = PeerId::from("ghost");
    assert!(matches!(
        harness.manager.initiate_call(&ghost).await,
        Err(SessionError::NotLoggedIn)
    ));

    harness.manager.login("ali").await.unwrap();
    assert!(matches!(
        harness.manager.initiate_call(&ghost).await,
        Err(SessionError::UnknownPeer { .. })
    ));
    assert_eq!(harness.manager.call_state().await, None);
}

#[tokio::test]
async fn end_call_is_idempotent_from_every_state() {
    let harness = Harness::new(CallConfig::default());

    // Idle: a no-op.
    harness.manager.end_call().await.unwrap();

    let bob = harness.login_with_peer("ali", "bob").await;

    // From RingingRemote.
    harness.manager.initiate_call(&bob).await.unwrap();
    harness.manager.end_call().await.unwrap();
    assert_eq!(harness.manager.call_state().await, None);

    // From Active, with screen share and mute engaged.
    let call_id = harness.establish_call(&bob).await;
    harness.manager.toggle_mute().await.unwrap();
    harness.manager.toggle_screen_share().await.unwrap();
    assert!(harness.manager.is_screen_sharing());

    harness.manager.end_call().await.unwrap();
    harness.manager.end_call().await.unwrap();

    assert_eq!(harness.manager.call_state().await, None);
    // Never left screen-share-substituted: the display handle is gone and
    // the preview is the camera handle again.
    assert!(!harness.manager.is_screen_sharing());
    let negotiator = harness.manager.negotiator();
    assert_eq!(
        negotiator.preview_source().unwrap().id(),
        negotiator.local_handle().unwrap().id()
    );
    // Per-call toggles are back to defaults.
    assert!(negotiator
        .local_handle()
        .unwrap()
        .track(peercall_session_core::TrackKind::Audio)
        .unwrap()
        .is_enabled());
    assert!(harness.engine.closed.lock().contains(&call_id));
}

#[tokio::test]
async fn stale_events_cannot_revive_a_dead_session() {
    let harness = Harness::new(CallConfig::default());
    let bob = harness.login_with_peer("ali", "bob").await;
    let call_id = harness.establish_call(&bob).await;

    harness.manager.end_call().await.unwrap();
    let events_after_end = harness.handler.events().len();

    // Late engine events for the dead call.
    harness.engine.report_connected(call_id);
    harness.engine.emit(
        call_id,
        NegotiationEvent::ConnectionStateChanged(ConnectionState::Failed),
    );
    // Late signals for the dead call.
    harness
        .manager
        .handle_signal(SignalMessage::CallAccept { call_id })
        .await
        .unwrap();
    harness
        .manager
        .handle_signal(SignalMessage::CallEnd { call_id })
        .await
        .unwrap();

    // Give the pump a moment to drain.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(harness.manager.call_state().await, None);
    assert_eq!(harness.handler.events().len(), events_after_end);
    // The stale accept did not restart negotiation.
    assert_eq!(harness.engine.started.lock().len(), 1);
}

#[tokio::test]
async fn accept_with_wrong_call_id_is_ignored() {
    let harness = Harness::new(CallConfig::default());
    let bob = harness.login_with_peer("ali", "bob").await;
    harness.manager.initiate_call(&bob).await.unwrap();

    harness
        .manager
        .handle_signal(SignalMessage::CallAccept {
            call_id: CallId::new(),
        })
        .await
        .unwrap();

    assert!(harness.engine.started.lock().is_empty());
    assert_eq!(
        harness.manager.call_state().await,
        Some(CallState::RingingRemote)
    );
}

#[tokio::test(start_paused = true)]
async fn ending_a_ringing_call_cancels_the_timer() {
    let config = CallConfig::default().with_ring_timeout(Duration::from_millis(30));
    let harness = Harness::new(config);
    let bob = harness.login_with_peer("ali", "bob").await;

    harness.manager.initiate_call(&bob).await.unwrap();
    harness.manager.end_call().await.unwrap();

    // Sleep well past the ring timeout; the cancelled timer must not fire.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!harness
        .handler
        .has(|e| matches!(e, SessionEvent::CallTimedOut { .. })));
}

#[tokio::test]
async fn accept_media_failure_aborts_setup_and_notifies_caller() {
    let config = CallConfig::default().with_acquire_media_on_login(false);
    let harness = Harness::new(config);
    let bob = harness.login_with_peer("ali", "bob").await;
    harness.capture.deny_user_media(true);

    let call_id = CallId::new();
    harness
        .manager
        .handle_signal(SignalMessage::CallOffer {
            call_id,
            from: bob.clone(),
            to: PeerId::from("ali"),
        })
        .await
        .unwrap();

    let result = harness.manager.accept_call().await;
    assert!(matches!(
        result,
        Err(SessionError::Media(MediaError::PermissionDenied))
    ));

    // Convergent: session destroyed, caller notified, failure surfaced.
    assert_eq!(harness.manager.call_state().await, None);
    assert!(harness
        .transport
        .sent_to(&bob)
        .iter()
        .any(|m| matches!(m, SignalMessage::CallDecline { call_id: id, .. } if *id == call_id)));
    assert!(harness
        .handler
        .has(|e| matches!(e, SessionEvent::MediaFailure { .. })));
    assert!(harness.handler.has(|e| matches!(
        e,
        SessionEvent::CallEnded {
            reason: TerminationReason::MediaFailed,
            ..
        }
    )));
}

#[tokio::test]
async fn connection_failure_recovers_to_idle_and_stays_usable() {
    let harness = Harness::new(CallConfig::default());
    let bob = harness.login_with_peer("ali", "bob").await;
    let call_id = harness.establish_call(&bob).await;

    harness.engine.emit(
        call_id,
        NegotiationEvent::ConnectionStateChanged(ConnectionState::Failed),
    );
    harness.wait_for_state(None).await;
    harness
        .wait_for_event(|e| {
            matches!(
                e,
                SessionEvent::CallEnded {
                    reason: TerminationReason::NegotiationFailed,
                    ..
                }
            )
        })
        .await;

    // The system remains usable for a new call.
    let second = harness.manager.initiate_call(&bob).await.unwrap();
    assert_ne!(second, call_id);
    assert_eq!(
        harness.manager.call_state().await,
        Some(CallState::RingingRemote)
    );
}

#[tokio::test]
async fn remote_tracks_are_recorded_and_detached() {
    let harness = Harness::new(CallConfig::default());
    let bob = harness.login_with_peer("ali", "bob").await;
    let call_id = harness.establish_call(&bob).await;

    harness.engine.emit(
        call_id,
        NegotiationEvent::RemoteTrackAdded(peercall_session_core::TrackRef {
            kind: peercall_session_core::TrackKind::Video,
            enabled: true,
            source_id: peercall_media_core::SourceId("remote-cam-0".to_string()),
        }),
    );
    harness
        .wait_for_event(|e| matches!(e, SessionEvent::RemoteTrackAdded { .. }))
        .await;
    assert_eq!(
        harness.manager.current_call().await.unwrap().remote_tracks.len(),
        1
    );

    harness.manager.end_call().await.unwrap();
    assert!(harness.manager.current_call().await.is_none());
}
