//! The notification bus implementation.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Handler for events published on a [`NotificationBus`].
///
/// Handlers are invoked sequentially, in publish order. A handler must not
/// publish back onto the same bus from inside `handle_event` (delivery is
/// serialized and the nested publish would wait on itself); spawn a task for
/// that instead.
#[async_trait]
pub trait EventHandler<E>: Send + Sync {
    async fn handle_event(&self, event: &E);
}

/// Token returned by [`NotificationBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(Uuid);

impl SubscriptionToken {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct Subscriber<E> {
    token: SubscriptionToken,
    handler: Arc<dyn EventHandler<E>>,
}

/// Pure event distribution: `publish` / `subscribe` / `unsubscribe`.
///
/// Ordering guarantee: handlers observe events in publish order. Delivery is
/// serialized behind an internal mutex, and the subscriber set is snapshotted
/// at publish time, so a handler registered while an event is being delivered
/// is not invoked for that in-flight event.
pub struct NotificationBus<E> {
    subscribers: RwLock<Vec<Subscriber<E>>>,
    delivery: Mutex<()>,
}

impl<E: Send + Sync> NotificationBus<E> {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            delivery: Mutex::new(()),
        }
    }

    /// Register a handler. Returns a token that removes it again.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler<E>>) -> SubscriptionToken {
        let token = SubscriptionToken::new();
        self.subscribers.write().push(Subscriber { token, handler });
        tracing::debug!("subscribed handler {}", token);
        token
    }

    /// Remove a previously registered handler.
    ///
    /// Returns `false` if the token was unknown (already unsubscribed).
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.token != token);
        subscribers.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Deliver `event` to every handler subscribed at this moment.
    pub async fn publish(&self, event: E) {
        let _delivery = self.delivery.lock().await;
        // Snapshot under the delivery lock: late subscribers wait for the
        // next event, and unsubscribing mid-delivery does not shift the set.
        let handlers: Vec<Arc<dyn EventHandler<E>>> = self
            .subscribers
            .read()
            .iter()
            .map(|s| s.handler.clone())
            .collect();
        for handler in handlers {
            handler.handle_event(&event).await;
        }
    }
}

impl<E: Send + Sync> Default for NotificationBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
