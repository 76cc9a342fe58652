//! Typed event distribution.
//!
//! The [`NotificationBus`] decouples event producers from however the events
//! are rendered. Producers call [`NotificationBus::publish`]; consumers
//! register an [`EventHandler`] with [`NotificationBus::subscribe`] and get a
//! [`SubscriptionToken`] back for later removal. The bus carries no business
//! logic of its own.

mod bus;

pub use bus::{EventHandler, NotificationBus, SubscriptionToken};
