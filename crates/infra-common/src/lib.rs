//! Common infrastructure for the peercall stack.
//!
//! This crate carries the pieces every other peercall crate leans on but that
//! belong to no single domain: the [`NotificationBus`](events::NotificationBus)
//! used to distribute typed events to renderers and other subscribers, and the
//! [`logging`] setup helpers built on `tracing`.

pub mod events;
pub mod logging;

pub use events::{EventHandler, NotificationBus, SubscriptionToken};
pub use logging::{setup_logging, LoggingConfig, LoggingError};
