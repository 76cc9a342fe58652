//! Local media handling for the peercall stack.
//!
//! This crate owns device-facing media state. The [`MediaNegotiator`] is the
//! single authority for acquiring and releasing capture resources: it wraps an
//! injected [`CaptureBackend`] (the platform's camera/microphone/display
//! access) and hands out [`MediaHandle`]s whose underlying tracks are
//! guaranteed to be stopped exactly once, on every exit path.
//!
//! Everything above this crate works with [`TrackRef`] views; the device
//! resources themselves never leave the negotiator's ownership.

pub mod capture;
pub mod error;
pub mod handle;
pub mod negotiator;
pub mod sim;
pub mod types;

pub use capture::CaptureBackend;
pub use error::{MediaError, Result};
pub use handle::{DeviceTrack, HandleId, MediaHandle};
pub use negotiator::MediaNegotiator;
pub use sim::SimulatedCapture;
pub use types::{CaptureKind, MediaConstraints, OutboundSenders, SourceId, TrackKind, TrackRef};
