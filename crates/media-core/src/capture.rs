//! The capture backend seam.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::handle::DeviceTrack;
use crate::types::MediaConstraints;

/// Platform capture access, injected into the
/// [`MediaNegotiator`](crate::negotiator::MediaNegotiator).
///
/// Implementations own nothing after returning: the tracks they hand back are
/// wrapped into a [`MediaHandle`](crate::handle::MediaHandle) whose lifecycle
/// the negotiator controls.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Open camera/microphone capture according to `constraints`.
    ///
    /// Errors with [`MediaError::PermissionDenied`](crate::MediaError) if the
    /// user or platform refuses, or
    /// [`MediaError::DeviceUnavailable`](crate::MediaError) if no usable
    /// device exists.
    async fn open_user_media(&self, constraints: MediaConstraints) -> Result<Vec<Arc<DeviceTrack>>>;

    /// Open display/screen capture.
    ///
    /// Errors with [`MediaError::PermissionDenied`](crate::MediaError) or
    /// [`MediaError::Unsupported`](crate::MediaError).
    async fn open_display_media(&self) -> Result<Vec<Arc<DeviceTrack>>>;
}
