//! Track and constraint types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    Audio,
    Video,
}

impl std::fmt::Display for TrackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackKind::Audio => write!(f, "audio"),
            TrackKind::Video => write!(f, "video"),
        }
    }
}

/// Opaque identifier of the device or surface producing a track.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(pub String);

impl SourceId {
    /// Generate a fresh source id with a readable prefix.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A view of one media track: kind, enablement, and producing source.
///
/// Does not own the underlying device; the owning
/// [`MediaHandle`](crate::handle::MediaHandle) does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    pub kind: TrackKind,
    pub enabled: bool,
    pub source_id: SourceId,
}

/// Which capture sources to request from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

impl MediaConstraints {
    pub fn audio_only() -> Self {
        Self {
            audio: true,
            video: false,
        }
    }
}

/// What a [`MediaHandle`](crate::handle::MediaHandle) was acquired from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    /// Camera and/or microphone capture.
    Camera,
    /// Screen/display capture.
    Display,
}

/// The tracks currently attached to a call session's outbound direction.
///
/// One slot per kind; replacement swaps a slot in place without renegotiating
/// the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundSenders {
    pub audio: Option<TrackRef>,
    pub video: Option<TrackRef>,
}

impl OutboundSenders {
    pub fn get(&self, kind: TrackKind) -> Option<&TrackRef> {
        match kind {
            TrackKind::Audio => self.audio.as_ref(),
            TrackKind::Video => self.video.as_ref(),
        }
    }

    pub(crate) fn slot_mut(&mut self, kind: TrackKind) -> &mut Option<TrackRef> {
        match kind {
            TrackKind::Audio => &mut self.audio,
            TrackKind::Video => &mut self.video,
        }
    }

    /// Update the enabled flag of the sender of `kind`, if one is attached.
    pub fn set_enabled(&mut self, kind: TrackKind, enabled: bool) {
        if let Some(track) = self.slot_mut(kind).as_mut() {
            track.enabled = enabled;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_none() && self.video.is_none()
    }

    pub fn clear(&mut self) {
        self.audio = None;
        self.video = None;
    }
}
