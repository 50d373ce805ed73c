//! Recording and media-capture collaborator contracts.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Opaque handle to an acquired microphone/media stream. Acquired once per
/// interview and reused across all questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCapture {
    pub device_id: String,
}

/// Acquires and releases the shared media-capture resource. The runner
/// releases a capture exactly once, and only if it acquired it itself.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MediaGateway: Send + Sync {
    async fn acquire(&self) -> Result<MediaCapture>;

    async fn release(&self, capture: MediaCapture) -> Result<()>;
}

/// A finished recording: the final transcript and an optional audio
/// artifact handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub transcript: String,
    pub audio_url: Option<String>,
}

/// Records one answer and produces its transcript. Returns when the
/// recording stops (explicit stop or silence detection); the runner bounds
/// the call with a wall-clock timeout and synthesizes a skipped answer on
/// expiry.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn capture(&self, mic: &MediaCapture, max_duration: Duration) -> Result<Recording>;
}
