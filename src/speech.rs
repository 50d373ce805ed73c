//! Avatar-speech collaborator contract.
//!
//! The concrete avatar/video SDK lives outside the core. Commands flow out
//! through [`AvatarSpeech`]; the SDK adapter pushes [`AvatarEvent`]
//! notifications back into the runner's signal channel. The core never
//! polls the collaborator.

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Notifications the avatar adapter delivers into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvatarEvent {
    /// Connection established; carries the external session handle.
    Connected { session_id: String },
    SpeakingStarted,
    SpeakingStopped,
    /// Connect/speak failure, with a human-readable message.
    Failed { message: String },
}

/// Commands the core issues to the avatar service.
///
/// `speak` resolves once the utterance has been accepted; actual speech
/// progress arrives as `SpeakingStarted`/`SpeakingStopped` events. The
/// runner serializes utterances, so implementations never see overlapping
/// speak calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AvatarSpeech: Send + Sync {
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    async fn speak(&self, text: &str) -> Result<()>;
}
