//! Session orchestration core for an AI spoken-interview practice tool.
//!
//! A candidate answers spoken questions from a virtual interviewer avatar;
//! answers are transcribed and scored across linguistic categories, and the
//! practice level adapts session to session. This crate holds the engines
//! and the event-driven session runner; the avatar/speech SDK, the
//! transcription path and all persistence backends stay behind collaborator
//! traits.

pub mod config;
pub mod error;
pub mod follow_up;
pub mod level;
pub mod questions;
pub mod recorder;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod session;
pub mod speech;
pub mod store;
pub mod weak_point;

pub use mensetsu_types as types;

pub use config::ConfigService;
pub use error::{ConfigError, SessionError};
pub use follow_up::FollowUpManager;
pub use level::AdaptiveLevelEngine;
pub use questions::{FixedQuestionSet, QuestionSource};
pub use recorder::{MediaCapture, MediaGateway, Recorder, Recording};
pub use runner::{InterviewRunner, SessionSignal};
pub use session::{InterviewState, InterviewStateMachine};
pub use speech::{AvatarEvent, AvatarSpeech};
pub use store::{ConfigStore, MemoryStore, StateStore};
pub use weak_point::WeakPointTracker;
