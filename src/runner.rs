//! The interview orchestrator.
//!
//! A single event loop over a signal channel, in the collaborator→core
//! notification direction: avatar adapters and the recording task push
//! [`SessionSignal`]s in, the runner drives the state machine and issues
//! commands back out through the collaborator traits. Utterances are
//! serialized through an internal queue — the next `speak` is only issued
//! on the previous utterance's speaking-stopped notification — and a short
//! grace period separates the avatar going quiet from the microphone
//! opening, so trailing echo is not captured.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::Local;
use mensetsu_types::{Answer, EvaluationConfig, EvaluationResult, JlptLevel, Question};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::level::AdaptiveLevelEngine;
use crate::questions::QuestionSource;
use crate::recorder::{MediaCapture, MediaGateway, Recorder, Recording};
use crate::scoring;
use crate::session::InterviewStateMachine;
use crate::speech::{AvatarEvent, AvatarSpeech};
use crate::weak_point::WeakPointTracker;

pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);
const DEFAULT_ANSWER_TIMEOUT: Duration = Duration::from_secs(60);
const SIGNAL_BUFFER: usize = 64;

const GREETING: &str = "これから面接を始めます。よろしくお願いします。";

/// Notifications consumed by the runner's event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    Avatar(AvatarEvent),
    RecordingFinished {
        question_index: usize,
        recording: Recording,
    },
    RecordingTimedOut {
        question_index: usize,
    },
    /// Post-speech grace period elapsed; the generation guards against
    /// windows that were superseded before firing.
    GraceElapsed {
        generation: u64,
    },
    /// The candidate asked to skip the current question.
    SkipRequested,
    /// Collaborator failure raised from a background task.
    CollaboratorFailed {
        message: String,
    },
    /// External request to end the interview immediately.
    Abort,
}

pub struct InterviewRunner {
    machine: InterviewStateMachine,
    avatar: Arc<dyn AvatarSpeech>,
    recorder: Arc<dyn Recorder>,
    media: Arc<dyn MediaGateway>,
    question_source: Arc<dyn QuestionSource>,
    level_engine: AdaptiveLevelEngine,
    weak_points: WeakPointTracker,
    config: EvaluationConfig,

    signal_tx: mpsc::Sender<SessionSignal>,
    signal_rx: mpsc::Receiver<SessionSignal>,

    session_level: JlptLevel,
    speak_queue: VecDeque<String>,
    mic: Option<MediaCapture>,
    owns_mic: bool,
    grace: Option<JoinHandle<()>>,
    grace_generation: u64,
    recording: Option<JoinHandle<()>>,
    grace_period: Duration,
    fallback_answer_timeout: Duration,
}

impl InterviewRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        avatar: Arc<dyn AvatarSpeech>,
        recorder: Arc<dyn Recorder>,
        media: Arc<dyn MediaGateway>,
        question_source: Arc<dyn QuestionSource>,
        level_engine: AdaptiveLevelEngine,
        weak_points: WeakPointTracker,
        config: EvaluationConfig,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(SIGNAL_BUFFER);
        let session_level = level_engine.current_level();
        Self {
            machine: InterviewStateMachine::new(),
            avatar,
            recorder,
            media,
            question_source,
            level_engine,
            weak_points,
            config,
            signal_tx,
            signal_rx,
            session_level,
            speak_queue: VecDeque::new(),
            mic: None,
            owns_mic: false,
            grace: None,
            grace_generation: 0,
            recording: None,
            grace_period: DEFAULT_GRACE_PERIOD,
            fallback_answer_timeout: DEFAULT_ANSWER_TIMEOUT,
        }
    }

    /// Uses a media capture acquired by the caller. The runner will reuse it
    /// but never release it — ownership stays outside.
    pub fn with_capture(mut self, capture: MediaCapture) -> Self {
        self.mic = Some(capture);
        self.owns_mic = false;
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Recording bound used when a question carries no expected duration.
    pub fn with_answer_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_answer_timeout = timeout;
        self
    }

    /// Producer side of the signal channel, for avatar adapters and UIs.
    pub fn signal_sender(&self) -> mpsc::Sender<SessionSignal> {
        self.signal_tx.clone()
    }

    pub fn machine(&self) -> &InterviewStateMachine {
        &self.machine
    }

    pub fn level_engine(&self) -> &AdaptiveLevelEngine {
        &self.level_engine
    }

    pub fn weak_points(&self) -> &WeakPointTracker {
        &self.weak_points
    }

    /// Runs one full interview and returns its evaluation. On any exit path
    /// — completion, abort or failure — background tasks are stopped, a
    /// self-acquired media capture is released exactly once, and the avatar
    /// is disconnected. After a failure the state machine is left in the
    /// `error` state so the caller can `clear_error` and retry.
    pub async fn run(&mut self) -> Result<EvaluationResult> {
        let outcome = self.drive().await;
        self.cleanup().await;
        outcome
    }

    async fn drive(&mut self) -> Result<EvaluationResult> {
        self.machine.initialize();
        self.session_level = self.level_engine.current_level();
        tracing::info!(level = %self.session_level, "connecting to avatar service");
        if let Err(error) = self.avatar.connect().await {
            return Err(self.fail(format!("アバターに接続できませんでした: {error}")));
        }

        loop {
            let signal = self
                .signal_rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("signal channel closed"))?;
            if let Some(result) = self.handle_signal(signal).await? {
                return Ok(result);
            }
        }
    }

    async fn handle_signal(
        &mut self,
        signal: SessionSignal,
    ) -> Result<Option<EvaluationResult>> {
        match signal {
            SessionSignal::Avatar(event) => self.handle_avatar_event(event).await,
            SessionSignal::RecordingFinished {
                question_index,
                recording,
            } => self.handle_recording_finished(question_index, recording).await,
            SessionSignal::RecordingTimedOut { question_index } => {
                if self.machine.is_listening()
                    && question_index == self.machine.current_index()
                {
                    tracing::info!(question_index, "answer window expired, skipping");
                    self.machine.skip_question()?;
                    self.advance().await
                } else {
                    tracing::debug!(question_index, "ignoring stale recording timeout");
                    Ok(None)
                }
            }
            SessionSignal::SkipRequested => {
                if self.machine.is_listening() {
                    self.cancel_recording();
                    self.cancel_grace();
                    self.machine.skip_question()?;
                    self.advance().await
                } else {
                    tracing::debug!(state = %self.machine.state(), "skip ignored");
                    Ok(None)
                }
            }
            SessionSignal::GraceElapsed { generation } => {
                if generation == self.grace_generation
                    && self.machine.is_listening()
                    && self.recording.is_none()
                {
                    self.start_recording();
                }
                Ok(None)
            }
            SessionSignal::CollaboratorFailed { message } => Err(self.fail(message)),
            SessionSignal::Abort => {
                tracing::info!("interview aborted");
                self.machine.reset();
                Err(anyhow!("interview aborted"))
            }
        }
    }

    async fn handle_avatar_event(
        &mut self,
        event: AvatarEvent,
    ) -> Result<Option<EvaluationResult>> {
        match event {
            AvatarEvent::Connected { session_id } => {
                self.machine.connected(session_id)?;
                let questions = match self.question_source.questions(self.session_level).await {
                    Ok(questions) => questions,
                    Err(error) => {
                        return Err(
                            self.fail(format!("質問リストを取得できませんでした: {error}"))
                        )
                    }
                };
                if self.mic.is_none() {
                    match self.media.acquire().await {
                        Ok(capture) => {
                            self.mic = Some(capture);
                            self.owns_mic = true;
                        }
                        Err(error) => {
                            return Err(
                                self.fail(format!("マイクを取得できませんでした: {error}"))
                            )
                        }
                    }
                }
                self.machine.start_interview(questions)?;
                self.speak_queue.push_back(GREETING.to_string());
                self.enqueue_current_question();
                self.speak_next().await?;
            }
            AvatarEvent::SpeakingStarted => {
                self.machine.avatar_start_speaking();
                // A fresh utterance supersedes any pending recording window.
                self.cancel_grace();
            }
            AvatarEvent::SpeakingStopped => {
                if self.speak_queue.is_empty() {
                    self.machine.avatar_stop_speaking();
                    if self.machine.is_listening() {
                        self.schedule_grace();
                    }
                } else {
                    // More utterances queued (e.g. greeting then question):
                    // keep the microphone closed and speak the next one.
                    self.speak_next().await?;
                }
            }
            AvatarEvent::Failed { message } => return Err(self.fail(message)),
        }
        Ok(None)
    }

    async fn handle_recording_finished(
        &mut self,
        question_index: usize,
        recording: Recording,
    ) -> Result<Option<EvaluationResult>> {
        self.recording = None;
        if !self.machine.is_listening() || question_index != self.machine.current_index() {
            // An answer against a question index that no longer matches
            // would corrupt the answer list; surface it instead.
            return Err(self.fail("回答と質問の対応が一致しませんでした".to_string()));
        }
        let Some(question) = self.machine.current_question() else {
            return Err(self.fail("現在の質問が見つかりませんでした".to_string()));
        };
        let answer = Answer {
            question_id: question.id.clone(),
            question_order: question.order,
            audio_url: recording.audio_url,
            transcript: recording.transcript,
            answered_at: Local::now(),
            skipped: false,
        };
        self.machine.submit_answer(answer)?;
        self.advance().await
    }

    /// Moves past the just-submitted answer: next question or completion.
    async fn advance(&mut self) -> Result<Option<EvaluationResult>> {
        self.cancel_recording();
        self.cancel_grace();
        self.machine.next_question()?;
        if self.machine.is_completed() {
            let result = self.finalize().await?;
            return Ok(Some(result));
        }
        self.enqueue_current_question();
        self.speak_next().await?;
        Ok(None)
    }

    async fn finalize(&mut self) -> Result<EvaluationResult> {
        let transcript = self
            .machine
            .answers()
            .iter()
            .filter(|answer| !answer.skipped)
            .map(|answer| answer.transcript.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let result =
            scoring::evaluate_answer_text("面接全体", &transcript, self.session_level, &self.config);

        self.weak_points.apply_scores(&result.scores).await?;
        let next = self.level_engine.record_session(result.total_score).await?;
        tracing::info!(
            total_score = result.total_score,
            next_level = %next.next_level,
            direction = ?next.direction,
            "interview completed"
        );
        Ok(result)
    }

    fn enqueue_current_question(&mut self) {
        let utterance = self
            .machine
            .current_question()
            .map(|question| self.question_utterance(question));
        if let Some(text) = utterance {
            self.speak_queue.push_back(text);
        }
    }

    /// Kana spoken form for levels configured to use it, display text
    /// otherwise.
    fn question_utterance(&self, question: &Question) -> String {
        let settings = self.config.jlpt.settings_for(self.session_level);
        if settings.use_simplified {
            question.utterance().to_string()
        } else {
            question.text.clone()
        }
    }

    async fn speak_next(&mut self) -> Result<()> {
        if let Some(text) = self.speak_queue.pop_front() {
            tracing::debug!(%text, "speaking");
            if let Err(error) = self.avatar.speak(&text).await {
                return Err(self.fail(format!("アバターの発話に失敗しました: {error}")));
            }
        }
        Ok(())
    }

    fn schedule_grace(&mut self) {
        self.cancel_grace();
        self.grace_generation += 1;
        let generation = self.grace_generation;
        let delay = self.grace_period;
        let tx = self.signal_tx.clone();
        self.grace = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(SessionSignal::GraceElapsed { generation }).await;
        }));
    }

    fn cancel_grace(&mut self) {
        // Bump the generation as well: an already-queued elapse message from
        // the aborted timer must not open a recording window.
        self.grace_generation += 1;
        if let Some(handle) = self.grace.take() {
            handle.abort();
        }
    }

    fn start_recording(&mut self) {
        let Some(mic) = self.mic.clone() else {
            let tx = self.signal_tx.clone();
            tokio::spawn(async move {
                let _ = tx
                    .send(SessionSignal::CollaboratorFailed {
                        message: "マイクが利用できません".to_string(),
                    })
                    .await;
            });
            return;
        };
        let Some(question) = self.machine.current_question() else {
            return;
        };
        let question_index = self.machine.current_index();
        let max_duration = if question.expected_duration_seconds > 0 {
            Duration::from_secs(u64::from(question.expected_duration_seconds))
        } else {
            self.fallback_answer_timeout
        };
        let recorder = Arc::clone(&self.recorder);
        let tx = self.signal_tx.clone();
        tracing::debug!(question_index, ?max_duration, "opening recording window");
        self.recording = Some(tokio::spawn(async move {
            match tokio::time::timeout(max_duration, recorder.capture(&mic, max_duration)).await
            {
                Ok(Ok(recording)) => {
                    let _ = tx
                        .send(SessionSignal::RecordingFinished {
                            question_index,
                            recording,
                        })
                        .await;
                }
                Ok(Err(error)) => {
                    let _ = tx
                        .send(SessionSignal::CollaboratorFailed {
                            message: format!("録音に失敗しました: {error}"),
                        })
                        .await;
                }
                Err(_) => {
                    let _ = tx
                        .send(SessionSignal::RecordingTimedOut { question_index })
                        .await;
                }
            }
        }));
    }

    fn cancel_recording(&mut self) {
        if let Some(handle) = self.recording.take() {
            handle.abort();
        }
    }

    fn fail(&mut self, message: String) -> anyhow::Error {
        self.machine.set_error(message.clone());
        anyhow!(message)
    }

    async fn cleanup(&mut self) {
        self.cancel_recording();
        self.cancel_grace();
        self.speak_queue.clear();
        if self.owns_mic {
            if let Some(capture) = self.mic.take() {
                if let Err(error) = self.media.release(capture).await {
                    tracing::warn!(%error, "failed to release media capture");
                }
            }
            self.owns_mic = false;
        }
        if let Err(error) = self.avatar.disconnect().await {
            tracing::warn!(%error, "avatar disconnect failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::MockQuestionSource;
    use crate::recorder::{MockMediaGateway, MockRecorder};
    use crate::speech::MockAvatarSpeech;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use mensetsu_types::config::ScoringConfig;
    use std::sync::OnceLock;

    fn test_questions(count: u32, expected_duration_seconds: u32) -> Vec<Question> {
        (1..=count)
            .map(|order| Question {
                id: format!("Q{order:02}"),
                order,
                text: format!("質問{order}です。"),
                spoken_text: None,
                expected_duration_seconds,
                evaluation_criteria: vec![],
                follow_ups: vec![],
            })
            .collect()
    }

    type SenderSlot = Arc<OnceLock<mpsc::Sender<SessionSignal>>>;

    /// Avatar mock wired like a real adapter: `connect` raises the
    /// connected notification, every `speak` raises speaking started and
    /// stopped.
    fn scripted_avatar(slot: &SenderSlot) -> MockAvatarSpeech {
        let mut avatar = MockAvatarSpeech::new();
        let connect_slot = Arc::clone(slot);
        avatar.expect_connect().returning(move || {
            let tx = connect_slot.get().expect("sender wired");
            tx.try_send(SessionSignal::Avatar(AvatarEvent::Connected {
                session_id: "avatar-sess-1".to_string(),
            }))
            .ok();
            Ok(())
        });
        let speak_slot = Arc::clone(slot);
        avatar.expect_speak().returning(move |_text| {
            let tx = speak_slot.get().expect("sender wired");
            tx.try_send(SessionSignal::Avatar(AvatarEvent::SpeakingStarted))
                .ok();
            tx.try_send(SessionSignal::Avatar(AvatarEvent::SpeakingStopped))
                .ok();
            Ok(())
        });
        avatar.expect_disconnect().returning(|| Ok(()));
        avatar
    }

    fn question_source(questions: Vec<Question>) -> MockQuestionSource {
        let mut source = MockQuestionSource::new();
        source
            .expect_questions()
            .returning(move |_level| Ok(questions.clone()));
        source
    }

    fn working_media() -> MockMediaGateway {
        let mut media = MockMediaGateway::new();
        media.expect_acquire().times(1).returning(|| {
            Ok(MediaCapture {
                device_id: "mic-0".to_string(),
            })
        });
        media.expect_release().times(1).returning(|_capture| Ok(()));
        media
    }

    /// Recorder that never finishes on its own; only the runner's timeout
    /// can end the answer window.
    struct NeverFinishesRecorder;

    #[async_trait]
    impl Recorder for NeverFinishesRecorder {
        async fn capture(
            &self,
            _mic: &MediaCapture,
            _max_duration: Duration,
        ) -> Result<Recording> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Recording {
                transcript: String::new(),
                audio_url: None,
            })
        }
    }

    async fn engines(store: Arc<MemoryStore>) -> (AdaptiveLevelEngine, WeakPointTracker) {
        let level_engine = AdaptiveLevelEngine::load(
            store.clone(),
            "user-1",
            JlptLevel::N3,
            ScoringConfig::default(),
            EvaluationConfig::default().jlpt,
        )
        .await
        .unwrap();
        let weak_points =
            WeakPointTracker::load(store, "user-1", EvaluationConfig::default().weak_point)
                .await
                .unwrap();
        (level_engine, weak_points)
    }

    #[tokio::test]
    async fn full_interview_records_answers_and_feeds_the_engines() {
        let slot: SenderSlot = Arc::new(OnceLock::new());
        let avatar = scripted_avatar(&slot);

        let mut recorder = MockRecorder::new();
        recorder.expect_capture().times(2).returning(|_mic, _max| {
            Ok(Recording {
                transcript: "私は以前の職場でチームリーダーとして働いておりました。".to_string(),
                audio_url: None,
            })
        });

        let store = Arc::new(MemoryStore::new());
        let (level_engine, weak_points) = engines(store).await;

        let mut runner = InterviewRunner::new(
            Arc::new(avatar),
            Arc::new(recorder),
            Arc::new(working_media()),
            Arc::new(question_source(test_questions(2, 60))),
            level_engine,
            weak_points,
            EvaluationConfig::default(),
        )
        .with_grace_period(Duration::from_millis(1));
        slot.set(runner.signal_sender()).unwrap();

        let result = runner.run().await.unwrap();

        assert!(runner.machine().is_completed());
        assert_eq!(runner.machine().answers().len(), 2);
        assert!(runner.machine().answers().iter().all(|a| !a.skipped));
        // Two answers of ~27 chars joined: mid band, passing total.
        assert_eq!(result.total_score, 75);

        let history = runner.level_engine().session_history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].level, JlptLevel::N3);
        assert_eq!(history[0].score, 75);
        assert_eq!(runner.level_engine().current_level(), JlptLevel::N2);
        assert!(runner.weak_points().records().is_empty());
    }

    #[tokio::test]
    async fn expired_answer_windows_synthesize_skipped_answers() {
        let slot: SenderSlot = Arc::new(OnceLock::new());
        let avatar = scripted_avatar(&slot);

        let store = Arc::new(MemoryStore::new());
        let (level_engine, weak_points) = engines(store).await;

        let mut runner = InterviewRunner::new(
            Arc::new(avatar),
            Arc::new(NeverFinishesRecorder),
            Arc::new(working_media()),
            Arc::new(question_source(test_questions(2, 0))),
            level_engine,
            weak_points,
            EvaluationConfig::default(),
        )
        .with_grace_period(Duration::from_millis(1))
        .with_answer_timeout(Duration::from_millis(10));
        slot.set(runner.signal_sender()).unwrap();

        let result = runner.run().await.unwrap();

        assert!(runner.machine().is_completed());
        assert_eq!(runner.machine().answers().len(), 2);
        assert!(runner.machine().answers().iter().all(|a| a.skipped));
        // Empty combined transcript evaluates like a silent session.
        assert!(result.total_score < 70);
        assert_eq!(result.weak_points.len(), 4);
        assert_eq!(runner.weak_points().records().len(), 4);
    }

    #[tokio::test]
    async fn microphone_denial_surfaces_as_session_error() {
        let slot: SenderSlot = Arc::new(OnceLock::new());
        let avatar = scripted_avatar(&slot);

        let mut media = MockMediaGateway::new();
        media
            .expect_acquire()
            .times(1)
            .returning(|| Err(anyhow!("permission denied")));
        // No release expectation: releasing an unacquired capture would
        // panic the mock.

        let store = Arc::new(MemoryStore::new());
        let (level_engine, weak_points) = engines(store).await;

        let mut runner = InterviewRunner::new(
            Arc::new(avatar),
            Arc::new(MockRecorder::new()),
            Arc::new(media),
            Arc::new(question_source(test_questions(1, 60))),
            level_engine,
            weak_points,
            EvaluationConfig::default(),
        );
        slot.set(runner.signal_sender()).unwrap();

        let error = runner.run().await.unwrap_err();
        assert!(error.to_string().contains("マイク"));
        assert!(runner.machine().is_error());
        assert!(runner.level_engine().session_history().is_empty());
    }

    #[tokio::test]
    async fn externally_owned_capture_is_never_released() {
        let slot: SenderSlot = Arc::new(OnceLock::new());
        let avatar = scripted_avatar(&slot);

        let mut recorder = MockRecorder::new();
        recorder.expect_capture().times(1).returning(|_mic, _max| {
            Ok(Recording {
                transcript: "はい、だいじょうぶです。".to_string(),
                audio_url: None,
            })
        });

        // Neither acquire nor release may be called.
        let media = MockMediaGateway::new();

        let store = Arc::new(MemoryStore::new());
        let (level_engine, weak_points) = engines(store).await;

        let mut runner = InterviewRunner::new(
            Arc::new(avatar),
            Arc::new(recorder),
            Arc::new(media),
            Arc::new(question_source(test_questions(1, 60))),
            level_engine,
            weak_points,
            EvaluationConfig::default(),
        )
        .with_capture(MediaCapture {
            device_id: "external-mic".to_string(),
        })
        .with_grace_period(Duration::from_millis(1));
        slot.set(runner.signal_sender()).unwrap();

        runner.run().await.unwrap();
        assert!(runner.machine().is_completed());
    }

    #[tokio::test]
    async fn connect_failure_leaves_a_retryable_error_state() {
        let mut avatar = MockAvatarSpeech::new();
        avatar
            .expect_connect()
            .returning(|| Err(anyhow!("network down")));
        avatar.expect_disconnect().returning(|| Ok(()));

        let store = Arc::new(MemoryStore::new());
        let (level_engine, weak_points) = engines(store).await;

        let mut runner = InterviewRunner::new(
            Arc::new(avatar),
            Arc::new(MockRecorder::new()),
            Arc::new(MockMediaGateway::new()),
            Arc::new(question_source(test_questions(1, 60))),
            level_engine,
            weak_points,
            EvaluationConfig::default(),
        );

        assert!(runner.run().await.is_err());
        assert!(runner.machine().is_error());
        assert!(runner.machine().error().unwrap().contains("接続"));
    }

    #[tokio::test]
    async fn skip_request_mid_listening_advances_with_a_skipped_answer() {
        let slot: SenderSlot = Arc::new(OnceLock::new());
        let avatar = scripted_avatar(&slot);

        let store = Arc::new(MemoryStore::new());
        let (level_engine, weak_points) = engines(store).await;

        let mut runner = InterviewRunner::new(
            Arc::new(avatar),
            Arc::new(NeverFinishesRecorder),
            Arc::new(working_media()),
            Arc::new(question_source(test_questions(1, 60))),
            level_engine,
            weak_points,
            EvaluationConfig::default(),
        )
        .with_grace_period(Duration::from_millis(1));
        slot.set(runner.signal_sender()).unwrap();

        // Ask to skip as soon as the interview is running; the signal sits
        // behind the speak events, so it lands while listening.
        let tx = runner.signal_sender();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(SessionSignal::SkipRequested).await.ok();
        });

        runner.run().await.unwrap();
        assert!(runner.machine().is_completed());
        assert_eq!(runner.machine().answers().len(), 1);
        assert!(runner.machine().answers()[0].skipped);
    }
}
