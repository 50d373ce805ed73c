//! The interview session state machine.
//!
//! A plain synchronous struct with one named entry point per transition.
//! Collaborators never get polled; the avatar/speech and recording layers
//! push notifications in through these entry points, and the caller reads
//! the derived projections (`is_listening`, `current_question`, ...).

use chrono::Local;
use mensetsu_types::{Answer, Question};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewState {
    /// Avatar connection in progress.
    Initializing,
    /// Connected, waiting for the interview to start.
    Ready,
    /// The interviewer avatar is speaking the current question.
    AvatarSpeaking,
    /// Recording window for the candidate's answer.
    Listening,
    /// Answer submitted, advancing.
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for InterviewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InterviewState::Initializing => "initializing",
            InterviewState::Ready => "ready",
            InterviewState::AvatarSpeaking => "avatar_speaking",
            InterviewState::Listening => "listening",
            InterviewState::Processing => "processing",
            InterviewState::Completed => "completed",
            InterviewState::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct InterviewStateMachine {
    state: InterviewState,
    current_index: usize,
    questions: Vec<Question>,
    answers: Vec<Answer>,
    avatar_session_id: Option<String>,
    error: Option<String>,
}

impl Default for InterviewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl InterviewStateMachine {
    pub fn new() -> Self {
        Self {
            state: InterviewState::Initializing,
            current_index: 0,
            questions: Vec::new(),
            answers: Vec::new(),
            avatar_session_id: None,
            error: None,
        }
    }

    fn transition(&mut self, action: &'static str, to: InterviewState) {
        tracing::debug!(%action, from = %self.state, %to, "session transition");
        self.state = to;
    }

    fn guard(
        &self,
        action: &'static str,
        allowed: &[InterviewState],
    ) -> Result<(), SessionError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }

    /// Unconditional re-entry into `initializing`, discarding all session
    /// progress.
    pub fn initialize(&mut self) {
        *self = Self::new();
    }

    /// The avatar connection came up; records the external session handle.
    pub fn connected(&mut self, avatar_session_id: impl Into<String>) -> Result<(), SessionError> {
        self.guard("connected", &[InterviewState::Initializing])?;
        self.avatar_session_id = Some(avatar_session_id.into());
        self.error = None;
        self.transition("connected", InterviewState::Ready);
        Ok(())
    }

    /// Loads the ordered question list and enters the first question.
    pub fn start_interview(&mut self, questions: Vec<Question>) -> Result<(), SessionError> {
        self.guard("start_interview", &[InterviewState::Ready])?;
        if questions.is_empty() {
            return Err(SessionError::EmptyQuestionList);
        }
        self.questions = questions;
        self.current_index = 0;
        self.answers.clear();
        self.transition("start_interview", InterviewState::AvatarSpeaking);
        Ok(())
    }

    /// Speaking-started notification. Duplicate or out-of-order SDK events
    /// are tolerated as no-ops.
    pub fn avatar_start_speaking(&mut self) {
        if matches!(
            self.state,
            InterviewState::Ready | InterviewState::Processing
        ) {
            self.transition("avatar_start_speaking", InterviewState::AvatarSpeaking);
        }
    }

    /// Speaking-stopped notification; opens the recording window.
    pub fn avatar_stop_speaking(&mut self) {
        if self.state == InterviewState::AvatarSpeaking {
            self.transition("avatar_stop_speaking", InterviewState::Listening);
        }
    }

    /// Records the answer for the current question. Only valid while
    /// listening; exactly one answer is recorded per question, in index
    /// order.
    pub fn submit_answer(&mut self, answer: Answer) -> Result<(), SessionError> {
        self.guard("submit_answer", &[InterviewState::Listening])?;
        self.answers.push(answer);
        self.transition("submit_answer", InterviewState::Processing);
        Ok(())
    }

    /// Equivalent to submitting an empty answer with the skipped flag set.
    pub fn skip_question(&mut self) -> Result<(), SessionError> {
        self.guard("skip_question", &[InterviewState::Listening])?;
        let question = self
            .questions
            .get(self.current_index)
            .ok_or(SessionError::NoCurrentQuestion {
                index: self.current_index,
            })?;
        let answer = Answer::skipped(question, Local::now());
        self.answers.push(answer);
        self.transition("skip_question", InterviewState::Processing);
        Ok(())
    }

    /// Advances past the just-answered question: back to the avatar for the
    /// next one, or into `completed` when the last answer is in.
    pub fn next_question(&mut self) -> Result<(), SessionError> {
        self.guard("next_question", &[InterviewState::Processing])?;
        let next_index = self.current_index + 1;
        self.current_index = next_index;
        if next_index >= self.questions.len() {
            self.transition("next_question", InterviewState::Completed);
        } else {
            self.transition("next_question", InterviewState::AvatarSpeaking);
        }
        Ok(())
    }

    /// Captures a failure message from any state.
    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, from = %self.state, "session error");
        self.error = Some(message);
        self.state = InterviewState::Error;
    }

    /// Returns to `ready` after an error. Question progress is discarded:
    /// the upstream connection must be assumed stale, so the caller restarts
    /// the interview rather than resuming mid-question.
    pub fn clear_error(&mut self) -> Result<(), SessionError> {
        self.guard("clear_error", &[InterviewState::Error])?;
        self.error = None;
        self.questions.clear();
        self.answers.clear();
        self.current_index = 0;
        self.transition("clear_error", InterviewState::Ready);
        Ok(())
    }

    /// Unconditional return to `initializing`, discarding everything.
    pub fn reset(&mut self) {
        self.transition("reset", InterviewState::Initializing);
        *self = Self::new();
    }

    // Projections.

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == InterviewState::Ready
    }

    pub fn is_avatar_speaking(&self) -> bool {
        self.state == InterviewState::AvatarSpeaking
    }

    pub fn is_listening(&self) -> bool {
        self.state == InterviewState::Listening
    }

    pub fn is_processing(&self) -> bool {
        self.state == InterviewState::Processing
    }

    pub fn is_completed(&self) -> bool {
        self.state == InterviewState::Completed
    }

    pub fn is_error(&self) -> bool {
        self.state == InterviewState::Error
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn avatar_session_id(&self) -> Option<&str> {
        self.avatar_session_id.as_deref()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// Percentage of questions answered, rounded. Evaluated against the
    /// current index, so completing question 1 of 2 reads 50, not 100.
    pub fn progress(&self) -> u8 {
        if self.questions.is_empty() {
            return 0;
        }
        let ratio = self.current_index as f64 / self.questions.len() as f64;
        (ratio * 100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: &str, order: u32) -> Question {
        Question {
            id: id.into(),
            order,
            text: format!("質問{order}"),
            spoken_text: None,
            expected_duration_seconds: 60,
            evaluation_criteria: vec![],
            follow_ups: vec![],
        }
    }

    fn answer(q: &Question, transcript: &str) -> Answer {
        Answer {
            question_id: q.id.clone(),
            question_order: q.order,
            audio_url: None,
            transcript: transcript.into(),
            answered_at: Local::now(),
            skipped: false,
        }
    }

    fn two_question_machine() -> InterviewStateMachine {
        let mut machine = InterviewStateMachine::new();
        machine.connected("sess-1").unwrap();
        machine
            .start_interview(vec![question("Q1", 1), question("Q2", 2)])
            .unwrap();
        machine
    }

    #[test]
    fn full_walkthrough_reaches_completed_with_all_answers() {
        let mut machine = two_question_machine();
        assert!(machine.is_avatar_speaking());

        for _ in 0..2 {
            machine.avatar_stop_speaking();
            assert!(machine.is_listening());
            let q = machine.current_question().unwrap().clone();
            machine.submit_answer(answer(&q, "はい、大丈夫です。")).unwrap();
            machine.next_question().unwrap();
            machine.avatar_start_speaking();
        }

        assert!(machine.is_completed());
        assert_eq!(machine.answers().len(), machine.total_questions());
    }

    #[test]
    fn progress_is_fifty_after_first_of_two() {
        let mut machine = two_question_machine();
        machine.avatar_stop_speaking();
        let q = machine.current_question().unwrap().clone();
        machine.submit_answer(answer(&q, "…")).unwrap();
        machine.next_question().unwrap();
        assert_eq!(machine.progress(), 50);
        assert!(machine.is_avatar_speaking());
    }

    #[test]
    fn submit_answer_is_guarded_outside_listening() {
        let mut machine = two_question_machine();
        let q = machine.current_question().unwrap().clone();
        let err = machine.submit_answer(answer(&q, "x")).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidTransition {
                action: "submit_answer",
                state: InterviewState::AvatarSpeaking,
            }
        );
    }

    #[test]
    fn start_interview_rejects_empty_question_list() {
        let mut machine = InterviewStateMachine::new();
        machine.connected("sess-1").unwrap();
        assert_eq!(
            machine.start_interview(vec![]).unwrap_err(),
            SessionError::EmptyQuestionList
        );
    }

    #[test]
    fn skip_records_a_skipped_answer_and_advances() {
        let mut machine = two_question_machine();
        machine.avatar_stop_speaking();
        machine.skip_question().unwrap();
        assert!(machine.is_processing());
        assert!(machine.answers()[0].skipped);
        assert!(machine.answers()[0].transcript.is_empty());
    }

    #[test]
    fn duplicate_speaking_events_are_tolerated() {
        let mut machine = two_question_machine();
        machine.avatar_start_speaking();
        assert!(machine.is_avatar_speaking());
        machine.avatar_stop_speaking();
        machine.avatar_stop_speaking();
        assert!(machine.is_listening());
    }

    #[test]
    fn error_from_any_state_and_clear_returns_to_ready() {
        let mut machine = two_question_machine();
        machine.set_error("avatar connection lost");
        assert!(machine.is_error());
        assert_eq!(machine.error(), Some("avatar connection lost"));

        machine.clear_error().unwrap();
        assert!(machine.is_ready());
        assert_eq!(machine.error(), None);
        // Question progress is discarded, the connection handle is kept.
        assert_eq!(machine.total_questions(), 0);
        assert_eq!(machine.avatar_session_id(), Some("sess-1"));
    }

    #[test]
    fn clear_error_is_guarded_outside_error() {
        let mut machine = two_question_machine();
        assert!(machine.clear_error().is_err());
    }

    #[test]
    fn reset_discards_everything() {
        let mut machine = two_question_machine();
        machine.reset();
        assert_eq!(machine.state(), InterviewState::Initializing);
        assert_eq!(machine.avatar_session_id(), None);
        assert_eq!(machine.total_questions(), 0);
        assert_eq!(machine.progress(), 0);
    }

    #[test]
    fn completing_the_final_question_yields_full_progress() {
        let mut machine = two_question_machine();
        for _ in 0..2 {
            machine.avatar_stop_speaking();
            machine.skip_question().unwrap();
            machine.next_question().unwrap();
            machine.avatar_start_speaking();
        }
        assert!(machine.is_completed());
        assert_eq!(machine.progress(), 100);
        assert_eq!(machine.current_question(), None);
    }
}
