//! Follow-up question depth control.
//!
//! Each top-level question allows at most a level-dependent number of
//! supplementary questions; higher levels permit deeper probing. Issued
//! follow-up texts are remembered so the same probe is never asked twice.

use std::collections::HashMap;

use mensetsu_types::{JlptConfig, JlptLevel, Question};

/// Per-question follow-up progress. Created on first access within a
/// session and discarded on session reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpState {
    pub question_id: String,
    pub current_depth: usize,
    pub max_depth: usize,
    pub used_follow_ups: Vec<String>,
}

impl FollowUpState {
    pub fn new(question_id: impl Into<String>, level: JlptLevel, jlpt: &JlptConfig) -> Self {
        Self {
            question_id: question_id.into(),
            current_depth: 0,
            max_depth: max_follow_up_depth(level, jlpt),
            used_follow_ups: Vec::new(),
        }
    }
}

/// Maximum follow-up chain length permitted at `level`.
pub fn max_follow_up_depth(level: JlptLevel, jlpt: &JlptConfig) -> usize {
    jlpt.settings_for(level).follow_up_depth as usize
}

pub fn can_ask_follow_up(state: &FollowUpState) -> bool {
    state.current_depth < state.max_depth
}

/// The question's follow-up list truncated to the level's maximum depth,
/// for callers that want the full eligible set up front.
pub fn limited_follow_ups(question: &Question, level: JlptLevel, jlpt: &JlptConfig) -> Vec<String> {
    let max_depth = max_follow_up_depth(level, jlpt);
    question.follow_ups.iter().take(max_depth).cloned().collect()
}

/// The follow-up at the current depth, or `None` when depth is exhausted,
/// the list has run out, or that text was already issued.
pub fn next_follow_up(question: &Question, state: &FollowUpState) -> Option<String> {
    if !can_ask_follow_up(state) {
        return None;
    }
    let candidate = question.follow_ups.get(state.current_depth)?;
    if state.used_follow_ups.iter().any(|used| used == candidate) {
        return None;
    }
    Some(candidate.clone())
}

/// Advances the depth and records the issued text.
pub fn advance_follow_up_state(state: &FollowUpState, issued: impl Into<String>) -> FollowUpState {
    let mut next = state.clone();
    next.current_depth += 1;
    next.used_follow_ups.push(issued.into());
    next
}

/// Session-wide follow-up bookkeeping across all questions.
#[derive(Debug)]
pub struct FollowUpManager {
    states: HashMap<String, FollowUpState>,
    level: JlptLevel,
    jlpt: JlptConfig,
}

impl FollowUpManager {
    pub fn new(level: JlptLevel, jlpt: JlptConfig) -> Self {
        Self {
            states: HashMap::new(),
            level,
            jlpt,
        }
    }

    /// The question's state, initialized on first access.
    pub fn state(&mut self, question_id: &str) -> &FollowUpState {
        if !self.states.contains_key(question_id) {
            let state = FollowUpState::new(question_id, self.level, &self.jlpt);
            self.states.insert(question_id.to_string(), state);
        }
        &self.states[question_id]
    }

    /// Issues the next follow-up for the question, advancing its state.
    pub fn use_next_follow_up(&mut self, question: &Question) -> Option<String> {
        let state = self.state(&question.id).clone();
        let follow_up = next_follow_up(question, &state)?;
        self.states.insert(
            question.id.clone(),
            advance_follow_up_state(&state, follow_up.as_str()),
        );
        Some(follow_up)
    }

    pub fn can_follow_up(&mut self, question_id: &str) -> bool {
        can_ask_follow_up(self.state(question_id))
    }

    pub fn remaining_follow_ups(&mut self, question_id: &str) -> usize {
        let state = self.state(question_id);
        state.max_depth.saturating_sub(state.current_depth)
    }

    pub fn reset(&mut self) {
        self.states.clear();
    }

    /// Switches level; all per-question progress is discarded since depth
    /// limits differ between levels.
    pub fn set_level(&mut self, level: JlptLevel) {
        self.level = level;
        self.reset();
    }
}
