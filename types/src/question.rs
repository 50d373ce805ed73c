use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// An interview question as issued to a session. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    /// 1-based position in the session's question list.
    pub order: u32,
    /// Display text.
    pub text: String,
    /// Kana reading for the avatar, when it differs from the display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoken_text: Option<String>,
    pub expected_duration_seconds: u32,
    pub evaluation_criteria: Vec<String>,
    /// Supplementary questions, ordered by probing depth.
    #[serde(default)]
    pub follow_ups: Vec<String>,
}

impl Question {
    /// Text the avatar should actually speak.
    pub fn utterance(&self) -> &str {
        self.spoken_text.as_deref().unwrap_or(&self.text)
    }
}

/// A candidate's answer to one question. Created exactly once per question
/// per session and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub question_order: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Final transcript; empty when the question was skipped or nothing was
    /// recognized.
    pub transcript: String,
    pub answered_at: DateTime<Local>,
    pub skipped: bool,
}

impl Answer {
    /// Synthesizes the skipped-answer form used for explicit skips and
    /// recording timeouts.
    pub fn skipped(question: &Question, answered_at: DateTime<Local>) -> Self {
        Self {
            question_id: question.id.clone(),
            question_order: question.order,
            audio_url: None,
            transcript: String::new(),
            answered_at,
            skipped: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utterance_prefers_spoken_text() {
        let mut q = Question {
            id: "Q03".into(),
            order: 1,
            text: "日本の生活には慣れましたか？".into(),
            spoken_text: Some("にほんの　せいかつには　なれましたか？".into()),
            expected_duration_seconds: 60,
            evaluation_criteria: vec!["adaptability".into()],
            follow_ups: vec![],
        };
        assert_eq!(q.utterance(), "にほんの　せいかつには　なれましたか？");
        q.spoken_text = None;
        assert_eq!(q.utterance(), "日本の生活には慣れましたか？");
    }

    #[test]
    fn skipped_answer_is_empty_and_flagged() {
        let q = Question {
            id: "Q05".into(),
            order: 2,
            text: "…".into(),
            spoken_text: None,
            expected_duration_seconds: 60,
            evaluation_criteria: vec![],
            follow_ups: vec![],
        };
        let a = Answer::skipped(&q, Local::now());
        assert!(a.skipped);
        assert!(a.transcript.is_empty());
        assert_eq!(a.question_id, "Q05");
        assert_eq!(a.question_order, 2);
    }
}
