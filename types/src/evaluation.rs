use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// The four linguistic categories every answer is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationCategory {
    Vocabulary,
    Grammar,
    Content,
    Honorifics,
}

impl EvaluationCategory {
    pub const ALL: [EvaluationCategory; 4] = [
        EvaluationCategory::Vocabulary,
        EvaluationCategory::Grammar,
        EvaluationCategory::Content,
        EvaluationCategory::Honorifics,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EvaluationCategory::Vocabulary => "vocabulary",
            EvaluationCategory::Grammar => "grammar",
            EvaluationCategory::Content => "content",
            EvaluationCategory::Honorifics => "honorifics",
        }
    }

    /// Japanese display label.
    pub fn label_ja(self) -> &'static str {
        match self {
            EvaluationCategory::Vocabulary => "語彙",
            EvaluationCategory::Grammar => "文法",
            EvaluationCategory::Content => "内容",
            EvaluationCategory::Honorifics => "敬語",
        }
    }
}

impl std::fmt::Display for EvaluationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-category scores, each clamped to 0..=100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub vocabulary: u8,
    pub grammar: u8,
    pub content: u8,
    pub honorifics: u8,
}

impl CategoryScores {
    pub fn new(vocabulary: u8, grammar: u8, content: u8, honorifics: u8) -> Self {
        Self {
            vocabulary: vocabulary.min(100),
            grammar: grammar.min(100),
            content: content.min(100),
            honorifics: honorifics.min(100),
        }
    }

    pub fn get(&self, category: EvaluationCategory) -> u8 {
        match category {
            EvaluationCategory::Vocabulary => self.vocabulary,
            EvaluationCategory::Grammar => self.grammar,
            EvaluationCategory::Content => self.content,
            EvaluationCategory::Honorifics => self.honorifics,
        }
    }
}

/// Free-text feedback per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    pub vocabulary: String,
    pub grammar: String,
    pub content: String,
    pub honorifics: String,
}

impl CategoryFeedback {
    pub fn get(&self, category: EvaluationCategory) -> &str {
        match category {
            EvaluationCategory::Vocabulary => &self.vocabulary,
            EvaluationCategory::Grammar => &self.grammar,
            EvaluationCategory::Content => &self.content,
            EvaluationCategory::Honorifics => &self.honorifics,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeakPointPriority {
    High,
    Medium,
    Low,
}

/// A single-session weak-category finding, before it enters the
/// cross-session tracking lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeakPointFinding {
    pub category: EvaluationCategory,
    pub description: String,
    pub example: String,
    pub suggestion: String,
}

/// A weak point as surfaced in an evaluation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakPoint {
    pub id: String,
    pub category: EvaluationCategory,
    pub description: String,
    pub example: String,
    pub suggestion: String,
    pub priority: WeakPointPriority,
    pub occurrence_count: u32,
    pub last_occurred_at: DateTime<Local>,
    pub resolved: bool,
}

/// Persisted record of a recurring weakness for one (user, category) pair.
///
/// Created on the first sub-threshold score in a category. At most one
/// unresolved record per category exists at a time; once `resolved` is set
/// the record is frozen and a later recurrence opens a fresh record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeakPointRecord {
    pub id: String,
    pub user_id: String,
    pub category: EvaluationCategory,
    pub description: String,
    pub priority: WeakPointPriority,
    pub occurrence_count: u32,
    pub last_occurred_at: DateTime<Local>,
    pub consecutive_high_scores: u32,
    pub resolved: bool,
    pub created_at: DateTime<Local>,
    pub updated_at: DateTime<Local>,
}

/// Evaluation of a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub scores: CategoryScores,
    pub feedback: CategoryFeedback,
    pub weak_points: Vec<WeakPoint>,
    pub overall_feedback: String,
    /// Weighted total, 0..=100.
    pub total_score: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_clamp_to_hundred() {
        let scores = CategoryScores::new(120, 100, 99, 0);
        assert_eq!(scores.vocabulary, 100);
        assert_eq!(scores.grammar, 100);
        assert_eq!(scores.content, 99);
        assert_eq!(scores.honorifics, 0);
    }

    #[test]
    fn category_serializes_lowercase() {
        let json = serde_json::to_string(&EvaluationCategory::Honorifics).unwrap();
        assert_eq!(json, "\"honorifics\"");
    }

    #[test]
    fn get_matches_field_order() {
        let scores = CategoryScores::new(10, 20, 30, 40);
        assert_eq!(scores.get(EvaluationCategory::Vocabulary), 10);
        assert_eq!(scores.get(EvaluationCategory::Grammar), 20);
        assert_eq!(scores.get(EvaluationCategory::Content), 30);
        assert_eq!(scores.get(EvaluationCategory::Honorifics), 40);
    }
}
