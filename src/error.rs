use mensetsu_types::JlptLevel;
use thiserror::Error;

use crate::session::InterviewState;

/// Rejections raised when an injected evaluation configuration is validated,
/// before any session may use it. Callers fall back to the documented
/// defaults instead of operating on rejected values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{section} is missing an entry for {level}")]
    MissingLevel {
        section: &'static str,
        level: JlptLevel,
    },

    #[error("category weights for {level} sum to {sum:.3}, expected 1.0")]
    WeightSum { level: JlptLevel, sum: f64 },

    #[error("estimation range for {higher} must exceed the range for {lower}")]
    EstimationRangeOrder { lower: JlptLevel, higher: JlptLevel },

    #[error("level adjustment high threshold {high} must exceed low threshold {low}")]
    AdjustmentThresholdOrder { high: u8, low: u8 },

    #[error("priority high threshold {high} must exceed medium threshold {medium}")]
    PriorityThresholdOrder { high: i64, medium: i64 },

    #[error("performance grade minimums must not increase from excellent to pass")]
    GradeOrder,
}

/// Violations of the session state machine's transition contract. These are
/// programming errors in the caller, not runtime conditions of the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{action} is not valid in the {state} state")]
    InvalidTransition {
        action: &'static str,
        state: InterviewState,
    },

    #[error("cannot start an interview with an empty question list")]
    EmptyQuestionList,

    #[error("no current question at index {index}")]
    NoCurrentQuestion { index: usize },
}
