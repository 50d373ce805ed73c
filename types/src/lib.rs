pub mod config;
pub mod evaluation;
pub mod level;
pub mod question;

pub use config::{EvaluationConfig, JlptConfig, ScoringConfig, WeakPointConfig};
pub use evaluation::{
    CategoryFeedback, CategoryScores, EvaluationCategory, EvaluationResult, WeakPoint,
    WeakPointFinding, WeakPointPriority, WeakPointRecord,
};
pub use level::{
    AdaptiveLevelState, AdjustmentDirection, JlptLevel, LevelEstimate, LevelStats,
    NextLevelResult, SessionResult,
};
pub use question::{Answer, Question};
