use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// JLPT proficiency levels, ordered from easiest (N5) to hardest (N1).
///
/// The declaration order drives `Ord`, so `JlptLevel::N5 < JlptLevel::N1`
/// and "higher level" always means "closer to N1".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JlptLevel {
    N5,
    N4,
    N3,
    N2,
    N1,
}

impl JlptLevel {
    /// All levels, lowest first.
    pub const ALL: [JlptLevel; 5] = [
        JlptLevel::N5,
        JlptLevel::N4,
        JlptLevel::N3,
        JlptLevel::N2,
        JlptLevel::N1,
    ];

    /// One level up. Saturates at N1.
    pub fn higher(self) -> JlptLevel {
        match self {
            JlptLevel::N5 => JlptLevel::N4,
            JlptLevel::N4 => JlptLevel::N3,
            JlptLevel::N3 => JlptLevel::N2,
            JlptLevel::N2 | JlptLevel::N1 => JlptLevel::N1,
        }
    }

    /// One level down. Saturates at N5.
    pub fn lower(self) -> JlptLevel {
        match self {
            JlptLevel::N1 => JlptLevel::N2,
            JlptLevel::N2 => JlptLevel::N3,
            JlptLevel::N3 => JlptLevel::N4,
            JlptLevel::N4 | JlptLevel::N5 => JlptLevel::N5,
        }
    }

    pub fn is_highest(self) -> bool {
        self == JlptLevel::N1
    }

    pub fn is_lowest(self) -> bool {
        self == JlptLevel::N5
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JlptLevel::N1 => "N1",
            JlptLevel::N2 => "N2",
            JlptLevel::N3 => "N3",
            JlptLevel::N4 => "N4",
            JlptLevel::N5 => "N5",
        }
    }
}

impl std::fmt::Display for JlptLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of the last automatic level adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentDirection {
    Up,
    Down,
    Stable,
}

/// Outcome of a next-level calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextLevelResult {
    pub next_level: JlptLevel,
    pub direction: AdjustmentDirection,
    pub can_go_higher: bool,
    pub can_go_lower: bool,
}

/// One completed interview session, as recorded in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// Level the session was conducted at (before any adjustment).
    pub level: JlptLevel,
    /// Weighted total score, 0..=100.
    pub score: u8,
    pub timestamp: DateTime<Local>,
    /// True if the session used the daily challenge allowance.
    #[serde(default)]
    pub is_challenge_session: bool,
}

/// Persisted adaptive-level state for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveLevelState {
    /// Level the user self-reported at onboarding.
    pub declared_level: JlptLevel,
    /// Effective level for the next session.
    pub current_level: JlptLevel,
    /// Append-only, ordered by creation time.
    pub session_history: Vec<SessionResult>,
    pub adjustment_direction: AdjustmentDirection,
    pub is_challenge_mode: bool,
}

impl AdaptiveLevelState {
    pub fn new(declared_level: JlptLevel) -> Self {
        Self {
            declared_level,
            current_level: declared_level,
            session_history: Vec::new(),
            adjustment_direction: AdjustmentDirection::Stable,
            is_challenge_mode: false,
        }
    }
}

/// Aggregate statistics for one level's session history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub level: JlptLevel,
    pub session_count: usize,
    pub average_score: u8,
    pub highest_score: u8,
    pub lowest_score: u8,
    pub latest_score: u8,
}

/// Estimated demonstrated competence; may fall below the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelEstimate {
    At(JlptLevel),
    BelowN5,
}

impl std::fmt::Display for LevelEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelEstimate::At(level) => level.fmt(f),
            LevelEstimate::BelowN5 => f.write_str("below_N5"),
        }
    }
}

impl Serialize for LevelEstimate {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
