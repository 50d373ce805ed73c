use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::evaluation::EvaluationCategory;
use crate::level::JlptLevel;

/// Relative weight of each evaluation category in the total score.
///
/// The four weights of a valid configuration sum to 1.0 (±0.001); that is
/// checked when a configuration is loaded, not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    pub vocabulary: f64,
    pub grammar: f64,
    pub content: f64,
    pub honorifics: f64,
}

impl CategoryWeights {
    pub fn get(&self, category: EvaluationCategory) -> f64 {
        match category {
            EvaluationCategory::Vocabulary => self.vocabulary,
            EvaluationCategory::Grammar => self.grammar,
            EvaluationCategory::Content => self.content,
            EvaluationCategory::Honorifics => self.honorifics,
        }
    }

    pub fn sum(&self) -> f64 {
        self.vocabulary + self.grammar + self.content + self.honorifics
    }
}

/// Per-level presentation settings for the avatar and follow-up probing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSettings {
    /// Avatar speech rate, 0.5..=1.5.
    pub speech_rate: f64,
    /// Use the simplified (kana) question form when available.
    pub use_simplified: bool,
    /// Maximum follow-up questions per top-level question.
    pub follow_up_depth: u32,
}

/// JLPT-level-dependent configuration: scoring weights, presentation
/// settings and the minimum scores backing level estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JlptConfig {
    pub weights: BTreeMap<JlptLevel, CategoryWeights>,
    pub settings: BTreeMap<JlptLevel, LevelSettings>,
    /// Minimum average score considered evidence of competence at a level.
    /// Strictly increasing toward N1 in any valid configuration.
    pub estimation_ranges: BTreeMap<JlptLevel, u8>,
}

impl JlptConfig {
    /// Weights for `level`, falling back to the documented defaults when the
    /// injected configuration is missing the level (load-time validation
    /// rejects such configurations, so the fallback only covers hand-built
    /// partial configs in tests).
    pub fn weights_for(&self, level: JlptLevel) -> CategoryWeights {
        self.weights
            .get(&level)
            .copied()
            .unwrap_or_else(|| default_weights(level))
    }

    pub fn settings_for(&self, level: JlptLevel) -> LevelSettings {
        self.settings
            .get(&level)
            .copied()
            .unwrap_or_else(|| default_settings(level))
    }
}

impl Default for JlptConfig {
    fn default() -> Self {
        Self {
            weights: JlptLevel::ALL
                .into_iter()
                .map(|l| (l, default_weights(l)))
                .collect(),
            settings: JlptLevel::ALL
                .into_iter()
                .map(|l| (l, default_settings(l)))
                .collect(),
            estimation_ranges: [
                (JlptLevel::N1, 80),
                (JlptLevel::N2, 70),
                (JlptLevel::N3, 60),
                (JlptLevel::N4, 50),
                (JlptLevel::N5, 40),
            ]
            .into_iter()
            .collect(),
        }
    }
}

fn default_weights(level: JlptLevel) -> CategoryWeights {
    let (vocabulary, grammar, content, honorifics) = match level {
        JlptLevel::N1 => (0.20, 0.20, 0.25, 0.35),
        JlptLevel::N2 => (0.20, 0.25, 0.25, 0.30),
        JlptLevel::N3 => (0.25, 0.30, 0.25, 0.20),
        JlptLevel::N4 => (0.30, 0.35, 0.25, 0.10),
        JlptLevel::N5 => (0.35, 0.40, 0.20, 0.05),
    };
    CategoryWeights {
        vocabulary,
        grammar,
        content,
        honorifics,
    }
}

fn default_settings(level: JlptLevel) -> LevelSettings {
    let (speech_rate, use_simplified, follow_up_depth) = match level {
        JlptLevel::N1 => (1.0, false, 3),
        JlptLevel::N2 => (1.0, false, 2),
        JlptLevel::N3 => (0.75, false, 2),
        JlptLevel::N4 => (0.5, true, 1),
        JlptLevel::N5 => (0.5, true, 1),
    };
    LevelSettings {
        speech_rate,
        use_simplified,
        follow_up_depth,
    }
}

/// Score bands for the performance grade shown in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceGrades {
    pub excellent_min: u8,
    pub good_min: u8,
    pub pass_min: u8,
}

impl Default for PerformanceGrades {
    fn default() -> Self {
        Self {
            excellent_min: 90,
            good_min: 80,
            pass_min: 70,
        }
    }
}

/// Thresholds driving automatic level adjustment and the daily challenge
/// allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelAdjustment {
    /// Score at or above which the level moves up.
    pub high_threshold: u8,
    /// Score at or below which the level moves down.
    pub low_threshold: u8,
    pub daily_challenge_limit: u32,
}

impl Default for LevelAdjustment {
    fn default() -> Self {
        Self {
            high_threshold: 70,
            low_threshold: 30,
            daily_challenge_limit: 3,
        }
    }
}

/// Level and score a job profile requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequirement {
    pub required_level: JlptLevel,
    pub min_score: u8,
}

/// Requirements backing the job-suitability verdicts in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSuitabilityConfig {
    pub basic_service: JobRequirement,
    pub general_work: JobRequirement,
    pub business_honorifics: JobRequirement,
    pub advanced_work: JobRequirement,
}

impl Default for JobSuitabilityConfig {
    fn default() -> Self {
        Self {
            basic_service: JobRequirement {
                required_level: JlptLevel::N4,
                min_score: 70,
            },
            general_work: JobRequirement {
                required_level: JlptLevel::N3,
                min_score: 70,
            },
            business_honorifics: JobRequirement {
                required_level: JlptLevel::N2,
                min_score: 70,
            },
            advanced_work: JobRequirement {
                required_level: JlptLevel::N1,
                min_score: 70,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub performance_grades: PerformanceGrades,
    pub level_adjustment: LevelAdjustment,
    pub job_suitability: JobSuitabilityConfig,
}

/// Weights of the weak-point priority score:
/// `occurrence_count * occurrence_multiplier
///  + max(0, recency_window_days - days_since_last_occurrence)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub occurrence_multiplier: i64,
    pub recency_window_days: i64,
    /// Priority score at or above which a record is `high`.
    pub high_threshold: i64,
    /// Priority score at or above which a record is `medium`.
    pub medium_threshold: i64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            occurrence_multiplier: 10,
            recency_window_days: 30,
            high_threshold: 50,
            medium_threshold: 25,
        }
    }
}

/// Weak-point detection and resolution thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeakPointConfig {
    /// Category scores strictly below this count as a weak-point occurrence.
    pub threshold: u8,
    /// Occurrences needed before the weakness is promoted to a user tag.
    pub tag_threshold: u32,
    /// Consecutive high scores needed to resolve a record.
    pub resolution_count: u32,
    /// Category scores at or above this count toward resolution.
    pub resolution_score: u8,
    pub priority: PriorityWeights,
}

impl Default for WeakPointConfig {
    fn default() -> Self {
        Self {
            threshold: 70,
            tag_threshold: 3,
            resolution_count: 3,
            resolution_score: 80,
            priority: PriorityWeights::default(),
        }
    }
}

/// The full injected evaluation configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    pub jlpt: JlptConfig,
    pub scoring: ScoringConfig,
    pub weak_point: WeakPointConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one_for_every_level() {
        let config = JlptConfig::default();
        for level in JlptLevel::ALL {
            let sum = config.weights_for(level).sum();
            assert!((sum - 1.0).abs() < 1e-3, "{level}: {sum}");
        }
    }

    #[test]
    fn default_estimation_ranges_increase_toward_n1() {
        let config = JlptConfig::default();
        let mut previous = 0u8;
        for level in JlptLevel::ALL {
            let min = config.estimation_ranges[&level];
            assert!(min > previous, "{level} range must exceed {previous}");
            previous = min;
        }
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = EvaluationConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        let back: EvaluationConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
