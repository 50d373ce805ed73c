//! Aggregate evaluation report for reviewers (e.g. a hiring company):
//! per-level performance, estimated level and job-suitability verdicts.

use chrono::{DateTime, Local};
use mensetsu_types::config::{
    JobRequirement, JobSuitabilityConfig, JlptConfig, PerformanceGrades, ScoringConfig,
};
use mensetsu_types::{CategoryScores, JlptLevel, LevelEstimate, SessionResult, WeakPoint};
use serde::Serialize;

use crate::level::{calculate_estimated_level, calculate_level_stats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceGrade {
    Excellent,
    Good,
    Pass,
    Fail,
    NotTested,
}

pub fn performance_grade(average: Option<u8>, grades: &PerformanceGrades) -> PerformanceGrade {
    match average {
        None => PerformanceGrade::NotTested,
        Some(score) if score >= grades.excellent_min => PerformanceGrade::Excellent,
        Some(score) if score >= grades.good_min => PerformanceGrade::Good,
        Some(score) if score >= grades.pass_min => PerformanceGrade::Pass,
        Some(_) => PerformanceGrade::Fail,
    }
}

/// Aggregate performance at one level across the whole history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelPerformance {
    pub level: JlptLevel,
    pub average_score: Option<u8>,
    pub session_count: usize,
    pub grade: PerformanceGrade,
    /// True when any of the level's sessions used the challenge allowance.
    pub includes_challenge: bool,
}

pub fn level_performances(
    history: &[SessionResult],
    grades: &PerformanceGrades,
) -> Vec<LevelPerformance> {
    JlptLevel::ALL
        .into_iter()
        .map(|level| {
            let stats = calculate_level_stats(history, level);
            let includes_challenge = history
                .iter()
                .any(|s| s.level == level && s.is_challenge_session);
            LevelPerformance {
                level,
                average_score: stats.as_ref().map(|s| s.average_score),
                session_count: stats.as_ref().map_or(0, |s| s.session_count),
                grade: performance_grade(stats.as_ref().map(|s| s.average_score), grades),
                includes_challenge,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimationDirection {
    Higher,
    Lower,
    Same,
}

fn estimate_rank(estimate: LevelEstimate) -> u8 {
    match estimate {
        LevelEstimate::BelowN5 => 0,
        LevelEstimate::At(level) => match level {
            JlptLevel::N5 => 1,
            JlptLevel::N4 => 2,
            JlptLevel::N3 => 3,
            JlptLevel::N2 => 4,
            JlptLevel::N1 => 5,
        },
    }
}

pub fn estimation_direction(declared: JlptLevel, estimate: LevelEstimate) -> EstimationDirection {
    let declared_rank = estimate_rank(LevelEstimate::At(declared));
    let estimated_rank = estimate_rank(estimate);
    match estimated_rank.cmp(&declared_rank) {
        std::cmp::Ordering::Greater => EstimationDirection::Higher,
        std::cmp::Ordering::Less => EstimationDirection::Lower,
        std::cmp::Ordering::Equal => EstimationDirection::Same,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSuitabilityStatus {
    /// Passing average at or above the required level.
    Capable,
    /// Attempted the required level, close to but under the bar.
    NeedsPractice,
    NotVerified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct JobSuitability {
    pub basic_service: JobSuitabilityStatus,
    pub general_work: JobSuitabilityStatus,
    pub business_honorifics: JobSuitabilityStatus,
    pub advanced_work: JobSuitabilityStatus,
}

fn suitability_status(
    performances: &[LevelPerformance],
    requirement: JobRequirement,
) -> JobSuitabilityStatus {
    // Any level at or above the requirement with a passing average counts.
    let capable = performances.iter().any(|perf| {
        perf.level >= requirement.required_level
            && perf
                .average_score
                .is_some_and(|avg| avg >= requirement.min_score)
    });
    if capable {
        return JobSuitabilityStatus::Capable;
    }

    let direct = performances
        .iter()
        .find(|perf| perf.level == requirement.required_level)
        .and_then(|perf| perf.average_score);
    match direct {
        Some(avg) if avg >= requirement.min_score.saturating_sub(20) => {
            JobSuitabilityStatus::NeedsPractice
        }
        _ => JobSuitabilityStatus::NotVerified,
    }
}

pub fn job_suitability(
    performances: &[LevelPerformance],
    config: &JobSuitabilityConfig,
) -> JobSuitability {
    JobSuitability {
        basic_service: suitability_status(performances, config.basic_service),
        general_work: suitability_status(performances, config.general_work),
        business_honorifics: suitability_status(performances, config.business_honorifics),
        advanced_work: suitability_status(performances, config.advanced_work),
    }
}

/// The full aggregate report.
#[derive(Debug, Clone, Serialize)]
pub struct EnterpriseReport {
    pub generated_at: DateTime<Local>,
    pub declared_level: JlptLevel,
    pub estimated_level: LevelEstimate,
    pub estimation_direction: EstimationDirection,
    pub estimation_reason: String,
    pub level_performances: Vec<LevelPerformance>,
    pub job_suitability: JobSuitability,
    pub detailed_scores: CategoryScores,
    pub weak_points: Vec<WeakPoint>,
    pub total_sessions: usize,
    pub total_challenge_sessions: usize,
}

pub fn generate_report(
    declared_level: JlptLevel,
    history: &[SessionResult],
    latest_scores: Option<CategoryScores>,
    latest_weak_points: Vec<WeakPoint>,
    scoring: &ScoringConfig,
    jlpt: &JlptConfig,
) -> EnterpriseReport {
    let performances = level_performances(history, &scoring.performance_grades);
    let (estimated_level, estimation_reason) =
        calculate_estimated_level(declared_level, history, jlpt);
    let suitability = job_suitability(&performances, &scoring.job_suitability);

    EnterpriseReport {
        generated_at: Local::now(),
        declared_level,
        estimated_level,
        estimation_direction: estimation_direction(declared_level, estimated_level),
        estimation_reason,
        level_performances: performances,
        job_suitability: suitability,
        detailed_scores: latest_scores.unwrap_or_default(),
        weak_points: latest_weak_points,
        total_sessions: history.len(),
        total_challenge_sessions: history.iter().filter(|s| s.is_challenge_session).count(),
    }
}
