//! Cross-session weak-point tracking.
//!
//! Each (user, category) pair moves through a small lifecycle: no record →
//! unresolved record accumulating occurrences → resolved record frozen in
//! history. At most one unresolved record per category exists at a time; a
//! recurrence after resolution opens a fresh record instead of reopening
//! the old one.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use mensetsu_types::config::{PriorityWeights, WeakPointConfig};
use mensetsu_types::{CategoryScores, EvaluationCategory, WeakPointPriority, WeakPointRecord};
use uuid::Uuid;

use crate::store::StateStore;

/// Categories whose score fell strictly below the detection threshold.
pub fn detect_candidates(scores: &CategoryScores, threshold: u8) -> Vec<EvaluationCategory> {
    EvaluationCategory::ALL
        .into_iter()
        .filter(|&category| scores.get(category) < threshold)
        .collect()
}

/// Priority score: frequency dominates, recent occurrences keep a category
/// hot, and anything outside the recency window contributes nothing.
pub fn calculate_priority_score(
    occurrence_count: u32,
    last_occurred_at: DateTime<Local>,
    weights: &PriorityWeights,
    now: DateTime<Local>,
) -> i64 {
    let days_since = (now - last_occurred_at).num_days().max(0);
    i64::from(occurrence_count) * weights.occurrence_multiplier
        + (weights.recency_window_days - days_since).max(0)
}

pub fn determine_priority_level(score: i64, weights: &PriorityWeights) -> WeakPointPriority {
    if score >= weights.high_threshold {
        WeakPointPriority::High
    } else if score >= weights.medium_threshold {
        WeakPointPriority::Medium
    } else {
        WeakPointPriority::Low
    }
}

fn default_description(category: EvaluationCategory) -> &'static str {
    match category {
        EvaluationCategory::Vocabulary => "語彙力の改善が必要です",
        EvaluationCategory::Grammar => "文法の正確性に課題があります",
        EvaluationCategory::Content => "回答内容の充実が必要です",
        EvaluationCategory::Honorifics => "敬語の使い方に課題があります",
    }
}

/// Applies one session's category scores to the record list.
///
/// Per unresolved record: a sub-threshold score increments the occurrence
/// count, refreshes the last-occurrence timestamp, resets the
/// consecutive-high-score counter and recomputes the priority; a score at or
/// above the resolution score advances the counter and resolves the record
/// when it reaches the resolution count; a score in between holds the
/// counter unchanged. Resolved records are never touched. Categories that
/// scored below threshold without an unresolved record get a new one.
pub fn update_weak_points(
    existing: &[WeakPointRecord],
    scores: &CategoryScores,
    user_id: &str,
    config: &WeakPointConfig,
    now: DateTime<Local>,
) -> Vec<WeakPointRecord> {
    let candidates = detect_candidates(scores, config.threshold);

    let mut updated: Vec<WeakPointRecord> = existing
        .iter()
        .map(|record| {
            if record.resolved {
                return record.clone();
            }
            let mut record = record.clone();
            let score = scores.get(record.category);

            if candidates.contains(&record.category) {
                record.occurrence_count += 1;
                record.last_occurred_at = now;
                record.consecutive_high_scores = 0;
                let priority_score = calculate_priority_score(
                    record.occurrence_count,
                    record.last_occurred_at,
                    &config.priority,
                    now,
                );
                record.priority = determine_priority_level(priority_score, &config.priority);
                record.updated_at = now;
            } else if score >= config.resolution_score {
                record.consecutive_high_scores += 1;
                if record.consecutive_high_scores >= config.resolution_count {
                    record.resolved = true;
                    tracing::info!(
                        category = %record.category,
                        user = user_id,
                        "weak point resolved"
                    );
                }
                record.updated_at = now;
            }
            // Scores between threshold and resolution score hold the
            // consecutive-high-score counter as-is.
            record
        })
        .collect();

    for category in candidates {
        let has_unresolved = updated
            .iter()
            .any(|record| record.category == category && !record.resolved);
        if !has_unresolved {
            let priority_score = calculate_priority_score(1, now, &config.priority, now);
            updated.push(WeakPointRecord {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                category,
                description: default_description(category).to_string(),
                priority: determine_priority_level(priority_score, &config.priority),
                occurrence_count: 1,
                last_occurred_at: now,
                consecutive_high_scores: 0,
                resolved: false,
                created_at: now,
                updated_at: now,
            });
        }
    }

    updated
}

/// True when a tracked weakness should be promoted to a persistent
/// user-facing weak-skill tag.
pub fn should_register_as_tag(record: &WeakPointRecord, config: &WeakPointConfig) -> bool {
    record.occurrence_count >= config.tag_threshold && !record.resolved
}

/// Unresolved records ordered by descending priority score, recomputed at
/// query time so stale occurrences decay even though the stored priority
/// field does not change.
pub fn sort_by_priority(
    records: &[WeakPointRecord],
    weights: &PriorityWeights,
    now: DateTime<Local>,
) -> Vec<WeakPointRecord> {
    let mut active: Vec<WeakPointRecord> = records
        .iter()
        .filter(|record| !record.resolved)
        .cloned()
        .collect();
    active.sort_by_key(|record| {
        -calculate_priority_score(record.occurrence_count, record.last_occurred_at, weights, now)
    });
    active
}

/// Categories of currently high-priority active records, strongest first.
/// Question-selection collaborators use this to bias the next session.
pub fn high_priority_categories(
    records: &[WeakPointRecord],
    config: &WeakPointConfig,
    now: DateTime<Local>,
) -> Vec<EvaluationCategory> {
    sort_by_priority(records, &config.priority, now)
        .into_iter()
        .filter(|record| record.priority == WeakPointPriority::High)
        .map(|record| record.category)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryProgress {
    pub is_weak: bool,
    pub occurrence_count: u32,
    pub priority: Option<WeakPointPriority>,
}

/// Snapshot of the tracking state for progress displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSummary {
    pub total_weak_points: usize,
    pub resolved_count: usize,
    pub active_count: usize,
    pub high_priority_count: usize,
    pub medium_priority_count: usize,
    pub low_priority_count: usize,
    pub by_category: Vec<(EvaluationCategory, CategoryProgress)>,
}

pub fn progress_summary(records: &[WeakPointRecord]) -> ProgressSummary {
    let active: Vec<&WeakPointRecord> = records.iter().filter(|r| !r.resolved).collect();

    let count_priority = |priority: WeakPointPriority| {
        active.iter().filter(|r| r.priority == priority).count()
    };

    let by_category = EvaluationCategory::ALL
        .into_iter()
        .map(|category| {
            let record = active.iter().find(|r| r.category == category);
            let progress = CategoryProgress {
                is_weak: record.is_some(),
                occurrence_count: record.map_or(0, |r| r.occurrence_count),
                priority: record.map(|r| r.priority),
            };
            (category, progress)
        })
        .collect();

    ProgressSummary {
        total_weak_points: records.len(),
        resolved_count: records.len() - active.len(),
        active_count: active.len(),
        high_priority_count: count_priority(WeakPointPriority::High),
        medium_priority_count: count_priority(WeakPointPriority::Medium),
        low_priority_count: count_priority(WeakPointPriority::Low),
        by_category,
    }
}

/// Stateful tracker for one user, persisting the record list through the
/// state store after every mutation.
pub struct WeakPointTracker {
    store: Arc<dyn StateStore>,
    storage_key: String,
    user_id: String,
    config: WeakPointConfig,
    records: Vec<WeakPointRecord>,
}

impl WeakPointTracker {
    pub async fn load(
        store: Arc<dyn StateStore>,
        user_id: impl Into<String>,
        config: WeakPointConfig,
    ) -> Result<Self> {
        let user_id = user_id.into();
        let storage_key = format!("weak_points/{user_id}");
        let records = match store.load(&storage_key).await? {
            Some(value) => match serde_json::from_value(value) {
                Ok(records) => records,
                Err(error) => {
                    tracing::warn!(%error, user = %user_id, "discarding malformed weak-point records");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Ok(Self {
            store,
            storage_key,
            user_id,
            config,
            records,
        })
    }

    /// Feeds one session's scores into the lifecycle and persists the result.
    pub async fn apply_scores(&mut self, scores: &CategoryScores) -> Result<()> {
        self.records =
            update_weak_points(&self.records, scores, &self.user_id, &self.config, Local::now());
        self.save().await
    }

    pub fn records(&self) -> &[WeakPointRecord] {
        &self.records
    }

    /// Active records by live priority, strongest first.
    pub fn sorted_active(&self) -> Vec<WeakPointRecord> {
        sort_by_priority(&self.records, &self.config.priority, Local::now())
    }

    /// Active records that qualify as persistent weak-skill tags.
    pub fn tags(&self) -> Vec<&WeakPointRecord> {
        self.records
            .iter()
            .filter(|record| should_register_as_tag(record, &self.config))
            .collect()
    }

    /// Explicit full reset; the only way records are ever removed.
    pub async fn reset(&mut self) -> Result<()> {
        self.records.clear();
        self.store
            .remove(&self.storage_key)
            .await
            .context("failed to clear weak-point records")
    }

    async fn save(&self) -> Result<()> {
        let value = serde_json::to_value(&self.records)?;
        self.store
            .save(&self.storage_key, value)
            .await
            .context("failed to persist weak-point records")
    }
}
