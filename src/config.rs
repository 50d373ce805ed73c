//! Evaluation-configuration loading.
//!
//! Configuration is injected through the [`ConfigStore`] collaborator as
//! three JSON blobs. Loading validates the assembled tree and falls back to
//! the documented defaults rather than operating on rejected values.
//! Concurrent loads share a single in-flight fetch.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use mensetsu_types::config::{EvaluationConfig, JlptConfig, ScoringConfig, WeakPointConfig};
use mensetsu_types::JlptLevel;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::store::ConfigStore;

pub const JLPT_CONFIG_KEY: &str = "jlpt_config";
pub const SCORING_CONFIG_KEY: &str = "scoring_config";
pub const WEAK_POINT_CONFIG_KEY: &str = "weak_point_config";

/// Checks every invariant a configuration must satisfy before use.
pub fn validate_config(config: &EvaluationConfig) -> Result<(), ConfigError> {
    validate_jlpt(&config.jlpt)?;
    validate_scoring(&config.scoring)?;
    validate_weak_point(&config.weak_point)?;
    Ok(())
}

fn validate_jlpt(jlpt: &JlptConfig) -> Result<(), ConfigError> {
    for level in JlptLevel::ALL {
        let weights = jlpt
            .weights
            .get(&level)
            .ok_or(ConfigError::MissingLevel {
                section: "weights",
                level,
            })?;
        let sum = weights.sum();
        if (sum - 1.0).abs() > 1e-3 {
            return Err(ConfigError::WeightSum { level, sum });
        }
        if !jlpt.settings.contains_key(&level) {
            return Err(ConfigError::MissingLevel {
                section: "settings",
                level,
            });
        }
        if !jlpt.estimation_ranges.contains_key(&level) {
            return Err(ConfigError::MissingLevel {
                section: "estimation_ranges",
                level,
            });
        }
    }
    // Minimum scores must rise strictly with the level.
    for pair in JlptLevel::ALL.windows(2) {
        let (lower, higher) = (pair[0], pair[1]);
        if jlpt.estimation_ranges[&lower] >= jlpt.estimation_ranges[&higher] {
            return Err(ConfigError::EstimationRangeOrder { lower, higher });
        }
    }
    Ok(())
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    let adjustment = scoring.level_adjustment;
    if adjustment.high_threshold <= adjustment.low_threshold {
        return Err(ConfigError::AdjustmentThresholdOrder {
            high: adjustment.high_threshold,
            low: adjustment.low_threshold,
        });
    }
    let grades = scoring.performance_grades;
    if grades.excellent_min < grades.good_min || grades.good_min < grades.pass_min {
        return Err(ConfigError::GradeOrder);
    }
    Ok(())
}

fn validate_weak_point(weak_point: &WeakPointConfig) -> Result<(), ConfigError> {
    let priority = weak_point.priority;
    if priority.high_threshold <= priority.medium_threshold {
        return Err(ConfigError::PriorityThresholdOrder {
            high: priority.high_threshold,
            medium: priority.medium_threshold,
        });
    }
    Ok(())
}

type InFlightLoad = Shared<BoxFuture<'static, EvaluationConfig>>;

/// Loads and caches the evaluation configuration.
///
/// Concurrent callers share one pending fetch; the slot is cleared on
/// completion or by [`ConfigService::invalidate`] (e.g. after an admin
/// update).
pub struct ConfigService {
    store: Arc<dyn ConfigStore>,
    cached: Mutex<Option<EvaluationConfig>>,
    in_flight: Mutex<Option<InFlightLoad>>,
}

impl ConfigService {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
            in_flight: Mutex::new(None),
        }
    }

    /// The current configuration; never fails. Absent, malformed or invalid
    /// stored values degrade to the documented defaults with a warning.
    pub async fn load(&self) -> EvaluationConfig {
        if let Some(config) = self.cached.lock().expect("config cache poisoned").clone() {
            return config;
        }
        let load = {
            let mut slot = self.in_flight.lock().expect("in-flight slot poisoned");
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let store = Arc::clone(&self.store);
                    let pending: InFlightLoad = fetch_config(store).boxed().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        let config = load.await;
        *self.cached.lock().expect("config cache poisoned") = Some(config.clone());
        *self.in_flight.lock().expect("in-flight slot poisoned") = None;
        config
    }

    /// Drops the cache and any pending fetch so the next load re-reads the
    /// store.
    pub fn invalidate(&self) {
        *self.cached.lock().expect("config cache poisoned") = None;
        *self.in_flight.lock().expect("in-flight slot poisoned") = None;
    }
}

async fn fetch_config(store: Arc<dyn ConfigStore>) -> EvaluationConfig {
    let jlpt: JlptConfig = fetch_section(store.as_ref(), JLPT_CONFIG_KEY).await;
    let scoring: ScoringConfig = fetch_section(store.as_ref(), SCORING_CONFIG_KEY).await;
    let weak_point: WeakPointConfig = fetch_section(store.as_ref(), WEAK_POINT_CONFIG_KEY).await;

    let config = EvaluationConfig {
        jlpt,
        scoring,
        weak_point,
    };
    match validate_config(&config) {
        Ok(()) => config,
        Err(error) => {
            tracing::warn!(%error, "rejecting invalid evaluation config, using defaults");
            EvaluationConfig::default()
        }
    }
}

async fn fetch_section<T: DeserializeOwned + Default>(store: &dyn ConfigStore, key: &str) -> T {
    match store.get(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(section) => section,
            Err(error) => {
                tracing::warn!(key, %error, "malformed config section, using default");
                T::default()
            }
        },
        Ok(None) => {
            tracing::debug!(key, "config section not set, using default");
            T::default()
        }
        Err(error) => {
            tracing::warn!(key, %error, "config fetch failed, using default");
            T::default()
        }
    }
}
