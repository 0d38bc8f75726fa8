use serde::{Deserialize, Serialize};
use std::time::Duration;

use catalog::BedroomPredicate;

use crate::types::RankError;

/// How a minimum-bedroom constraint is applied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BedroomPolicy {
    /// Sample only listings with exactly the requested bedroom count. No
    /// bedroom term is scored since every candidate matches equally.
    Exact,
    /// Sample listings with at least the requested count and reward extra
    /// bedrooms relative to the largest count in the sample.
    #[default]
    AtLeast,
}

impl BedroomPolicy {
    pub fn predicate(self, min_bedrooms: u32) -> BedroomPredicate {
        match self {
            BedroomPolicy::Exact => BedroomPredicate::Exact(min_bedrooms),
            BedroomPolicy::AtLeast => BedroomPredicate::AtLeast(min_bedrooms),
        }
    }

    /// Whether the filter score carries a bedroom term.
    pub fn scores_bedrooms(self) -> bool {
        matches!(self, BedroomPolicy::AtLeast)
    }
}

/// Tunables for the ranking engine, injected at construction.
///
/// Every field has a serde default so partial YAML sections work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RankingConfig {
    /// Weight of semantic similarity in the structured-mode blend.
    pub semantic_weight: f32,
    /// Weight of the filter score in the structured-mode blend.
    pub filter_weight: f32,
    /// No result with a lower similarity is ever returned.
    pub hard_floor_similarity: f32,
    /// Structured-mode results must score strictly above this.
    pub min_final_score: f32,
    /// Used when the caller's limit is zero or negative.
    pub default_limit: usize,
    pub min_limit: usize,
    pub max_limit: usize,
    /// Structured sample size is `max(limit * oversampling_factor, min_sample_size)`.
    pub oversampling_factor: usize,
    pub min_sample_size: usize,
    /// Fraction of the pure-semantic pool above the dynamic cutoff (0.2 = p80).
    pub top_fraction: f32,
    pub bedroom_policy: BedroomPolicy,
    /// Compare with a plain dot product instead of full cosine. Only safe
    /// when stored listing vectors are guaranteed unit length.
    pub assume_normalized: bool,
    /// Candidates per parallel scoring task.
    pub scoring_chunk_size: usize,
    /// Upper bound for each suspension point (embed, fetch, hydrate).
    #[serde(
        with = "semantic::serde_millis::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub stage_timeout: Option<Duration>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.75,
            filter_weight: 0.25,
            hard_floor_similarity: 0.06,
            min_final_score: 0.0,
            default_limit: 5,
            min_limit: 1,
            max_limit: 100,
            oversampling_factor: 5,
            min_sample_size: 50,
            top_fraction: 0.2,
            bedroom_policy: BedroomPolicy::AtLeast,
            assume_normalized: false,
            scoring_chunk_size: 256,
            stage_timeout: None,
        }
    }
}

impl RankingConfig {
    pub fn with_bedroom_policy(mut self, policy: BedroomPolicy) -> Self {
        self.bedroom_policy = policy;
        self
    }

    pub fn with_weights(mut self, semantic_weight: f32, filter_weight: f32) -> Self {
        self.semantic_weight = semantic_weight;
        self.filter_weight = filter_weight;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = Some(timeout);
        self
    }

    pub fn with_scoring_chunk_size(mut self, chunk: usize) -> Self {
        self.scoring_chunk_size = chunk;
        self
    }

    /// Map a caller-supplied limit into `[min_limit, max_limit]`, replacing
    /// zero or negative values with `default_limit`.
    pub fn normalize_limit(&self, limit: i64) -> usize {
        if limit <= 0 {
            return self.default_limit;
        }
        let requested = usize::try_from(limit).unwrap_or(usize::MAX);
        requested.clamp(self.min_limit, self.max_limit)
    }

    /// Structured-mode sample size for a normalized limit.
    pub fn sample_size(&self, limit: usize) -> usize {
        limit
            .saturating_mul(self.oversampling_factor)
            .max(self.min_sample_size)
    }

    pub fn validate(&self) -> Result<(), RankError> {
        let unit = |v: f32| v.is_finite() && (0.0..=1.0).contains(&v);
        if !unit(self.semantic_weight) || !unit(self.filter_weight) {
            return Err(RankError::Validation(
                "semantic_weight and filter_weight must be within [0, 1]".into(),
            ));
        }
        if (self.semantic_weight + self.filter_weight - 1.0).abs() > 1e-4 {
            return Err(RankError::Validation(format!(
                "semantic_weight + filter_weight must equal 1 (got {})",
                self.semantic_weight + self.filter_weight
            )));
        }
        if !self.hard_floor_similarity.is_finite()
            || !(-1.0..=1.0).contains(&self.hard_floor_similarity)
        {
            return Err(RankError::Validation(
                "hard_floor_similarity must be within [-1, 1]".into(),
            ));
        }
        if !self.min_final_score.is_finite() {
            return Err(RankError::Validation(
                "min_final_score must be finite".into(),
            ));
        }
        if self.min_limit == 0 {
            return Err(RankError::Validation(
                "min_limit must be greater than zero".into(),
            ));
        }
        if self.min_limit > self.max_limit {
            return Err(RankError::Validation(
                "min_limit must not exceed max_limit".into(),
            ));
        }
        if !(self.min_limit..=self.max_limit).contains(&self.default_limit) {
            return Err(RankError::Validation(
                "default_limit must lie within [min_limit, max_limit]".into(),
            ));
        }
        if self.oversampling_factor == 0 {
            return Err(RankError::Validation(
                "oversampling_factor must be at least 1".into(),
            ));
        }
        if !self.top_fraction.is_finite() || !(0.0..1.0).contains(&self.top_fraction) {
            return Err(RankError::Validation(
                "top_fraction must be within [0, 1)".into(),
            ));
        }
        if self.scoring_chunk_size == 0 {
            return Err(RankError::Validation(
                "scoring_chunk_size must be greater than zero".into(),
            ));
        }
        if self.stage_timeout.is_some_and(|t| t.is_zero()) {
            return Err(RankError::Validation(
                "stage_timeout must be greater than zero when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = RankingConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.semantic_weight, 0.75);
        assert_eq!(cfg.filter_weight, 0.25);
        assert_eq!(cfg.hard_floor_similarity, 0.06);
        assert_eq!(cfg.bedroom_policy, BedroomPolicy::AtLeast);
        assert!(!cfg.assume_normalized);
    }

    #[test]
    fn normalize_limit_rules() {
        let cfg = RankingConfig::default();
        assert_eq!(cfg.normalize_limit(0), 5);
        assert_eq!(cfg.normalize_limit(-3), 5);
        assert_eq!(cfg.normalize_limit(1), 1);
        assert_eq!(cfg.normalize_limit(42), 42);
        assert_eq!(cfg.normalize_limit(150), 100);
        assert_eq!(cfg.normalize_limit(i64::MAX), 100);
    }

    #[test]
    fn sample_size_rules() {
        let cfg = RankingConfig::default();
        assert_eq!(cfg.sample_size(5), 50);
        assert_eq!(cfg.sample_size(20), 100);
        assert_eq!(cfg.sample_size(100), 500);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let err = RankingConfig::default()
            .with_weights(0.7, 0.2)
            .validate()
            .expect_err("weights summing to 0.9 must be rejected");
        assert!(err.to_string().contains("must equal 1"));
        assert!(RankingConfig::default()
            .with_weights(1.0, 0.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn rejects_inconsistent_limits() {
        let cfg = RankingConfig {
            min_limit: 10,
            max_limit: 5,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = RankingConfig {
            default_limit: 500,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = RankingConfig {
            min_limit: 0,
            default_limit: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_bad_fraction_chunk_and_timeout() {
        let bad_fraction = RankingConfig {
            top_fraction: 1.0,
            ..Default::default()
        };
        assert!(bad_fraction.validate().is_err());

        let bad_chunk = RankingConfig::default().with_scoring_chunk_size(0);
        assert!(bad_chunk.validate().is_err());

        let bad_timeout = RankingConfig::default().with_stage_timeout(Duration::ZERO);
        assert!(bad_timeout.validate().is_err());
    }

    #[test]
    fn partial_deserialization_keeps_defaults() {
        let cfg: RankingConfig = serde_json::from_value(serde_json::json!({
            "bedroom_policy": "exact",
            "stage_timeout": 750
        }))
        .unwrap();
        assert_eq!(cfg.bedroom_policy, BedroomPolicy::Exact);
        assert_eq!(cfg.stage_timeout, Some(Duration::from_millis(750)));
        assert_eq!(cfg.max_limit, 100);
    }

    #[test]
    fn policy_maps_to_predicate() {
        assert_eq!(BedroomPolicy::Exact.predicate(2), BedroomPredicate::Exact(2));
        assert_eq!(
            BedroomPolicy::AtLeast.predicate(2),
            BedroomPredicate::AtLeast(2)
        );
        assert!(BedroomPolicy::AtLeast.scores_bedrooms());
        assert!(!BedroomPolicy::Exact.scores_bedrooms());
    }
}
