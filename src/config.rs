//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::search::{HighlightMarkers, ScoringWeights};

/// Tunable engine settings. Every field falls back to its default when absent from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Multiplier applied to title-field matches.
    pub title_weight: f64,
    /// Scale of the bonus for matching a larger fraction of the query terms.
    pub coverage_bonus: f64,
    /// Maximum number of results highlighted and returned per query.
    pub result_cap: usize,
    /// Preview length in characters.
    pub preview_window: usize,
    /// Fuzzy threshold tried automatically when exact lookup finds nothing. 0 disables.
    pub fallback_fuzzy: f64,
    pub suggestion_limit: usize,
    /// Number of query results kept in the LRU cache. 0 disables caching.
    pub query_cache_size: usize,
    pub markers: HighlightMarkers,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let weights = ScoringWeights::default();
        Self {
            title_weight: weights.title_weight,
            coverage_bonus: weights.coverage_bonus,
            result_cap: 50,
            preview_window: 160,
            fallback_fuzzy: 0.4,
            suggestion_limit: 8,
            query_cache_size: 64,
            markers: HighlightMarkers::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|source| SearchError::InvalidInput {
            what: "engine configuration",
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.result_cap == 0 {
            return Err(SearchError::InvalidConfig(
                "result_cap must be at least 1".to_string(),
            ));
        }
        if self.preview_window == 0 {
            return Err(SearchError::InvalidConfig(
                "preview_window must be at least 1".to_string(),
            ));
        }
        if self.title_weight.is_nan() || self.title_weight < 1.0 {
            return Err(SearchError::InvalidConfig(format!(
                "title_weight must be at least 1.0, got {}",
                self.title_weight
            )));
        }
        if self.coverage_bonus.is_nan() || self.coverage_bonus < 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "coverage_bonus must not be negative, got {}",
                self.coverage_bonus
            )));
        }
        if !(0.0..=1.0).contains(&self.fallback_fuzzy) {
            return Err(SearchError::InvalidConfig(format!(
                "fallback_fuzzy must be within [0, 1], got {}",
                self.fallback_fuzzy
            )));
        }
        Ok(())
    }

    pub const fn weights(&self) -> ScoringWeights {
        ScoringWeights {
            title_weight: self.title_weight,
            coverage_bonus: self.coverage_bonus,
        }
    }
}
