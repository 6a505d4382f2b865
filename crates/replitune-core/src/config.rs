//! Tuning configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Per-replica index space budget (in bytes) handed to the advisor.
    pub budget_bytes: u64,

    /// Maximum width of a recommended or candidate index.
    pub max_index_width: usize,

    /// Load-skew tolerance for routing, in `[0, 1]`. 0 pins every query
    /// to its cheapest replica; 1 reroutes freely below baseline.
    pub skew_threshold: f64,

    /// Defensive iteration cap for the tuning and refinement loops. The
    /// reference algorithms converge monotonically; hitting this cap logs
    /// a warning and keeps the best state found.
    pub max_rounds: usize,

    /// Retry policy for oracle/advisor round trips.
    pub retry_max_attempts: usize,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            budget_bytes: 6_000_000_000, // 6 GB per replica
            max_index_width: 2,
            skew_threshold: 0.5,
            max_rounds: 32,
            retry_max_attempts: 3,
            retry_initial_backoff_ms: 200,
            retry_max_backoff_ms: 5_000,
        }
    }
}

impl TunerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `REPLITUNE_BUDGET_BYTES`: per-replica index space budget
    /// - `REPLITUNE_MAX_INDEX_WIDTH`: maximum index width
    /// - `REPLITUNE_SKEW_THRESHOLD`: routing skew tolerance
    /// - `REPLITUNE_MAX_ROUNDS`: loop iteration cap
    /// - `REPLITUNE_RETRY_MAX_ATTEMPTS`: oracle retry attempts
    /// - `REPLITUNE_RETRY_INITIAL_MS` / `REPLITUNE_RETRY_MAX_MS`: backoff
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("REPLITUNE_BUDGET_BYTES") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.budget_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("REPLITUNE_MAX_INDEX_WIDTH") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_index_width = v;
            }
        }

        if let Ok(s) = std::env::var("REPLITUNE_SKEW_THRESHOLD") {
            if let Ok(v) = s.parse::<f64>() {
                cfg.skew_threshold = v;
            }
        }

        if let Ok(s) = std::env::var("REPLITUNE_MAX_ROUNDS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_rounds = v;
            }
        }

        if let Ok(s) = std::env::var("REPLITUNE_RETRY_MAX_ATTEMPTS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.retry_max_attempts = v;
            }
        }

        if let Ok(s) = std::env::var("REPLITUNE_RETRY_INITIAL_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_initial_backoff_ms = v;
            }
        }

        if let Ok(s) = std::env::var("REPLITUNE_RETRY_MAX_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_max_backoff_ms = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.skew_threshold) {
            return Err(Error::Config(format!(
                "skew threshold {} outside [0, 1]",
                self.skew_threshold
            )));
        }
        if self.max_index_width == 0 {
            return Err(Error::Config("max index width must be at least 1".into()));
        }
        if self.max_rounds == 0 {
            return Err(Error::Config("max rounds must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(TunerConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut cfg = TunerConfig::default();
        cfg.skew_threshold = 1.5;
        assert!(cfg.validate().is_err());
        cfg.skew_threshold = -0.1;
        assert!(cfg.validate().is_err());
    }
}
