//! Engine configuration

use brokerage_risk::DEFAULT_BASE_ALLOWANCE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Engine configuration
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```json
/// { "base_allowance": "50000", "matching_interval_ms": 1000 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Credit each user may commit beyond their funds, per asset class
    pub base_allowance: Decimal,
    /// Run a matching pass on the order's asset right after each submission
    pub match_on_submit: bool,
    /// Period of the background matching task, if one is started
    pub matching_interval_ms: Option<u64>,
    /// Upper bound on matches settled by a single pass (None = unbounded)
    pub max_matches_per_pass: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_allowance: DEFAULT_BASE_ALLOWANCE,
            match_on_submit: true,
            matching_interval_ms: None,
            max_matches_per_pass: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_allowance < Decimal::ZERO {
            return Err(EngineError::InvalidConfig(format!(
                "base_allowance must not be negative, got {}",
                self.base_allowance
            )));
        }
        if self.matching_interval_ms == Some(0) {
            return Err(EngineError::InvalidConfig(
                "matching_interval_ms must be positive".to_string(),
            ));
        }
        if self.max_matches_per_pass == Some(0) {
            return Err(EngineError::InvalidConfig(
                "max_matches_per_pass must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_base_allowance(mut self, base_allowance: Decimal) -> Self {
        self.base_allowance = base_allowance;
        self
    }

    pub fn with_match_on_submit(mut self, enabled: bool) -> Self {
        self.match_on_submit = enabled;
        self
    }

    pub fn with_matching_interval(mut self, interval: Duration) -> Self {
        self.matching_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    pub fn with_max_matches_per_pass(mut self, limit: usize) -> Self {
        self.max_matches_per_pass = Some(limit);
        self
    }

    pub fn matching_interval(&self) -> Option<Duration> {
        self.matching_interval_ms.map(Duration::from_millis)
    }
}
