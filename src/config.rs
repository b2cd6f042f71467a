//! Tunable matching constants.
//!
//! Defaults come from `scoring`. A TOML file may override any subset:
//!
//! ```toml
//! accept_threshold = 0.65
//! mismatch_penalty = 0.4
//! duration_zero_credit_sec = 45
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::scoring::{
    ACCEPT_THRESHOLD, ARTIST_WEIGHT, DURATION_FULL_CREDIT_SEC, DURATION_WEIGHT, DURATION_ZERO_CREDIT_SEC,
    MISMATCH_PENALTY, TITLE_WEIGHT,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatchConfig {
    /// Minimum score for a candidate to be accepted and cached
    pub accept_threshold: f64,
    /// Multiplier applied when remix/live/cover status differs
    pub mismatch_penalty: f64,
    pub title_weight: f64,
    pub artist_weight: f64,
    pub duration_weight: f64,
    pub duration_full_credit_sec: f64,
    pub duration_zero_credit_sec: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            accept_threshold: ACCEPT_THRESHOLD,
            mismatch_penalty: MISMATCH_PENALTY,
            title_weight: TITLE_WEIGHT,
            artist_weight: ARTIST_WEIGHT,
            duration_weight: DURATION_WEIGHT,
            duration_full_credit_sec: DURATION_FULL_CREDIT_SEC,
            duration_zero_credit_sec: DURATION_ZERO_CREDIT_SEC,
        }
    }
}

impl MatchConfig {
    /// Parse a (possibly partial) TOML document and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        Ok(Self::from_toml_str(&contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_range("accept_threshold", self.accept_threshold)?;
        unit_range("mismatch_penalty", self.mismatch_penalty)?;

        for (name, value) in [
            ("title_weight", self.title_weight),
            ("artist_weight", self.artist_weight),
            ("duration_weight", self.duration_weight),
        ] {
            if value.is_nan() || value < 0.0 || value.is_infinite() {
                return Err(ConfigError::NegativeWeight { name, value });
            }
        }
        if self.title_weight + self.artist_weight <= 0.0 {
            return Err(ConfigError::NoStringWeight);
        }

        let (full, zero) = (self.duration_full_credit_sec, self.duration_zero_credit_sec);
        let valid = full >= 0.0 && full < zero && zero.is_finite();
        if !valid {
            return Err(ConfigError::InvalidDurationWindow { full, zero });
        }

        Ok(())
    }
}

fn unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}
