//! Failure kinds surfaced by the matching engine.
//!
//! `NoAcceptableMatch` is deliberately absent: a sub-threshold outcome is a
//! valid `MatchResult`, not an error.

use thiserror::Error;

use crate::models::Platform;

/// A platform search could not be performed (transport or auth failure).
/// Transient; the caller decides whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{platform} search unavailable: {reason}")]
pub struct SearchUnavailable {
    pub platform: Platform,
    pub reason: String,
}

impl SearchUnavailable {
    pub fn new(platform: Platform, reason: impl Into<String>) -> Self {
        Self {
            platform,
            reason: reason.into(),
        }
    }
}

/// The link store could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("link store unavailable: {0}")]
pub struct StoreUnavailable(pub String);

impl From<rusqlite::Error> for StoreUnavailable {
    fn from(e: rusqlite::Error) -> Self {
        StoreUnavailable(e.to_string())
    }
}

/// Failure of a single `resolve` call. Scoped to that call only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    SearchUnavailable(#[from] SearchUnavailable),

    #[error("search adapter serves {adapter}, but {requested} was requested")]
    AdapterMismatch {
        adapter: Platform,
        requested: Platform,
    },

    #[error("source and target platform are both {0}")]
    SamePlatform(Platform),
}

/// Invalid matching configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    #[error("weight {name} must not be negative, got {value}")]
    NegativeWeight { name: &'static str, value: f64 },

    #[error("title and artist weights must sum to a positive value")]
    NoStringWeight,

    #[error("duration window must satisfy 0 <= full ({full}) < zero ({zero})")]
    InvalidDurationWindow { full: f64, zero: f64 },

    #[error("failed to parse config: {0}")]
    Parse(String),
}
