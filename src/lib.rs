//! Cross-platform track linking: normalize a track, search the other
//! platform, score candidates, and cache accepted links.

pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod scoring;
pub mod search;
pub mod store;

pub use config::MatchConfig;
pub use error::{ConfigError, ResolveError, SearchUnavailable, StoreUnavailable};
pub use matcher::{resolve, resolve_batch, resolve_with, BatchOutcome};
pub use models::{LinkKey, MatchResult, Platform, Resolution, StoreWarning, Track, TrackLink};
pub use search::SearchAdapter;
pub use store::LinkStore;
