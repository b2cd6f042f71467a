//! Core data models for cross-platform track linking.
//!
//! This module contains the track, query, link and result types shared by
//! the normalizer, scorer, link store and matcher.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ResolveError;

// ============================================================================
// Platforms
// ============================================================================

/// Music catalog a track lives in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Spotify,
    Youtube,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::Youtube => "youtube",
        }
    }

    /// The other catalog, the usual target when rebuilding a playlist.
    pub fn opposite(self) -> Platform {
        match self {
            Platform::Spotify => Platform::Youtube,
            Platform::Youtube => Platform::Spotify,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spotify" => Ok(Platform::Spotify),
            "youtube" | "yt" => Ok(Platform::Youtube),
            other => Err(format!("unknown platform '{}'", other)),
        }
    }
}

// ============================================================================
// Tracks
// ============================================================================

/// Version markers derived from a title's bracketed or dashed qualifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionFlags {
    pub remix: bool,
    pub live: bool,
    pub cover: bool,
}

impl VersionFlags {
    /// True when some category is set on exactly one side.
    pub fn mismatches(self, other: VersionFlags) -> bool {
        self.remix != other.remix || self.live != other.live || self.cover != other.cover
    }

    pub fn union(self, other: VersionFlags) -> VersionFlags {
        VersionFlags {
            remix: self.remix || other.remix,
            live: self.live || other.live,
            cover: self.cover || other.cover,
        }
    }
}

/// Track metadata as fetched from a platform.
///
/// Treated as immutable: a re-fetch produces a new value. `flags` are always
/// derived from the title, so deserialized input never carries its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "TrackRecord")]
pub struct Track {
    pub platform: Platform,
    pub id: String,          // Spotify track ID or YouTube video ID
    pub title: String,       // Raw title, video titles included verbatim
    pub artists: Vec<String>, // Credited order; for YouTube usually the channel name
    pub duration_sec: Option<u32>,
    pub flags: VersionFlags,
}

/// Wire shape of a track, without derived fields.
#[derive(Deserialize)]
struct TrackRecord {
    platform: Platform,
    id: String,
    title: String,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    duration_sec: Option<u32>,
}

impl From<TrackRecord> for Track {
    fn from(r: TrackRecord) -> Self {
        Track::new(r.platform, r.id, r.title, r.artists, r.duration_sec)
    }
}

impl Track {
    pub fn new(
        platform: Platform,
        id: impl Into<String>,
        title: impl Into<String>,
        artists: Vec<String>,
        duration_sec: Option<u32>,
    ) -> Self {
        let title = title.into();
        let flags = crate::normalize::detect_version_flags(&title);
        Self {
            platform,
            id: id.into(),
            title,
            artists,
            duration_sec,
            flags,
        }
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }
}

/// Comparable form of a track: lower-cased, punctuation-stripped title and
/// artists plus the version flags pulled out of the title.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NormalizedQuery {
    pub title: String,
    pub artist: String,       // Primary artist, empty if unknown
    pub artists: Vec<String>, // All credited artists, normalized, empty ones dropped
    pub duration_sec: Option<u32>,
    pub flags: VersionFlags,
}

impl NormalizedQuery {
    /// Query string handed to platform search: "title artist".
    pub fn search_terms(&self) -> String {
        match (self.title.is_empty(), self.artist.is_empty()) {
            (false, false) => format!("{} {}", self.title, self.artist),
            (false, true) => self.title.clone(),
            (true, false) => self.artist.clone(),
            (true, true) => String::new(),
        }
    }
}

// ============================================================================
// Links
// ============================================================================

/// Composite key identifying at most one active link.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey {
    pub source_platform: Platform,
    pub source_id: String,
    pub target_platform: Platform,
}

impl LinkKey {
    pub fn new(source_platform: Platform, source_id: impl Into<String>, target_platform: Platform) -> Self {
        Self {
            source_platform,
            source_id: source_id.into(),
            target_platform,
        }
    }

    pub fn for_track(track: &Track, target_platform: Platform) -> Self {
        Self::new(track.platform, track.id.clone(), target_platform)
    }
}

impl fmt::Display for LinkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}->{}", self.source_platform, self.source_id, self.target_platform)
    }
}

/// Persisted mapping from a source track to its match on another platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackLink {
    pub key: LinkKey,
    pub target_id: String,
    pub confidence: f64,
    pub is_remix_mismatch: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackLink {
    /// New link stamped with the current time. Timestamps are kept at
    /// millisecond precision so a stored link reads back unchanged.
    pub fn new(key: LinkKey, target_id: impl Into<String>, confidence: f64, is_remix_mismatch: bool) -> Self {
        let now = Utc::now().trunc_subsecs(3);
        Self {
            key,
            target_id: target_id.into(),
            confidence,
            is_remix_mismatch,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// Scoring Models
// ============================================================================

/// Per-component view of a candidate's score.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub title_similarity: f64,
    pub artist_similarity: f64,
    pub duration_closeness: Option<f64>, // None if either duration is unknown
    pub duration_diff_sec: Option<u32>,
    pub title_weight: f64,
    pub artist_weight: f64,
    pub duration_weight: f64,
    pub penalized: bool,
    pub total: f64,
}

impl ScoreBreakdown {
    pub fn summary(&self) -> String {
        let duration = match (self.duration_closeness, self.duration_diff_sec) {
            (Some(c), Some(d)) => format!("{:.2} ({}s)", c, d),
            _ => "n/a".to_string(),
        };
        format!(
            "total:{:.3} [title:{:.2} artist:{:.2} duration:{}{}]",
            self.total,
            self.title_similarity,
            self.artist_similarity,
            duration,
            if self.penalized { " penalized" } else { "" }
        )
    }
}

/// A search hit together with its search rank (0 = first hit) and score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub track: Track,
    pub rank: usize,
    pub breakdown: ScoreBreakdown,
}

impl ScoredCandidate {
    pub fn score(&self) -> f64 {
        self.breakdown.total
    }
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of one `resolve` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchResult {
    /// Answered from the link store without searching.
    CacheHit { link: TrackLink },
    /// Found by search and scoring at or above the threshold.
    Matched {
        link: TrackLink,
        candidate: ScoredCandidate,
    },
    /// Nothing reached the threshold. `best` is for observability only.
    NoAcceptableMatch {
        best: Option<ScoredCandidate>,
        candidate_count: usize,
    },
}

impl MatchResult {
    pub fn link(&self) -> Option<&TrackLink> {
        match self {
            MatchResult::CacheHit { link } | MatchResult::Matched { link, .. } => Some(link),
            MatchResult::NoAcceptableMatch { .. } => None,
        }
    }

    pub fn target_id(&self) -> Option<&str> {
        self.link().map(|l| l.target_id.as_str())
    }

    /// Stored confidence for links, best sub-threshold score otherwise.
    pub fn confidence(&self) -> Option<f64> {
        match self {
            MatchResult::CacheHit { link } | MatchResult::Matched { link, .. } => Some(link.confidence),
            MatchResult::NoAcceptableMatch { best, .. } => best.as_ref().map(ScoredCandidate::score),
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        matches!(self, MatchResult::CacheHit { .. })
    }

    pub fn is_match(&self) -> bool {
        self.link().is_some()
    }
}

/// Soft signal that the link store misbehaved while a call still completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum StoreWarning {
    /// Lookup failed; the call searched as if on a miss.
    ReadFailed(String),
    /// The new link was not persisted; the match is still returned.
    WriteFailed(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Resolution {
    pub result: MatchResult,
    pub warnings: Vec<StoreWarning>,
}

// ============================================================================
// Statistics (Instrumentation)
// ============================================================================

/// Aggregate counters for a batch of `resolve` calls.
#[derive(Default, Debug, Clone, Serialize)]
pub struct MatchingStats {
    pub total_tracks: usize,
    pub cache_hits: usize,
    pub fresh_matches: usize,
    pub no_candidates: usize,
    pub all_rejected: usize,
    pub search_failures: usize,
    pub other_failures: usize,
    pub store_read_failures: usize,
    pub store_write_failures: usize,

    // Confidence of fresh matches
    pub confidence_0_90_plus: usize,
    pub confidence_0_75_to_0_90: usize,
    pub confidence_below_0_75: usize,

    pub elapsed_seconds: f64,
}

impl MatchingStats {
    /// Count one call's outcome.
    pub fn record(&mut self, outcome: &Result<Resolution, ResolveError>) {
        self.total_tracks += 1;
        let resolution = match outcome {
            Ok(r) => r,
            Err(ResolveError::SearchUnavailable(_)) => {
                self.search_failures += 1;
                return;
            }
            Err(_) => {
                self.other_failures += 1;
                return;
            }
        };

        for warning in &resolution.warnings {
            match warning {
                StoreWarning::ReadFailed(_) => self.store_read_failures += 1,
                StoreWarning::WriteFailed(_) => self.store_write_failures += 1,
            }
        }

        match &resolution.result {
            MatchResult::CacheHit { .. } => self.cache_hits += 1,
            MatchResult::Matched { link, .. } => {
                self.fresh_matches += 1;
                self.record_confidence_bucket(link.confidence);
            }
            MatchResult::NoAcceptableMatch { candidate_count: 0, .. } => self.no_candidates += 1,
            MatchResult::NoAcceptableMatch { .. } => self.all_rejected += 1,
        }
    }

    fn record_confidence_bucket(&mut self, confidence: f64) {
        if confidence >= 0.90 {
            self.confidence_0_90_plus += 1;
        } else if confidence >= 0.75 {
            self.confidence_0_75_to_0_90 += 1;
        } else {
            self.confidence_below_0_75 += 1;
        }
    }

    pub fn total_matches(&self) -> usize {
        self.cache_hits + self.fresh_matches
    }

    /// Calculate match rate as a percentage
    pub fn match_rate(&self) -> f64 {
        if self.total_tracks == 0 {
            0.0
        } else {
            100.0 * self.total_matches() as f64 / self.total_tracks as f64
        }
    }

    /// Log stats in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            tracing::info!("[STATS:{}]\n{}", phase, json);
        }
    }

    /// Write stats to a JSON file
    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchUnavailable;

    #[test]
    fn test_platform_parse_and_display() {
        assert_eq!("Spotify".parse::<Platform>(), Ok(Platform::Spotify));
        assert_eq!("yt".parse::<Platform>(), Ok(Platform::Youtube));
        assert!("deezer".parse::<Platform>().is_err());
        assert_eq!(Platform::Youtube.to_string(), "youtube");
        assert_eq!(Platform::Spotify.opposite(), Platform::Youtube);
    }

    #[test]
    fn test_track_flags_derived_on_deserialize() {
        let json = r#"{"platform":"youtube","id":"abc","title":"Song (Live)","artists":["Band"],
                       "flags":{"remix":true,"live":false,"cover":false}}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert!(track.flags.live);
        assert!(!track.flags.remix);
        assert_eq!(track.duration_sec, None);
    }

    #[test]
    fn test_flags_mismatch() {
        let studio = VersionFlags::default();
        let remix = VersionFlags { remix: true, ..Default::default() };
        let live = VersionFlags { live: true, ..Default::default() };
        assert!(!studio.mismatches(studio));
        assert!(studio.mismatches(remix));
        assert!(remix.mismatches(live));
        assert!(!remix.mismatches(remix));
    }

    #[test]
    fn test_search_terms() {
        let q = NormalizedQuery {
            title: "shape of you".into(),
            artist: "ed sheeran".into(),
            artists: vec!["ed sheeran".into()],
            duration_sec: Some(234),
            flags: VersionFlags::default(),
        };
        assert_eq!(q.search_terms(), "shape of you ed sheeran");
    }

    #[test]
    fn test_stats_record() {
        let key = LinkKey::new(Platform::Spotify, "s1", Platform::Youtube);
        let link = TrackLink::new(key, "y1", 0.95, false);
        let mut stats = MatchingStats::default();
        stats.record(&Ok(Resolution {
            result: MatchResult::CacheHit { link },
            warnings: vec![StoreWarning::ReadFailed("x".into())],
        }));
        stats.record(&Ok(Resolution {
            result: MatchResult::NoAcceptableMatch { best: None, candidate_count: 0 },
            warnings: vec![],
        }));
        stats.record(&Err(ResolveError::SearchUnavailable(SearchUnavailable::new(
            Platform::Youtube,
            "timeout",
        ))));
        assert_eq!(stats.total_tracks, 3);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.no_candidates, 1);
        assert_eq!(stats.search_failures, 1);
        assert_eq!(stats.store_read_failures, 1);
        assert!((stats.match_rate() - 100.0 / 3.0).abs() < 1e-9);
    }
}
