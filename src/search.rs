//! Candidate search.
//!
//! Platform clients are external; the matcher only needs `SearchAdapter`.
//! `CatalogSearch` is an offline adapter over a fixed list of tracks, used by
//! the CLI and in tests.

use anyhow::{Context, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::SearchUnavailable;
use crate::models::{NormalizedQuery, Platform, Track};
use crate::normalize::normalize;

/// Default number of candidates returned per query
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Search capability for one platform.
///
/// Results are ordered best-first by the platform's own ranking. "No results"
/// is an empty vector, never an error.
pub trait SearchAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    fn search(&self, query: &NormalizedQuery) -> Result<Vec<Track>, SearchUnavailable>;
}

// ============================================================================
// Offline catalog
// ============================================================================

/// Catalog entry with its normalized form precomputed.
struct CatalogEntry {
    track: Track,
    title_tokens: FxHashSet<String>,
    artist_tokens: FxHashSet<String>,
}

/// In-memory search over a fixed catalog for one platform.
///
/// Ranks by shared title tokens, then shared artist tokens, then catalog
/// order. Only tracks sharing at least one title token are returned.
pub struct CatalogSearch {
    platform: Platform,
    entries: Vec<CatalogEntry>,
    title_index: FxHashMap<String, Vec<usize>>, // token -> entry indices
    limit: usize,
    offline: AtomicBool,
}

fn tokens(s: &str) -> FxHashSet<String> {
    s.split_whitespace().map(str::to_string).collect()
}

impl CatalogSearch {
    /// Build a catalog. Tracks from other platforms are skipped.
    pub fn new(platform: Platform, tracks: Vec<Track>) -> Self {
        let mut entries = Vec::with_capacity(tracks.len());
        let mut title_index: FxHashMap<String, Vec<usize>> = FxHashMap::default();

        for track in tracks.into_iter().filter(|t| t.platform == platform) {
            let normalized = normalize(&track);
            let title_tokens = tokens(&normalized.title);
            let artist_tokens: FxHashSet<String> = normalized.artists.iter().flat_map(|a| tokens(a)).collect();

            let idx = entries.len();
            for token in &title_tokens {
                title_index.entry(token.clone()).or_default().push(idx);
            }
            entries.push(CatalogEntry {
                track,
                title_tokens,
                artist_tokens,
            });
        }

        Self {
            platform,
            entries,
            title_index,
            limit: DEFAULT_SEARCH_LIMIT,
            offline: AtomicBool::new(false),
        }
    }

    /// Load tracks from a JSON array file.
    pub fn from_json_file(platform: Platform, path: &Path) -> Result<Self> {
        let tracks = load_tracks(path)?;
        Ok(Self::new(platform, tracks))
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Simulate an outage: every search fails until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SearchAdapter for CatalogSearch {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn search(&self, query: &NormalizedQuery) -> Result<Vec<Track>, SearchUnavailable> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(SearchUnavailable::new(self.platform, "catalog offline"));
        }

        let query_title = tokens(&query.title);
        let query_artist: FxHashSet<String> = query.artists.iter().flat_map(|a| tokens(a)).collect();

        let mut hits: FxHashSet<usize> = FxHashSet::default();
        for token in &query_title {
            if let Some(indices) = self.title_index.get(token) {
                hits.extend(indices.iter().copied());
            }
        }

        let mut ranked: Vec<(usize, usize, usize)> = hits
            .into_iter()
            .map(|idx| {
                let entry = &self.entries[idx];
                let title_overlap = entry.title_tokens.intersection(&query_title).count();
                let artist_overlap = entry.artist_tokens.intersection(&query_artist).count();
                (title_overlap, artist_overlap, idx)
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)));

        Ok(ranked
            .into_iter()
            .take(self.limit)
            .map(|(_, _, idx)| self.entries[idx].track.clone())
            .collect())
    }
}

/// Read a JSON array of tracks.
pub fn load_tracks(path: &Path) -> Result<Vec<Track>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read tracks file {}", path.display()))?;
    let tracks: Vec<Track> =
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse tracks file {}", path.display()))?;
    Ok(tracks)
}
