//! Matching orchestrator.
//!
//! `resolve` composes the pieces for one track: cache lookup, normalization,
//! search, scoring, and persisting an accepted link. It holds no state; the
//! link store and search adapter are passed in, so concurrent calls only
//! share the store. Concurrent calls for the same key may both search and
//! both write: last write wins.

use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::MatchConfig;
use crate::error::ResolveError;
use crate::models::{LinkKey, MatchResult, MatchingStats, Platform, Resolution, StoreWarning, Track, TrackLink};
use crate::normalize::normalize;
use crate::progress::{create_progress_bar, log_progress};
use crate::scoring::{is_acceptable, rank_candidates};
use crate::search::SearchAdapter;
use crate::store::LinkStore;

/// Log every N tracks in log-only mode
const LOG_INTERVAL: u64 = 500;

/// Resolve with the default configuration.
pub fn resolve(
    source: &Track,
    target_platform: Platform,
    adapter: &dyn SearchAdapter,
    store: &dyn LinkStore,
) -> Result<Resolution, ResolveError> {
    resolve_with(source, target_platform, adapter, store, &MatchConfig::default())
}

/// Find the best match for `source` on `target_platform`.
///
/// A stored link answers without searching. A failed cache read degrades to
/// a search and is reported in `warnings`; a failed cache write keeps the
/// match and is reported the same way. Search failure is returned as an
/// error and nothing is written. Sub-threshold results are never cached.
pub fn resolve_with(
    source: &Track,
    target_platform: Platform,
    adapter: &dyn SearchAdapter,
    store: &dyn LinkStore,
    config: &MatchConfig,
) -> Result<Resolution, ResolveError> {
    if source.platform == target_platform {
        return Err(ResolveError::SamePlatform(target_platform));
    }
    if adapter.platform() != target_platform {
        return Err(ResolveError::AdapterMismatch {
            adapter: adapter.platform(),
            requested: target_platform,
        });
    }

    let key = LinkKey::for_track(source, target_platform);
    let mut warnings = Vec::new();

    match store.get(&key) {
        Ok(Some(link)) => {
            debug!("cache hit {} -> {}", key, link.target_id);
            return Ok(Resolution {
                result: MatchResult::CacheHit { link },
                warnings,
            });
        }
        Ok(None) => {}
        Err(e) => {
            warn!("link store read failed for {}, searching anyway: {}", key, e);
            warnings.push(StoreWarning::ReadFailed(e.to_string()));
        }
    }

    let query = normalize(source);
    let candidates = adapter.search(&query).map_err(|e| {
        warn!("search failed for {}: {}", key, e);
        ResolveError::from(e)
    })?;
    let candidate_count = candidates.len();

    let best = match rank_candidates(&query, candidates, config).into_iter().next() {
        Some(best) if is_acceptable(best.score(), config) => best,
        best => {
            debug!(
                "no acceptable match for {} \"{}\" ({} candidates, best {:?})",
                key,
                query.search_terms(),
                candidate_count,
                best.as_ref().map(|c| c.score())
            );
            return Ok(Resolution {
                result: MatchResult::NoAcceptableMatch { best, candidate_count },
                warnings,
            });
        }
    };

    let link = TrackLink::new(key, best.track.id.clone(), best.score(), best.breakdown.penalized);
    if let Err(e) = store.put(&link) {
        warn!("link store write failed for {}: {}", link.key, e);
        warnings.push(StoreWarning::WriteFailed(e.to_string()));
    }
    debug!("matched {} -> {} ({})", link.key, link.target_id, best.breakdown.summary());

    Ok(Resolution {
        result: MatchResult::Matched { link, candidate: best },
        warnings,
    })
}

/// Outcome of a batch: one entry per input track, in input order.
pub struct BatchOutcome {
    pub results: Vec<Result<Resolution, ResolveError>>,
    pub stats: MatchingStats,
}

/// Resolve many tracks in parallel. One track's failure never affects
/// another's.
pub fn resolve_batch(
    tracks: &[Track],
    target_platform: Platform,
    adapter: &dyn SearchAdapter,
    store: &dyn LinkStore,
    config: &MatchConfig,
) -> BatchOutcome {
    let start = Instant::now();
    let total = tracks.len() as u64;
    let pb = create_progress_bar(total, "Resolving tracks");

    let results: Vec<Result<Resolution, ResolveError>> = tracks
        .par_iter()
        .map(|track| {
            let result = resolve_with(track, target_platform, adapter, store, config);
            pb.inc(1);
            log_progress("resolve", pb.position(), total, LOG_INTERVAL);
            result
        })
        .collect();

    let mut stats = MatchingStats::default();
    for result in &results {
        stats.record(result);
    }
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    pb.finish_with_message(format!("Resolved {} tracks", results.len()));
    info!(
        "{} tracks: {} cache hits, {} new matches, {} unmatched, {} search failures ({:.1}% matched)",
        stats.total_tracks,
        stats.cache_hits,
        stats.fresh_matches,
        stats.no_candidates + stats.all_rejected,
        stats.search_failures,
        stats.match_rate()
    );

    BatchOutcome { results, stats }
}
