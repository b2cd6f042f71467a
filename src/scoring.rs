//! Scoring functions for cross-platform matching.
//!
//! This module contains:
//! - String similarity (token-set overlap and edit-distance ratio)
//! - Multi-artist similarity
//! - Duration closeness
//! - Combined weighted scoring with the version mismatch penalty
//! - Candidate ranking with deterministic tie-breaks

use rustc_hash::FxHashSet;
use std::cmp::Ordering;

use crate::config::MatchConfig;
use crate::models::{NormalizedQuery, ScoreBreakdown, ScoredCandidate, Track};
use crate::normalize::normalize;

// ============================================================================
// Score Thresholds
// ============================================================================

/// Minimum score to accept a match
pub const ACCEPT_THRESHOLD: f64 = 0.6;

/// Multiplier applied when remix/live/cover status differs
pub const MISMATCH_PENALTY: f64 = 0.5;

pub const TITLE_WEIGHT: f64 = 0.5;
pub const ARTIST_WEIGHT: f64 = 0.3;
pub const DURATION_WEIGHT: f64 = 0.2;

/// Duration difference that still earns full credit
pub const DURATION_FULL_CREDIT_SEC: f64 = 3.0;

/// Duration difference at which credit reaches zero
pub const DURATION_ZERO_CREDIT_SEC: f64 = 30.0;

/// Scores are compared on a grid of this many steps per unit, so float
/// noise ties while the ordering stays total
const SCORE_GRID: f64 = 1e9;

// ============================================================================
// String Similarity
// ============================================================================

/// Jaccard similarity on word tokens.
pub fn token_set_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: FxHashSet<&str> = a.split_whitespace().collect();
    let tokens_b: FxHashSet<&str> = b.split_whitespace().collect();

    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();

    intersection as f64 / union as f64
}

/// Similarity of two normalized strings in [0, 1]. Symmetric.
///
/// Best of token-set overlap, Levenshtein ratio, and exact equality once
/// spaces are removed ("edsheeran" vs "ed sheeran"). Empty input scores 0.
pub fn string_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let compact_a: String = a.split_whitespace().collect();
    let compact_b: String = b.split_whitespace().collect();
    if compact_a == compact_b {
        return 1.0;
    }

    let tokens = token_set_similarity(a, b);
    let edit = strsim::normalized_levenshtein(a, b);
    tokens.max(edit).clamp(0.0, 1.0)
}

/// Best similarity across every pair of credited artists. Symmetric.
pub fn artist_similarity(source: &[String], candidate: &[String]) -> f64 {
    let mut best: f64 = 0.0;
    for a in source {
        for b in candidate {
            let similarity = string_similarity(a, b);
            if similarity > best {
                best = similarity;
                if best >= 1.0 {
                    return 1.0;
                }
            }
        }
    }
    best
}

// ============================================================================
// Duration Scoring
// ============================================================================

/// Duration closeness: 1.0 within the full-credit window, decaying linearly
/// to 0.0 at the zero-credit window.
pub fn duration_closeness(diff_sec: u32, config: &MatchConfig) -> f64 {
    let diff = diff_sec as f64;
    if diff <= config.duration_full_credit_sec {
        1.0
    } else if diff >= config.duration_zero_credit_sec {
        0.0
    } else {
        (config.duration_zero_credit_sec - diff) / (config.duration_zero_credit_sec - config.duration_full_credit_sec)
    }
}

fn duration_diff(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.abs_diff(b)),
        _ => None,
    }
}

// ============================================================================
// Combined Scoring
// ============================================================================

/// Score a normalized candidate against a normalized source.
///
/// Weighted sum of title, artist and duration similarity. Unknown duration
/// hands its weight to title and artist in proportion. A version mismatch
/// multiplies the result by the configured penalty once.
pub fn score_normalized(source: &NormalizedQuery, candidate: &NormalizedQuery, config: &MatchConfig) -> ScoreBreakdown {
    let title_similarity = string_similarity(&source.title, &candidate.title);
    let artist_similarity = artist_similarity(&source.artists, &candidate.artists);
    let duration_diff_sec = duration_diff(source.duration_sec, candidate.duration_sec);
    let duration_closeness = duration_diff_sec.map(|d| duration_closeness(d, config));

    let (title_weight, artist_weight, duration_weight) = match duration_closeness {
        Some(_) => (config.title_weight, config.artist_weight, config.duration_weight),
        None => {
            let string_weight = config.title_weight + config.artist_weight;
            let scale = (string_weight + config.duration_weight) / string_weight;
            (config.title_weight * scale, config.artist_weight * scale, 0.0)
        }
    };
    let weight_sum = title_weight + artist_weight + duration_weight;

    let weighted = title_weight * title_similarity
        + artist_weight * artist_similarity
        + duration_weight * duration_closeness.unwrap_or(0.0);
    let mut total = if weight_sum > 0.0 { weighted / weight_sum } else { 0.0 };

    let penalized = source.flags.mismatches(candidate.flags);
    if penalized {
        total *= config.mismatch_penalty;
    }

    ScoreBreakdown {
        title_similarity,
        artist_similarity,
        duration_closeness,
        duration_diff_sec,
        title_weight: title_weight / weight_sum.max(f64::MIN_POSITIVE),
        artist_weight: artist_weight / weight_sum.max(f64::MIN_POSITIVE),
        duration_weight: duration_weight / weight_sum.max(f64::MIN_POSITIVE),
        penalized,
        total: total.clamp(0.0, 1.0),
    }
}

/// Score a raw candidate track against a normalized source. Returns [0, 1].
pub fn score(source: &NormalizedQuery, candidate: &Track, config: &MatchConfig) -> f64 {
    score_normalized(source, &normalize(candidate), config).total
}

pub fn is_acceptable(score: f64, config: &MatchConfig) -> bool {
    score >= config.accept_threshold
}

// ============================================================================
// Candidate Ranking
// ============================================================================

fn score_key(score: f64) -> i64 {
    (score * SCORE_GRID).round() as i64
}

/// Best-first order: higher score, then known and closer duration, then
/// earlier search rank.
pub fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    let by_score = score_key(b.score()).cmp(&score_key(a.score()));
    if by_score != Ordering::Equal {
        return by_score;
    }

    let by_duration = match (a.breakdown.duration_diff_sec, b.breakdown.duration_diff_sec) {
        (Some(da), Some(db)) => da.cmp(&db),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_duration.then_with(|| a.rank.cmp(&b.rank))
}

/// Score every candidate, keeping its search rank, sorted best-first.
pub fn rank_candidates(source: &NormalizedQuery, candidates: Vec<Track>, config: &MatchConfig) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .enumerate()
        .map(|(rank, track)| {
            let breakdown = score_normalized(source, &normalize(&track), config);
            tracing::debug!(
                "candidate #{} {}:{} \"{}\" {}",
                rank,
                track.platform,
                track.id,
                track.title,
                breakdown.summary()
            );
            ScoredCandidate { track, rank, breakdown }
        })
        .collect();

    scored.sort_by(compare_candidates);
    scored
}

/// Highest-ranked candidate, if any.
pub fn select_best(source: &NormalizedQuery, candidates: Vec<Track>, config: &MatchConfig) -> Option<ScoredCandidate> {
    rank_candidates(source, candidates, config).into_iter().next()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;

    fn cfg() -> MatchConfig {
        MatchConfig::default()
    }

    fn source() -> NormalizedQuery {
        normalize(&Track::new(
            Platform::Spotify,
            "7qiZfU4dY1lWllzX7mPBI3",
            "Shape of You",
            vec!["Ed Sheeran".into()],
            Some(234),
        ))
    }

    fn yt(id: &str, title: &str, channel: &str, duration: Option<u32>) -> Track {
        Track::new(Platform::Youtube, id, title, vec![channel.to_string()], duration)
    }

    #[test]
    fn test_identical_candidate_is_acceptable() {
        let candidate = yt("JGwWNGJdvx8", "Shape of You", "Ed Sheeran", Some(235));
        let s = score(&source(), &candidate, &cfg());
        assert!(s >= 0.6, "score {}", s);
        assert!(is_acceptable(s, &cfg()));
        assert!(s > 0.99);
    }

    #[test]
    fn test_remix_mismatch_penalty() {
        let plain = yt("a", "Shape of You", "Galantis", Some(234));
        let remix = yt("b", "Shape of You (Remix)", "Galantis", Some(234));
        let unpenalized = score(&source(), &plain, &cfg());
        let penalized = score(&source(), &remix, &cfg());
        assert!(penalized <= unpenalized * 0.6, "{} vs {}", penalized, unpenalized);
        assert!(!is_acceptable(penalized, &cfg()));
    }

    #[test]
    fn test_scores_bounded() {
        let inputs = [
            ("", ""),
            ("Shape of You", "Ed Sheeran"),
            ("(((", "!!!"),
            ("A very long title with many many words in it", "Somebody"),
        ];
        for (title, artist) in inputs {
            for (ctitle, cartist) in inputs {
                for duration in [None, Some(0), Some(234), Some(10_000)] {
                    let src = normalize(&Track::new(Platform::Spotify, "s", title, vec![artist.into()], duration));
                    let cand = yt("c", ctitle, cartist, Some(234));
                    let s = score(&src, &cand, &cfg());
                    assert!((0.0..=1.0).contains(&s), "{} for {:?} vs {:?}", s, title, ctitle);
                }
            }
        }
    }

    #[test]
    fn test_similarity_symmetric() {
        let pairs = [
            ("shape of you", "shape of you remix"),
            ("ed sheeran", "edsheeran"),
            ("bohemian rhapsody", "rhapsody bohemian"),
            ("", "abc"),
            ("kino", "kino gruppa"),
        ];
        for (a, b) in pairs {
            assert_eq!(string_similarity(a, b), string_similarity(b, a));
            assert_eq!(token_set_similarity(a, b), token_set_similarity(b, a));
        }
        let left = vec!["drake".to_string(), "rihanna".to_string()];
        let right = vec!["rihanna".to_string()];
        assert_eq!(artist_similarity(&left, &right), artist_similarity(&right, &left));
        assert_eq!(artist_similarity(&left, &right), 1.0);
    }

    #[test]
    fn test_compact_artist_equal() {
        assert_eq!(string_similarity("ed sheeran", "edsheeran"), 1.0);
        assert_eq!(string_similarity("", ""), 0.0);
    }

    #[test]
    fn test_duration_closeness() {
        let c = cfg();
        assert_eq!(duration_closeness(0, &c), 1.0);
        assert_eq!(duration_closeness(3, &c), 1.0);
        assert_eq!(duration_closeness(30, &c), 0.0);
        assert_eq!(duration_closeness(300, &c), 0.0);
        let mid = duration_closeness(16, &c);
        assert!((mid - 14.0 / 27.0).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_duration_redistributes_weight() {
        let candidate = yt("x", "Shape of You", "Ed Sheeran", None);
        let breakdown = score_normalized(&source(), &normalize(&candidate), &cfg());
        assert_eq!(breakdown.duration_closeness, None);
        assert_eq!(breakdown.duration_weight, 0.0);
        assert!((breakdown.title_weight - 0.625).abs() < 1e-9);
        assert!((breakdown.artist_weight - 0.375).abs() < 1e-9);
        assert!((breakdown.total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_far_duration_loses_duration_share() {
        let candidate = yt("x", "Shape of You", "Ed Sheeran", Some(234 + 60));
        let s = score(&source(), &candidate, &cfg());
        assert!((s - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_tie_prefers_known_closer_duration_then_rank() {
        let src = normalize(&Track::new(Platform::Spotify, "s", "Song", vec!["Band".into()], Some(200)));
        let candidates = vec![
            yt("unknown", "Song", "Band", None),
            yt("two_off", "Song", "Band", Some(202)),
            yt("exact", "Song", "Band", Some(200)),
            yt("exact_later", "Song", "Band", Some(200)),
        ];
        let ranked = rank_candidates(&src, candidates, &cfg());
        let ids: Vec<&str> = ranked.iter().map(|c| c.track.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "exact_later", "two_off", "unknown"]);
        assert_eq!(ranked[0].rank, 2);
    }

    #[test]
    fn test_tie_prefers_first_hit() {
        let src = normalize(&Track::new(Platform::Spotify, "s", "Song", vec!["Band".into()], None));
        let candidates = vec![yt("first", "Song", "Band", None), yt("second", "Song", "Band", None)];
        let best = select_best(&src, candidates, &cfg()).unwrap();
        assert_eq!(best.track.id, "first");
    }

    #[test]
    fn test_higher_score_wins_over_rank() {
        let candidates = vec![
            yt("cover", "Shape of You (Piano Cover)", "Some Pianist", Some(230)),
            yt("official", "Ed Sheeran - Shape of You (Official Music Video)", "Ed Sheeran", Some(263)),
        ];
        let best = select_best(&source(), candidates, &cfg()).unwrap();
        assert_eq!(best.track.id, "official");
        assert!(best.score() >= ACCEPT_THRESHOLD);
    }

    #[test]
    fn test_compare_candidates_is_total_order() {
        // Scores one grid step apart with duration pulling the other way
        let make = |id: &str, total: f64, diff: u32, rank: usize| ScoredCandidate {
            track: yt(id, "Song", "Band", Some(200)),
            rank,
            breakdown: ScoreBreakdown {
                total,
                duration_diff_sec: Some(diff),
                ..Default::default()
            },
        };
        let step = 0.6e-9;
        let mut candidates = vec![
            make("c", 0.7 + 2.0 * step, 20, 2),
            make("a", 0.7, 0, 0),
            make("b", 0.7 + step, 10, 1),
        ];
        for x in &candidates {
            for y in &candidates {
                assert_eq!(compare_candidates(x, y), compare_candidates(y, x).reverse());
            }
        }
        candidates.sort_by(compare_candidates);
        assert!(candidates.windows(2).all(|w| compare_candidates(&w[0], &w[1]) != Ordering::Greater));
    }

    #[test]
    fn test_hidden_remix_qualifiers_penalized() {
        for title in [
            "Shape of You - Galantis Remix | Official Audio",
            "Shape of You (Major Lazer Remix [Extended Mix])",
        ] {
            let candidate = yt("r", title, "Ed Sheeran", Some(234));
            let breakdown = score_normalized(&source(), &normalize(&candidate), &cfg());
            assert!(breakdown.penalized, "{}", title);
            assert!(!is_acceptable(breakdown.total, &cfg()), "{}: {}", title, breakdown.summary());
        }
    }

    #[test]
    fn test_select_best_empty() {
        assert!(select_best(&source(), Vec::new(), &cfg()).is_none());
    }
}
