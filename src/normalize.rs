//! Track normalization for cross-platform matching.
//!
//! Turns raw platform metadata into a `NormalizedQuery`: lower-cased,
//! ASCII-folded, punctuation-stripped title and artists, with remix/live/cover
//! qualifiers pulled out of the title into `VersionFlags`.
//!
//! Every function here is pure and total. Garbage in degrades to empty
//! strings, never to an error. Text normalization runs to a fixpoint, so
//! feeding normalized text back in returns it unchanged.

use any_ascii::any_ascii;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

use crate::models::{NormalizedQuery, Platform, Track, VersionFlags};

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// A bracketed group: "(Live at Wembley)", "[Official Video]". Group 1 is the content.
pub static BRACKET_GROUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[\(\[]([^\(\)\[\]]*)[\)\]]").unwrap());

/// Words marking a bracketed group as a qualifier rather than part of the name.
/// "(I Can't Get No) Satisfaction" has none of them and is kept.
pub static QUALIFIER_VOCAB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:",
        // Versions and mixes
        r"remaster(?:ed)?|re-?mix(?:e[ds])?|rmx|mix|edit|version|re-?work(?:ed)?|bootleg|mash-?up|",
        r"sped\s+up|slowed|reverb|nightcore|daycore|",
        // Performances
        r"live|acoustic|unplugged|concert|session|demo|take|outtake|alternate|",
        r"cover(?:ed)?|tribute|karaoke|instrumental|in\s+the\s+style\s+of|originally\s+performed|",
        // Releases
        r"mono|stereo|deluxe|edition|bonus|explicit|clean|censored|radio|single|album|extended|original|",
        r"soundtrack|ost|from|",
        // Uploads
        r"official|video|audio|lyrics?|visuali[sz]er|hd|hq|4k|",
        // Credits
        r"feat\.?|ft\.?|featuring|prod\.?|with|",
        r"\d{4}",
        r")(?:\b|$)"
    ))
    .unwrap()
});

/// Dash-suffixed qualifiers: "- Remastered 2011", "- Live at Wembley", "- Radio Edit", "- Piano Cover".
/// "- Live Forever" is not a qualifier.
pub static DASH_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\s+[-–—]\s+(?:",
        r"[^-–—]*\b(?:remaster(?:ed)?|re-?mix(?:ed)?|rmx|edit|version|mono|stereo|bootleg|re-?work(?:ed)?|",
        r"sped\s+up|slowed|nightcore)\b[^-–—]*|",
        r"live(?:\s+(?:at|from|in|on)\b[^-–—]*|\s+\d{4})?|",
        r"(?:[^-–—]*\s)?cover(?:\s+by\b[^-–—]*)?|",
        r"acoustic(?:\s+version)?|",
        r"\d{4}",
        r")\s*$"
    ))
    .unwrap()
});

/// Featured artists without brackets: "Song feat. Artist", "Song ft. Someone"
pub static FEAT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.+$").unwrap());

/// Upload noise after a pipe: "Song | Official Video"
pub static PIPE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[|｜].*$").unwrap());

/// Matches track number prefixes like "Track 5 - ", "01. ", "03_"
pub static TRACK_NUMBER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:track\s*\d{1,3}\s*[-–—.:]\s*|\d{1,2}[._]\s+)").unwrap());

/// Matches track number in brackets: "[01] Song", "[12] Title"
pub static TRACK_NUMBER_BRACKET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[\d{1,2}\]\s*").unwrap());

/// Matches file extensions in titles
pub static FILE_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.(flac|mp3|wav|m4a|ogg|aac)$").unwrap());

/// Matches mojibake replacement characters at end of string
pub static MOJIBAKE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\u{FFFD}]+$").unwrap());

pub static REMIX_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:re-?mix(?:e[ds])?|rmx|re-?work(?:ed)?|bootleg|mash-?up|(?:club|dub|vip)\s+mix|sped\s+up|slowed|nightcore|daycore)\b",
    )
    .unwrap()
});

pub static LIVE_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:live|unplugged|in\s+concert|concert)\b").unwrap());

pub static COVER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:cover(?:ed)?|tribute|karaoke|in\s+the\s+style\s+of|originally\s+performed)\b").unwrap()
});

/// Dash suffix that marks a live version: "- Live", "- Live at Wembley", "- Live 1985"
static DASH_LIVE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s[-–—]\s*live(?:\s+(?:at|from|in|on)\b[^-–—]*|\s+\d{4})?\s*$").unwrap());

/// Dash suffix ending in a remix word: "- Remix", "- Kygo Remix"
static DASH_REMIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s[-–—]\s*[^-–—]*\b(?:re-?mix(?:ed)?|rmx|re-?work(?:ed)?|bootleg|sped\s+up|slowed|nightcore)(?:\s+\d{4})?\s*$")
        .unwrap()
});

/// Dash suffix ending in a cover marker: "- Piano Cover", "- Cover by Someone". "Cover Me" is a title.
static DASH_COVER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s[-–—]\s*(?:[^-–—]*\s)?cover(?:\s+by\b[^-–—]*)?\s*$").unwrap());

/// Artist cleanup patterns
pub static ARTIST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.*").unwrap(),
        // YouTube channel decorations: "Artist - Topic", "ArtistVEVO", "Artist Official"
        Regex::new(r"(?i)\s*-\s*topic$").unwrap(),
        Regex::new(r"(?i)\s*vevo$").unwrap(),
        Regex::new(r"(?i)\s+official(?:\s+channel)?$").unwrap(),
    ]
});

/// Separators between credited artists inside one artist string.
/// "&" and "and" are left alone: too many band names contain them.
pub static ARTIST_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*[,;/•×]\s*|\s+(?:x|vs\.?|with|feat\.?|ft\.?|featuring)\s+").unwrap()
});

/// Dash between artist and title in video titles: "Artist - Title"
static VIDEO_TITLE_DASH: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+[-–—]\s+").unwrap());

/// Regex to collapse multiple whitespace into single space
pub static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Anything left over after folding that is not a letter, digit or space.
static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]+").unwrap());

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Check if a character is a Unicode combining mark (diacritical mark).
pub fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0xFE20..=0xFE2F)
}

/// Fold Unicode text to lower-case ASCII: NFKD decomposition, combining marks
/// removed, remaining scripts transliterated.
/// e.g., "Beyoncé" → "beyonce", "Motörhead" → "motorhead"
pub fn fold_to_ascii(s: &str) -> String {
    let stripped: String = s.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    any_ascii(&stripped).to_lowercase()
}

/// Normalize punctuation by converting curly quotes to straight quotes and & to and.
/// Also fixes common encoding issues where ? stands in for an apostrophe.
pub fn normalize_punctuation(s: &str) -> String {
    let result = s
        .replace(['\u{2018}', '\u{2019}'], "'") // Left/right single curly quotes
        .replace(['\u{201C}', '\u{201D}'], "\"") // Left/right double curly quotes
        .replace(['\u{00B4}', '\u{0060}'], "'") // Acute accent and grave accent
        .replace(" & ", " and ")
        .replace("?t ", "'t ") // Can?t → Can't
        .replace("?s ", "'s ") // It?s → It's
        .replace("?m ", "'m ") // I?m → I'm
        .replace("?ve ", "'ve ")
        .replace("?re ", "'re ")
        .replace("?ll ", "'ll ");
    MULTI_SPACE.replace_all(&result, " ").to_string()
}

/// Final stage shared by titles and artists: fold, drop apostrophes, turn any
/// other punctuation into spaces, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let folded = fold_to_ascii(s).replace('\'', "");
    let spaced = NON_ALNUM.replace_all(&folded, " ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Repeat `pass` until its output stops changing. Only the first pass can
/// add characters; later ones run on folded text and only delete.
fn until_stable(input: &str, mut pass: impl FnMut(&str) -> String) -> String {
    let mut current = pass(input);
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

// ============================================================================
// QUALIFIER STRIPPING
// ============================================================================

fn flag_group(content: &str, flags: &mut VersionFlags) {
    flags.remix |= REMIX_WORDS.is_match(content);
    flags.live |= LIVE_WORDS.is_match(content);
    flags.cover |= COVER_WORDS.is_match(content);
}

fn flag_dash_suffix(suffix: &str, flags: &mut VersionFlags) {
    flags.remix |= DASH_REMIX.is_match(suffix);
    flags.live |= DASH_LIVE.is_match(suffix);
    flags.cover |= DASH_COVER.is_match(suffix);
}

/// Remove qualifier groups, innermost first, flagging each one removed.
/// Name-bearing groups lose their brackets but keep their words, so an
/// enclosing qualifier group is still seen: "(Major Lazer Remix [Extended Mix])".
fn strip_bracket_qualifiers(text: &str, flags: &mut VersionFlags) -> String {
    let mut result = text.to_string();
    // Every replacement drops one bracket pair
    while BRACKET_GROUP.is_match(&result) {
        result = BRACKET_GROUP
            .replace_all(&result, |caps: &Captures| {
                let content = &caps[1];
                if QUALIFIER_VOCAB.is_match(content) {
                    flag_group(content, flags);
                    String::new()
                } else {
                    format!(" {} ", content)
                }
            })
            .into_owned();
    }
    result
}

/// Upload and file noise that hides the end of a title: "Song - Remix | Official Audio".
fn strip_upload_noise(title: &str) -> String {
    let mut result = normalize_punctuation(title);

    result = FILE_EXTENSION.replace(&result, "").to_string();
    result = TRACK_NUMBER_PREFIX.replace(&result, "").to_string();
    result = TRACK_NUMBER_BRACKET.replace(&result, "").to_string();
    result = MOJIBAKE_SUFFIX.replace(&result, "").to_string();
    PIPE_SUFFIX.replace(&result, "").to_string()
}

/// Remove the dash qualifier ending `text`, if any, flagging it.
fn strip_dash_qualifier(text: &mut String, flags: &mut VersionFlags) {
    if let Some(start) = DASH_QUALIFIER.find(text).map(|m| m.start()) {
        flag_dash_suffix(&text[start..], flags);
        text.truncate(start);
    }
}

fn title_pass(title: &str, flags: &mut VersionFlags) -> String {
    let result = strip_upload_noise(title);
    let mut result = strip_bracket_qualifiers(&result, flags);
    strip_dash_qualifier(&mut result, flags);
    result = FEAT_SUFFIX.replace(&result, "").to_string();

    normalize_text(&result)
}

/// Normalize a title and collect the version flags of every qualifier
/// stripped from it.
pub fn clean_title(title: &str) -> (String, VersionFlags) {
    let mut flags = VersionFlags::default();
    let cleaned = until_stable(title, |t| title_pass(t, &mut flags));
    (cleaned, flags)
}

/// Detect remix/live/cover markers. Only bracketed groups and dash suffixes
/// count, so "Live Forever" or "Cover Me" stay unflagged.
pub fn detect_version_flags(title: &str) -> VersionFlags {
    clean_title(title).1
}

// ============================================================================
// NORMALIZATION FUNCTIONS
// ============================================================================

/// Normalize a title for matching. Strips qualifiers, featured artists,
/// upload noise and punctuation.
pub fn normalize_title(title: &str) -> String {
    clean_title(title).0
}

fn artist_pass(artist: &str) -> String {
    let mut result = normalize_punctuation(artist);
    for pattern in ARTIST_PATTERNS.iter() {
        result = pattern.replace_all(&result, "").to_string();
    }

    let mut normalized = normalize_text(&result);

    // Strip "the " prefix (e.g., "The Beatles" → "beatles")
    while let Some(rest) = normalized.strip_prefix("the ") {
        normalized = rest.to_string();
    }
    // Strip ", the" suffix; the comma is already gone (e.g., "Scorpions, The" → "scorpions")
    while let Some(rest) = normalized.strip_suffix(" the") {
        normalized = rest.to_string();
    }

    normalized
}

/// Normalize a single artist name for matching.
pub fn normalize_artist(artist: &str) -> String {
    until_stable(artist, artist_pass)
}

/// Split one artist string into its credited artists, normalized.
/// e.g., "Mustard, Migos" → ["mustard", "migos"]; "Simon & Garfunkel" stays whole.
pub fn split_artists(raw: &str) -> Vec<String> {
    // ", The" is an inverted article, not a separator
    let raw = raw.trim();
    let raw = match raw.len().checked_sub(5) {
        Some(i) if raw.is_char_boundary(i) && raw[i..].eq_ignore_ascii_case(", the") => &raw[..i],
        _ => raw,
    };

    ARTIST_SEPARATOR
        .split(raw)
        .map(normalize_artist)
        .filter(|a| !a.is_empty())
        .collect()
}

/// Split a video title of the form "Artist - Title".
///
/// Only splits when the left side agrees with the uploader (compared without
/// spaces, so "EdSheeranVEVO" agrees with "Ed Sheeran"), or when no uploader
/// is known. A right side that is itself a qualifier ("- Live at Wembley") is
/// never split off. Qualifier groups on the left side are dropped.
pub fn split_video_title(title: &str, channel: Option<&str>) -> Option<(String, String)> {
    let m = VIDEO_TITLE_DASH.find(title)?;
    let right = title[m.end()..].trim();

    let mut ignored = VersionFlags::default();
    let left = strip_bracket_qualifiers(&title[..m.start()], &mut ignored);
    let left = left.trim();

    let suffix = strip_bracket_qualifiers(&PIPE_SUFFIX.replace(&title[m.start()..], ""), &mut ignored);
    let is_qualifier = DASH_QUALIFIER.find(&suffix).is_some_and(|q| q.start() == 0);
    if left.is_empty() || right.is_empty() || is_qualifier {
        return None;
    }

    let agrees = match channel {
        None => true,
        Some(channel) => {
            let left_compact = compact(&normalize_artist(left));
            let channel_compact = compact(&normalize_artist(channel));
            !left_compact.is_empty()
                && !channel_compact.is_empty()
                && (left_compact.contains(&channel_compact) || channel_compact.contains(&left_compact))
        }
    };

    agrees.then(|| (left.to_string(), right.to_string()))
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Derive the comparable form of a track.
pub fn normalize(track: &Track) -> NormalizedQuery {
    // Video titles usually carry the artist: "Artist - Title (Official Video)"
    let split = match track.platform {
        Platform::Youtube => split_video_title(&track.title, track.primary_artist()),
        Platform::Spotify => None,
    };

    let mut raw_title = track.title.as_str();
    let mut raw_artists: Vec<&str> = track.artists.iter().map(String::as_str).collect();
    if let Some((artist, title)) = &split {
        raw_title = title.as_str();
        // The title's artist spelling beats the channel name
        let l = compact(&normalize_artist(artist));
        raw_artists.retain(|a| {
            let c = compact(&normalize_artist(a));
            !(c.contains(&l) || l.contains(&c))
        });
        raw_artists.insert(0, artist.as_str());
    }

    let mut artists: Vec<String> = Vec::new();
    for raw in raw_artists {
        for artist in split_artists(raw) {
            if !artists.contains(&artist) {
                artists.push(artist);
            }
        }
    }

    let (title, flags) = clean_title(raw_title);
    NormalizedQuery {
        title,
        artist: artists.first().cloned().unwrap_or_default(),
        artists,
        duration_sec: track.duration_sec,
        flags: track.flags.union(flags),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn spotify(title: &str, artists: &[&str]) -> Track {
        Track::new(
            Platform::Spotify,
            "sp",
            title,
            artists.iter().map(|a| a.to_string()).collect(),
            Some(200),
        )
    }

    fn youtube(title: &str, channel: &str) -> Track {
        Track::new(Platform::Youtube, "yt", title, vec![channel.to_string()], None)
    }

    #[test]
    fn test_normalize_title_basic() {
        assert_eq!(normalize_title("Shape of You"), "shape of you");
        assert_eq!(normalize_title("Song [Mono]"), "song");
        assert_eq!(normalize_title("Track (2021 Remaster)"), "track");
        assert_eq!(normalize_title("Yesterday - Remastered 2009"), "yesterday");
        assert_eq!(normalize_title("Don’t Stop Me Now"), "dont stop me now");
    }

    #[test]
    fn test_live_qualifier_stripped_and_flagged() {
        let q = normalize(&spotify("Song (Live) - Artist", &["Artist"]));
        assert!(q.flags.live);
        assert!(!q.title.contains("live"));
        assert_eq!(q.title, "song artist");
    }

    #[test]
    fn test_flags_only_from_qualifiers() {
        assert_eq!(detect_version_flags("Live Forever"), VersionFlags::default());
        assert_eq!(detect_version_flags("Cover Me"), VersionFlags::default());
        assert!(detect_version_flags("Shape of You (Major Lazer Remix)").remix);
        assert!(detect_version_flags("Bohemian Rhapsody - Live at Wembley '86").live);
        assert!(detect_version_flags("Hallelujah - Piano Cover").cover);
        assert!(detect_version_flags("Creep [Karaoke Version]").cover);
        let both = detect_version_flags("Song (Remix) - Live");
        assert!(both.remix && both.live && !both.cover);
    }

    #[test]
    fn test_flags_seen_through_upload_noise() {
        let q = normalize(&youtube("Shape of You - Galantis Remix | Official Audio", "Ed Sheeran"));
        assert_eq!(q.title, "shape of you");
        assert!(q.flags.remix);
        assert!(detect_version_flags("Song - Live | Lyrics").live);
        assert!(detect_version_flags("Song - Piano Cover.mp3").cover);
        assert_eq!(normalize_title("Song - Live | Lyrics"), "song");
    }

    #[test]
    fn test_nested_qualifier_groups() {
        let title = "Shape of You (Major Lazer Remix [Extended Mix])";
        let (cleaned, flags) = clean_title(title);
        assert_eq!(cleaned, "shape of you");
        assert!(flags.remix);
        assert_eq!(detect_version_flags(title), flags);

        // A name-bearing inner group does not hide the outer qualifier
        let (cleaned, flags) = clean_title("Song (Remix [Foo Bar])");
        assert_eq!(cleaned, "song");
        assert!(flags.remix);
    }

    #[test]
    fn test_repeated_articles_reach_fixpoint() {
        let input = format!("{}x", "the ".repeat(20));
        let once = normalize_artist(&input);
        assert_eq!(once, "x");
        assert_eq!(normalize_artist(&once), once);
        assert_eq!(normalize_artist("The The"), "the");
    }

    #[test]
    fn test_split_video_title_drops_artist_qualifiers() {
        let q = normalize(&Track::new(Platform::Youtube, "yt", "Song (Live) - Artist", vec![], None));
        assert_eq!(q.artist, "song");
        assert_eq!(q.title, "artist");
        assert!(q.flags.live);
        assert_eq!(
            split_video_title("Ed Sheeran - Shape of You - Remix | Lyrics", Some("Ed Sheeran")).map(|s| s.1),
            Some("Shape of You - Remix | Lyrics".to_string())
        );
    }

    #[test]
    fn test_featuring_stripped() {
        assert_eq!(normalize_title("Señorita (feat. Camila Cabello)"), "senorita");
        assert_eq!(normalize_title("Old Town Road feat. Billy Ray Cyrus"), "old town road");
    }

    #[test]
    fn test_name_bearing_parentheses_kept() {
        assert_eq!(
            normalize_title("(I Can't Get No) Satisfaction"),
            "i cant get no satisfaction"
        );
    }

    #[test]
    fn test_upload_noise_stripped() {
        assert_eq!(normalize_title("Shape of You (Official Music Video)"), "shape of you");
        assert_eq!(normalize_title("Numb [HD] | Lyrics"), "numb");
        assert_eq!(normalize_title("[01] Song Name"), "song name");
    }

    #[test]
    fn test_normalize_title_idempotent() {
        let inputs = [
            "Shape of You (Remix)",
            "Song (Live) - Artist",
            "  Björk — Jóga (Live at Royal Opera House)  ",
            "Track 5 - Something & Nothing",
            "",
            "((()))",
            "— — —",
            "The The",
        ];
        for input in inputs {
            let once = normalize_title(input);
            assert_eq!(normalize_title(&once), once, "input: {:?}", input);
            let artist_once = normalize_artist(input);
            assert_eq!(normalize_artist(&artist_once), artist_once, "input: {:?}", input);
        }
    }

    #[test]
    fn test_garbage_degrades_to_empty() {
        assert_eq!(normalize_title(""), "");
        assert_eq!(normalize_title("(Official Video)"), "");
        assert_eq!(normalize_title("!!! ??? ..."), "");
        let q = normalize(&Track::new(Platform::Spotify, "x", "", vec![], None));
        assert_eq!(q.title, "");
        assert_eq!(q.artist, "");
        assert!(q.artists.is_empty());
    }

    #[test]
    fn test_normalize_artist_basic() {
        assert_eq!(normalize_artist("The Beatles"), "beatles");
        assert_eq!(normalize_artist("Artist feat. Other"), "artist");
        assert_eq!(normalize_artist("Ed Sheeran - Topic"), "ed sheeran");
        assert_eq!(normalize_artist("EdSheeranVEVO"), "edsheeran");
        assert_eq!(normalize_artist("Beyoncé"), "beyonce");
    }

    #[test]
    fn test_fold_to_ascii() {
        assert_eq!(fold_to_ascii("Björk"), "bjork");
        assert_eq!(fold_to_ascii("Motörhead"), "motorhead");
        assert_eq!(fold_to_ascii("кино"), "kino");
    }

    #[test]
    fn test_split_artists() {
        assert_eq!(split_artists("Mustard, Migos"), vec!["mustard", "migos"]);
        assert_eq!(split_artists("Drake feat. Rihanna"), vec!["drake", "rihanna"]);
        assert_eq!(split_artists("DJ Snake x Lil Jon"), vec!["dj snake", "lil jon"]);
        assert_eq!(split_artists("Simon & Garfunkel"), vec!["simon and garfunkel"]);
        assert_eq!(split_artists("Scorpions, The"), vec!["scorpions"]);
    }

    #[test]
    fn test_normalize_punctuation() {
        assert_eq!(normalize_punctuation("Can?t Stop"), "Can't Stop");
        assert_eq!(normalize_punctuation("Rock & Roll"), "Rock and Roll");
    }

    #[test]
    fn test_split_video_title() {
        assert_eq!(
            split_video_title("Ed Sheeran - Shape of You", Some("EdSheeranVEVO")),
            Some(("Ed Sheeran".to_string(), "Shape of You".to_string()))
        );
        assert_eq!(split_video_title("Queen - Bohemian Rhapsody", None).map(|s| s.0), Some("Queen".into()));
        // Uploader disagrees: keep the whole title
        assert_eq!(split_video_title("Ed Sheeran - Shape of You", Some("Lyrics Hub")), None);
        // Right side is a qualifier, not a title
        assert_eq!(split_video_title("Song - Live at Wembley", None), None);
        assert_eq!(
            split_video_title("Ed Sheeran - Shape of You (Galantis Remix)", Some("Ed Sheeran")).map(|s| s.1),
            Some("Shape of You (Galantis Remix)".to_string())
        );
    }

    #[test]
    fn test_normalize_youtube_track() {
        let q = normalize(&youtube("Ed Sheeran - Shape of You (Official Music Video)", "Ed Sheeran"));
        assert_eq!(q.title, "shape of you");
        assert_eq!(q.artist, "ed sheeran");
        assert_eq!(q.artists, vec!["ed sheeran"]);
        assert_eq!(q.search_terms(), "shape of you ed sheeran");
    }

    #[test]
    fn test_normalize_youtube_remix_video() {
        let q = normalize(&youtube("Ed Sheeran - Shape of You (Galantis Remix)", "Galantis"));
        // Channel disagrees with the title's artist, so nothing is split off
        assert!(q.flags.remix);
        assert_eq!(q.artist, "galantis");
        assert_eq!(q.title, "ed sheeran shape of you");
    }

    #[test]
    fn test_normalize_collects_all_artists() {
        let q = normalize(&spotify("Bad Guy", &["Billie Eilish", "Justin Bieber, Billie Eilish"]));
        assert_eq!(q.artist, "billie eilish");
        assert_eq!(q.artists, vec!["billie eilish", "justin bieber"]);
        assert_eq!(q.duration_sec, Some(200));
    }
}
