use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tracklink::config::MatchConfig;
use tracklink::matcher::resolve_batch;
use tracklink::models::{LinkKey, MatchResult, Platform, Track};
use tracklink::normalize::normalize;
use tracklink::progress::{create_spinner, format_duration, set_log_only};
use tracklink::search::{load_tracks, CatalogSearch, DEFAULT_SEARCH_LIMIT};
use tracklink::store::{LinkStore, SqliteLinkStore};

#[derive(Parser)]
#[command(name = "tracklink")]
#[command(about = "Match tracks between Spotify and YouTube and cache the links")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the normalized form of a title
    Normalize {
        title: String,

        #[arg(long = "artist")]
        artists: Vec<String>,

        #[arg(long, value_enum, default_value = "spotify")]
        platform: Platform,
    },

    /// Resolve a JSON list of tracks against an offline catalog
    Resolve {
        /// SQLite link database (created if missing)
        #[arg(long)]
        links: PathBuf,

        /// JSON array of target-platform tracks to search
        #[arg(long)]
        catalog: PathBuf,

        /// JSON array of source tracks
        #[arg(long)]
        tracks: PathBuf,

        #[arg(long, value_enum)]
        target: Platform,

        /// TOML file overriding matching constants
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        threshold: Option<f64>,

        #[arg(long)]
        penalty: Option<f64>,

        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,

        #[arg(long, default_value = "0")]
        workers: usize,

        /// Write batch statistics as JSON
        #[arg(long)]
        stats: Option<PathBuf>,

        /// Hide progress bars, log periodic progress lines instead
        #[arg(long)]
        log_only: bool,
    },

    /// Print the stored link for one track
    Lookup {
        #[arg(long)]
        links: PathBuf,

        #[arg(long, value_enum)]
        platform: Platform,

        #[arg(long)]
        id: String,

        /// Defaults to the other platform
        #[arg(long, value_enum)]
        target: Option<Platform>,
    },
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    match args.command {
        Command::Normalize {
            title,
            artists,
            platform,
        } => {
            let track = Track::new(platform, "", title, artists, None);
            println!("{}", serde_json::to_string_pretty(&normalize(&track))?);
        }

        Command::Resolve {
            links,
            catalog,
            tracks,
            target,
            config,
            threshold,
            penalty,
            limit,
            workers,
            stats,
            log_only,
        } => {
            set_log_only(log_only);
            if workers > 0 {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build_global()
                    .context("Failed to set thread pool size")?;
            }

            let mut match_config = match config {
                Some(path) => MatchConfig::from_file(&path)?,
                None => MatchConfig::default(),
            };
            if let Some(t) = threshold {
                match_config.accept_threshold = t;
            }
            if let Some(p) = penalty {
                match_config.mismatch_penalty = p;
            }
            match_config.validate()?;

            let start = Instant::now();
            let spinner = create_spinner("Loading catalog");
            let adapter = CatalogSearch::from_json_file(target, &catalog)?.with_limit(limit);
            let sources = load_tracks(&tracks)?;
            spinner.finish_and_clear();
            info!(
                "Loaded {} {} catalog tracks and {} source tracks",
                adapter.len(),
                target,
                sources.len()
            );
            if adapter.is_empty() {
                bail!("catalog {} has no {} tracks", catalog.display(), target);
            }

            let store = SqliteLinkStore::open(&links)
                .with_context(|| format!("Failed to open link database {}", links.display()))?;

            let outcome = resolve_batch(&sources, target, &adapter, &store, &match_config);

            for (track, result) in sources.iter().zip(&outcome.results) {
                let line = match result {
                    Ok(resolution) => match &resolution.result {
                        MatchResult::CacheHit { link } => format!("cached  {} ({:.3})", link.target_id, link.confidence),
                        MatchResult::Matched { link, .. } => format!("matched {} ({:.3})", link.target_id, link.confidence),
                        MatchResult::NoAcceptableMatch { best, candidate_count } => match best {
                            Some(b) => format!("no match ({} candidates, best {:.3})", candidate_count, b.score()),
                            None => "no match (0 candidates)".to_string(),
                        },
                    },
                    Err(e) => format!("error   {}", e),
                };
                println!("{}:{}  {}  {}", track.platform, track.id, track.title, line);
            }

            outcome.stats.log_phase("resolve");
            if let Some(path) = stats {
                outcome
                    .stats
                    .write_to_file(&path)
                    .with_context(|| format!("Failed to write stats {}", path.display()))?;
            }

            println!("\n{:=<60}", "");
            println!("Resolve complete!");
            println!("  Tracks: {}", outcome.stats.total_tracks);
            println!("  Matched: {} ({:.1}%)", outcome.stats.total_matches(), outcome.stats.match_rate());
            println!("  Links stored: {}", store.len()?);
            println!("  Elapsed: {}", format_duration(start.elapsed()));
            println!("{:=<60}", "");
        }

        Command::Lookup {
            links,
            platform,
            id,
            target,
        } => {
            let store = SqliteLinkStore::open(&links)
                .with_context(|| format!("Failed to open link database {}", links.display()))?;
            let key = LinkKey::new(platform, id, target.unwrap_or_else(|| platform.opposite()));
            match store.get(&key)? {
                Some(link) => println!("{}", serde_json::to_string_pretty(&link)?),
                None => println!("No link stored for {}", key),
            }
        }
    }

    Ok(())
}
