//! Link cache storage.
//!
//! `LinkStore` is the capability the matcher consumes. Two backends ship
//! here: `MemoryLinkStore` for tests and one-off runs, `SqliteLinkStore` for
//! persistence across runs.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE track_links (
//!     source_platform   TEXT NOT NULL,
//!     source_id         TEXT NOT NULL,
//!     target_platform   TEXT NOT NULL,
//!     target_id         TEXT NOT NULL,
//!     confidence        REAL NOT NULL,
//!     is_remix_mismatch INTEGER NOT NULL,
//!     created_at_ms     INTEGER NOT NULL,
//!     updated_at_ms     INTEGER NOT NULL,
//!     PRIMARY KEY (source_platform, source_id, target_platform)
//! );
//! ```

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use crate::error::StoreUnavailable;
use crate::models::{LinkKey, Platform, TrackLink};

/// Persistent mapping from composite key to link.
///
/// `put` upserts: an existing key keeps its `created_at`, everything else is
/// replaced. Implementations must make each `put` atomic.
pub trait LinkStore: Send + Sync {
    fn get(&self, key: &LinkKey) -> Result<Option<TrackLink>, StoreUnavailable>;

    fn put(&self, link: &TrackLink) -> Result<(), StoreUnavailable>;

    /// Number of stored links.
    fn len(&self) -> Result<usize, StoreUnavailable>;

    fn is_empty(&self) -> Result<bool, StoreUnavailable> {
        Ok(self.len()? == 0)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Default)]
pub struct MemoryLinkStore {
    links: RwLock<FxHashMap<LinkKey, TrackLink>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinkStore for MemoryLinkStore {
    fn get(&self, key: &LinkKey) -> Result<Option<TrackLink>, StoreUnavailable> {
        let links = self
            .links
            .read()
            .map_err(|_| StoreUnavailable("memory store lock poisoned".into()))?;
        Ok(links.get(key).cloned())
    }

    fn put(&self, link: &TrackLink) -> Result<(), StoreUnavailable> {
        let mut links = self
            .links
            .write()
            .map_err(|_| StoreUnavailable("memory store lock poisoned".into()))?;
        let mut stored = link.clone();
        if let Some(existing) = links.get(&link.key) {
            stored.created_at = existing.created_at;
        }
        links.insert(link.key.clone(), stored);
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreUnavailable> {
        let links = self
            .links
            .read()
            .map_err(|_| StoreUnavailable("memory store lock poisoned".into()))?;
        Ok(links.len())
    }
}

// ============================================================================
// SQLite backend
// ============================================================================

/// Current schema version, stored in `PRAGMA user_version`.
const SCHEMA_VERSION: i64 = 1;

const CREATE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS track_links (
        source_platform   TEXT NOT NULL,
        source_id         TEXT NOT NULL,
        target_platform   TEXT NOT NULL,
        target_id         TEXT NOT NULL,
        confidence        REAL NOT NULL,
        is_remix_mismatch INTEGER NOT NULL,
        created_at_ms     INTEGER NOT NULL,
        updated_at_ms     INTEGER NOT NULL,
        PRIMARY KEY (source_platform, source_id, target_platform)
    );
    CREATE INDEX IF NOT EXISTS idx_track_links_target
        ON track_links (target_platform, target_id);";

pub struct SqliteLinkStore {
    conn: Mutex<Connection>,
}

impl SqliteLinkStore {
    pub fn open(path: &Path) -> Result<Self, StoreUnavailable> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreUnavailable> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreUnavailable> {
        migrate_if_needed(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreUnavailable> {
        self.conn
            .lock()
            .map_err(|_| StoreUnavailable("sqlite connection lock poisoned".into()))
    }
}

fn migrate_if_needed(conn: &Connection) -> Result<(), StoreUnavailable> {
    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version > SCHEMA_VERSION {
        return Err(StoreUnavailable(format!(
            "link db schema version {} is newer than supported {}",
            db_version, SCHEMA_VERSION
        )));
    }
    if db_version < SCHEMA_VERSION {
        tracing::info!("Creating link db schema at version {}", SCHEMA_VERSION);
        conn.execute_batch(CREATE_SCHEMA)?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}

fn from_millis(ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| rusqlite::Error::IntegralValueOutOfRange(0, ms))
}

fn parse_platform(idx: usize, s: String) -> rusqlite::Result<Platform> {
    s.parse::<Platform>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        )
    })
}

impl LinkStore for SqliteLinkStore {
    fn get(&self, key: &LinkKey) -> Result<Option<TrackLink>, StoreUnavailable> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "SELECT source_platform, source_id, target_platform, target_id, confidence,
                    is_remix_mismatch, created_at_ms, updated_at_ms
             FROM track_links
             WHERE source_platform = ?1 AND source_id = ?2 AND target_platform = ?3",
        )?;

        let link = stmt
            .query_row(
                params![key.source_platform.as_str(), key.source_id, key.target_platform.as_str()],
                |row| {
                    Ok(TrackLink {
                        key: LinkKey {
                            source_platform: parse_platform(0, row.get(0)?)?,
                            source_id: row.get(1)?,
                            target_platform: parse_platform(2, row.get(2)?)?,
                        },
                        target_id: row.get(3)?,
                        confidence: row.get(4)?,
                        is_remix_mismatch: row.get(5)?,
                        created_at: from_millis(row.get(6)?)?,
                        updated_at: from_millis(row.get(7)?)?,
                    })
                },
            )
            .optional()?;
        Ok(link)
    }

    fn put(&self, link: &TrackLink) -> Result<(), StoreUnavailable> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(
            "INSERT INTO track_links (source_platform, source_id, target_platform, target_id,
                                      confidence, is_remix_mismatch, created_at_ms, updated_at_ms)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (source_platform, source_id, target_platform) DO UPDATE SET
                 target_id = excluded.target_id,
                 confidence = excluded.confidence,
                 is_remix_mismatch = excluded.is_remix_mismatch,
                 updated_at_ms = excluded.updated_at_ms",
        )?;
        stmt.execute(params![
            link.key.source_platform.as_str(),
            link.key.source_id,
            link.key.target_platform.as_str(),
            link.target_id,
            link.confidence,
            link.is_remix_mismatch,
            link.created_at.timestamp_millis(),
            link.updated_at.timestamp_millis(),
        ])?;
        Ok(())
    }

    fn len(&self) -> Result<usize, StoreUnavailable> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM track_links", [], |r| r.get(0))?;
        Ok(count as usize)
    }
}
