//! SQLite-backed data store.
//!
//! Repositories are free functions over a per-call connection, tied to
//! nothing but the `Config` workspace path. Comments and posts are
//! written by an external ingestion process in production; the insert
//! helpers here exist for the CLI seeding path and tests.

pub mod audit;
pub mod comments;
pub mod connections;
pub mod profile;

use crate::config::Config;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub use comments::Comment;
pub use profile::{FormalityMode, StyleProfile};

/// Read-only projection of the post a comment belongs to, used for
/// prompting only.
#[derive(Debug, Clone)]
pub struct PostContext {
    pub id: String,
    pub caption: String,
    pub media_url: Option<String>,
    pub media_kind: MediaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Carousel,
    Unknown,
}

impl MediaKind {
    pub(crate) fn as_db(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Carousel => "carousel",
            Self::Unknown => "unknown",
        }
    }

    pub(crate) fn from_db(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "video" => Self::Video,
            "carousel" => Self::Carousel,
            _ => Self::Unknown,
        }
    }
}

pub(crate) fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("Invalid stored timestamp: {raw}"))
}

pub(crate) fn with_connection<T>(
    config: &Config,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    let db_path = config.workspace_dir.join("data").join("replypilot.db");
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open data DB: {}", db_path.display()))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )
    .context("Failed to set sqlite pragmas")?;

    init_schema(&conn)?;
    f(&conn)
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS comments (
            id               TEXT PRIMARY KEY,
            external_id      TEXT NOT NULL,
            post_id          TEXT,
            text             TEXT NOT NULL,
            author_handle    TEXT NOT NULL,
            created_at       TEXT NOT NULL,
            is_replied       INTEGER NOT NULL DEFAULT 0,
            is_hidden        INTEGER NOT NULL DEFAULT 0,
            sentiment_score  REAL,
            reply_suggestion TEXT
        );
        CREATE TABLE IF NOT EXISTS posts (
            id         TEXT PRIMARY KEY,
            caption    TEXT NOT NULL DEFAULT '',
            media_url  TEXT,
            media_kind TEXT NOT NULL DEFAULT 'unknown'
        );
        CREATE TABLE IF NOT EXISTS style_profile (
            id         INTEGER PRIMARY KEY CHECK (id = 1),
            tone       TEXT NOT NULL DEFAULT 'warm and personal',
            style_hint TEXT NOT NULL DEFAULT '',
            language   TEXT NOT NULL DEFAULT 'en',
            formality  TEXT NOT NULL DEFAULT 'smart',
            exemplars  TEXT NOT NULL DEFAULT '[]'
        );
        CREATE TABLE IF NOT EXISTS platform_connections (
            platform     TEXT PRIMARY KEY,
            access_token TEXT NOT NULL,
            connected_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS reply_queue (
            id            TEXT PRIMARY KEY,
            comment_id    TEXT NOT NULL,
            reply_text    TEXT NOT NULL,
            status        TEXT NOT NULL DEFAULT 'pending',
            scheduled_for TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            sent_at       TEXT,
            error_message TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_reply_queue_due ON reply_queue(status, scheduled_for);
        CREATE TABLE IF NOT EXISTS audit_log (
            id                TEXT PRIMARY KEY,
            queue_item_id     TEXT NOT NULL,
            comment_id        TEXT NOT NULL,
            external_reply_id TEXT NOT NULL,
            sent_at           TEXT NOT NULL
        );",
    )
    .context("Failed to initialize data schema")?;
    Ok(())
}

/// Upsert a post projection (seeding/CLI path).
pub fn upsert_post(config: &Config, post: &PostContext) -> Result<()> {
    with_connection(config, |conn| {
        conn.execute(
            "INSERT INTO posts (id, caption, media_url, media_kind)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                caption = excluded.caption,
                media_url = excluded.media_url,
                media_kind = excluded.media_kind",
            rusqlite::params![post.id, post.caption, post.media_url, post.media_kind.as_db()],
        )
        .context("Failed to upsert post")?;
        Ok(())
    })
}

pub fn get_post(config: &Config, id: &str) -> Result<Option<PostContext>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT id, caption, media_url, media_kind FROM posts WHERE id = ?1",
        )?;
        let mut rows = stmt.query(rusqlite::params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let media_kind_raw: String = row.get(3)?;
        Ok(Some(PostContext {
            id: row.get(0)?,
            caption: row.get(1)?,
            media_url: row.get(2)?,
            media_kind: MediaKind::from_db(&media_kind_raw),
        }))
    })
}
