use super::{parse_rfc3339, with_connection};
use crate::config::Config;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

/// One successfully dispatched reply. Written exactly once per sent
/// queue item, right after the platform call commits.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: String,
    pub queue_item_id: String,
    pub comment_id: String,
    pub external_reply_id: String,
    pub sent_at: DateTime<Utc>,
}

pub fn record(
    config: &Config,
    queue_item_id: &str,
    comment_id: &str,
    external_reply_id: &str,
) -> Result<AuditEntry> {
    let entry = AuditEntry {
        id: Uuid::new_v4().to_string(),
        queue_item_id: queue_item_id.to_string(),
        comment_id: comment_id.to_string(),
        external_reply_id: external_reply_id.to_string(),
        sent_at: Utc::now(),
    };

    with_connection(config, |conn| {
        conn.execute(
            "INSERT INTO audit_log (id, queue_item_id, comment_id, external_reply_id, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.id,
                entry.queue_item_id,
                entry.comment_id,
                entry.external_reply_id,
                entry.sent_at.to_rfc3339(),
            ],
        )
        .context("Failed to record audit entry")?;
        Ok(())
    })?;

    Ok(entry)
}

pub fn list(config: &Config) -> Result<Vec<AuditEntry>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT id, queue_item_id, comment_id, external_reply_id, sent_at
             FROM audit_log ORDER BY sent_at DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, queue_item_id, comment_id, external_reply_id, sent_at_raw) = row?;
            entries.push(AuditEntry {
                id,
                queue_item_id,
                comment_id,
                external_reply_id,
                sent_at: parse_rfc3339(&sent_at_raw)?,
            });
        }
        Ok(entries)
    })
}
