use super::types::{QueueItem, QueueStatus};
use crate::config::Config;
use crate::error::StoreError;
use crate::store::{parse_rfc3339, with_connection};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "id, comment_id, reply_text, status, scheduled_for, created_at, sent_at, error_message";

type RawRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
);

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_item(raw: RawRow) -> Result<QueueItem> {
    let (id, comment_id, reply_text, status_raw, scheduled_raw, created_raw, sent_raw, error_message) =
        raw;
    Ok(QueueItem {
        id,
        comment_id,
        reply_text,
        status: QueueStatus::from_db(&status_raw),
        scheduled_for: parse_rfc3339(&scheduled_raw)?,
        created_at: parse_rfc3339(&created_raw)?,
        sent_at: match sent_raw {
            Some(raw) => Some(parse_rfc3339(&raw)?),
            None => None,
        },
        error_message,
    })
}

/// Create a `pending` item for an approved draft.
///
/// Enforces the one-active-item-per-comment contract the dispatcher
/// relies on: a second enqueue while a `pending`/`waiting_for_post` item
/// exists for the same comment is rejected.
pub fn enqueue(
    config: &Config,
    comment_id: &str,
    reply_text: &str,
    scheduled_for: DateTime<Utc>,
) -> Result<QueueItem> {
    let now = Utc::now();
    let id = Uuid::new_v4().to_string();

    with_connection(config, |conn| {
        let active: i64 = conn.query_row(
            "SELECT COUNT(*) FROM reply_queue
             WHERE comment_id = ?1 AND status IN ('pending', 'waiting_for_post')",
            params![comment_id],
            |row| row.get(0),
        )?;
        if active > 0 {
            return Err(StoreError::DuplicateQueueItem(comment_id.to_string()).into());
        }

        conn.execute(
            "INSERT INTO reply_queue (
                id, comment_id, reply_text, status, scheduled_for, created_at
             ) VALUES (?1, ?2, ?3, 'pending', ?4, ?5)",
            params![
                id,
                comment_id,
                reply_text,
                scheduled_for.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .context("Failed to enqueue reply")?;
        Ok(())
    })?;

    Ok(QueueItem {
        id,
        comment_id: comment_id.to_string(),
        reply_text: reply_text.to_string(),
        status: QueueStatus::Pending,
        scheduled_for,
        created_at: now,
        sent_at: None,
        error_message: None,
    })
}

/// Due `pending` items, oldest schedule first. FIFO within a tick.
pub fn due_items(config: &Config, now: DateTime<Utc>, limit: usize) -> Result<Vec<QueueItem>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM reply_queue
             WHERE status = 'pending' AND scheduled_for <= ?1
             ORDER BY scheduled_for ASC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![now.to_rfc3339(), limit as i64], read_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(into_item(row?)?);
        }
        Ok(items)
    })
}

pub fn get(config: &Config, id: &str) -> Result<Option<QueueItem>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM reply_queue WHERE id = ?1"
        ))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(into_item(read_row(row)?)?)),
            None => Ok(None),
        }
    })
}

pub fn list(config: &Config) -> Result<Vec<QueueItem>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM reply_queue ORDER BY scheduled_for ASC"
        ))?;
        let rows = stmt.query_map([], read_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(into_item(row?)?);
        }
        Ok(items)
    })
}

/// `pending`/`waiting_for_post` → `sent`. Terminal rows are never touched.
pub fn mark_sent(config: &Config, id: &str) -> Result<()> {
    let changed = with_connection(config, |conn| {
        conn.execute(
            "UPDATE reply_queue SET status = 'sent', sent_at = ?1, error_message = NULL
             WHERE id = ?2 AND status IN ('pending', 'waiting_for_post')",
            params![Utc::now().to_rfc3339(), id],
        )
        .context("Failed to update queue item")
    })?;

    if changed == 0 {
        return Err(StoreError::QueueItemNotFound(id.to_string()).into());
    }
    Ok(())
}

/// `pending`/`waiting_for_post` → `failed`, recording the reason.
pub fn mark_failed(config: &Config, id: &str, message: &str) -> Result<()> {
    let changed = with_connection(config, |conn| {
        conn.execute(
            "UPDATE reply_queue SET status = 'failed', error_message = ?1
             WHERE id = ?2 AND status IN ('pending', 'waiting_for_post')",
            params![message, id],
        )
        .context("Failed to update queue item")
    })?;

    if changed == 0 {
        return Err(StoreError::QueueItemNotFound(id.to_string()).into());
    }
    Ok(())
}

/// `pending` → `waiting_for_post` (the referenced post is not live yet).
pub fn mark_waiting_for_post(config: &Config, id: &str) -> Result<()> {
    let changed = with_connection(config, |conn| {
        conn.execute(
            "UPDATE reply_queue SET status = 'waiting_for_post'
             WHERE id = ?1 AND status = 'pending'",
            params![id],
        )
        .context("Failed to update queue item")
    })?;

    if changed == 0 {
        return Err(StoreError::QueueItemNotFound(id.to_string()).into());
    }
    Ok(())
}

/// `waiting_for_post` → `pending`. Taken by the external promoter once
/// the post is published; exposed here, never called by the dispatcher.
pub fn promote_waiting(config: &Config, comment_id: &str) -> Result<usize> {
    with_connection(config, |conn| {
        conn.execute(
            "UPDATE reply_queue SET status = 'pending'
             WHERE comment_id = ?1 AND status = 'waiting_for_post'",
            params![comment_id],
        )
        .context("Failed to promote waiting queue items")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::test_config;
    use chrono::Duration;

    fn due_now(config: &Config) -> Vec<QueueItem> {
        due_items(config, Utc::now(), 50).unwrap()
    }

    #[test]
    fn enqueue_creates_pending_item() {
        let (_dir, config) = test_config();
        let item = enqueue(&config, "c-1", "Danke!", Utc::now()).unwrap();
        assert_eq!(item.status, QueueStatus::Pending);

        let loaded = get(&config, &item.id).unwrap().unwrap();
        assert_eq!(loaded.reply_text, "Danke!");
        assert!(loaded.error_message.is_none());
    }

    #[test]
    fn second_active_item_per_comment_is_rejected() {
        let (_dir, config) = test_config();
        enqueue(&config, "c-1", "a", Utc::now()).unwrap();
        let err = enqueue(&config, "c-1", "b", Utc::now()).unwrap_err();
        assert!(err.to_string().contains("active queue item"));
    }

    #[test]
    fn terminal_item_allows_re_enqueue() {
        let (_dir, config) = test_config();
        let item = enqueue(&config, "c-1", "a", Utc::now()).unwrap();
        mark_failed(&config, &item.id, "boom").unwrap();
        // Manual re-submission after failure is the supported path.
        assert!(enqueue(&config, "c-1", "a again", Utc::now()).is_ok());
    }

    #[test]
    fn future_items_are_not_due() {
        let (_dir, config) = test_config();
        enqueue(&config, "c-1", "later", Utc::now() + Duration::hours(2)).unwrap();
        assert!(due_now(&config).is_empty());
    }

    #[test]
    fn due_items_are_fifo_by_schedule() {
        let (_dir, config) = test_config();
        let base = Utc::now() - Duration::hours(3);
        enqueue(&config, "c-2", "second", base + Duration::hours(1)).unwrap();
        enqueue(&config, "c-1", "first", base).unwrap();

        let due = due_now(&config);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].reply_text, "first");
        assert_eq!(due[1].reply_text, "second");
    }

    #[test]
    fn due_respects_limit() {
        let (_dir, config) = test_config();
        for i in 0..5 {
            enqueue(&config, &format!("c-{i}"), "x", Utc::now() - Duration::minutes(5)).unwrap();
        }
        assert_eq!(due_items(&config, Utc::now(), 3).unwrap().len(), 3);
    }

    #[test]
    fn waiting_items_are_not_due() {
        let (_dir, config) = test_config();
        let item = enqueue(&config, "c-1", "x", Utc::now() - Duration::minutes(1)).unwrap();
        mark_waiting_for_post(&config, &item.id).unwrap();
        assert!(due_now(&config).is_empty());

        promote_waiting(&config, "c-1").unwrap();
        assert_eq!(due_now(&config).len(), 1);
    }

    #[test]
    fn sent_is_terminal_and_immutable() {
        let (_dir, config) = test_config();
        let item = enqueue(&config, "c-1", "x", Utc::now()).unwrap();
        mark_sent(&config, &item.id).unwrap();

        assert!(mark_failed(&config, &item.id, "late error").is_err());
        let loaded = get(&config, &item.id).unwrap().unwrap();
        assert_eq!(loaded.status, QueueStatus::Sent);
        assert!(loaded.sent_at.is_some());
    }

    #[test]
    fn failed_is_terminal_and_keeps_message() {
        let (_dir, config) = test_config();
        let item = enqueue(&config, "c-1", "x", Utc::now()).unwrap();
        mark_failed(&config, &item.id, "duplicate reply").unwrap();

        assert!(mark_sent(&config, &item.id).is_err());
        let loaded = get(&config, &item.id).unwrap().unwrap();
        assert_eq!(loaded.status, QueueStatus::Failed);
        assert_eq!(loaded.error_message.as_deref(), Some("duplicate reply"));
    }
}
