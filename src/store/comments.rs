use super::{parse_rfc3339, with_connection};
use crate::config::Config;
use crate::error::StoreError;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;

/// An inbound comment as persisted by the ingestion process. This core
/// only ever mutates `reply_suggestion` and `is_replied`.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: String,
    pub external_id: String,
    pub post_id: Option<String>,
    pub text: String,
    pub author_handle: String,
    pub created_at: DateTime<Utc>,
    pub is_replied: bool,
    pub is_hidden: bool,
    pub sentiment_score: Option<f64>,
    pub reply_suggestion: Option<String>,
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Comment, String)> {
    let created_at_raw: String = row.get(5)?;
    Ok((
        Comment {
            id: row.get(0)?,
            external_id: row.get(1)?,
            post_id: row.get(2)?,
            text: row.get(3)?,
            author_handle: row.get(4)?,
            created_at: Utc::now(), // replaced by parsed value below
            is_replied: row.get::<_, i64>(6)? != 0,
            is_hidden: row.get::<_, i64>(7)? != 0,
            sentiment_score: row.get(8)?,
            reply_suggestion: row.get(9)?,
        },
        created_at_raw,
    ))
}

const SELECT_COLUMNS: &str = "id, external_id, post_id, text, author_handle, created_at,
                              is_replied, is_hidden, sentiment_score, reply_suggestion";

pub fn get(config: &Config, id: &str) -> Result<Option<Comment>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM comments WHERE id = ?1"
        ))?;
        let mut rows = stmt.query(params![id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let (mut comment, created_at_raw) = row_to_comment(row)?;
        comment.created_at = parse_rfc3339(&created_at_raw)?;
        Ok(Some(comment))
    })
}

/// Seed a comment (ingestion is external in production; CLI/tests use this).
pub fn insert(config: &Config, comment: &Comment) -> Result<()> {
    with_connection(config, |conn| {
        conn.execute(
            "INSERT INTO comments (
                id, external_id, post_id, text, author_handle, created_at,
                is_replied, is_hidden, sentiment_score, reply_suggestion
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                comment.id,
                comment.external_id,
                comment.post_id,
                comment.text,
                comment.author_handle,
                comment.created_at.to_rfc3339(),
                i64::from(comment.is_replied),
                i64::from(comment.is_hidden),
                comment.sentiment_score,
                comment.reply_suggestion,
            ],
        )
        .context("Failed to insert comment")?;
        Ok(())
    })
}

/// Persist a freshly generated draft onto the comment record. Called once
/// per comment, immediately after generation, so a crash mid-batch keeps
/// every already-processed draft.
pub fn set_reply_suggestion(config: &Config, id: &str, suggestion: &str) -> Result<()> {
    let changed = with_connection(config, |conn| {
        conn.execute(
            "UPDATE comments SET reply_suggestion = ?1 WHERE id = ?2",
            params![suggestion, id],
        )
        .context("Failed to store reply suggestion")
    })?;

    if changed == 0 {
        return Err(StoreError::CommentNotFound(id.to_string()).into());
    }
    Ok(())
}

pub fn mark_replied(config: &Config, id: &str) -> Result<()> {
    let changed = with_connection(config, |conn| {
        conn.execute(
            "UPDATE comments SET is_replied = 1 WHERE id = ?1",
            params![id],
        )
        .context("Failed to mark comment replied")
    })?;

    if changed == 0 {
        return Err(StoreError::CommentNotFound(id.to_string()).into());
    }
    Ok(())
}

/// Comments carrying an unsent draft, newest first (CLI inspection).
pub fn list_with_suggestions(config: &Config) -> Result<Vec<Comment>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {SELECT_COLUMNS} FROM comments
             WHERE reply_suggestion IS NOT NULL AND is_replied = 0
             ORDER BY created_at DESC"
        ))?;
        let rows = stmt.query_map([], row_to_comment)?;

        let mut comments = Vec::new();
        for row in rows {
            let (mut comment, created_at_raw) = row?;
            comment.created_at = parse_rfc3339(&created_at_raw)?;
            comments.push(comment);
        }
        Ok(comments)
    })
}

#[cfg(test)]
pub(crate) fn test_comment(id: &str) -> Comment {
    Comment {
        id: id.to_string(),
        external_id: format!("ext-{id}"),
        post_id: Some("p-1".into()),
        text: "Sieht köstlich aus!".into(),
        author_handle: "foodie_jana".into(),
        created_at: Utc::now(),
        is_replied: false,
        is_hidden: false,
        sentiment_score: Some(0.9),
        reply_suggestion: None,
    }
}
