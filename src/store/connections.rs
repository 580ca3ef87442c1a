use super::with_connection;
use crate::config::Config;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::params;

/// The single platform this deployment dispatches to.
pub const PLATFORM: &str = "instagram";

/// Resolve the platform access token, if the account is connected.
/// Absence is a per-item configuration failure for the dispatcher, not
/// a systemic error.
pub fn access_token(config: &Config) -> Result<Option<String>> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT access_token FROM platform_connections WHERE platform = ?1",
        )?;
        let mut rows = stmt.query(params![PLATFORM])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    })
}

pub fn connect(config: &Config, token: &str) -> Result<()> {
    with_connection(config, |conn| {
        conn.execute(
            "INSERT INTO platform_connections (platform, access_token, connected_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(platform) DO UPDATE SET
                access_token = excluded.access_token,
                connected_at = excluded.connected_at",
            params![PLATFORM, token, Utc::now().to_rfc3339()],
        )
        .context("Failed to store platform connection")?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::test_config;
    use super::*;

    #[test]
    fn absent_connection_is_none() {
        let (_dir, config) = test_config();
        assert!(access_token(&config).unwrap().is_none());
    }

    #[test]
    fn connect_stores_and_replaces_token() {
        let (_dir, config) = test_config();
        connect(&config, "tok-1").unwrap();
        assert_eq!(access_token(&config).unwrap().as_deref(), Some("tok-1"));

        connect(&config, "tok-2").unwrap();
        assert_eq!(access_token(&config).unwrap().as_deref(), Some("tok-2"));
    }
}
