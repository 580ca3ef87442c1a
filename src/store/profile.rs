use super::with_connection;
use crate::config::Config;
use anyhow::{Context, Result};
use rusqlite::params;

/// Per-creator style configuration, refreshed by an external
/// style-analysis job. Read-only to the pipeline.
#[derive(Debug, Clone)]
pub struct StyleProfile {
    pub tone: String,
    pub style_hint: String,
    pub language: String,
    pub formality: FormalityMode,
    /// The creator's own previously-sent replies, used as few-shot
    /// exemplars. Already pre-filtered upstream; [`load`] re-applies the
    /// triviality filter defensively.
    pub exemplars: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormalityMode {
    /// Infer the register from the commenter's own text.
    #[default]
    Smart,
    AlwaysFormal,
    AlwaysInformal,
}

impl FormalityMode {
    pub(crate) fn as_db(self) -> &'static str {
        match self {
            Self::Smart => "smart",
            Self::AlwaysFormal => "always-formal",
            Self::AlwaysInformal => "always-informal",
        }
    }

    pub(crate) fn from_db(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "always-formal" => Self::AlwaysFormal,
            "always-informal" => Self::AlwaysInformal,
            _ => Self::Smart,
        }
    }
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            tone: "warm and personal".into(),
            style_hint: String::new(),
            language: "en".into(),
            formality: FormalityMode::Smart,
            exemplars: Vec::new(),
        }
    }
}

/// An exemplar is worth imitating only if enough of it is actual prose.
/// Emoji-only and sub-trivial replies ("Danke!", "🙏🙏") are excluded.
pub fn is_substantive_exemplar(text: &str) -> bool {
    text.chars().filter(|c| c.is_alphanumeric()).count() >= 8
}

/// Load the singleton profile, falling back to defaults when the
/// style-analysis job has not run yet.
pub fn load(config: &Config) -> Result<StyleProfile> {
    with_connection(config, |conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT tone, style_hint, language, formality, exemplars
             FROM style_profile WHERE id = 1",
        )?;
        let mut rows = stmt.query([])?;
        let Some(row) = rows.next()? else {
            return Ok(StyleProfile::default());
        };

        let formality_raw: String = row.get(3)?;
        let exemplars_raw: String = row.get(4)?;
        let exemplars: Vec<String> =
            serde_json::from_str(&exemplars_raw).context("Invalid stored exemplars")?;

        Ok(StyleProfile {
            tone: row.get(0)?,
            style_hint: row.get(1)?,
            language: row.get(2)?,
            formality: FormalityMode::from_db(&formality_raw),
            exemplars: exemplars
                .into_iter()
                .filter(|e| is_substantive_exemplar(e))
                .collect(),
        })
    })
}

/// Persist the profile (style-analysis job / CLI seeding path).
pub fn save(config: &Config, profile: &StyleProfile) -> Result<()> {
    let exemplars = serde_json::to_string(&profile.exemplars)?;
    with_connection(config, |conn| {
        conn.execute(
            "INSERT INTO style_profile (id, tone, style_hint, language, formality, exemplars)
             VALUES (1, ?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                tone = excluded.tone,
                style_hint = excluded.style_hint,
                language = excluded.language,
                formality = excluded.formality,
                exemplars = excluded.exemplars",
            params![
                profile.tone,
                profile.style_hint,
                profile.language,
                profile.formality.as_db(),
                exemplars,
            ],
        )
        .context("Failed to save style profile")?;
        Ok(())
    })
}
