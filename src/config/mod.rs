use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

// ── Top-level config ──────────────────────────────────────────────

/// Process-wide configuration, loaded once at startup and passed by
/// reference into every component. Nothing in the pipeline reads the
/// environment at call time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    /// Override for the text backend endpoint (self-hosted gateways, tests).
    pub backend_base_url: Option<String>,

    #[serde(default)]
    pub platform: PlatformConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub persona: PersonaConfig,
}

// ── External platform ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the social platform graph API.
    #[serde(default = "default_platform_base_url")]
    pub base_url: String,
}

fn default_platform_base_url() -> String {
    "https://graph.instagram.com".into()
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_platform_base_url(),
        }
    }
}

// ── Pacing ───────────────────────────────────────────────────────

/// Fixed delays between outbound calls. Both the text backend and the
/// platform API rate-limit per account, so batch work is paced rather
/// than parallelized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Delay between comments during batch draft generation.
    #[serde(default = "default_generation_delay_ms")]
    pub generation_delay_ms: u64,
    /// Delay between queue items during a dispatch tick.
    #[serde(default = "default_dispatch_delay_ms")]
    pub dispatch_delay_ms: u64,
    /// Maximum queue items drained per tick.
    #[serde(default = "default_dispatch_batch_size")]
    pub dispatch_batch_size: usize,
}

fn default_generation_delay_ms() -> u64 {
    1_500
}

fn default_dispatch_delay_ms() -> u64 {
    2_000
}

fn default_dispatch_batch_size() -> usize {
    50
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            generation_delay_ms: default_generation_delay_ms(),
            dispatch_delay_ms: default_dispatch_delay_ms(),
            dispatch_batch_size: default_dispatch_batch_size(),
        }
    }
}

// ── Persona ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Display name the replies are written as.
    #[serde(default = "default_persona_name")]
    pub name: String,
}

fn default_persona_name() -> String {
    "the creator".into()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::new(),
            config_path: PathBuf::new(),
            api_key: None,
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            backend_base_url: None,
            platform: PlatformConfig::default(),
            pacing: PacingConfig::default(),
            persona: PersonaConfig::default(),
        }
    }
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let pilot_dir = home.join(".replypilot");
        let config_path = pilot_dir.join("config.toml");

        if !pilot_dir.exists() {
            fs::create_dir_all(&pilot_dir).context("Failed to create .replypilot directory")?;
            fs::create_dir_all(pilot_dir.join("workspace"))
                .context("Failed to create workspace directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            // Set computed paths that are skipped during serialization
            config.config_path.clone_from(&config_path);
            config.workspace_dir = pilot_dir.join("workspace");
            config.validate().map_err(anyhow::Error::from)?;
            Ok(config)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                workspace_dir: pilot_dir.join("workspace"),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("REPLYPILOT_API_KEY").or_else(|_| std::env::var("API_KEY")) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }

        if let Ok(model) = std::env::var("REPLYPILOT_MODEL") {
            if !model.is_empty() {
                self.model = model;
            }
        }

        if let Ok(workspace) = std::env::var("REPLYPILOT_WORKSPACE") {
            if !workspace.is_empty() {
                let expanded = shellexpand::tilde(&workspace);
                self.workspace_dir = PathBuf::from(expanded.as_ref());
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, contents).context("Failed to write config file")?;
        Ok(())
    }

    fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Validation(format!(
                "temperature {} out of range 0.0..=2.0",
                self.temperature
            )));
        }
        if self.pacing.dispatch_batch_size == 0 {
            return Err(ConfigError::Validation(
                "pacing.dispatch_batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Config rooted at an explicit workspace, used by tests and embedders.
    pub fn for_workspace(workspace_dir: impl Into<PathBuf>) -> Self {
        let workspace_dir = workspace_dir.into();
        Self {
            config_path: workspace_dir.join("config.toml"),
            workspace_dir,
            ..Self::default()
        }
    }
}
