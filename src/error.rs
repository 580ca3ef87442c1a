use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `replypilot`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum PilotError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Text generation backend ─────────────────────────────────────────
    #[error("generation: {0}")]
    Generation(#[from] GenerationError),

    // ── Data store ──────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── External platform API ───────────────────────────────────────────
    #[error("platform: {0}")]
    Platform(#[from] PlatformError),

    // ── Prompt / Template ───────────────────────────────────────────────
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Text generation errors ─────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("backend request failed: {0}")]
    Request(String),

    #[error("backend returned an empty completion")]
    EmptyCompletion,
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("comment not found: {0}")]
    CommentNotFound(String),

    #[error("queue item not found: {0}")]
    QueueItemNotFound(String),

    #[error("comment {0} already has an active queue item")]
    DuplicateQueueItem(String),

    #[error("sqlite: {0}")]
    Sqlite(String),
}

// ─── Platform errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("no platform connection")]
    NoConnection,

    #[error("reply failed: {0}")]
    Reply(String),

    #[error("like failed: {0}")]
    Like(String),
}

// ─── Prompt / Template errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template render failed: {0}")]
    Render(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, PilotError>;
