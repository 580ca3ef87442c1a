use chrono::{DateTime, Utc};

/// One unit of dispatch work: an approved draft frozen at enqueue time,
/// plus scheduling and status metadata.
#[derive(Debug, Clone)]
pub struct QueueItem {
    pub id: String,
    pub comment_id: String,
    /// Frozen at enqueue time; never regenerated.
    pub reply_text: String,
    pub status: QueueStatus,
    pub scheduled_for: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

/// Lifecycle: `pending` → `sent` | `failed` | `waiting_for_post`, and
/// `waiting_for_post` → `pending` (taken by an external promoter once the
/// referenced post is published, never by the dispatcher). `sent` and
/// `failed` are terminal; repository update guards refuse to touch them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    Pending,
    WaitingForPost,
    Sent,
    Failed,
}

impl QueueStatus {
    pub(crate) fn as_db(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::WaitingForPost => "waiting_for_post",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub(crate) fn from_db(value: &str) -> Self {
        match value {
            "waiting_for_post" => Self::WaitingForPost,
            "sent" => Self::Sent,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }

    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}
