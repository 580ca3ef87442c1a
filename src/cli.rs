use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "replypilot",
    version,
    about = "Guarded reply drafting and scheduled dispatch for creator comment inboxes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate guarded reply drafts for the given comments
    Draft {
        /// Comment ids to draft replies for
        #[arg(required = true)]
        comment_ids: Vec<String>,
    },
    /// List comments holding an unsent draft
    Drafts,
    /// Queue a comment's stored draft for dispatch
    Enqueue {
        comment_id: String,
        /// Send at this RFC 3339 timestamp instead of immediately
        #[arg(long)]
        at: Option<String>,
        /// Send this many minutes from now
        #[arg(long, conflicts_with = "at")]
        in_minutes: Option<i64>,
    },
    /// Send due queue items to the platform
    Dispatch {
        /// Keep running and dispatch on an interval
        #[arg(long)]
        watch: bool,
        /// Dispatch interval in seconds (with --watch)
        #[arg(long, default_value_t = 60)]
        every_secs: u64,
    },
    /// Inspect and manage the dispatch queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Store the platform access token
    Connect { access_token: String },
}

#[derive(Subcommand)]
pub enum QueueCommands {
    /// List all queue items, oldest first
    List,
    /// Move a comment's waiting items back to pending
    Promote { comment_id: String },
}
