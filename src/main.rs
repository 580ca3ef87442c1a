#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

mod cli;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use cli::{Cli, Commands, QueueCommands};
use replypilot::config::Config;
use replypilot::drafts::DraftGenerator;
use replypilot::platform::GraphPlatformClient;
use replypilot::providers::OpenAiCompatibleBackend;
use replypilot::queue::{repository, Dispatcher};
use replypilot::store::{comments, connections};
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let cli = Cli::parse();
    let mut config = Config::load_or_init()?;
    config.apply_env_overrides();

    match cli.command {
        Commands::Draft { comment_ids } => draft(&config, &comment_ids).await,
        Commands::Drafts => list_drafts(&config),
        Commands::Enqueue {
            comment_id,
            at,
            in_minutes,
        } => enqueue(&config, &comment_id, at.as_deref(), in_minutes),
        Commands::Dispatch { watch, every_secs } => dispatch(config, watch, every_secs).await,
        Commands::Queue { command } => queue(&config, &command),
        Commands::Connect { access_token } => {
            connections::connect(&config, &access_token)?;
            println!("Platform connection stored.");
            Ok(())
        }
    }
}

async fn draft(config: &Config, comment_ids: &[String]) -> Result<()> {
    let backend = Arc::new(OpenAiCompatibleBackend::from_config(config));
    let outcome = DraftGenerator::new(config, backend).run(comment_ids).await?;
    println!(
        "Drafted {} repl{}, {} failed.",
        outcome.success_count,
        if outcome.success_count == 1 { "y" } else { "ies" },
        outcome.error_count
    );
    Ok(())
}

fn list_drafts(config: &Config) -> Result<()> {
    let drafted = comments::list_with_suggestions(config)?;
    if drafted.is_empty() {
        println!("No pending drafts.");
        return Ok(());
    }
    for comment in drafted {
        println!("{} @{}", comment.id, comment.author_handle);
        println!("  comment: {}", comment.text);
        if let Some(suggestion) = comment.reply_suggestion {
            println!("  draft:   {suggestion}");
        }
    }
    Ok(())
}

fn enqueue(
    config: &Config,
    comment_id: &str,
    at: Option<&str>,
    in_minutes: Option<i64>,
) -> Result<()> {
    let comment = comments::get(config, comment_id)?
        .with_context(|| format!("No comment with id {comment_id}"))?;
    let reply_text = comment
        .reply_suggestion
        .with_context(|| format!("Comment {comment_id} has no draft; run `draft` first"))?;

    let scheduled_for = match (at, in_minutes) {
        (Some(raw), _) => DateTime::parse_from_rfc3339(raw)
            .context("Invalid --at timestamp, expected RFC 3339")?
            .with_timezone(&Utc),
        (None, Some(minutes)) => Utc::now() + Duration::minutes(minutes),
        (None, None) => Utc::now(),
    };

    let item = repository::enqueue(config, comment_id, &reply_text, scheduled_for)?;
    println!("Queued {} for {}.", item.id, item.scheduled_for.to_rfc3339());
    Ok(())
}

async fn dispatch(config: Config, watch: bool, every_secs: u64) -> Result<()> {
    let platform = Arc::new(GraphPlatformClient::from_config(&config));
    let dispatcher = Dispatcher::new(Arc::new(config), platform);

    if watch {
        dispatcher.run(every_secs).await
    } else {
        let outcome = dispatcher.tick().await?;
        println!(
            "Processed {}: {} sent, {} failed.",
            outcome.processed, outcome.sent, outcome.failed
        );
        Ok(())
    }
}

fn queue(config: &Config, command: &QueueCommands) -> Result<()> {
    match command {
        QueueCommands::List => {
            let items = repository::list(config)?;
            if items.is_empty() {
                println!("Queue is empty.");
                return Ok(());
            }
            for item in items {
                let mut line = format!(
                    "{}  {}  comment={}  due={}",
                    item.id,
                    item.status,
                    item.comment_id,
                    item.scheduled_for.to_rfc3339()
                );
                if let Some(error) = &item.error_message {
                    line.push_str(&format!("  error={error}"));
                }
                println!("{line}");
            }
        }
        QueueCommands::Promote { comment_id } => {
            let promoted = repository::promote_waiting(config, comment_id)?;
            println!("Promoted {promoted} item(s) to pending.");
        }
    }
    Ok(())
}
