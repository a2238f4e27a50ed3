//! CLI command handlers operating directly on the durable store.

mod args;

pub use args::{Cli, CliCommand, HistoryCliArgs, SetKeyCliArgs};

use anyhow::Result;

use crate::history::SummaryRecord;
use crate::store::{keys, KvStore, SqliteKvStore};

pub async fn handle_history_command(args: HistoryCliArgs) -> Result<()> {
    let store = SqliteKvStore::open_default()?;

    let records: Vec<SummaryRecord> = match store.get(keys::HISTORY).await? {
        Some(json) => serde_json::from_str(&json)?,
        None => Vec::new(),
    };

    if records.is_empty() {
        println!("No summaries recorded yet.");
        return Ok(());
    }

    for record in records.iter().rev().take(args.limit) {
        println!(
            "{}  {}  ({} utterances, {})",
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.meeting_key,
            record.utterance_count,
            record.model_used,
        );
        if args.full {
            println!("{}\n", record.summary_text);
        } else if let Some(first_line) = record.summary_text.lines().find(|l| !l.is_empty()) {
            println!("  {}", first_line);
        }
        if let Some(warning) = &record.artifact_warning {
            println!("  ⚠ artifacts: {}", warning);
        } else if let Some(artifacts) = &record.artifacts {
            println!("  → {}", artifacts.summary.resolved_path);
        }
    }

    Ok(())
}

pub async fn handle_set_key_command(args: SetKeyCliArgs) -> Result<()> {
    let store = SqliteKvStore::open_default()?;
    store.set(keys::CREDENTIAL, args.key.trim()).await?;
    println!("API key stored.");
    Ok(())
}

pub async fn handle_clear_command() -> Result<()> {
    let store = SqliteKvStore::open_default()?;
    store.remove(keys::SESSIONS).await?;
    store.remove(keys::HISTORY).await?;
    println!("Sessions and summary history cleared.");
    Ok(())
}
