// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `confab history` command implementation.
//!
//! Reads the session store directly; no API credentials are needed.

use colored::Colorize;
use confab_config::ConfabConfig;
use confab_core::{ConfabError, HistoryEntry, Role, SessionId, SessionSummary, StorageAdapter};
use confab_storage::SqliteStorage;

/// Prints, clears or lists stored conversations.
pub async fn run_history(
    config: &ConfabConfig,
    session_id: &str,
    clear: bool,
    list: bool,
) -> Result<(), ConfabError> {
    let storage = SqliteStorage::open(config.storage.clone()).await?;
    let session_id = SessionId::from(session_id);

    if list {
        let sessions = storage.list_sessions().await?;
        if sessions.is_empty() {
            println!("{}", "no stored sessions".dimmed());
        }
        for summary in &sessions {
            println!("{}", format_summary(summary));
        }
    } else if clear {
        let removed = storage.clear_session(&session_id).await?;
        println!("cleared {removed} messages from session {session_id}");
    } else {
        let entries = storage.get_messages(&session_id).await?;
        if entries.is_empty() {
            println!("{}", format!("session {session_id} is empty").dimmed());
        }
        for entry in &entries {
            println!("{}", format_entry(entry));
        }
    }

    storage.close().await
}

fn format_summary(summary: &SessionSummary) -> String {
    format!(
        "{}  {} messages  last active {}",
        summary.session_id.bold(),
        summary.message_count,
        summary.last_activity
    )
}

fn format_entry(entry: &HistoryEntry) -> String {
    let label = match entry.role {
        Role::System => "System:".yellow(),
        Role::Human => "You:".green(),
        Role::Assistant => "AI:".cyan(),
    };
    format!("{} {} {}", entry.created_at.dimmed(), label, entry.content)
}
