// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Confab - chat, persistent sessions and expert routing over an
//! OpenAI-compatible completion API.

mod history;
mod shell;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use confab_config::{ConfabConfig, Credentials};
use tracing::error;

/// Confab - chat with an OpenAI-compatible model from the terminal.
#[derive(Parser, Debug)]
#[command(name = "confab", version, about, long_about = None)]
struct Cli {
    /// Load this TOML file instead of the default config search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream a reply from the tennis expert.
    Chat,
    /// Chat with a history that is kept between runs.
    Session {
        /// Conversation to continue (defaults to `session.default_id`).
        #[arg(long)]
        session_id: Option<String>,
        /// Wait for the whole reply instead of streaming it.
        #[arg(long)]
        no_stream: bool,
    },
    /// Send questions to a JavaScript, Python or AI expert.
    Route,
    /// Show, clear or list stored conversations.
    History {
        /// Conversation to show or clear (defaults to `session.default_id`).
        #[arg(long)]
        session_id: Option<String>,
        /// Delete the conversation instead of printing it.
        #[arg(long, conflicts_with = "list")]
        clear: bool,
        /// List every stored conversation.
        #[arg(long)]
        list: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    confab_config::load_dotenv();
    let loaded = match cli.config.as_deref() {
        Some(path) => confab_config::load_and_validate_path(path),
        None => confab_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            confab_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Commands::Chat => shell::run_chat(&config, &require_credentials(&config)).await,
        Commands::Session {
            session_id,
            no_stream,
        } => {
            let session_id = session_id.unwrap_or_else(|| config.session.default_id.clone());
            let stream = config.session.stream && !no_stream;
            shell::run_session(&config, &require_credentials(&config), session_id, stream).await
        }
        Commands::Route => shell::run_route(&config, &require_credentials(&config)).await,
        Commands::History {
            session_id,
            clear,
            list,
        } => {
            let session_id = session_id.unwrap_or_else(|| config.session.default_id.clone());
            history::run_history(&config, &session_id, clear, list).await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("{}: {e}", "error".red());
        std::process::exit(1);
    }
}

/// Model and API key, or exit before any client is built.
fn require_credentials(config: &ConfabConfig) -> Credentials {
    match confab_config::resolve_credentials(&config.openai) {
        Ok(credentials) => credentials,
        Err(errors) => {
            confab_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr so they never interleave with streamed replies.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("confab={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
