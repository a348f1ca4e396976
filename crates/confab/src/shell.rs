// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `confab chat`, `confab session` and `confab route`.
//!
//! The two interactive commands read lines with rustyline and end on `exit`
//! or `quit` (any case), Ctrl-C or Ctrl-D. A provider or storage error ends
//! the command; `main` reports it and exits non-zero.

use std::io::Write;

use colored::Colorize;
use confab_agent::{ChatModelClient, PersistentChatSession};
use confab_config::{ConfabConfig, Credentials};
use confab_core::ConfabError;
use confab_router::{ExpertRouter, RouteOutcome};
use futures::{Stream, StreamExt};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, info};

const PROMPT: &str = "You: ";

/// Words that end an interactive loop.
const EXIT_COMMANDS: [&str; 2] = ["exit", "quit"];

/// What the user typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Exit,
}

pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd))
}

/// Streams the fixed tennis exchange to stdout.
pub async fn run_chat(config: &ConfabConfig, credentials: &Credentials) -> Result<(), ConfabError> {
    let client =
        ChatModelClient::from_config(&config.openai, &credentials.model, &credentials.api_key)?;

    let reply = client.stream_exchange().await?;
    print_stream(reply).await?;
    Ok(())
}

/// Runs the persistent-session REPL.
pub async fn run_session(
    config: &ConfabConfig,
    credentials: &Credentials,
    session_id: String,
    stream: bool,
) -> Result<(), ConfabError> {
    let session = PersistentChatSession::open(
        config,
        &credentials.model,
        &credentials.api_key,
        session_id,
    )
    .await?;

    let stored = session.history().await?.len();
    info!(
        session_id = session.session_id().as_str(),
        stored_messages = stored,
        stream,
        "session opened"
    );

    println!(
        "{} {}",
        "Session".bold().green(),
        session.session_id().as_str().bold()
    );
    println!(
        "Type {} or {} to end the conversation.",
        "exit".yellow(),
        "quit".yellow()
    );

    let mut rl = editor()?;
    while let Input::Line(prompt) = read_input(&mut rl)? {
        if stream {
            let reply = session.respond_stream(&prompt).await?;
            print_stream(reply).await?;
        } else {
            let reply = session.respond(&prompt).await?;
            println!("{reply}");
        }
    }

    session.close().await
}

/// Runs the expert-routing REPL.
pub async fn run_route(config: &ConfabConfig, credentials: &Credentials) -> Result<(), ConfabError> {
    let router =
        ExpertRouter::from_config(&config.openai, &credentials.model, &credentials.api_key)?;

    println!("Welcome to the chat! Type 'exit' or 'quit' to end the conversation.");
    println!("I will be your assistant on javascript, typescript, python and AI.");

    let mut rl = editor()?;
    while let Input::Line(query) = read_input(&mut rl)? {
        let outcome = router.route(&query).await?;
        write_outcome(&outcome, &mut std::io::stdout())?;
    }

    Ok(())
}

/// Prints only the answer; the routing decision goes to the log.
fn write_outcome<W: Write>(outcome: &RouteOutcome, out: &mut W) -> Result<(), ConfabError> {
    debug!(
        knowledge_field = %outcome.field,
        expert = ?outcome.expert,
        "query routed"
    );
    writeln!(out, "{}", outcome.answer)
        .map_err(|e| ConfabError::Internal(format!("failed to write reply: {e}")))
}

fn editor() -> Result<DefaultEditor, ConfabError> {
    DefaultEditor::new()
        .map_err(|e| ConfabError::Internal(format!("failed to initialize readline: {e}")))
}

fn read_input(rl: &mut DefaultEditor) -> Result<Input, ConfabError> {
    match rl.readline(PROMPT) {
        Ok(line) => {
            if is_exit_command(&line) {
                return Ok(Input::Exit);
            }
            let _ = rl.add_history_entry(line.as_str());
            Ok(Input::Line(line))
        }
        // Ctrl+C, Ctrl+D
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(Input::Exit),
        Err(e) => Err(ConfabError::Internal(format!("readline failed: {e}"))),
    }
}

/// Writes fragments as they arrive, then a newline. Returns the full text.
async fn print_stream<S>(stream: S) -> Result<String, ConfabError>
where
    S: Stream<Item = Result<String, ConfabError>>,
{
    let mut stdout = std::io::stdout();
    let written = write_stream(stream, &mut stdout).await;
    println!();
    written
}

async fn write_stream<S, W>(stream: S, out: &mut W) -> Result<String, ConfabError>
where
    S: Stream<Item = Result<String, ConfabError>>,
    W: Write,
{
    let mut stream = std::pin::pin!(stream);
    let mut full = String::new();
    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        out.write_all(fragment.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|e| ConfabError::Internal(format!("failed to write reply: {e}")))?;
        full.push_str(&fragment);
    }
    Ok(full)
}
