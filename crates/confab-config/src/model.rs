// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Confab configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfabConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Chat-completion endpoint settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Message history store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Persistent chat session settings.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Chat-completion endpoint configuration.
///
/// `api_key` and `model` are required at runtime but may come from the
/// `OPENAI_API_KEY` / `OPENAI_MODEL_NAME` environment variables instead of
/// the config file; see [`crate::credentials`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API credential. `None` requires the environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier. `None` requires the environment variable.
    #[serde(default)]
    pub model: Option<String>,

    /// Sampling temperature used by the chat model client.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Base URL of the API, without the `/chat/completions` suffix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for transient HTTP errors. Zero disables retrying.
    #[serde(default)]
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: None,
            temperature: default_temperature(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
        }
    }
}

fn default_temperature() -> f32 {
    0.7
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

/// Message history store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file. Relative paths resolve against the
    /// working directory.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "cache/chat_history.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Persistent chat session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Session identifier used by the CLI when `--session-id` is not given.
    #[serde(default = "default_session_id")]
    pub default_id: String,

    /// Stream replies token by token in the interactive session.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_id: default_session_id(),
            stream: default_stream(),
        }
    }
}

fn default_session_id() -> String {
    "user_session".to_string()
}

fn default_stream() -> bool {
    true
}
