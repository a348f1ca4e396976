// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Confab.

use thiserror::Error;

/// The primary error type used across all Confab adapter traits and operations.
#[derive(Debug, Error)]
pub enum ConfabError {
    /// Configuration errors (missing required settings, invalid model or credential).
    #[error("configuration error: {0}")]
    Config(String),

    /// History store errors (database connection, query failure, migrations).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Completion endpoint errors (transport, HTTP status, SSE, response parsing).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
