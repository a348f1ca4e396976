// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for durable, session-scoped message history.

use async_trait::async_trait;

use crate::error::ConfabError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatMessage, HistoryEntry, SessionId, SessionSummary};

/// Adapter for message history backends.
///
/// History is an append-only, ordered list of role-tagged messages keyed by
/// session identifier. A session exists once its first message is appended.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ConfabError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ConfabError>;

    /// Appends a message to the end of a session's history and returns its row id.
    async fn append_message(
        &self,
        session_id: &SessionId,
        message: &ChatMessage,
    ) -> Result<i64, ConfabError>;

    /// Returns the full history of a session in append order.
    async fn get_messages(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>, ConfabError>;

    /// Returns the number of messages stored for a session.
    async fn count_messages(&self, session_id: &SessionId) -> Result<i64, ConfabError>;

    /// Deletes every message of a session and returns how many were removed.
    async fn clear_session(&self, session_id: &SessionId) -> Result<u64, ConfabError>;

    /// Lists sessions that have stored messages, most recently active first.
    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ConfabError>;
}
