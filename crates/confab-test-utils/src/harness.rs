// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness pairing a [`MockProvider`] with a temp-file SQLite store.

use std::path::PathBuf;
use std::sync::Arc;

use confab_config::model::StorageConfig;
use confab_core::{ConfabError, SessionId, StorageAdapter};
use confab_storage::SqliteStorage;

use crate::mock_provider::MockProvider;

/// Builder for creating test environments.
#[derive(Default)]
pub struct TestHarnessBuilder {
    responses: Vec<String>,
}

impl TestHarnessBuilder {
    /// Queue replies on the mock provider.
    pub fn with_mock_responses<S: Into<String>>(
        mut self,
        responses: impl IntoIterator<Item = S>,
    ) -> Self {
        self.responses = responses.into_iter().map(Into::into).collect();
        self
    }

    /// Create the temp directory, open the store and build the provider.
    pub async fn build(self) -> Result<TestHarness, ConfabError> {
        let temp_dir = tempfile::TempDir::new().map_err(|e| ConfabError::Storage {
            source: Box::new(e),
        })?;
        let db_path = temp_dir.path().join("cache").join("chat_history.db");

        let storage = SqliteStorage::open(StorageConfig {
            database_path: db_path.display().to_string(),
            wal_mode: true,
        })
        .await?;

        Ok(TestHarness {
            provider: Arc::new(MockProvider::with_responses(self.responses)),
            storage: Arc::new(storage),
            db_path,
            _temp_dir: temp_dir,
        })
    }
}

/// Mock provider plus a real, initialized store in a temp directory.
pub struct TestHarness {
    pub provider: Arc<MockProvider>,
    pub storage: Arc<SqliteStorage>,
    /// Location of the database file, for reopen tests.
    pub db_path: PathBuf,
    /// Deleted on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Shorthand for `builder().build()`.
    pub async fn new() -> Result<TestHarness, ConfabError> {
        Self::builder().build().await
    }

    /// Stored `(role, content)` pairs of a session, in order.
    pub async fn transcript(&self, session_id: &str) -> Result<Vec<(String, String)>, ConfabError> {
        let entries = self
            .storage
            .get_messages(&SessionId::from(session_id))
            .await?;
        Ok(entries
            .into_iter()
            .map(|e| (e.role.to_string(), e.content))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::{ChatMessage, ProviderAdapter, ProviderRequest};

    #[tokio::test]
    async fn harness_creates_database_file() {
        let harness = TestHarness::new().await.unwrap();
        assert!(harness.db_path.exists());
        assert!(harness.transcript("empty").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn harness_wires_mock_responses() {
        let harness = TestHarness::builder()
            .with_mock_responses(["scripted"])
            .build()
            .await
            .unwrap();
        let resp = harness
            .provider
            .complete(ProviderRequest::new("m", vec![ChatMessage::human("q")]))
            .await
            .unwrap();
        assert_eq!(resp.content, "scripted");
    }

    #[tokio::test]
    async fn transcript_reports_roles_as_stored() {
        let harness = TestHarness::new().await.unwrap();
        let sid = SessionId::from("t");
        harness
            .storage
            .append_message(&sid, &ChatMessage::human("hello"))
            .await
            .unwrap();
        assert_eq!(
            harness.transcript("t").await.unwrap(),
            vec![("human".to_string(), "hello".to_string())]
        );
    }
}
