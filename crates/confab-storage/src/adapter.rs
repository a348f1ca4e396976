// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use confab_config::model::StorageConfig;
use confab_core::{
    AdapterType, ChatMessage, ConfabError, HealthStatus, HistoryEntry, PluginAdapter, SessionId,
    SessionSummary, StorageAdapter,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed message history.
///
/// The database is opened on the first call to
/// [`StorageAdapter::initialize`]; every other operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Create and initialize in one step.
    pub async fn open(config: StorageConfig) -> Result<Self, ConfabError> {
        let storage = Self::new(config);
        storage.initialize().await?;
        Ok(storage)
    }

    fn db(&self) -> Result<&Database, ConfabError> {
        self.db.get().ok_or_else(|| ConfabError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ConfabError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| ConfabError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ConfabError> {
        self.db()?.checkpoint().await
    }

    async fn append_message(
        &self,
        session_id: &SessionId,
        message: &ChatMessage,
    ) -> Result<i64, ConfabError> {
        queries::messages::append_message(
            self.db()?,
            session_id.as_str(),
            message.role,
            &message.content,
        )
        .await
    }

    async fn get_messages(&self, session_id: &SessionId) -> Result<Vec<HistoryEntry>, ConfabError> {
        queries::messages::get_session_messages(self.db()?, session_id.as_str()).await
    }

    async fn count_messages(&self, session_id: &SessionId) -> Result<i64, ConfabError> {
        queries::messages::count_session_messages(self.db()?, session_id.as_str()).await
    }

    async fn clear_session(&self, session_id: &SessionId) -> Result<u64, ConfabError> {
        let removed = queries::sessions::clear_session(self.db()?, session_id.as_str()).await?;
        debug!(session_id = %session_id, removed, "session cleared");
        Ok(removed)
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ConfabError> {
        queries::sessions::list_sessions(self.db()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_core::Role;
    use tempfile::tempdir;

    fn make_config(path: &std::path::Path) -> StorageConfig {
        StorageConfig {
            database_path: path.display().to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_storage_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("test.db")));

        assert_eq!(storage.name(), "sqlite");
        assert_eq!(storage.version(), semver::Version::new(0, 1, 0));
        assert_eq!(storage.adapter_type(), AdapterType::Storage);
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("double.db")));

        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn operations_fail_before_initialize() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(make_config(&dir.path().join("no_init.db")));

        assert!(storage.health_check().await.is_err());
        assert!(storage.get_messages(&"s".into()).await.is_err());
        // Nothing to flush yet.
        assert!(storage.shutdown().await.is_ok());
    }

    #[tokio::test]
    async fn history_lifecycle_through_adapter() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::open(make_config(&dir.path().join("life.db")))
            .await
            .unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);

        let sid = SessionId::from("user_session");
        storage
            .append_message(&sid, &ChatMessage::human("Who won Wimbledon?"))
            .await
            .unwrap();
        storage
            .append_message(&sid, &ChatMessage::assistant("Alcaraz."))
            .await
            .unwrap();

        let history = storage.get_messages(&sid).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::Human);
        assert_eq!(history[1].clone().into_message(), ChatMessage::assistant("Alcaraz."));
        assert_eq!(storage.count_messages(&sid).await.unwrap(), 2);

        let sessions = storage.list_sessions().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "user_session");

        assert_eq!(storage.clear_session(&sid).await.unwrap(), 2);
        assert!(storage.get_messages(&sid).await.unwrap().is_empty());

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn history_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("persist.db");
        let sid = SessionId::from("persist");

        {
            let storage = SqliteStorage::open(make_config(&path)).await.unwrap();
            storage
                .append_message(&sid, &ChatMessage::human("remember me"))
                .await
                .unwrap();
            storage.shutdown().await.unwrap();
        }

        let reopened = SqliteStorage::open(make_config(&path)).await.unwrap();
        let history = reopened.get_messages(&sid).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].content, "remember me");
    }
}
