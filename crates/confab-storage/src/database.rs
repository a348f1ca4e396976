// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All access is serialized through tokio-rusqlite's single background
//! thread. The [`Database`] handle is the only writer; do not open additional
//! connections to the same file for writes.

use std::path::{Path, PathBuf};

use confab_core::ConfabError;
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Handle to an open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    path: PathBuf,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and applies migrations.
    ///
    /// Missing parent directories are created. With `wal_mode`, the journal
    /// is switched to write-ahead logging.
    pub async fn open(path: impl AsRef<Path>, wal_mode: bool) -> Result<Self, ConfabError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConfabError::Storage {
                    source: Box::new(e),
                })?;
        }

        let conn = tokio_rusqlite::Connection::open(&path)
            .await
            .map_err(|e| ConfabError::Storage {
                source: format!("failed to open {}: {e}", path.display()).into(),
            })?;

        conn.call(move |conn| -> Result<(), ConfabError> {
            apply_pragmas(conn, wal_mode).map_err(|e| ConfabError::Storage {
                source: Box::new(e),
            })?;
            run_migrations(conn)
        })
        .await
        .map_err(|e| ConfabError::Storage {
            source: e.to_string().into(),
        })?;

        info!(path = %path.display(), wal_mode, "database opened");
        Ok(Self { conn, path })
    }

    /// The underlying async connection. Query modules call through this.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), ConfabError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!(path = %self.path.display(), "WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoints and closes the connection.
    pub async fn close(self) -> Result<(), ConfabError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(|e| ConfabError::Storage {
            source: e.to_string().into(),
        })?;
        debug!(path = %self.path.display(), "database closed");
        Ok(())
    }
}

fn apply_pragmas(conn: &rusqlite::Connection, wal_mode: bool) -> Result<(), rusqlite::Error> {
    if wal_mode {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    }
    conn.execute_batch(
        "PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
}

/// Maps a tokio-rusqlite call error into [`ConfabError::Storage`].
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ConfabError {
    ConfabError::Storage {
        source: e.to_string().into(),
    }
}
