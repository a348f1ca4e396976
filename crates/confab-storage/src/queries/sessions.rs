// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-level operations. A session is just the set of rows sharing a
//! `session_id`; there is no separate sessions table.

use confab_core::{ConfabError, SessionSummary};
use rusqlite::params;

use crate::database::Database;

/// Delete every message of a session and return how many rows were removed.
pub async fn clear_session(db: &Database, session_id: &str) -> Result<u64, ConfabError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<u64> {
            let removed = conn.execute(
                "DELETE FROM message_store WHERE session_id = ?1",
                params![session_id],
            )?;
            Ok(removed as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Sessions with at least one message, most recently appended-to first.
pub async fn list_sessions(db: &Database) -> Result<Vec<SessionSummary>, ConfabError> {
    db.connection()
        .call(|conn| -> rusqlite::Result<Vec<SessionSummary>> {
            let mut stmt = conn.prepare(
                "SELECT session_id, COUNT(*), MAX(created_at)
                 FROM message_store
                 GROUP BY session_id
                 ORDER BY MAX(id) DESC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(SessionSummary {
                    session_id: row.get(0)?,
                    message_count: row.get(1)?,
                    last_activity: row.get(2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::messages::{append_message, count_session_messages};
    use confab_core::Role;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db"), true).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn clear_removes_only_target_session() {
        let (db, _dir) = setup_db().await;
        append_message(&db, "a", Role::Human, "1").await.unwrap();
        append_message(&db, "a", Role::Assistant, "2").await.unwrap();
        append_message(&db, "b", Role::Human, "3").await.unwrap();

        assert_eq!(clear_session(&db, "a").await.unwrap(), 2);
        assert_eq!(count_session_messages(&db, "a").await.unwrap(), 0);
        assert_eq!(count_session_messages(&db, "b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_unknown_session_removes_nothing() {
        let (db, _dir) = setup_db().await;
        assert_eq!(clear_session(&db, "ghost").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_orders_by_latest_append() {
        let (db, _dir) = setup_db().await;
        append_message(&db, "older", Role::Human, "x").await.unwrap();
        append_message(&db, "newer", Role::Human, "y").await.unwrap();
        append_message(&db, "newer", Role::Assistant, "z").await.unwrap();

        let sessions = list_sessions(&db).await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "newer");
        assert_eq!(sessions[0].message_count, 2);
        assert_eq!(sessions[1].session_id, "older");
        assert!(!sessions[1].last_activity.is_empty());
    }

    #[tokio::test]
    async fn list_is_empty_for_fresh_database() {
        let (db, _dir) = setup_db().await;
        assert!(list_sessions(&db).await.unwrap().is_empty());
    }
}
