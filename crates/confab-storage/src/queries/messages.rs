// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append and read operations on `message_store`.

use std::str::FromStr;

use confab_core::{ConfabError, HistoryEntry, Role};
use rusqlite::params;

use crate::database::Database;

/// Append one message to the end of a session and return its row id.
pub async fn append_message(
    db: &Database,
    session_id: &str,
    role: Role,
    content: &str,
) -> Result<i64, ConfabError> {
    let session_id = session_id.to_string();
    let content = content.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<i64> {
            conn.execute(
                "INSERT INTO message_store (session_id, role, content) VALUES (?1, ?2, ?3)",
                params![session_id, role.to_string(), content],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All messages of a session in append order.
pub async fn get_session_messages(
    db: &Database,
    session_id: &str,
) -> Result<Vec<HistoryEntry>, ConfabError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<Vec<HistoryEntry>> {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, role, content, created_at
                 FROM message_store WHERE session_id = ?1
                 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map(params![session_id], |row| {
                let role: String = row.get(2)?;
                let role = Role::from_str(&role).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(HistoryEntry {
                    id: row.get(0)?,
                    session_id: row.get(1)?,
                    role,
                    content: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of messages stored for a session.
pub async fn count_session_messages(db: &Database, session_id: &str) -> Result<i64, ConfabError> {
    let session_id = session_id.to_string();
    db.connection()
        .call(move |conn| -> rusqlite::Result<i64> {
            conn.query_row(
                "SELECT COUNT(*) FROM message_store WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db"), true).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn append_and_read_back_in_order() {
        let (db, _dir) = setup_db().await;

        let first = append_message(&db, "s1", Role::System, "You are a tennis expert.")
            .await
            .unwrap();
        let second = append_message(&db, "s1", Role::Human, "news?").await.unwrap();
        let third = append_message(&db, "s1", Role::Assistant, "none today").await.unwrap();
        assert!(first < second && second < third);

        let entries = get_session_messages(&db, "s1").await.unwrap();
        let roles: Vec<Role> = entries.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::System, Role::Human, Role::Assistant]);
        assert_eq!(entries[1].content, "news?");
        assert!(entries.iter().all(|e| e.session_id == "s1"));
        assert!(entries[0].created_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let (db, _dir) = setup_db().await;
        append_message(&db, "alice", Role::Human, "hi").await.unwrap();
        append_message(&db, "bob", Role::Human, "yo").await.unwrap();
        append_message(&db, "alice", Role::Assistant, "hello").await.unwrap();

        let alice = get_session_messages(&db, "alice").await.unwrap();
        assert_eq!(alice.len(), 2);
        assert_eq!(count_session_messages(&db, "bob").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_empty() {
        let (db, _dir) = setup_db().await;
        assert!(get_session_messages(&db, "nobody").await.unwrap().is_empty());
        assert_eq!(count_session_messages(&db, "nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_content_is_stored_verbatim() {
        let (db, _dir) = setup_db().await;
        append_message(&db, "s", Role::Human, "").await.unwrap();
        let entries = get_session_messages(&db, "s").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "");
    }

    #[tokio::test]
    async fn concurrent_appends_keep_every_message() {
        let dir = tempdir().unwrap();
        let db = std::sync::Arc::new(
            Database::open(dir.path().join("concurrent.db"), true).await.unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                append_message(&db, "shared", Role::Human, &format!("msg-{i}"))
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(count_session_messages(&db, "shared").await.unwrap(), 10);
    }
}
