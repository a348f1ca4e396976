// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded database migrations using refinery.
//!
//! SQL files under `migrations/` are compiled into the binary via
//! `embed_migrations!` and applied on every [`Database::open`](crate::Database::open).

use confab_core::ConfabError;
use tracing::debug;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Run all pending migrations against the given connection.
///
/// Refinery tracks applied versions in `refinery_schema_history`, so this is
/// a no-op on an up-to-date database.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), ConfabError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(|e| ConfabError::Storage {
            source: e.to_string().into(),
        })?;
    debug!(
        applied = report.applied_migrations().len(),
        "migrations complete"
    );
    Ok(())
}
