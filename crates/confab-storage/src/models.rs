// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the history store.
//!
//! The canonical types live in `confab-core` so they can cross the
//! [`StorageAdapter`](confab_core::StorageAdapter) boundary; they are
//! re-exported here for callers that only depend on this crate.

pub use confab_core::types::{HistoryEntry, Role, SessionSummary};
