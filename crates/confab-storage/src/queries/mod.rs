// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query modules over the `message_store` table.

pub mod messages;
pub mod sessions;
