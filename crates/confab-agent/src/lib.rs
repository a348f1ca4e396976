// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation layer of Confab.
//!
//! - [`ChatModelClient`] streams a reply to a fixed or caller-supplied
//!   transcript without keeping any state.
//! - [`PersistentChatSession`] stores every turn in a [`StorageAdapter`] and
//!   replays the whole history to the provider on each turn.
//!
//! [`StorageAdapter`]: confab_core::StorageAdapter

pub mod chat;
pub mod session;

pub use chat::{
    ChatModelClient, TextStream, DEFAULT_TEMPERATURE, FIXED_HUMAN_PROMPT, FIXED_SYSTEM_PROMPT,
};
pub use session::{PersistentChatSession, ReplyStream};
