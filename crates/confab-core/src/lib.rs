// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Confab.
//!
//! This crate provides the trait definitions, error type, and common types
//! shared by the provider, storage, chat, and router crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ConfabError;
pub use types::{
    AdapterType, ChatMessage, HealthStatus, HistoryEntry, ProviderRequest, ProviderResponse,
    ProviderStreamChunk, ResponseFormat, Role, SessionId, SessionSummary, StreamEventType,
    TokenUsage,
};

pub use traits::{PluginAdapter, ProviderAdapter, ProviderStream, StorageAdapter};
