// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for hosted chat-completion endpoints.

use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;

use crate::error::ConfabError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ProviderRequest, ProviderResponse, ProviderStreamChunk};

/// A finite, single-pass stream of completion chunks.
pub type ProviderStream =
    Pin<Box<dyn Stream<Item = Result<ProviderStreamChunk, ConfabError>> + Send>>;

/// Adapter for chat-completion endpoints.
///
/// Supports single-shot completion (optionally constrained by a
/// [`ResponseFormat`](crate::types::ResponseFormat)) and streaming responses.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ConfabError>;

    /// Sends a completion request and returns a stream of response chunks.
    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, ConfabError>;
}
