// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock completion provider for deterministic testing.
//!
//! `MockProvider` implements `ProviderAdapter` with pre-configured replies
//! and records every request it receives, so tests can assert on what was
//! sent as well as on what came back.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use confab_core::traits::{PluginAdapter, ProviderAdapter, ProviderStream};
use confab_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, ProviderStreamChunk,
    StreamEventType, TokenUsage,
};
use confab_core::ConfabError;

/// Reply text used once the queue is exhausted.
pub const DEFAULT_REPLY: &str = "mock response";

const MOCK_USAGE: TokenUsage = TokenUsage {
    prompt_tokens: 10,
    completion_tokens: 20,
};

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    /// The call itself fails.
    Fail(String),
    /// Streams `partial` and then yields an error. `complete` just fails.
    BrokenStream { partial: String, error: String },
}

/// A mock provider that returns pre-configured replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty,
/// [`DEFAULT_REPLY`] is returned.
pub struct MockProvider {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with an empty reply queue.
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock provider pre-loaded with the given replies.
    pub fn with_responses<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        let queue = responses
            .into_iter()
            .map(|r| MockReply::Text(r.into()))
            .collect();
        Self {
            replies: Arc::new(Mutex::new(queue)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a reply to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.push(MockReply::Text(text.into())).await;
    }

    /// Queue a call that fails with a provider error.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.push(MockReply::Fail(message.into())).await;
    }

    /// Queue a stream that yields `partial` and then errors.
    pub async fn add_broken_stream(&self, partial: impl Into<String>, error: impl Into<String>) {
        self.push(MockReply::BrokenStream {
            partial: partial.into(),
            error: error.into(),
        })
        .await;
    }

    /// Every request received so far, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of `complete` plus `stream` calls received.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// The most recent request, if any.
    pub async fn last_request(&self) -> Option<ProviderRequest> {
        self.requests.lock().await.last().cloned()
    }

    async fn push(&self, reply: MockReply) {
        self.replies.lock().await.push_back(reply);
    }

    async fn next_reply(&self, request: ProviderRequest) -> MockReply {
        self.requests.lock().await.push(request);
        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| MockReply::Text(DEFAULT_REPLY.to_string()))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn provider_error(message: String) -> ConfabError {
    ConfabError::Provider {
        message,
        source: None,
    }
}

/// Splits on spaces, keeping the separator, so fragments concatenate back
/// to the original text.
pub fn fragments(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(String::from).collect()
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ConfabError> {
        let model = request.model.clone();
        match self.next_reply(request).await {
            MockReply::Text(content) => Ok(ProviderResponse {
                id: format!("mock-{}", self.call_count().await),
                content,
                model,
                finish_reason: Some("stop".to_string()),
                usage: Some(MOCK_USAGE),
            }),
            MockReply::Fail(message) | MockReply::BrokenStream { error: message, .. } => {
                Err(provider_error(message))
            }
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, ConfabError> {
        let (text, tail) = match self.next_reply(request).await {
            MockReply::Text(text) => (text, None),
            MockReply::Fail(message) => return Err(provider_error(message)),
            MockReply::BrokenStream { partial, error } => (partial, Some(error)),
        };

        let mut chunks: Vec<Result<ProviderStreamChunk, ConfabError>> = fragments(&text)
            .into_iter()
            .map(|f| Ok(ProviderStreamChunk::text(f)))
            .collect();

        match tail {
            Some(error) => chunks.push(Err(provider_error(error))),
            None => {
                chunks.push(Ok(ProviderStreamChunk {
                    event_type: StreamEventType::MessageDelta,
                    text: None,
                    finish_reason: Some("stop".to_string()),
                    usage: Some(MOCK_USAGE),
                }));
                chunks.push(Ok(ProviderStreamChunk::stop()));
            }
        }

        Ok(Box::pin(stream::iter(chunks)))
    }
}
