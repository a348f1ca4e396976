// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent chat session.
//!
//! Every turn appends the human message, replays the whole stored history to
//! the provider and appends the reply. A streamed reply is appended only once
//! its stream has been drained; a stream that is dropped early or fails part
//! way leaves the human message without a reply.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use confab_config::ConfabConfig;
use confab_core::{
    ChatMessage, ConfabError, ProviderAdapter, ProviderRequest, ProviderStream, SessionId,
    StorageAdapter, StreamEventType,
};
use confab_openai::OpenAiProvider;
use confab_storage::SqliteStorage;
use futures::{Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::chat::{validate_model, validate_temperature};

/// A conversation whose history lives in a [`StorageAdapter`].
pub struct PersistentChatSession {
    provider: Arc<dyn ProviderAdapter + Send + Sync>,
    history: Arc<dyn StorageAdapter + Send + Sync>,
    model: String,
    temperature: Option<f32>,
    session_id: SessionId,
}

impl PersistentChatSession {
    /// Wraps an existing provider and store.
    ///
    /// No temperature is sent until [`Self::with_temperature`] sets one.
    pub fn new(
        provider: Arc<dyn ProviderAdapter + Send + Sync>,
        history: Arc<dyn StorageAdapter + Send + Sync>,
        model: impl Into<String>,
        session_id: impl Into<SessionId>,
    ) -> Result<Self, ConfabError> {
        let model = model.into();
        validate_model(&model)?;
        let session_id = session_id.into();
        if session_id.as_str().is_empty() {
            return Err(ConfabError::Config("session id must not be empty".into()));
        }
        Ok(Self {
            provider,
            history,
            model,
            temperature: None,
            session_id,
        })
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Result<Self, ConfabError> {
        if let Some(t) = temperature {
            validate_temperature(t)?;
        }
        self.temperature = temperature;
        Ok(self)
    }

    /// Opens the configured SQLite store and OpenAI provider.
    ///
    /// The database file and its parent directory are created if missing.
    pub async fn open(
        config: &ConfabConfig,
        model: &str,
        api_key: &str,
        session_id: impl Into<SessionId>,
    ) -> Result<Self, ConfabError> {
        validate_model(model)?;
        let provider = OpenAiProvider::new(&config.openai, api_key)?;
        let storage = SqliteStorage::open(config.storage.clone()).await?;
        Self::new(Arc::new(provider), Arc::new(storage), model, session_id)?
            .with_temperature(Some(config.openai.temperature))
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Stored transcript in append order.
    pub async fn history(&self) -> Result<Vec<ChatMessage>, ConfabError> {
        let entries = self.history.get_messages(&self.session_id).await?;
        Ok(entries.into_iter().map(|e| e.into_message()).collect())
    }

    /// Deletes the stored transcript and returns how many messages went.
    pub async fn clear(&self) -> Result<u64, ConfabError> {
        self.history.clear_session(&self.session_id).await
    }

    /// Flushes the store. The session stays usable afterwards.
    pub async fn close(&self) -> Result<(), ConfabError> {
        self.history.close().await?;
        debug!(session_id = self.session_id.as_str(), "history store flushed");
        Ok(())
    }

    /// Answers `prompt` with the full history as context.
    ///
    /// The human message is stored before the provider is called, so it
    /// survives a provider failure.
    pub async fn respond(&self, prompt: &str) -> Result<String, ConfabError> {
        let request = self.begin_turn(prompt, false).await?;
        let response = self.provider.complete(request).await?;

        self.history
            .append_message(&self.session_id, &ChatMessage::assistant(&response.content))
            .await?;
        info!(
            session_id = self.session_id.as_str(),
            model = %response.model,
            reply_bytes = response.content.len(),
            "turn complete"
        );
        Ok(response.content)
    }

    /// Streaming variant of [`Self::respond`].
    ///
    /// The reply is stored when the returned stream reports its end.
    pub async fn respond_stream(&self, prompt: &str) -> Result<ReplyStream, ConfabError> {
        let request = self.begin_turn(prompt, true).await?;
        let chunks = self.provider.stream(request).await?;
        Ok(ReplyStream::new(
            chunks,
            Arc::clone(&self.history),
            self.session_id.clone(),
        ))
    }

    async fn begin_turn(&self, prompt: &str, stream: bool) -> Result<ProviderRequest, ConfabError> {
        self.history
            .append_message(&self.session_id, &ChatMessage::human(prompt))
            .await?;
        debug!(session_id = self.session_id.as_str(), "persisted human message");

        let messages = self.history().await?;
        debug!(
            session_id = self.session_id.as_str(),
            context_messages = messages.len(),
            stream,
            "sending history to provider"
        );
        let mut request =
            ProviderRequest::new(&self.model, messages).with_temperature(self.temperature);
        request.stream = stream;
        Ok(request)
    }
}

/// Reply fragments of one streamed turn.
///
/// Yields each non-empty text fragment as it arrives. After the provider
/// signals the end, the concatenated reply is appended to the history and the
/// stream ends; a storage failure at that point is yielded as the final item.
pub struct ReplyStream {
    inner: Pin<Box<dyn Stream<Item = Result<String, ConfabError>> + Send>>,
}

struct ReplyState {
    chunks: ProviderStream,
    history: Arc<dyn StorageAdapter + Send + Sync>,
    pending: PendingReply,
    done: bool,
}

/// Accumulated reply text. Warns on drop unless the turn was settled.
struct PendingReply {
    session_id: SessionId,
    text: String,
    settled: bool,
}

impl Drop for PendingReply {
    fn drop(&mut self) {
        if !self.settled {
            warn!(
                session_id = self.session_id.as_str(),
                discarded_bytes = self.text.len(),
                "reply stream dropped before completion; reply not persisted"
            );
        }
    }
}

impl ReplyStream {
    fn new(
        chunks: ProviderStream,
        history: Arc<dyn StorageAdapter + Send + Sync>,
        session_id: SessionId,
    ) -> Self {
        let state = ReplyState {
            chunks,
            history,
            pending: PendingReply {
                session_id,
                text: String::new(),
                settled: false,
            },
            done: false,
        };
        Self {
            inner: Box::pin(futures::stream::unfold(state, next_fragment)),
        }
    }

    /// Drains the stream and returns the full reply.
    pub async fn collect_reply(mut self) -> Result<String, ConfabError> {
        let mut reply = String::new();
        while let Some(fragment) = self.next().await {
            reply.push_str(&fragment?);
        }
        Ok(reply)
    }
}

impl Stream for ReplyStream {
    type Item = Result<String, ConfabError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

async fn next_fragment(
    mut state: ReplyState,
) -> Option<(Result<String, ConfabError>, ReplyState)> {
    if state.done {
        return None;
    }

    loop {
        match state.chunks.next().await {
            Some(Ok(chunk)) => match chunk.event_type {
                StreamEventType::ContentDelta => {
                    if let Some(text) = chunk.text.filter(|t| !t.is_empty()) {
                        state.pending.text.push_str(&text);
                        return Some((Ok(text), state));
                    }
                }
                StreamEventType::MessageDelta => {}
                StreamEventType::MessageStop => break,
            },
            Some(Err(e)) => {
                warn!(
                    session_id = state.pending.session_id.as_str(),
                    discarded_bytes = state.pending.text.len(),
                    error = %e,
                    "reply stream failed; reply not persisted"
                );
                state.pending.settled = true;
                state.done = true;
                return Some((Err(e), state));
            }
            None => break,
        }
    }

    state.done = true;
    let reply = ChatMessage::assistant(state.pending.text.clone());
    let stored = state
        .history
        .append_message(&state.pending.session_id, &reply)
        .await;
    state.pending.settled = true;
    match stored {
        Ok(_) => {
            info!(
                session_id = state.pending.session_id.as_str(),
                reply_bytes = reply.content.len(),
                "streamed turn complete"
            );
            None
        }
        Err(e) => Some((Err(e), state)),
    }
}
