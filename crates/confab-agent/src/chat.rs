// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming chat model client.
//!
//! [`ChatModelClient`] binds a provider to a model and a sampling
//! temperature and turns the provider's chunk stream into a stream of text
//! fragments. [`ChatModelClient::stream_exchange`] submits the fixed tennis
//! exchange used by `confab chat`.

use std::pin::Pin;
use std::sync::Arc;

use confab_config::model::OpenAiConfig;
use confab_core::{
    ChatMessage, ConfabError, ProviderAdapter, ProviderRequest, ProviderStream, StreamEventType,
};
use confab_openai::OpenAiProvider;
use futures::{Stream, StreamExt};
use tracing::debug;

/// System prompt of the fixed exchange.
pub const FIXED_SYSTEM_PROMPT: &str = "You are a tennis expert.";

/// Human prompt of the fixed exchange.
pub const FIXED_HUMAN_PROMPT: &str = "Please, can you tell me about the latest tennis news?";

/// Sampling temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// A lazy, finite, single-pass stream of reply fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ConfabError>> + Send>>;

/// A provider bound to one model and temperature.
pub struct ChatModelClient {
    provider: Arc<dyn ProviderAdapter + Send + Sync>,
    model: String,
    temperature: f32,
}

impl std::fmt::Debug for ChatModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl ChatModelClient {
    /// Binds an existing provider.
    ///
    /// Fails with [`ConfabError::Config`] on an empty model or a temperature
    /// outside `[0, 2]`.
    pub fn new(
        provider: Arc<dyn ProviderAdapter + Send + Sync>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self, ConfabError> {
        let model = model.into();
        validate_model(&model)?;
        validate_temperature(temperature)?;
        Ok(Self {
            provider,
            model,
            temperature,
        })
    }

    /// Builds an OpenAI provider from config and binds it.
    ///
    /// The credential is checked by the provider: empty or non-header-safe
    /// keys fail here rather than on the first request.
    pub fn from_config(
        config: &OpenAiConfig,
        model: &str,
        api_key: &str,
    ) -> Result<Self, ConfabError> {
        validate_model(model)?;
        let provider = OpenAiProvider::new(config, api_key)?;
        Self::new(Arc::new(provider), model, config.temperature)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// The system and human messages submitted by [`Self::stream_exchange`].
    pub fn fixed_exchange() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(FIXED_SYSTEM_PROMPT),
            ChatMessage::human(FIXED_HUMAN_PROMPT),
        ]
    }

    /// Streams the reply to the fixed tennis exchange.
    pub async fn stream_exchange(&self) -> Result<TextStream, ConfabError> {
        self.stream_messages(Self::fixed_exchange()).await
    }

    /// Streams the reply to an arbitrary transcript.
    pub async fn stream_messages(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<TextStream, ConfabError> {
        debug!(model = %self.model, messages = messages.len(), "opening chat stream");
        let mut request =
            ProviderRequest::new(&self.model, messages).with_temperature(Some(self.temperature));
        request.stream = true;
        let chunks = self.provider.stream(request).await?;
        Ok(text_fragments(chunks))
    }
}

/// Keeps the non-empty text of content chunks and ends at `MessageStop`.
pub fn text_fragments(chunks: ProviderStream) -> TextStream {
    let fragments = chunks
        .take_while(|chunk| {
            let more = !matches!(
                chunk,
                Ok(c) if c.event_type == StreamEventType::MessageStop
            );
            async move { more }
        })
        .filter_map(|chunk| async move {
            match chunk {
                Ok(c) if c.event_type == StreamEventType::ContentDelta => {
                    c.text.filter(|t| !t.is_empty()).map(Ok)
                }
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            }
        });
    Box::pin(fragments)
}

pub(crate) fn validate_model(model: &str) -> Result<(), ConfabError> {
    if model.trim().is_empty() {
        return Err(ConfabError::Config("model name must not be empty".into()));
    }
    Ok(())
}

pub(crate) fn validate_temperature(temperature: f32) -> Result<(), ConfabError> {
    if !temperature.is_finite() || !(0.0..=2.0).contains(&temperature) {
        return Err(ConfabError::Config(format!(
            "temperature must be between 0 and 2, got {temperature}"
        )));
    }
    Ok(())
}
