// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Chat Completions provider adapter for Confab.
//!
//! This crate implements [`ProviderAdapter`] for any endpoint speaking the
//! OpenAI Chat Completions protocol, providing single-shot completion
//! (optionally constrained to a JSON schema) and streaming SSE responses.

pub mod client;
pub mod sse;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use confab_config::model::OpenAiConfig;
use confab_core::error::ConfabError;
use confab_core::traits::{PluginAdapter, ProviderAdapter, ProviderStream};
use confab_core::types::{
    AdapterType, ChatMessage, HealthStatus, ProviderRequest, ProviderResponse,
    ProviderStreamChunk, ResponseFormat, Role, StreamEventType, TokenUsage,
};
use futures::stream::StreamExt;
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::sse::StreamEvent;
use crate::types::{
    ApiMessage, ApiResponseFormat, ApiUsage, ChatCompletionChunk, ChatCompletionRequest,
    JsonSchemaSpec, StreamOptions,
};

/// Chat Completions provider implementing [`ProviderAdapter`].
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider from the `[openai]` config section and a resolved key.
    ///
    /// The model is not fixed here; every [`ProviderRequest`] names its own.
    pub fn new(config: &OpenAiConfig, api_key: &str) -> Result<Self, ConfabError> {
        let client = OpenAiClient::new(
            api_key,
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )?;

        info!(
            endpoint = client.endpoint(),
            max_retries = config.max_retries,
            "OpenAI provider initialized"
        );

        Ok(Self { client })
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }
}

/// Converts a [`ProviderRequest`] to a wire [`ChatCompletionRequest`].
fn to_chat_request(request: &ProviderRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.model.clone(),
        messages: request.messages.iter().map(to_api_message).collect(),
        temperature: request.temperature,
        response_format: request.response_format.as_ref().map(|format| match format {
            ResponseFormat::JsonSchema { name, schema } => ApiResponseFormat::JsonSchema {
                json_schema: JsonSchemaSpec {
                    name: name.clone(),
                    schema: schema.clone(),
                    strict: true,
                },
            },
        }),
        stream: request.stream,
        stream_options: request.stream.then_some(StreamOptions {
            include_usage: true,
        }),
    }
}

fn to_api_message(message: &ChatMessage) -> ApiMessage {
    let role = match message.role {
        Role::System => "system",
        Role::Human => "user",
        Role::Assistant => "assistant",
    };
    ApiMessage {
        role: role.to_string(),
        content: message.content.clone(),
    }
}

fn to_usage(usage: ApiUsage) -> TokenUsage {
    TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConfabError> {
        // No health request is sent; a completion call would spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ConfabError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ConfabError> {
        let api_request = to_chat_request(&request);
        let response = self.client.complete(&api_request).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ConfabError::Provider {
                message: "API response contained no choices".into(),
                source: None,
            })?;

        let content = match (choice.message.content, choice.message.refusal) {
            (Some(content), _) => content,
            (None, Some(refusal)) => {
                return Err(ConfabError::Provider {
                    message: format!("model refused the request: {refusal}"),
                    source: None,
                });
            }
            (None, None) => String::new(),
        };

        Ok(ProviderResponse {
            id: response.id,
            content,
            model: response.model,
            finish_reason: choice.finish_reason,
            usage: response.usage.map(to_usage),
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ProviderStream, ConfabError> {
        let mut api_request = to_chat_request(&request);
        api_request.stream = true;
        api_request.stream_options = Some(StreamOptions {
            include_usage: true,
        });
        let event_stream = self.client.stream_completion(&api_request).await?;

        let mut finish_reason: Option<String> = None;
        let chunk_stream = event_stream.filter_map(move |result| {
            let chunk = match result {
                Ok(event) => map_stream_event(event, &mut finish_reason),
                Err(e) => Some(Err(e)),
            };
            async move { chunk }
        });

        Ok(Box::pin(chunk_stream))
    }
}

/// Maps a [`StreamEvent`] to at most one [`ProviderStreamChunk`].
///
/// Role-only and empty deltas produce nothing. The finish reason seen on an
/// earlier chunk is repeated on the final `MessageStop`.
fn map_stream_event(
    event: StreamEvent,
    finish_reason: &mut Option<String>,
) -> Option<Result<ProviderStreamChunk, ConfabError>> {
    match event {
        StreamEvent::Chunk(chunk) => map_chunk(chunk, finish_reason),
        StreamEvent::Done => Some(Ok(ProviderStreamChunk {
            event_type: StreamEventType::MessageStop,
            text: None,
            finish_reason: finish_reason.clone(),
            usage: None,
        })),
    }
}

fn map_chunk(
    chunk: ChatCompletionChunk,
    finish_reason: &mut Option<String>,
) -> Option<Result<ProviderStreamChunk, ConfabError>> {
    let usage = chunk.usage.map(to_usage);
    let choice = chunk.choices.into_iter().next();

    let (text, reason, refusal) = match choice {
        Some(c) => (c.delta.content, c.finish_reason, c.delta.refusal),
        None => (None, None, None),
    };

    if let Some(refusal) = refusal.filter(|r| !r.is_empty()) {
        return Some(Err(ConfabError::Provider {
            message: format!("model refused the request: {refusal}"),
            source: None,
        }));
    }
    if reason.is_some() {
        finish_reason.clone_from(&reason);
    }

    match text.filter(|t| !t.is_empty()) {
        Some(text) => Some(Ok(ProviderStreamChunk {
            event_type: StreamEventType::ContentDelta,
            text: Some(text),
            finish_reason: reason,
            usage,
        })),
        None if reason.is_some() || usage.is_some() => Some(Ok(ProviderStreamChunk {
            event_type: StreamEventType::MessageDelta,
            text: None,
            finish_reason: reason,
            usage,
        })),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChunkChoice, ChunkDelta};
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        let config = OpenAiConfig {
            base_url: server.uri(),
            ..Default::default()
        };
        OpenAiProvider::new(&config, "sk-test").unwrap()
    }

    fn content_chunk(text: Option<&str>, finish: Option<&str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: "c".into(),
            model: "m".into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: text.map(String::from),
                    refusal: None,
                },
                finish_reason: finish.map(String::from),
            }],
            usage: None,
        }
    }

    #[test]
    fn human_role_is_sent_as_user() {
        let request = ProviderRequest::new(
            "gpt-4o-mini",
            vec![
                ChatMessage::system("You are a tennis expert."),
                ChatMessage::human("news?"),
                ChatMessage::assistant("none"),
            ],
        );
        let api = to_chat_request(&request);
        let roles: Vec<&str> = api.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant"]);
        assert_eq!(api.messages[0].content, "You are a tennis expert.");
    }

    #[test]
    fn request_carries_temperature_and_schema() {
        let request = ProviderRequest::new("m", vec![ChatMessage::human("q")])
            .with_temperature(Some(0.7))
            .with_response_format(ResponseFormat::JsonSchema {
                name: "Route".into(),
                schema: serde_json::json!({"type": "object"}),
            });
        let api = to_chat_request(&request);
        assert_eq!(api.temperature, Some(0.7));
        let value = serde_json::to_value(&api).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["strict"], true);
        assert!(value.get("stream_options").is_none());
    }

    #[test]
    fn streaming_request_asks_for_usage() {
        let mut request = ProviderRequest::new("m", vec![ChatMessage::human("q")]);
        request.stream = true;
        let api = to_chat_request(&request);
        assert!(api.stream_options.unwrap().include_usage);
    }

    #[test]
    fn text_delta_maps_to_content_chunk() {
        let mut reason = None;
        let chunk = map_stream_event(StreamEvent::Chunk(content_chunk(Some("Hel"), None)), &mut reason)
            .unwrap()
            .unwrap();
        assert_eq!(chunk.event_type, StreamEventType::ContentDelta);
        assert_eq!(chunk.text.as_deref(), Some("Hel"));
    }

    #[test]
    fn role_only_delta_is_skipped() {
        let mut reason = None;
        assert!(map_stream_event(StreamEvent::Chunk(content_chunk(Some(""), None)), &mut reason).is_none());
        assert!(map_stream_event(StreamEvent::Chunk(content_chunk(None, None)), &mut reason).is_none());
    }

    #[test]
    fn finish_reason_carries_to_message_stop() {
        let mut reason = None;
        let delta = map_stream_event(StreamEvent::Chunk(content_chunk(None, Some("stop"))), &mut reason)
            .unwrap()
            .unwrap();
        assert_eq!(delta.event_type, StreamEventType::MessageDelta);

        let stop = map_stream_event(StreamEvent::Done, &mut reason).unwrap().unwrap();
        assert_eq!(stop.event_type, StreamEventType::MessageStop);
        assert_eq!(stop.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn refusal_delta_is_an_error() {
        let mut reason = None;
        let mut chunk = content_chunk(None, None);
        chunk.choices[0].delta.refusal = Some("no".into());
        let result = map_stream_event(StreamEvent::Chunk(chunk), &mut reason).unwrap();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-1",
                "model": "gpt-4o-mini",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hello!"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let response = provider
            .complete(ProviderRequest::new("gpt-4o-mini", vec![ChatMessage::human("hi")]))
            .await
            .unwrap();
        assert_eq!(response.content, "Hello!");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(
            response.usage,
            Some(TokenUsage {
                prompt_tokens: 3,
                completion_tokens: 2
            })
        );
    }

    #[tokio::test]
    async fn complete_with_refusal_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-r",
                "model": "m",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": null, "refusal": "I can't"}, "finish_reason": "stop"}]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .complete(ProviderRequest::new("m", vec![ChatMessage::human("q")]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("refused"), "got: {err}");
    }

    #[tokio::test]
    async fn complete_without_choices_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-e", "model": "m", "choices": []
            })))
            .mount(&server)
            .await;

        let result = provider_for(&server)
            .complete(ProviderRequest::new("m", vec![ChatMessage::human("q")]))
            .await;
        assert!(matches!(result, Err(ConfabError::Provider { .. })));
    }

    #[tokio::test]
    async fn stream_yields_fragments_in_order() {
        let sse = concat!(
            "data: {\"id\":\"c\",\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
            "data: {\"id\":\"c\",\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Federer \"}}]}\n\n",
            "data: {\"id\":\"c\",\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"retired.\"}}]}\n\n",
            "data: {\"id\":\"c\",\"model\":\"m\",\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"stop\"}]}\n\n",
            "data: [DONE]\n\n",
        );
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let mut request = ProviderRequest::new("m", vec![ChatMessage::human("q")]);
        request.stream = true;
        let chunks: Vec<ProviderStreamChunk> = provider
            .stream(request)
            .await
            .unwrap()
            .map(|c| c.unwrap())
            .collect()
            .await;

        let text: String = chunks.iter().filter_map(|c| c.text.as_deref()).collect();
        assert_eq!(text, "Federer retired.");
        let last = chunks.last().unwrap();
        assert_eq!(last.event_type, StreamEventType::MessageStop);
        assert_eq!(last.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let client = OpenAiClient::new(
            "sk-test",
            "http://localhost",
            Duration::from_secs(1),
            0,
        )
        .unwrap();
        let provider = OpenAiProvider::with_client(client);
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.adapter_type(), AdapterType::Provider);
        assert_eq!(provider.version(), semver::Version::new(0, 1, 0));
    }
}
