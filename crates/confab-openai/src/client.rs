// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI Chat Completions API.
//!
//! Provides [`OpenAiClient`] which handles bearer authentication, request
//! dispatch, streaming SSE responses, and optional transient-error retry.

use std::pin::Pin;
use std::time::Duration;

use confab_core::ConfabError;
use futures::Stream;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::sse::{self, StreamEvent};
use crate::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};

/// Path appended to the configured base URL.
const COMPLETIONS_PATH: &str = "/chat/completions";

/// Delay between retry attempts.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// HTTP client for Chat Completions calls.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    /// Creates a client for `base_url` (e.g. `https://api.openai.com/v1`).
    ///
    /// Fails with [`ConfabError::Config`] if the key is empty or cannot be
    /// carried in an HTTP header.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ConfabError> {
        if api_key.trim().is_empty() {
            return Err(ConfabError::Config("OpenAI API key must not be empty".into()));
        }

        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
            ConfabError::Config(format!("invalid API key header value: {e}"))
        })?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ConfabError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}{COMPLETIONS_PATH}", base_url.trim_end_matches('/')),
            max_retries,
            retry_delay: RETRY_DELAY,
        })
    }

    /// Full URL requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Shortens the retry delay (for testing with wiremock).
    #[cfg(test)]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Sends a streaming request and returns a stream of SSE events.
    pub async fn stream_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<StreamEvent, ConfabError>> + Send>>, ConfabError>
    {
        let mut req = request.clone();
        req.stream = true;
        let response = self.send(&req).await?;
        Ok(sse::parse_sse_stream(response))
    }

    /// Sends a non-streaming request and returns the parsed body.
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ConfabError> {
        let mut req = request.clone();
        req.stream = false;
        req.stream_options = None;
        let response = self.send(&req).await?;

        let body = response.text().await.map_err(|e| ConfabError::Provider {
            message: format!("failed to read response body: {e}"),
            source: Some(Box::new(e)),
        })?;
        serde_json::from_str(&body).map_err(|e| ConfabError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Posts `req`, retrying transient statuses up to `max_retries` times.
    ///
    /// Returns the response only for 2xx statuses.
    async fn send(&self, req: &ChatCompletionRequest) -> Result<reqwest::Response, ConfabError> {
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                warn!(attempt, "retrying request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(req)
                .send()
                .await
                .map_err(|e| ConfabError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, stream = req.stream, "response received");

            if status.is_success() {
                return Ok(response);
            }

            let body = response.text().await.unwrap_or_default();
            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, body = %body, "transient error, will retry");
                attempt += 1;
                continue;
            }

            return Err(ConfabError::Provider {
                message: describe_error(status, &body),
                source: None,
            });
        }
    }
}

/// Returns true for HTTP status codes worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Uses the API error envelope when the body carries one.
fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "OpenAI API error {status} ({}): {}",
            api_err.error.kind(),
            api_err.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use futures::StreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, max_retries: u32) -> OpenAiClient {
        OpenAiClient::new("sk-test", base_url, Duration::from_secs(5), max_retries)
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    fn test_request() -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "Hello".into(),
            }],
            temperature: Some(0.7),
            response_format: None,
            stream: false,
            stream_options: None,
        }
    }

    fn success_body(id: &str, text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        })
    }

    #[test]
    fn empty_api_key_is_config_error() {
        let err = OpenAiClient::new("", "http://localhost", Duration::from_secs(1), 0).unwrap_err();
        assert!(matches!(err, ConfabError::Config(_)));
    }

    #[test]
    fn non_header_safe_key_is_config_error() {
        let err =
            OpenAiClient::new("sk-\nbad", "http://localhost", Duration::from_secs(1), 0).unwrap_err();
        assert!(matches!(err, ConfabError::Config(_)));
    }

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let client = test_client("http://localhost:1234/v1/", 0);
        assert_eq!(client.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[tokio::test]
    async fn complete_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("cmpl-1", "Hi!")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let result = client.complete(&test_request()).await.unwrap();
        assert_eq!(result.id, "cmpl-1");
        assert_eq!(result.choices[0].message.content.as_deref(), Some("Hi!"));
        assert_eq!(result.usage.unwrap().prompt_tokens, 10);
    }

    #[tokio::test]
    async fn sends_bearer_auth_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("content-type", "application/json"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "stream": false,
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("cmpl-h", "ok")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let result = client.complete(&test_request()).await;
        assert!(result.is_ok(), "request should match: {result:?}");
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let err = client.complete(&test_request()).await.unwrap_err();
        assert!(err.to_string().contains("503"), "got: {err}");
    }

    #[tokio::test]
    async fn retries_on_429_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "Rate limited", "type": "requests", "code": "rate_limit_exceeded"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(success_body("cmpl-retry", "after")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 1);
        let result = client.complete(&test_request()).await.unwrap();
        assert_eq!(result.id, "cmpl-retry");
    }

    #[tokio::test]
    async fn exhausts_retries_and_reports_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"message": "The server had an error", "type": "server_error"}
            })))
            .expect(3)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 2);
        let err = client.complete(&test_request()).await.unwrap_err().to_string();
        assert!(err.contains("server_error"), "got: {err}");
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error", "code": "invalid_api_key"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 3);
        let err = client.complete(&test_request()).await.unwrap_err().to_string();
        assert!(err.contains("Incorrect API key"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_success_body_is_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let err = client.complete(&test_request()).await.unwrap_err();
        assert!(matches!(err, ConfabError::Provider { .. }));
    }

    #[tokio::test]
    async fn stream_completion_sets_stream_flag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string("data: [DONE]\n\n"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri(), 0);
        let mut stream = client.stream_completion(&test_request()).await.unwrap();
        assert!(matches!(stream.next().await, Some(Ok(StreamEvent::Done))));
        assert!(stream.next().await.is_none());
    }
}
