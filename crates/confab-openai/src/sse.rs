// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Chat Completions streaming responses.
//!
//! The endpoint sends unnamed `data:` events, each a JSON
//! `chat.completion.chunk`, and terminates with the literal `data: [DONE]`.

use std::pin::Pin;

use confab_core::ConfabError;
use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};

use crate::types::{ApiErrorResponse, ChatCompletionChunk};

/// Sentinel payload marking the end of the stream.
const DONE_SENTINEL: &str = "[DONE]";

/// Typed events from the streaming protocol.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Chunk(ChatCompletionChunk),
    /// `[DONE]` was received.
    Done,
}

/// Parses a reqwest streaming response into a stream of [`StreamEvent`]s.
///
/// Events with empty data (keep-alives) are skipped. An `{"error": ...}`
/// payload becomes a provider error item.
pub fn parse_sse_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, ConfabError>> + Send>> {
    let events = response.bytes_stream().eventsource();

    let mapped = events.filter_map(|result| async move {
        match result {
            Ok(event) => parse_data(event.data.trim()),
            Err(e) => Some(Err(ConfabError::Provider {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}

fn parse_data(data: &str) -> Option<Result<StreamEvent, ConfabError>> {
    if data.is_empty() {
        return None;
    }
    if data == DONE_SENTINEL {
        return Some(Ok(StreamEvent::Done));
    }

    let parsed = match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) if !is_error_payload(data) => Ok(StreamEvent::Chunk(chunk)),
        Ok(_) | Err(_) => match serde_json::from_str::<ApiErrorResponse>(data) {
            Ok(api_err) => Err(ConfabError::Provider {
                message: format!(
                    "OpenAI API error during stream ({}): {}",
                    api_err.error.kind(),
                    api_err.error.message
                ),
                source: None,
            }),
            Err(e) => Err(ConfabError::Provider {
                message: format!("failed to parse stream chunk: {e}"),
                source: Some(Box::new(e)),
            }),
        },
    };
    Some(parsed)
}

/// Every chunk field has a default, so an error envelope would also parse as
/// an empty chunk; detect it by its top-level key.
fn is_error_payload(data: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(data)
        .map(|v| v.get("error").is_some())
        .unwrap_or(false)
}
