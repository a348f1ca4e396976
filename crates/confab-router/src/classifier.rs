// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structured-output query classification.
//!
//! One completion call with a strict `json_schema` response format turns a
//! free-form query into a [`KnowledgeField`]. Nothing is remembered between
//! calls.

use std::sync::Arc;

use confab_core::{ChatMessage, ConfabError, ProviderAdapter, ProviderRequest, ResponseFormat};
use serde::{Deserialize, Serialize};
use serde_json::json;
use strum::VariantNames;
use tracing::debug;

/// System prompt of the classification call.
pub const ROUTING_PROMPT: &str = "You are an expert at routing user queries to the appropriate specialized assistant.
The available areas are: JavaScript, TypeScript, Python, and AI.
If the query is not related to these areas, select 'Other'.
Route the input to the most relevant area.";

/// Schema name sent with the structured-output request.
pub const ROUTE_SCHEMA_NAME: &str = "Route";

/// Area of knowledge a query needs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
pub enum KnowledgeField {
    JavaScript,
    TypeScript,
    Python,
    #[serde(rename = "AI")]
    #[strum(serialize = "AI")]
    Ai,
    Other,
}

/// The classifier's structured reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Route {
    pub knowledge_field: KnowledgeField,
}

/// JSON schema of [`Route`], in the strict subset the endpoint accepts.
pub fn route_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "description": "Route the query to the most relevant area.",
        "properties": {
            "knowledge_field": {
                "type": "string",
                "enum": KnowledgeField::VARIANTS,
                "description": "The area of knowledge required to answer the user query."
            }
        },
        "required": ["knowledge_field"],
        "additionalProperties": false
    })
}

/// Parses a classification reply.
pub fn parse_route(content: &str) -> Result<Route, ConfabError> {
    serde_json::from_str(content.trim()).map_err(|e| ConfabError::Provider {
        message: format!("classification reply is not a valid route: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Classifies queries with a single structured-output completion.
pub struct QueryClassifier {
    provider: Arc<dyn ProviderAdapter + Send + Sync>,
    model: String,
    temperature: Option<f32>,
}

impl QueryClassifier {
    pub fn new(
        provider: Arc<dyn ProviderAdapter + Send + Sync>,
        model: impl Into<String>,
        temperature: Option<f32>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
        }
    }

    /// The request [`Self::classify`] sends for `query`.
    pub fn request(&self, query: &str) -> ProviderRequest {
        ProviderRequest::new(
            &self.model,
            vec![ChatMessage::system(ROUTING_PROMPT), ChatMessage::human(query)],
        )
        .with_temperature(self.temperature)
        .with_response_format(ResponseFormat::JsonSchema {
            name: ROUTE_SCHEMA_NAME.to_string(),
            schema: route_schema(),
        })
    }

    pub async fn classify(&self, query: &str) -> Result<Route, ConfabError> {
        let response = self.provider.complete(self.request(query)).await?;
        let route = parse_route(&response.content)?;
        debug!(knowledge_field = %route.knowledge_field, "query classified");
        Ok(route)
    }
}
