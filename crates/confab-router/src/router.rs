// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expert dispatch.
//!
//! Classification picks a [`KnowledgeField`]; dispatch maps it to an
//! [`Expert`] system prompt and makes one more completion call, or answers
//! with [`REFUSAL`] without calling the model.

use std::sync::Arc;

use confab_config::model::OpenAiConfig;
use confab_core::{ChatMessage, ConfabError, ProviderAdapter, ProviderRequest};
use confab_openai::OpenAiProvider;
use tracing::{debug, info};

use crate::classifier::{KnowledgeField, QueryClassifier};

/// Answer for queries outside the supported areas.
pub const REFUSAL: &str =
    "I'm sorry, I can only assist with JavaScript, TypeScript, Python, and AI.";

/// A fixed system-prompt persona.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Expert {
    JavaScript,
    Python,
    #[strum(serialize = "AI")]
    Ai,
}

impl Expert {
    /// The expert for a label, or `None` for `Other`.
    pub fn for_field(field: KnowledgeField) -> Option<Self> {
        match field {
            KnowledgeField::JavaScript | KnowledgeField::TypeScript => Some(Self::JavaScript),
            KnowledgeField::Python => Some(Self::Python),
            KnowledgeField::Ai => Some(Self::Ai),
            KnowledgeField::Other => None,
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            Self::JavaScript => {
                "You are a senior developer with 20 years of experience. You are an expert in JavaScript and TypeScript.
You are also an expert in software architecture and design patterns."
            }
            Self::Python => {
                "You are a senior developer with 20 years of experience. You are an expert in Python.
You are also an expert in software architecture and design patterns."
            }
            Self::Ai => {
                "You are a senior developer with 20 years of experience. You are an expert in AI.
You are also an expert in best practices for AI development."
            }
        }
    }
}

/// Result of routing one query.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOutcome {
    pub field: KnowledgeField,
    /// `None` when the query was refused.
    pub expert: Option<Expert>,
    pub answer: String,
}

/// Classifies a query and answers it with the matching expert.
pub struct ExpertRouter {
    classifier: QueryClassifier,
    provider: Arc<dyn ProviderAdapter + Send + Sync>,
    model: String,
    temperature: Option<f32>,
}

impl ExpertRouter {
    /// Both stages share `provider` and `model`.
    pub fn new(
        provider: Arc<dyn ProviderAdapter + Send + Sync>,
        model: impl Into<String>,
        temperature: Option<f32>,
    ) -> Result<Self, ConfabError> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(ConfabError::Config("model name must not be empty".into()));
        }
        if let Some(t) = temperature.filter(|t| !t.is_finite() || !(0.0..=2.0).contains(t)) {
            return Err(ConfabError::Config(format!(
                "temperature must be between 0 and 2, got {t}"
            )));
        }
        Ok(Self {
            classifier: QueryClassifier::new(Arc::clone(&provider), &model, temperature),
            provider,
            model,
            temperature,
        })
    }

    pub fn from_config(
        config: &OpenAiConfig,
        model: &str,
        api_key: &str,
    ) -> Result<Self, ConfabError> {
        let provider = OpenAiProvider::new(config, api_key)?;
        Self::new(Arc::new(provider), model, Some(config.temperature))
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// The request sent to `expert` for `query`.
    pub fn expert_request(&self, expert: Expert, query: &str) -> ProviderRequest {
        ProviderRequest::new(
            &self.model,
            vec![
                ChatMessage::system(expert.system_prompt()),
                ChatMessage::human(query),
            ],
        )
        .with_temperature(self.temperature)
    }

    /// Answers `query` for an already known label.
    pub async fn dispatch(
        &self,
        field: KnowledgeField,
        query: &str,
    ) -> Result<RouteOutcome, ConfabError> {
        let Some(expert) = Expert::for_field(field) else {
            info!(knowledge_field = %field, "query refused");
            return Ok(RouteOutcome {
                field,
                expert: None,
                answer: REFUSAL.to_string(),
            });
        };

        debug!(knowledge_field = %field, expert = %expert, "dispatching to expert");
        let response = self
            .provider
            .complete(self.expert_request(expert, query))
            .await?;
        info!(
            knowledge_field = %field,
            expert = %expert,
            reply_bytes = response.content.len(),
            "query answered"
        );
        Ok(RouteOutcome {
            field,
            expert: Some(expert),
            answer: response.content,
        })
    }

    /// Classifies `query`, then dispatches it.
    pub async fn route(&self, query: &str) -> Result<RouteOutcome, ConfabError> {
        let route = self.classifier.classify(query).await?;
        self.dispatch(route.knowledge_field, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use confab_test_utils::MockProvider;

    fn router(provider: &Arc<MockProvider>) -> ExpertRouter {
        ExpertRouter::new(provider.clone(), "gpt-4o-mini", Some(0.7)).unwrap()
    }

    fn label(field: &str) -> String {
        format!(r#"{{"knowledge_field":"{field}"}}"#)
    }

    #[test]
    fn every_label_has_a_destination() {
        assert_eq!(Expert::for_field(KnowledgeField::JavaScript), Some(Expert::JavaScript));
        assert_eq!(Expert::for_field(KnowledgeField::TypeScript), Some(Expert::JavaScript));
        assert_eq!(Expert::for_field(KnowledgeField::Python), Some(Expert::Python));
        assert_eq!(Expert::for_field(KnowledgeField::Ai), Some(Expert::Ai));
        assert_eq!(Expert::for_field(KnowledgeField::Other), None);
    }

    #[test]
    fn python_and_ai_requests_differ() {
        let provider = Arc::new(MockProvider::new());
        let router = router(&provider);
        let python = router.expert_request(Expert::Python, "same query");
        let ai = router.expert_request(Expert::Ai, "same query");

        assert_eq!(python.system_prompt(), Some(Expert::Python.system_prompt()));
        assert_ne!(python.system_prompt(), ai.system_prompt());
        assert_eq!(python.messages[1], ai.messages[1]);
        assert!(python.response_format.is_none());
    }

    #[tokio::test]
    async fn python_query_goes_to_python_expert() {
        let provider = Arc::new(MockProvider::with_responses([
            label("Python"),
            "Use sorted(d.items()).".to_string(),
        ]));
        let outcome = router(&provider).route("How do I sort a dict?").await.unwrap();

        assert_eq!(outcome.field, KnowledgeField::Python);
        assert_eq!(outcome.expert, Some(Expert::Python));
        assert_eq!(outcome.answer, "Use sorted(d.items()).");

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 2);
        assert!(requests[0].response_format.is_some());
        assert_eq!(requests[1].system_prompt(), Some(Expert::Python.system_prompt()));
        assert_eq!(requests[1].messages[1].content, "How do I sort a dict?");
    }

    #[tokio::test]
    async fn typescript_shares_javascript_expert() {
        let provider =
            Arc::new(MockProvider::with_responses([label("TypeScript"), "Use generics.".into()]));
        let outcome = router(&provider).route("Typing a reducer?").await.unwrap();
        assert_eq!(outcome.field, KnowledgeField::TypeScript);
        assert_eq!(outcome.expert, Some(Expert::JavaScript));
    }

    #[tokio::test]
    async fn other_is_refused_without_expert_call() {
        let provider = Arc::new(MockProvider::with_responses([label("Other")]));
        let outcome = router(&provider).route("Best pasta recipe?").await.unwrap();

        assert_eq!(
            outcome,
            RouteOutcome {
                field: KnowledgeField::Other,
                expert: None,
                answer: REFUSAL.to_string(),
            }
        );
        assert_eq!(provider.call_count().await, 1);
    }

    #[tokio::test]
    async fn dispatch_skips_classification() {
        let provider = Arc::new(MockProvider::with_responses(["Transformers."]));
        let outcome = router(&provider)
            .dispatch(KnowledgeField::Ai, "What is attention?")
            .await
            .unwrap();
        assert_eq!(outcome.expert, Some(Expert::Ai));
        assert_eq!(provider.call_count().await, 1);
    }

    #[tokio::test]
    async fn classification_failure_stops_routing() {
        let provider = Arc::new(MockProvider::with_responses(["not json"]));
        let result = router(&provider).route("q").await;
        assert!(matches!(result, Err(ConfabError::Provider { .. })));
        assert_eq!(provider.call_count().await, 1);
    }

    #[tokio::test]
    async fn queries_are_routed_independently() {
        let provider = Arc::new(MockProvider::with_responses([
            label("AI"),
            "a".into(),
            label("Python"),
            "b".into(),
        ]));
        let router = router(&provider);
        router.route("first").await.unwrap();
        router.route("second").await.unwrap();

        let classify = &provider.requests().await[2];
        assert_eq!(classify.messages.len(), 2);
        assert_eq!(classify.messages[1].content, "second");
    }

    #[test]
    fn construction_validates_model_and_temperature() {
        let provider = Arc::new(MockProvider::new());
        assert!(matches!(
            ExpertRouter::new(provider.clone(), "", None),
            Err(ConfabError::Config(_))
        ));
        assert!(matches!(
            ExpertRouter::new(provider, "m", Some(3.0)),
            Err(ConfabError::Config(_))
        ));
        assert!(matches!(
            ExpertRouter::from_config(&OpenAiConfig::default(), "m", ""),
            Err(ConfabError::Config(_))
        ));
    }
}
