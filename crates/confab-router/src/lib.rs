// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query classification and expert routing.
//!
//! This crate provides:
//! - [`QueryClassifier`]: one structured-output completion that labels a
//!   query with a [`KnowledgeField`]
//! - [`ExpertRouter`]: maps the label to an [`Expert`] system prompt and
//!   answers, or refuses queries labelled `Other` without a model call
//!
//! Each query is routed on its own. No conversation state is kept.

pub mod classifier;
pub mod router;

pub use classifier::{
    parse_route, route_schema, KnowledgeField, QueryClassifier, Route, ROUTE_SCHEMA_NAME,
    ROUTING_PROMPT,
};
pub use router::{Expert, ExpertRouter, RouteOutcome, REFUSAL};
