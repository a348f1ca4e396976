// SPDX-FileCopyrightText: 2026 Confab Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Confab integration tests.
//!
//! Provides a scripted provider and a temp-directory store so chat,
//! session and router tests run without network access.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock completion provider with queued replies and request capture
//! - [`TestHarness`] - Mock provider plus an initialized SQLite store in a temp dir

pub mod harness;
pub mod mock_provider;

pub use harness::TestHarness;
pub use mock_provider::MockProvider;
