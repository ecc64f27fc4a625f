// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Chorus integration tests.
//!
//! Provides mock collaborators and a harness for fast, deterministic tests
//! without platform connections or a model.
//!
//! # Components
//!
//! - [`MockCycleProcessor`] - Counts cycles, tracks concurrency, optionally gated
//! - [`MockDecisionEngine`] - Returns scripted planned actions
//! - [`MockSender`] - Captures outbound actions
//! - [`fixtures`] - Message builders for both platforms
//! - [`TestHarness`] - Store, limiter and coordinator wired together

pub mod fixtures;
pub mod harness;
pub mod mock_engine;
pub mod mock_processor;
pub mod mock_sender;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_engine::MockDecisionEngine;
pub use mock_processor::MockCycleProcessor;
pub use mock_sender::MockSender;
