// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the Chorus core.
//!
//! Async collaborators use `#[async_trait]` for dynamic dispatch
//! compatibility; the node directory is synchronous because the payload
//! builder reads it while holding the world-state read lock.

pub mod engine;
pub mod node_directory;
pub mod processor;
pub mod sender;

pub use engine::{DecisionEngine, DecisionRequest, PlannedAction};
pub use node_directory::{NodeDirectory, NodeMetadata};
pub use processor::{CycleOutcome, CycleProcessor, CycleRequest};
pub use sender::{ActionSender, OutboundAction, SendReceipt};
