// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context payload builder for the Chorus agent core.
//!
//! Renders a [`WorldState`] into the JSON payload handed to the decision
//! engine. Two views exist: a flat view that ranks every channel and details
//! the most active ones, and a node view that exposes the state as
//! addressable paths the engine expands and collapses on demand. Small
//! states get the flat view; once the estimated size crosses the configured
//! token threshold, [`ContextPayloadBuilder::build`] switches to node view.

pub mod directory;
pub mod full_view;
pub mod node_view;
pub mod optimize;
pub mod paths;
pub mod ranking;
pub mod render;
pub mod resolve;
pub mod size;

use std::sync::Arc;

use chorus_config::model::ContextConfig;
use chorus_core::recording;
use chorus_core::traits::NodeDirectory;
use chorus_world::WorldState;
use serde_json::Value;
use tracing::debug;

pub use directory::InMemoryNodeDirectory;
pub use optimize::{OptimizeOptions, optimize_payload};
pub use paths::NodeKind;
pub use size::{BuiltPayload, PayloadEstimate, PayloadMode, PayloadStats, estimate_tokens};

/// Builds decision payloads from world state snapshots.
#[derive(Clone)]
pub struct ContextPayloadBuilder {
    config: ContextConfig,
    directory: Option<Arc<dyn NodeDirectory>>,
}

impl std::fmt::Debug for ContextPayloadBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPayloadBuilder")
            .field("config", &self.config)
            .field("has_directory", &self.directory.is_some())
            .finish()
    }
}

impl ContextPayloadBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            directory: None,
        }
    }

    /// Attach the expansion directory consulted by the node view.
    pub fn with_directory(mut self, directory: Arc<dyn NodeDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn directory(&self) -> Option<&Arc<dyn NodeDirectory>> {
        self.directory.as_ref()
    }

    pub fn build_full_view(&self, state: &WorldState, primary: Option<&str>, now: f64) -> BuiltPayload {
        full_view::build_full_view(state, &self.config, primary, now)
    }

    pub fn build_node_view(&self, state: &WorldState, now: f64) -> BuiltPayload {
        node_view::build_node_view(state, self.directory.as_deref(), &self.config, now)
    }

    /// Size of the flat view for `state`, estimated without rendering.
    pub fn estimate_payload_size(&self, state: &WorldState) -> PayloadEstimate {
        size::estimate_payload_size(state, &self.config)
    }

    /// Run the optimizer with this builder's limits.
    pub fn optimize(&self, payload: Value) -> Value {
        optimize_payload(payload, &OptimizeOptions::from(&self.config))
    }

    /// Render whichever view fits: flat when the estimate is at or under the
    /// node-mode threshold, node view otherwise.
    pub fn build(&self, state: &WorldState, primary: Option<&str>, now: f64) -> BuiltPayload {
        let estimate = self.estimate_payload_size(state);
        let use_nodes = estimate.estimated_tokens > self.config.node_mode_token_threshold;
        debug!(
            estimated_tokens = estimate.estimated_tokens,
            threshold = self.config.node_mode_token_threshold,
            node_mode = use_nodes,
            "selecting payload mode"
        );
        let built = if use_nodes {
            self.build_node_view(state, now)
        } else {
            self.build_full_view(state, primary, now)
        };
        recording::record_payload_bytes(built.stats.size_bytes);
        built
    }
}

impl Default for ContextPayloadBuilder {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}
