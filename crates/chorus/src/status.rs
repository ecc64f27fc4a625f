// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chorus status` command implementation.
//!
//! Builds the core stack from the loaded configuration without starting
//! it and prints what a fresh process would report: coordinator state,
//! rate limit windows, world metrics and the payload estimate.

use std::sync::Arc;

use chorus_agent::{PayloadCycleProcessor, ProcessingCoordinator, ProcessingStatus};
use chorus_config::model::ChorusConfig;
use chorus_context::{ContextPayloadBuilder, PayloadEstimate};
use chorus_core::error::ChorusError;
use chorus_core::types::{WorldMetrics, now_secs};
use chorus_ratelimit::{RateLimitStatus, RateLimiter};
use chorus_world::WorldStateStore;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::dry_run::DryRunEngine;

/// Structured status output.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub agent: String,
    pub processing: ProcessingStatus,
    pub rate_limits: RateLimitStatus,
    pub world: WorldMetrics,
    pub payload_estimate: PayloadEstimate,
}

/// Collect a [`StatusReport`] for an idle stack built from `config`.
pub async fn collect_status(config: &ChorusConfig) -> StatusReport {
    let now = now_secs();
    let store = Arc::new(WorldStateStore::new(&config.world));
    let limiter = Arc::new(Mutex::new(RateLimiter::new(&config.rate_limit)));
    let builder = ContextPayloadBuilder::new(config.context.clone());
    let payload_estimate = builder.estimate_payload_size(&*store.read().await);
    let processor = Arc::new(PayloadCycleProcessor::new(
        Arc::clone(&store),
        builder,
        Arc::new(DryRunEngine),
    ));
    let coordinator =
        ProcessingCoordinator::new(Arc::clone(&store), processor, limiter, config.processing.clone());

    StatusReport {
        agent: config.agent.name.clone(),
        processing: coordinator.processing_status(),
        rate_limits: coordinator.rate_limit_status(now).await,
        world: store.get_metrics(now).await,
        payload_estimate,
    }
}

/// Run the `chorus status` command.
pub async fn run_status(config: &ChorusConfig, json: bool) -> Result<(), ChorusError> {
    let report = collect_status(config).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("agent:        {}", report.agent);
    println!("state:        {}", report.processing.state);
    let hour = &report.rate_limits.cycles_last_hour;
    println!(
        "cycles:       {} used this hour, {} remaining",
        hour.used,
        hour.remaining.map_or_else(|| "unlimited".to_string(), |r| r.to_string())
    );
    println!(
        "world:        {} channels, {} messages, {} actions",
        report.world.channel_count, report.world.message_count, report.world.action_count
    );
    println!(
        "payload:      ~{} tokens ({} bytes)",
        report.payload_estimate.estimated_tokens, report.payload_estimate.estimated_bytes
    );
    Ok(())
}
