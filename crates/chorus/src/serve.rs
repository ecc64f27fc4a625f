// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `chorus serve` command implementation.
//!
//! Wires the world-state store, payload builder, rate limiter, coordinator
//! and one scheduler per platform, then runs until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use chorus_agent::shutdown::{install_signal_handler, shutdown};
use chorus_agent::{ActionScheduler, PayloadCycleProcessor, ProcessingCoordinator};
use chorus_config::model::ChorusConfig;
use chorus_context::{ContextPayloadBuilder, InMemoryNodeDirectory};
use chorus_core::error::ChorusError;
use chorus_core::recording;
use chorus_core::types::ChannelType;
use chorus_ratelimit::RateLimiter;
use chorus_world::WorldStateStore;
use tokio::sync::Mutex;
use tracing::info;

use crate::dry_run::{DryRunEngine, DryRunSender};

/// How long in-flight sends may take to finish on shutdown.
const SCHEDULER_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs the `chorus serve` command.
pub async fn run_serve(config: ChorusConfig) -> Result<(), ChorusError> {
    init_tracing(&config.agent.log_level);
    recording::register_metrics();

    info!(name = %config.agent.name, "starting chorus");

    let store = Arc::new(WorldStateStore::new(&config.world));
    let limiter = Arc::new(Mutex::new(RateLimiter::new(&config.rate_limit)));
    let directory = Arc::new(InMemoryNodeDirectory::from_config(&config.context));
    let builder = ContextPayloadBuilder::new(config.context.clone()).with_directory(directory);
    let schedulers: Vec<Arc<ActionScheduler>> = [ChannelType::Matrix, ChannelType::Farcaster]
        .into_iter()
        .map(|platform| {
            Arc::new(ActionScheduler::new(
                Arc::new(DryRunSender::new(platform)),
                Arc::clone(&store),
                Arc::clone(&limiter),
                &config.scheduler,
            ))
        })
        .collect();

    let processor = schedulers.iter().fold(
        PayloadCycleProcessor::new(Arc::clone(&store), builder, Arc::new(DryRunEngine)),
        |processor, scheduler| processor.with_scheduler(Arc::clone(scheduler)),
    );
    let processor = Arc::new(processor);

    let coordinator = ProcessingCoordinator::new(
        Arc::clone(&store),
        processor,
        Arc::clone(&limiter),
        config.processing.clone(),
    )
    .with_channel_retention(config.world.channel_retention_secs);

    let cancel = install_signal_handler();

    let scheduler_tasks = schedulers
        .into_iter()
        .map(|scheduler| tokio::spawn(scheduler.run(cancel.child_token())))
        .collect();

    coordinator.start().await;
    info!("chorus is running, press Ctrl+C to stop");

    cancel.cancelled().await;
    shutdown(&coordinator, scheduler_tasks, SCHEDULER_DRAIN_TIMEOUT).await;

    let status = coordinator.processing_status();
    info!(
        cycles = status.cycles_processed,
        errors = status.processing_errors,
        "chorus stopped"
    );
    Ok(())
}

/// Initialize the tracing subscriber with an env filter.
///
/// `RUST_LOG` wins when set; otherwise chorus crates log at `log_level`
/// and everything else at `warn`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chorus={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
