// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal-driven shutdown of the coordinator and its schedulers.

use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coordinator::ProcessingCoordinator;

/// Installs handlers for SIGTERM and SIGINT.
///
/// The returned token is cancelled when either signal arrives.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, only Ctrl+C is handled");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Stop the coordinator, then give scheduler drain loops up to `timeout` to
/// finish their in-flight sends.
///
/// The scheduler tasks must already observe a cancelled token.
pub async fn shutdown(
    coordinator: &ProcessingCoordinator,
    schedulers: Vec<JoinHandle<()>>,
    timeout: Duration,
) {
    coordinator.stop().await;

    if schedulers.is_empty() {
        return;
    }
    info!(count = schedulers.len(), "waiting for schedulers to finish");
    match tokio::time::timeout(timeout, join_all(schedulers)).await {
        Ok(results) => {
            for e in results.into_iter().filter_map(Result::err) {
                warn!(error = %e, "scheduler task ended abnormally");
            }
            info!("all schedulers stopped");
        }
        Err(_) => warn!("timeout reached, some outbound sends were interrupted"),
    }
}
