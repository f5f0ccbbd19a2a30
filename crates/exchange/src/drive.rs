//! The two periodic tasks driving the round lifecycle.
//!
//! They are scheduled independently but serialize against each other and
//! against the inbound message handlers through the coordinating lock.

use crate::coordinator::PoseGraphExchange;
use crate::ExchangeConfig;
use std::sync::Arc;
use tokio::task::AbortHandle;

/// Spawns the task that attempts to start a round whenever the
/// coordinator is idle.
pub(crate) fn spawn_round_start_task(
    config: Arc<ExchangeConfig>,
    exchange: PoseGraphExchange,
) -> AbortHandle {
    tracing::info!("Starting round start task");

    let interval = config.round_interval();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            exchange.round_start_tick().await;
        }
    })
    .abort_handle()
}

/// Spawns the task that moves an active round through its transitions,
/// checks waiting deadlines and publishes the optimizer state.
pub(crate) fn spawn_drive_task(
    config: Arc<ExchangeConfig>,
    exchange: PoseGraphExchange,
) -> AbortHandle {
    tracing::info!("Starting round drive task");

    let interval = config.drive_interval();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            exchange.drive_tick().await;
        }
    })
    .abort_handle()
}
