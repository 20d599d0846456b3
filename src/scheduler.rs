use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::dispatch::{DispatchError, Dispatcher};

/// Runs a dispatch cycle every `every`, starting one period after the call.
/// Ticks missed while a long cycle was running are skipped, never queued.
pub async fn run_dispatch_schedule(dispatcher: Arc<Dispatcher>, every: Duration) {
    tracing::info!(
        interval_secs = every.as_secs(),
        "Weather dispatch scheduler started"
    );

    let mut tick = interval_at(Instant::now() + every, every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        match dispatcher.run_cycle().await {
            Ok(summary) => {
                tracing::info!(
                    attempted = summary.attempted,
                    sent = summary.sent,
                    failed = summary.failed,
                    "Scheduled dispatch cycle finished"
                );
            }
            Err(DispatchError::CycleInProgress) => {
                tracing::warn!("Skipping scheduled dispatch, a cycle is already running");
            }
            Err(err) => {
                tracing::error!("Scheduled dispatch cycle failed: {:?}", err);
            }
        }
    }
}
