use std::time::Duration;

use tokio::time::{sleep_until, Instant};

pub const DEFAULT_MIN_INTERVAL_MILLISECONDS: u64 = 1_000;

/// Minimum time between two consecutive requests to the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingPolicy {
    pub min_interval: Duration,
}

impl PacingPolicy {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }

    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub(crate) fn pacer(&self) -> Pacer {
        Pacer {
            min_interval: self.min_interval,
            last_request: None,
        }
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_MIN_INTERVAL_MILLISECONDS))
    }
}

/// Tracks one cycle's request times. The first request never waits.
pub(crate) struct Pacer {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl Pacer {
    pub(crate) async fn wait_turn(&mut self) {
        if let Some(last_request) = self.last_request {
            sleep_until(last_request + self.min_interval).await;
        }

        self.last_request = Some(Instant::now());
    }
}
