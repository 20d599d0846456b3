use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

use super::evaluator::{self, DEFAULT_HORIZON_SECONDS};
use super::filter;
use super::pacing::PacingPolicy;
use super::rate_limiter::{self, DEFAULT_COOLDOWN_SECONDS};
use super::{error_chain_fmt, AlertSender, ForecastError, SendError, WeatherProvider};
use crate::domain::subscriber::Subscriber;
use crate::store::{StoreError, SubscriptionStore};

pub const DEFAULT_CALL_TIMEOUT: StdDuration = StdDuration::from_secs(10);

#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    pub horizon: Duration,
    pub cooldown: Duration,
    pub pacing: PacingPolicy,
    /// Upper bound for every single call to the weather provider or the sender.
    pub call_timeout: StdDuration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            horizon: Duration::seconds(DEFAULT_HORIZON_SECONDS),
            cooldown: Duration::seconds(DEFAULT_COOLDOWN_SECONDS),
            pacing: PacingPolicy::default(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Outcome counts of one cycle. `failed` only counts alerts the sender could not
/// deliver; subscribers skipped because their forecast could not be fetched are
/// reported in `provider_failures`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub provider_failures: usize,
    pub throttled: usize,
    pub quiet: usize,
    /// Alerts delivered whose timestamp could not be stored.
    pub unrecorded: usize,
}

impl CycleSummary {
    fn record(&mut self, outcome: SubscriberOutcome) {
        match outcome {
            SubscriberOutcome::Sent => self.sent += 1,
            SubscriberOutcome::SentUnrecorded => {
                self.sent += 1;
                self.unrecorded += 1;
            }
            SubscriberOutcome::SendFailed => self.failed += 1,
            SubscriberOutcome::ForecastUnavailable => self.provider_failures += 1,
            SubscriberOutcome::Throttled => self.throttled += 1,
            SubscriberOutcome::NothingToSend => self.quiet += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubscriberOutcome {
    Sent,
    SentUnrecorded,
    SendFailed,
    ForecastUnavailable,
    Throttled,
    NothingToSend,
}

#[derive(thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to fetch the active subscriptions.")]
    StoreFetch(#[source] StoreError),
    #[error("A dispatch cycle is already running.")]
    CycleInProgress,
}

impl std::fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub struct Dispatcher {
    store: Arc<dyn SubscriptionStore>,
    weather: Arc<dyn WeatherProvider>,
    sender: Arc<dyn AlertSender>,
    policy: DispatchPolicy,
    cycle_guard: Mutex<()>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn SubscriptionStore>,
        weather: Arc<dyn WeatherProvider>,
        sender: Arc<dyn AlertSender>,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            store,
            weather,
            sender,
            policy,
            cycle_guard: Mutex::new(()),
        }
    }

    /// Runs one full pass over the active subscribers.
    ///
    /// Subscribers are processed one after the other and each one's failures are
    /// only counted, so the cycle fails only when the subscriber list itself cannot
    /// be read, or when another cycle is still running.
    #[tracing::instrument(name = "Running a dispatch cycle", skip(self), fields(cycle_id = %Uuid::new_v4()))]
    pub async fn run_cycle(&self) -> Result<CycleSummary, DispatchError> {
        let _running = self
            .cycle_guard
            .try_lock()
            .map_err(|_| DispatchError::CycleInProgress)?;

        let subscribers = self.store.list_active().await.map_err(|err| {
            tracing::error!("Failed to fetch active subscriptions: {:?}", err);
            DispatchError::StoreFetch(err)
        })?;

        tracing::info!("Found {} active subscriptions", subscribers.len());

        let mut summary = CycleSummary::default();
        let mut pacer = self.policy.pacing.pacer();

        for subscriber in subscribers.iter().filter(|subscriber| subscriber.is_active) {
            summary.attempted += 1;
            pacer.wait_turn().await;
            let outcome = self.process_subscriber(subscriber).await;
            summary.record(outcome);
        }

        tracing::info!(
            attempted = summary.attempted,
            sent = summary.sent,
            failed = summary.failed,
            provider_failures = summary.provider_failures,
            throttled = summary.throttled,
            "Dispatch cycle completed"
        );

        Ok(summary)
    }

    #[tracing::instrument(
        name = "Checking weather for a subscriber",
        skip(self, subscriber),
        fields(
            subscriber_email = %subscriber.email,
            location = %subscriber.location
        )
    )]
    async fn process_subscriber(&self, subscriber: &Subscriber) -> SubscriberOutcome {
        let snapshot = match timeout(
            self.policy.call_timeout,
            self.weather.forecast(&subscriber.location),
        )
        .await
        .unwrap_or(Err(ForecastError::TimedOut))
        {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("Skipping subscriber, forecast unavailable: {:?}", err);
                return SubscriberOutcome::ForecastUnavailable;
            }
        };

        let now = Utc::now();
        let preferences = subscriber.effective_preferences();
        let alerts = filter::filter(
            evaluator::evaluate(&snapshot, now, self.policy.horizon),
            Some(&preferences),
        );

        if alerts.is_empty() {
            tracing::debug!("No relevant alerts for subscriber");
            return SubscriberOutcome::NothingToSend;
        }

        if !rate_limiter::may_dispatch(subscriber.last_alert_sent, now, self.policy.cooldown) {
            tracing::info!("Skipping alert, too soon since the last one");
            return SubscriberOutcome::Throttled;
        }

        let delivery = timeout(
            self.policy.call_timeout,
            self.sender.send(
                &subscriber.email,
                &subscriber.location,
                &alerts,
                &snapshot.current,
            ),
        )
        .await
        .unwrap_or(Err(SendError::TimedOut));

        if let Err(err) = delivery {
            tracing::error!("Failed to send weather alert: {:?}", err);
            return SubscriberOutcome::SendFailed;
        }

        match self.store.record_alert_sent(&subscriber.email, now).await {
            Ok(()) => {
                tracing::info!("Weather alert sent with {} alerts", alerts.len());
                SubscriberOutcome::Sent
            }
            Err(err) => {
                tracing::error!(
                    "Weather alert sent but its timestamp was not stored: {:?}",
                    err
                );
                SubscriberOutcome::SentUnrecorded
            }
        }
    }
}
