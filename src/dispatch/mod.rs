//! Notification dispatch engine.
//!
//! [`evaluator`], [`filter`] and [`rate_limiter`] are pure functions; the
//! [`orchestrator`] is the only part that talks to the outside world, through the
//! [`WeatherProvider`], [`AlertSender`] and [`SubscriptionStore`](crate::store::SubscriptionStore)
//! seams.

pub mod evaluator;
pub mod filter;
pub mod orchestrator;
pub mod pacing;
pub mod rate_limiter;

use async_trait::async_trait;

use crate::domain::alert::AlertEvent;
use crate::domain::forecast::{CurrentConditions, ForecastSnapshot};
use crate::domain::location::Location;
use crate::domain::subscriber_email::SubscriberEmail;

pub use orchestrator::{CycleSummary, DispatchError, DispatchPolicy, Dispatcher};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn forecast(&self, location: &Location) -> Result<ForecastSnapshot, ForecastError>;
}

#[async_trait]
pub trait AlertSender: Send + Sync {
    async fn send(
        &self,
        recipient: &SubscriberEmail,
        location: &Location,
        alerts: &[AlertEvent],
        current: &CurrentConditions,
    ) -> Result<(), SendError>;
}

#[derive(thiserror::Error)]
pub enum ForecastError {
    #[error("Location {0} could not be resolved by the weather provider.")]
    LocationInvalid(String),
    #[error("The weather provider is unavailable.")]
    ProviderUnavailable(#[source] BoxError),
    #[error("The weather provider did not answer in time.")]
    TimedOut,
}

impl std::fmt::Debug for ForecastError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum SendError {
    #[error("The alert could not be delivered.")]
    Rejected(#[source] BoxError),
    #[error("The alert sender did not answer in time.")]
    TimedOut,
}

impl std::fmt::Debug for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

pub(crate) fn error_chain_fmt(
    error: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    write!(f, "{}", error)?;

    let mut current = error.source();
    while let Some(cause) = current {
        write!(f, "\nCaused by:\n\t{}", cause)?;
        current = cause.source();
    }

    Ok(())
}
