mod in_memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;

pub use in_memory::InMemorySubscriptionStore;
pub use postgres::PostgresSubscriptionStore;

/// Owner of subscriber persistence. The dispatch engine only reads the active
/// subscribers and records when an alert went out.
///
/// Implementations must make a `record_alert_sent` visible to the next
/// `list_active` call.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError>;

    async fn record_alert_sent(
        &self,
        email: &SubscriberEmail,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Failed to query the subscriptions database.")]
    Database(#[from] sqlx::Error),
    #[error("No subscription exists for {0}.")]
    UnknownSubscriber(String),
    #[error("The in-memory subscription store lock was poisoned.")]
    LockPoisoned,
}

impl std::fmt::Debug for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::dispatch::error_chain_fmt(self, f)
    }
}
