use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{StoreError, SubscriptionStore};
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;

/// Process-local store for tests and local development. Nothing survives a
/// restart.
#[derive(Debug, Default)]
pub struct InMemorySubscriptionStore {
    subscriptions: RwLock<HashMap<String, Subscriber>>,
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::LockPoisoned
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the subscriber, replacing any record with the same address.
    pub fn upsert(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().map_err(poisoned)?;
        subscriptions.insert(subscriber.email.as_ref().to_string(), subscriber);
        Ok(())
    }

    pub fn get(&self, email: &SubscriberEmail) -> Result<Option<Subscriber>, StoreError> {
        let subscriptions = self.subscriptions.read().map_err(poisoned)?;
        Ok(subscriptions.get(email.as_ref()).cloned())
    }

    /// Soft delete: the record stays but is no longer listed as active.
    /// Returns false when the address is unknown.
    pub fn deactivate(&self, email: &SubscriberEmail) -> Result<bool, StoreError> {
        let mut subscriptions = self.subscriptions.write().map_err(poisoned)?;
        match subscriptions.get_mut(email.as_ref()) {
            Some(subscriber) => {
                subscriber.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        let subscriptions = self.subscriptions.read().map_err(poisoned)?;
        let mut active: Vec<Subscriber> = subscriptions
            .values()
            .filter(|subscriber| subscriber.is_active)
            .cloned()
            .collect();
        drop(subscriptions);

        active.sort_by(|a, b| {
            a.subscribed_at
                .cmp(&b.subscribed_at)
                .then_with(|| a.email.as_ref().cmp(b.email.as_ref()))
        });

        Ok(active)
    }

    async fn record_alert_sent(
        &self,
        email: &SubscriberEmail,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut subscriptions = self.subscriptions.write().map_err(poisoned)?;
        let subscriber = subscriptions
            .get_mut(email.as_ref())
            .ok_or_else(|| StoreError::UnknownSubscriber(email.to_string()))?;
        subscriber.last_alert_sent = Some(sent_at);
        Ok(())
    }
}
