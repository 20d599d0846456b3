use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use wiremock::MockServer;

use crate::helpers::{email, launch, subscriber, TestApp};
use weather_guard::domain::subscriber::Subscriber;
use weather_guard::domain::subscriber_email::SubscriberEmail;
use weather_guard::store::{StoreError, SubscriptionStore};

struct UnreachableStore;

#[async_trait]
impl SubscriptionStore for UnreachableStore {
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        Err(StoreError::LockPoisoned)
    }

    async fn record_alert_sent(
        &self,
        _email: &SubscriberEmail,
        _sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        Err(StoreError::LockPoisoned)
    }
}

#[tokio::test]
async fn status_reports_the_active_subscription_count() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber(subscriber("one@example.com", "Seville, ES"));
    test_app.add_subscriber(subscriber("two@example.com", "Oslo, NO"));
    test_app.add_subscriber(subscriber("three@example.com", "Lisbon, PT"));
    test_app
        .store
        .deactivate(&email("three@example.com"))
        .unwrap();

    let response = test_app.get_status().await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["stats"]["activeSubscriptions"], 2);
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn status_returns_503_when_the_store_is_unreachable() {
    let weather_server = MockServer::start().await;
    let email_server = MockServer::start().await;
    let address = launch(Arc::new(UnreachableStore), &weather_server, &email_server).await;

    let response = reqwest::Client::new()
        .get(format!("{}/admin/status", address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(response.status().as_u16(), 503);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert!(body["stats"].is_null());
}
