use crate::helpers::{email, subscriber, TestApp, ADMIN_API_KEY};

#[tokio::test]
async fn listing_subscriptions_requires_credentials() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.get_subscriptions(Some("not-the-key")).await;

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn only_active_subscriptions_are_listed() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber(subscriber("active@example.com", "Seville, ES"));
    test_app.add_subscriber(subscriber("gone@example.com", "Lisbon, PT"));
    test_app
        .store
        .deactivate(&email("gone@example.com"))
        .unwrap();

    let response = test_app.get_subscriptions(Some(ADMIN_API_KEY)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["subscriptions"][0]["email"], "active@example.com");
    assert_eq!(body["subscriptions"][0]["location"], "Seville, ES");
    assert!(body["subscriptions"][0]["lastAlertSent"].is_null());
}
