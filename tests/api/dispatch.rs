use chrono::{Duration, Utc};
use wiremock::matchers::{any, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{email, subscriber, TestApp, ADMIN_API_KEY};
use weather_guard::domain::location::{Location, LocationName};
use weather_guard::domain::subscriber::Subscriber;

#[tokio::test]
async fn dispatch_returns_401_without_valid_credentials() {
    let test_app = TestApp::spawn_app().await;
    let test_cases = vec![(None, "missing token"), (Some("wrong-key"), "invalid token")];

    for (token, error_message) in test_cases {
        let response = test_app.post_dispatch(token).await;

        assert_eq!(
            401,
            response.status().as_u16(),
            "The API did not fail with 401 status when the request had a {}",
            error_message
        );
    }
}

#[tokio::test]
async fn dispatch_with_no_subscribers_is_a_successful_no_op() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.weather_server)
        .await;

    let response = test_app.post_dispatch(Some(ADMIN_API_KEY)).await;
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["summary"]["attempted"], 0);
    assert!(body["triggeredAt"].is_string());
}

#[tokio::test]
async fn extreme_heat_alert_is_delivered_and_recorded() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber(subscriber("heat@example.com", "Seville, ES"));
    test_app.mount_forecast(36.0, 5.0, "Clear").await;

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.post_dispatch(Some(ADMIN_API_KEY)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["summary"]["attempted"], 1);
    assert_eq!(body["summary"]["sent"], 1);
    assert_eq!(body["summary"]["failed"], 0);

    let stored = test_app
        .store
        .get(&email("heat@example.com"))
        .unwrap()
        .unwrap();
    assert!(stored.last_alert_sent.is_some());
}

#[tokio::test]
async fn subscriber_alerted_recently_is_not_alerted_again() {
    let test_app = TestApp::spawn_app().await;
    let last_alert = Utc::now() - Duration::hours(2);
    test_app.add_subscriber(
        subscriber("recent@example.com", "Seville, ES").with_last_alert_sent(last_alert),
    );
    test_app.mount_forecast(38.0, 5.0, "Clear").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.post_dispatch(Some(ADMIN_API_KEY)).await;
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["summary"]["sent"], 0);
    assert_eq!(body["summary"]["throttled"], 1);
    let stored = test_app
        .store
        .get(&email("recent@example.com"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_alert_sent, Some(last_alert));
}

#[tokio::test]
async fn unknown_location_is_skipped_without_failing_the_others() {
    let test_app = TestApp::spawn_app().await;
    let mut lost = Subscriber::new(
        email("lost@example.com"),
        Location::new(LocationName::parse("Atlantis".to_string()).unwrap()),
    );
    let mut first = subscriber("first@example.com", "Seville, ES");
    first.subscribed_at = Utc::now() - Duration::days(3);
    lost.subscribed_at = Utc::now() - Duration::days(2);
    test_app.add_subscriber(first);
    test_app.add_subscriber(lost);
    test_app.add_subscriber(subscriber("third@example.com", "Cordoba, ES"));
    test_app.mount_forecast(20.0, 20.0, "Thunderstorm").await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&test_app.weather_server)
        .await;
    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.post_dispatch(Some(ADMIN_API_KEY)).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["summary"]["attempted"], 3);
    assert_eq!(body["summary"]["sent"], 2);
    assert_eq!(body["summary"]["failed"], 0);
    assert_eq!(body["summary"]["providerFailures"], 1);
}

#[tokio::test]
async fn rejected_email_is_counted_as_failed_and_retried_next_cycle() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber(subscriber("bounce@example.com", "Seville, ES"));
    test_app.mount_forecast(-15.0, 2.0, "Snow").await;

    Mock::given(path("/mail/send"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&test_app.email_server)
        .await;
    Mock::given(path("/mail/send"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&test_app.email_server)
        .await;

    let first: serde_json::Value = test_app
        .post_dispatch(Some(ADMIN_API_KEY))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(first["summary"]["failed"], 1);
    assert_eq!(first["summary"]["sent"], 0);
    let stored = test_app
        .store
        .get(&email("bounce@example.com"))
        .unwrap()
        .unwrap();
    assert!(stored.last_alert_sent.is_none());

    let second: serde_json::Value = test_app
        .post_dispatch(Some(ADMIN_API_KEY))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(second["summary"]["sent"], 1);
}

#[tokio::test]
async fn calm_weather_sends_no_email() {
    let test_app = TestApp::spawn_app().await;
    test_app.add_subscriber(subscriber("calm@example.com", "Lisbon, PT"));
    test_app.mount_forecast(22.0, 4.0, "Clouds").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let body: serde_json::Value = test_app
        .post_dispatch(Some(ADMIN_API_KEY))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["summary"]["attempted"], 1);
    assert_eq!(body["summary"]["quiet"], 1);
}
