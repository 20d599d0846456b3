use chrono::Utc;
use reqwest::Response;
use std::sync::{Arc, Once};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use weather_guard::{
    config::{get_configuration, StoreBackend},
    domain::{
        location::{Coordinates, Location, LocationName},
        subscriber::Subscriber,
        subscriber_email::SubscriberEmail,
    },
    startup::Application,
    store::{InMemorySubscriptionStore, SubscriptionStore},
    telemetry::{get_subscriber, init_subscriber},
};

pub const ADMIN_API_KEY: &str = "test-admin-key";

static TRACING: Once = Once::new();

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemorySubscriptionStore>,
    pub weather_server: MockServer,
    pub email_server: MockServer,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let weather_server = MockServer::start().await;
        let email_server = MockServer::start().await;
        let address = launch(store.clone(), &weather_server, &email_server).await;

        TestApp {
            address,
            store,
            weather_server,
            email_server,
        }
    }

    pub fn add_subscriber(&self, subscriber: Subscriber) {
        self.store
            .upsert(subscriber)
            .expect("Failed to store the subscriber.");
    }

    pub async fn post_dispatch(&self, token: Option<&str>) -> Response {
        let client = reqwest::Client::new();
        let mut request = client.post(format!("{}/admin/dispatch", self.address));

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request.send().await.expect("Failed to execute request.")
    }

    pub async fn get_status(&self) -> Response {
        reqwest::Client::new()
            .get(format!("{}/admin/status", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_subscriptions(&self, token: Option<&str>) -> Response {
        let client = reqwest::Client::new();
        let mut request = client.get(format!("{}/admin/subscriptions", self.address));

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        request.send().await.expect("Failed to execute request.")
    }

    /// Current weather plus a forecast with a single point three hours from now.
    pub async fn mount_forecast(&self, temperature: f64, wind_speed: f64, condition: &str) {
        let dt = (Utc::now() + chrono::Duration::hours(3)).timestamp();

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "main": { "temp": 29.0, "humidity": 35 },
                "wind": { "speed": 3.5 },
                "weather": [{ "main": "Clear", "description": "clear sky" }]
            })))
            .mount(&self.weather_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "list": [{
                    "dt": dt,
                    "main": { "temp": temperature },
                    "wind": { "speed": wind_speed },
                    "weather": [{ "main": condition }]
                }]
            })))
            .mount(&self.weather_server)
            .await;
    }
}

/// Starts the application on top of `store` and returns its base address.
pub async fn launch(
    store: Arc<dyn SubscriptionStore>,
    weather_server: &MockServer,
    email_server: &MockServer,
) -> String {
    // Set TEST_LOG to see the application logs while running the tests
    TRACING.call_once(|| {
        let name = String::from("test");
        let filter = String::from("debug");
        if std::env::var("TEST_LOG").is_ok() {
            init_subscriber(get_subscriber(name, filter, std::io::stdout));
        } else {
            init_subscriber(get_subscriber(name, filter, std::io::sink));
        }
    });

    let mut config = get_configuration().expect("Missing configuration file.");

    // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
    // take into account: when port is 0, the OS will search for the first available port
    config.set_app_port(0);
    config.set_email_client_base_url(email_server.uri());
    config.set_weather_client_base_url(weather_server.uri());
    config.set_store_backend(StoreBackend::InMemory);
    config.application.admin_api_key = secrecy::Secret::new(ADMIN_API_KEY.to_string());
    config.dispatch.schedule_enabled = false;
    config.dispatch.pacing_milliseconds = 0;

    let application = Application::build_with_store(config, store)
        .await
        .expect("Failed to build application.");
    let address = format!("http://127.0.0.1:{}", application.get_port());

    tokio::spawn(application.run_until_stop());

    address
}

pub fn subscriber(email: &str, location: &str) -> Subscriber {
    let location = Location::new(LocationName::parse(location.to_string()).unwrap())
        .with_coordinates(Coordinates::parse(37.38, -5.98).unwrap());

    Subscriber::new(SubscriberEmail::parse(email.to_string()).unwrap(), location)
}

pub fn email(address: &str) -> SubscriberEmail {
    SubscriberEmail::parse(address.to_string()).unwrap()
}
