use config::{Config, ConfigError, File};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};
use std::time::Duration as StdDuration;

use crate::dispatch::pacing::PacingPolicy;
use crate::dispatch::DispatchPolicy;
use crate::domain::subscriber_email::SubscriberEmail;

// chrono durations hold at most i64::MAX milliseconds.
const MAX_DURATION_SECONDS: i64 = i64::MAX / 1_000;

#[derive(Debug)]
pub enum Environment {
    Development,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub store: StoreSettings,
    pub email_client: EmailClientSettings,
    pub weather_client: WeatherClientSettings,
    pub dispatch: DispatchSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub admin_api_key: Secret<String>,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    pub api_key: Secret<String>,
    /// Public site hosting the unsubscribe page linked from every alert. It is
    /// not served by this application.
    pub unsubscribe_base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct WeatherClientSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    // secrecy protects secret information and prevents them to be exposed (eg: via logs)
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub name: String,
    pub require_ssl: bool,
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Postgres,
    InMemory,
}

#[derive(serde::Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
}

#[derive(serde::Deserialize, Clone)]
pub struct DispatchSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub horizon_seconds: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub cooldown_seconds: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub pacing_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub call_timeout_milliseconds: u64,
    pub schedule_enabled: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub schedule_interval_seconds: u64,
}

impl Settings {
    pub fn get_address(&self) -> String {
        format!(
            "{}:{}",
            self.application.get_host(),
            self.application.get_port()
        )
    }

    pub fn get_db_options(&self) -> PgConnectOptions {
        self.database.get_db_options()
    }

    pub fn get_email_client_sender(&self) -> Result<SubscriberEmail, String> {
        self.email_client.get_sender_email()
    }

    pub fn set_email_client_base_url(&mut self, new_base_url: String) {
        self.email_client.base_url = new_base_url
    }

    pub fn set_weather_client_base_url(&mut self, new_base_url: String) {
        self.weather_client.base_url = new_base_url
    }

    pub fn set_app_port(&mut self, port: u16) {
        self.application.port = port;
    }

    pub fn set_store_backend(&mut self, backend: StoreBackend) {
        self.store.backend = backend;
    }
}

impl DatabaseSettings {
    pub fn get_db_options(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        let mut db_options = PgConnectOptions::new()
            .host(&self.host)
            .password(self.password.expose_secret())
            .username(&self.username)
            .port(self.port)
            .database(&self.name)
            .ssl_mode(ssl_mode);

        db_options.log_statements(tracing::log::LevelFilter::Trace);

        db_options
    }
}

impl ApplicationSettings {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_host(&self) -> String {
        self.host.clone()
    }
}

impl EmailClientSettings {
    pub fn get_sender_email(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn get_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.timeout_milliseconds)
    }
}

impl WeatherClientSettings {
    pub fn get_timeout(&self) -> StdDuration {
        StdDuration::from_millis(self.timeout_milliseconds)
    }
}

impl DispatchSettings {
    /// Interval of the timer trigger, `None` when the schedule is disabled.
    pub fn get_schedule_interval(&self) -> Result<Option<StdDuration>, String> {
        if !self.schedule_enabled {
            return Ok(None);
        }
        if self.schedule_interval_seconds == 0 {
            return Err(String::from(
                "The dispatch schedule is enabled, its interval must be at least one second",
            ));
        }

        Ok(Some(StdDuration::from_secs(self.schedule_interval_seconds)))
    }

    pub fn get_policy(&self) -> Result<DispatchPolicy, String> {
        if self.horizon_seconds <= 0 || self.horizon_seconds > MAX_DURATION_SECONDS {
            return Err(format!(
                "{} is not a valid forecast horizon, it must be between 1 and {} seconds",
                self.horizon_seconds, MAX_DURATION_SECONDS
            ));
        }
        if self.cooldown_seconds < 0 || self.cooldown_seconds > MAX_DURATION_SECONDS {
            return Err(format!(
                "{} is not a valid cooldown, it must be between 0 and {} seconds",
                self.cooldown_seconds, MAX_DURATION_SECONDS
            ));
        }

        Ok(DispatchPolicy {
            horizon: chrono::Duration::seconds(self.horizon_seconds),
            cooldown: chrono::Duration::seconds(self.cooldown_seconds),
            pacing: PacingPolicy::new(StdDuration::from_millis(self.pacing_milliseconds)),
            call_timeout: StdDuration::from_millis(self.call_timeout_milliseconds),
        })
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            unknown_env => Err(format!(
                "{} is not supported environment. Use either 'development' or 'production'.",
                unknown_env
            )),
        }
    }
}

pub fn get_configuration() -> Result<Settings, ConfigError> {
    let root_path = std::env::current_dir().map_err(|err| {
        ConfigError::Message(format!("Failed to determine the current directory: {}", err))
    })?;
    let config_directory = root_path.join("config");
    // Uses development environment by default
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(ConfigError::Message)?;
    let config_base_filepath = config_directory.join("base");
    let config_env_filepath = config_directory.join(environment.as_str());

    // It merges the base configuration file with the one from the specific environment (development or production)
    let settings = Config::builder()
        .add_source(File::from(config_base_filepath).required(true))
        .add_source(File::from(config_env_filepath).required(true))
        // Merge settings from environment variables with a prefix of APP and "__" separator
        // E.g APP_DISPATCH__COOLDOWN_SECONDS would set Settings.dispatch.cooldown_seconds
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .build()?;

    tracing::info!("Application environment = {:?}", environment);

    // Try to convert the value from the configuration file into a Settings type
    settings.try_deserialize()
}
