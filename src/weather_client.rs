use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use std::time;

use crate::dispatch::{ForecastError, WeatherProvider};
use crate::domain::forecast::{CurrentConditions, ForecastPoint, ForecastSnapshot};
use crate::domain::location::{Coordinates, Location};

const REQUEST_TIMEOUT: time::Duration = time::Duration::from_secs(10);

/// Client for an OpenWeatherMap compatible API: geocoding, current weather and the
/// 3-hourly forecast.
pub struct WeatherClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

#[derive(serde::Deserialize)]
struct GeocodingResult {
    lat: f64,
    lon: f64,
}

#[derive(serde::Deserialize)]
struct CurrentWeatherResponse {
    main: CurrentMain,
    wind: Wind,
    weather: Vec<WeatherCondition>,
}

#[derive(serde::Deserialize)]
struct CurrentMain {
    temp: f64,
    humidity: f64,
}

#[derive(serde::Deserialize)]
struct Wind {
    speed: Option<f64>,
}

#[derive(serde::Deserialize)]
struct WeatherCondition {
    main: Option<String>,
    description: Option<String>,
}

#[derive(serde::Deserialize)]
struct ForecastResponse {
    list: Vec<serde_json::Value>,
}

#[derive(serde::Deserialize)]
struct ForecastItem {
    dt: Option<i64>,
    main: Option<ForecastMain>,
    wind: Option<Wind>,
    #[serde(default)]
    weather: Vec<WeatherCondition>,
}

#[derive(serde::Deserialize)]
struct ForecastMain {
    temp: Option<f64>,
}

impl From<ForecastItem> for ForecastPoint {
    fn from(item: ForecastItem) -> Self {
        ForecastPoint {
            timestamp: item
                .dt
                .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single()),
            temperature: item.main.and_then(|main| main.temp),
            wind_speed: item.wind.and_then(|wind| wind.speed),
            condition: item
                .weather
                .into_iter()
                .next()
                .and_then(|condition| condition.main),
        }
    }
}

impl WeatherClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: Option<time::Duration>,
    ) -> Result<WeatherClient, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout.unwrap_or(REQUEST_TIMEOUT))
            .build()?;

        Ok(WeatherClient {
            http_client,
            base_url,
            api_key,
        })
    }

    #[tracing::instrument(name = "Resolve location coordinates", skip(self))]
    async fn geocode(&self, location: &Location) -> Result<Coordinates, ForecastError> {
        let url = format!("{}/geo/1.0/direct", self.base_url);
        let results: Vec<GeocodingResult> = self
            .get_json(
                &url,
                &[
                    ("q", location.name.as_ref()),
                    ("limit", "1"),
                    ("appid", self.api_key.expose_secret().as_str()),
                ],
                location,
            )
            .await?;

        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| ForecastError::LocationInvalid(location.to_string()))?;

        Coordinates::parse(first.lat, first.lon)
            .map_err(|_| ForecastError::LocationInvalid(location.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
        location: &Location,
    ) -> Result<T, ForecastError> {
        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| ForecastError::ProviderUnavailable(Box::new(err)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ForecastError::LocationInvalid(location.to_string()));
        }

        response
            .error_for_status()
            .map_err(|err| ForecastError::ProviderUnavailable(Box::new(err)))?
            .json::<T>()
            .await
            .map_err(|err| ForecastError::ProviderUnavailable(Box::new(err)))
    }
}

#[async_trait]
impl WeatherProvider for WeatherClient {
    #[tracing::instrument(name = "Fetch forecast snapshot", skip(self, location), fields(location = %location))]
    async fn forecast(&self, location: &Location) -> Result<ForecastSnapshot, ForecastError> {
        let coordinates = match location.coordinates {
            Some(coordinates) => coordinates,
            None => self.geocode(location).await?,
        };
        let latitude = coordinates.latitude().to_string();
        let longitude = coordinates.longitude().to_string();
        let query = [
            ("lat", latitude.as_str()),
            ("lon", longitude.as_str()),
            ("appid", self.api_key.expose_secret().as_str()),
            ("units", "metric"),
        ];

        let current: CurrentWeatherResponse = self
            .get_json(&format!("{}/data/2.5/weather", self.base_url), &query, location)
            .await?;
        let forecast: ForecastResponse = self
            .get_json(&format!("{}/data/2.5/forecast", self.base_url), &query, location)
            .await?;

        let condition = current.weather.into_iter().next();
        let points = forecast
            .list
            .into_iter()
            .filter_map(|item| serde_json::from_value::<ForecastItem>(item).ok())
            .map(ForecastPoint::from)
            .collect();

        Ok(ForecastSnapshot {
            current: CurrentConditions {
                temperature: current.main.temp,
                humidity: current.main.humidity,
                wind_speed: current.wind.speed.unwrap_or_default(),
                condition: condition
                    .as_ref()
                    .and_then(|condition| condition.main.clone())
                    .unwrap_or_default(),
                description: condition
                    .and_then(|condition| condition.description)
                    .unwrap_or_default(),
            },
            points,
        })
    }
}
