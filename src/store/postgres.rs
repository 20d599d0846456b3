use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};

use super::{StoreError, SubscriptionStore};
use crate::domain::location::{Coordinates, Location, LocationName};
use crate::domain::preferences::AlertPreferences;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;

pub struct PostgresSubscriptionStore {
    db_pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    #[tracing::instrument(name = "Fetch active subscriptions", skip(self))]
    async fn list_active(&self) -> Result<Vec<Subscriber>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT email, location_name, latitude, longitude, is_active, subscribed_at,
                   last_alert_sent, wind_threshold, rain_threshold, temperature_alerts,
                   storm_alerts
            FROM subscriptions
            WHERE is_active = true
            ORDER BY subscribed_at, email
            "#,
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })?;

        let subscribers = rows
            .iter()
            .filter_map(|row| match parse_subscriber(row) {
                Ok(subscriber) => Some(subscriber),
                Err(err) => {
                    tracing::warn!("Skipping unreadable subscription row: {}", err);
                    None
                }
            })
            .collect();

        Ok(subscribers)
    }

    #[tracing::instrument(
        name = "Record alert sent",
        skip(self, email, sent_at),
        fields(subscriber_email = %email, sent_at = %sent_at)
    )]
    async fn record_alert_sent(
        &self,
        email: &SubscriberEmail,
        sent_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET last_alert_sent = $1
            WHERE email = $2
            "#,
        )
        .bind(sent_at)
        .bind(email.as_ref())
        .execute(&self.db_pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UnknownSubscriber(email.to_string()));
        }

        Ok(())
    }
}

fn parse_subscriber(row: &PgRow) -> Result<Subscriber, String> {
    let column = |err: sqlx::Error| err.to_string();

    let email = SubscriberEmail::parse(row.try_get("email").map_err(column)?)?;
    let name = LocationName::parse(row.try_get("location_name").map_err(column)?)?;
    let latitude: Option<f64> = row.try_get("latitude").map_err(column)?;
    let longitude: Option<f64> = row.try_get("longitude").map_err(column)?;
    let coordinates = match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Coordinates::parse(latitude, longitude).ok(),
        _ => None,
    };

    Ok(Subscriber {
        email,
        location: Location { name, coordinates },
        is_active: row.try_get("is_active").map_err(column)?,
        subscribed_at: row.try_get("subscribed_at").map_err(column)?,
        last_alert_sent: row.try_get("last_alert_sent").map_err(column)?,
        preferences: parse_preferences(row).map_err(column)?,
    })
}

/// Preferences are stored as nullable columns. A row with none of them set has
/// no preference set; partially set rows are completed with the defaults.
fn parse_preferences(row: &PgRow) -> Result<Option<AlertPreferences>, sqlx::Error> {
    Ok(preferences_from_columns(
        row.try_get("wind_threshold")?,
        row.try_get("rain_threshold")?,
        row.try_get("temperature_alerts")?,
        row.try_get("storm_alerts")?,
    ))
}

fn preferences_from_columns(
    wind_threshold: Option<f64>,
    rain_threshold: Option<f64>,
    temperature_alerts: Option<bool>,
    storm_alerts: Option<bool>,
) -> Option<AlertPreferences> {
    if wind_threshold.is_none()
        && rain_threshold.is_none()
        && temperature_alerts.is_none()
        && storm_alerts.is_none()
    {
        return None;
    }

    let defaults = AlertPreferences::default();
    Some(AlertPreferences {
        wind_threshold: wind_threshold.unwrap_or(defaults.wind_threshold),
        rain_threshold: rain_threshold.unwrap_or(defaults.rain_threshold),
        temperature_alerts: temperature_alerts.unwrap_or(defaults.temperature_alerts),
        storm_alerts: storm_alerts.unwrap_or(defaults.storm_alerts),
    })
}
