use chrono::{DateTime, Duration, Utc};

use crate::domain::alert::{AlertCategory, AlertEvent, AlertSeverity};
use crate::domain::forecast::{ForecastPoint, ForecastSnapshot};

pub const DEFAULT_HORIZON_SECONDS: i64 = 86_400;

const THUNDERSTORM_CONDITION: &str = "Thunderstorm";
const EXTREME_HEAT_CELSIUS: f64 = 35.0;
const EXTREME_COLD_CELSIUS: f64 = -10.0;
const HIGH_WIND_METERS_PER_SECOND: f64 = 15.0;

/// Turns a forecast into the list of alert events expected between `now` and
/// `now + horizon` (both ends included).
///
/// Every point is checked on its own against each rule, so a single point may
/// produce several events and consecutive points may produce repeated ones.
/// Events keep the order of the points they come from. Points with missing or
/// non-finite fields are skipped.
pub fn evaluate(
    snapshot: &ForecastSnapshot,
    now: DateTime<Utc>,
    horizon: Duration,
) -> Vec<AlertEvent> {
    let horizon_end = now
        .checked_add_signed(horizon)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    snapshot
        .points
        .iter()
        .filter_map(ReadablePoint::from_point)
        .filter(|point| point.timestamp >= now && point.timestamp <= horizon_end)
        .flat_map(|point| point.alerts())
        .collect()
}

struct ReadablePoint<'a> {
    timestamp: DateTime<Utc>,
    temperature: f64,
    wind_speed: f64,
    condition: &'a str,
}

impl<'a> ReadablePoint<'a> {
    fn from_point(point: &'a ForecastPoint) -> Option<Self> {
        let temperature = point.temperature.filter(|value| value.is_finite())?;
        let wind_speed = point.wind_speed.filter(|value| value.is_finite())?;

        Some(Self {
            timestamp: point.timestamp?,
            temperature,
            wind_speed,
            condition: point.condition.as_deref()?,
        })
    }

    fn alerts(&self) -> Vec<AlertEvent> {
        let mut alerts = Vec::new();

        if self.condition.eq_ignore_ascii_case(THUNDERSTORM_CONDITION) {
            alerts.push(AlertEvent::new(
                AlertCategory::Storm,
                AlertSeverity::Moderate,
                "Thunderstorm expected",
                self.timestamp,
            ));
        }

        if self.temperature > EXTREME_HEAT_CELSIUS {
            alerts.push(
                AlertEvent::new(
                    AlertCategory::ExtremeHeat,
                    AlertSeverity::High,
                    format!("Extreme heat warning: {}°C", self.temperature.round()),
                    self.timestamp,
                )
                .with_magnitude(self.temperature, "°C"),
            );
        }

        if self.temperature < EXTREME_COLD_CELSIUS {
            alerts.push(
                AlertEvent::new(
                    AlertCategory::ExtremeCold,
                    AlertSeverity::High,
                    format!("Extreme cold warning: {}°C", self.temperature.round()),
                    self.timestamp,
                )
                .with_magnitude(self.temperature, "°C"),
            );
        }

        if self.wind_speed > HIGH_WIND_METERS_PER_SECOND {
            alerts.push(
                AlertEvent::new(
                    AlertCategory::HighWind,
                    AlertSeverity::Moderate,
                    format!("High wind warning: {} m/s", self.wind_speed),
                    self.timestamp,
                )
                .with_magnitude(self.wind_speed, "m/s"),
            );
        }

        alerts
    }
}
