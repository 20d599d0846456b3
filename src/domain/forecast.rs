use chrono::{DateTime, Utc};

/// Weather at the moment the snapshot was fetched. Only used to give context in
/// the alert sent to the subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: String,
    pub description: String,
}

/// One future data point of a forecast.
///
/// Every field is optional because upstream data is not trusted: a point missing
/// any of them is ignored by the evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastPoint {
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub wind_speed: Option<f64>,
    pub condition: Option<String>,
}

impl ForecastPoint {
    pub fn new(
        timestamp: DateTime<Utc>,
        temperature: f64,
        wind_speed: f64,
        condition: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Some(timestamp),
            temperature: Some(temperature),
            wind_speed: Some(wind_speed),
            condition: Some(condition.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSnapshot {
    pub current: CurrentConditions,
    pub points: Vec<ForecastPoint>,
}
