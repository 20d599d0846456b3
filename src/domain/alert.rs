use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertCategory {
    Storm,
    ExtremeHeat,
    ExtremeCold,
    HighWind,
    /// Precipitation-class alert. Nothing in the evaluator emits it yet, but
    /// preferences already carry a rain threshold for it.
    Rain,
    Other(String),
}

impl AsRef<str> for AlertCategory {
    fn as_ref(&self) -> &str {
        match self {
            AlertCategory::Storm => "storm",
            AlertCategory::ExtremeHeat => "extreme_heat",
            AlertCategory::ExtremeCold => "extreme_cold",
            AlertCategory::HighWind => "high_wind",
            AlertCategory::Rain => "rain",
            AlertCategory::Other(category) => category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AlertSeverity {
    Low,
    Moderate,
    High,
    Severe,
}

impl AsRef<str> for AlertSeverity {
    fn as_ref(&self) -> &str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Moderate => "moderate",
            AlertSeverity::High => "high",
            AlertSeverity::Severe => "severe",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Magnitude {
    pub value: f64,
    pub unit: &'static str,
}

/// A severe weather condition found in one forecast point.
///
/// Events only live for the evaluation cycle that produced them and are never
/// persisted, so they expose read-only accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    category: AlertCategory,
    severity: AlertSeverity,
    description: String,
    forecast_at: DateTime<Utc>,
    magnitude: Option<Magnitude>,
}

impl AlertEvent {
    pub fn new(
        category: AlertCategory,
        severity: AlertSeverity,
        description: impl Into<String>,
        forecast_at: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            severity,
            description: description.into(),
            forecast_at,
            magnitude: None,
        }
    }

    pub fn with_magnitude(mut self, value: f64, unit: &'static str) -> Self {
        self.magnitude = Some(Magnitude { value, unit });
        self
    }

    pub fn category(&self) -> &AlertCategory {
        &self.category
    }

    pub fn severity(&self) -> AlertSeverity {
        self.severity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn forecast_at(&self) -> DateTime<Utc> {
        self.forecast_at
    }

    pub fn magnitude(&self) -> Option<&Magnitude> {
        self.magnitude.as_ref()
    }
}
