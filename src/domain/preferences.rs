pub const DEFAULT_WIND_THRESHOLD: f64 = 10.0;
pub const DEFAULT_RAIN_THRESHOLD: f64 = 5.0;

/// Per-subscriber alert thresholds.
///
/// Wind is expressed in meters per second and rain in millimeters per hour.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPreferences {
    pub wind_threshold: f64,
    pub rain_threshold: f64,
    pub temperature_alerts: bool,
    pub storm_alerts: bool,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self {
            wind_threshold: DEFAULT_WIND_THRESHOLD,
            rain_threshold: DEFAULT_RAIN_THRESHOLD,
            temperature_alerts: true,
            storm_alerts: true,
        }
    }
}
