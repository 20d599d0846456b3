use crate::domain::alert::{AlertCategory, AlertEvent};
use crate::domain::preferences::AlertPreferences;

/// Drops the events a subscriber opted out of. Missing preferences behave like
/// [`AlertPreferences::default`]. Categories this filter does not know about are
/// always kept.
pub fn filter(events: Vec<AlertEvent>, preferences: Option<&AlertPreferences>) -> Vec<AlertEvent> {
    let defaults = AlertPreferences::default();
    let preferences = preferences.unwrap_or(&defaults);

    events
        .into_iter()
        .filter(|event| is_wanted(event, preferences))
        .collect()
}

fn is_wanted(event: &AlertEvent, preferences: &AlertPreferences) -> bool {
    let magnitude = event.magnitude().map(|magnitude| magnitude.value);

    match event.category() {
        AlertCategory::HighWind => {
            magnitude.map_or(false, |speed| speed >= preferences.wind_threshold)
        }
        AlertCategory::Rain => magnitude.map_or(false, |rate| rate >= preferences.rain_threshold),
        AlertCategory::Storm => preferences.storm_alerts,
        AlertCategory::ExtremeHeat | AlertCategory::ExtremeCold => preferences.temperature_alerts,
        AlertCategory::Other(_) => true,
    }
}
