use chrono::{DateTime, Utc};

use crate::domain::location::Location;
use crate::domain::preferences::AlertPreferences;
use crate::domain::subscriber_email::SubscriberEmail;

#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub email: SubscriberEmail,
    pub location: Location,
    pub is_active: bool,
    pub subscribed_at: DateTime<Utc>,
    pub last_alert_sent: Option<DateTime<Utc>>,
    pub preferences: Option<AlertPreferences>,
}

impl Subscriber {
    /// A freshly subscribed, active subscriber with no alert history.
    pub fn new(email: SubscriberEmail, location: Location) -> Self {
        Self {
            email,
            location,
            is_active: true,
            subscribed_at: Utc::now(),
            last_alert_sent: None,
            preferences: None,
        }
    }

    pub fn with_preferences(mut self, preferences: AlertPreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_last_alert_sent(mut self, sent_at: DateTime<Utc>) -> Self {
        self.last_alert_sent = Some(sent_at);
        self
    }

    pub fn effective_preferences(&self) -> AlertPreferences {
        self.preferences.clone().unwrap_or_default()
    }
}
