use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_COOLDOWN_SECONDS: i64 = 21_600;

/// Whether a subscriber may be alerted at `now`. Subscribers never alerted before
/// always may; otherwise at least `cooldown` must have elapsed since the last
/// alert, whatever its category was.
pub fn may_dispatch(
    last_alert_sent: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> bool {
    match last_alert_sent {
        None => true,
        Some(last_alert_sent) => now - last_alert_sent >= cooldown,
    }
}
