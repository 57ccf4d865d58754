use chrono::{DateTime, Duration, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// True when `at` is no older than `window` relative to `now`. Timestamps in
/// the future count as recent.
pub fn is_within(at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(at) <= window
}
