//! Display strings for gossip timestamps.

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};

pub const EXPIRED_LABEL: &str = "Expired";

/// `DD-MM-YYYY hh:mm AM` in the given offset. Strings that are not
/// RFC 3339 timestamps are shown as they came.
pub fn format_freshness(raw: &str, offset: FixedOffset) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(at) => at.with_timezone(&offset).format("%d-%m-%Y %I:%M %p").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Time left until `expires_at`.
///
/// `"{H}h {MM}m left"`, or `"{M}m left"` under an hour. Remaining time is
/// rounded up to whole minutes, so anything still active shows at least
/// one minute.
pub fn countdown(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let remaining = expires_at - now;
    if remaining <= TimeDelta::zero() {
        return EXPIRED_LABEL.to_string();
    }

    let minutes = ((remaining.num_milliseconds() + 59_999) / 60_000).max(1);
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m left")
    } else {
        format!("{minutes}m left")
    }
}

/// Countdown for a wire timestamp; `None` when there is no usable expiry.
pub fn format_expiry_countdown(expires_at: Option<&str>, now: DateTime<Utc>) -> Option<String> {
    let expires_at = DateTime::parse_from_rfc3339(expires_at?).ok()?;
    Some(countdown(expires_at.with_timezone(&Utc), now))
}
