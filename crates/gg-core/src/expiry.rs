//! # Expiry Policy
//!
//! Gossips live for one of a fixed set of durations. Anything outside that
//! set collapses to the shortest one, so a malformed request can never
//! produce a long-lived post.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The allowed lifetimes of a gossip, in hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ExpiryHours {
    #[default]
    One,
    Six,
    Twelve,
    TwentyFour,
}

impl ExpiryHours {
    /// Ordered the way the composer offers them.
    pub const ALL: [ExpiryHours; 4] = [
        ExpiryHours::TwentyFour,
        ExpiryHours::Twelve,
        ExpiryHours::Six,
        ExpiryHours::One,
    ];

    pub const fn hours(self) -> u32 {
        match self {
            ExpiryHours::One => 1,
            ExpiryHours::Six => 6,
            ExpiryHours::Twelve => 12,
            ExpiryHours::TwentyFour => 24,
        }
    }

    pub fn duration(self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.hours()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unsupported expiry duration: {0}h")]
pub struct UnsupportedDuration(pub u32);

impl TryFrom<u32> for ExpiryHours {
    type Error = UnsupportedDuration;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ExpiryHours::ALL
            .into_iter()
            .find(|h| h.hours() == value)
            .ok_or(UnsupportedDuration(value))
    }
}

impl From<ExpiryHours> for u32 {
    fn from(value: ExpiryHours) -> Self {
        value.hours()
    }
}

/// Maps a numeric candidate onto the allowed set. Non-finite, fractional,
/// negative and unknown values all become [`ExpiryHours::One`].
pub fn normalize_hours(candidate: f64) -> ExpiryHours {
    if !candidate.is_finite() {
        return ExpiryHours::One;
    }
    ExpiryHours::ALL
        .into_iter()
        .find(|h| f64::from(h.hours()) == candidate)
        .unwrap_or(ExpiryHours::One)
}

/// Normalizes a requested duration as it arrives on the wire.
///
/// Numbers are judged directly and numeric strings (`"12"`) are parsed first.
/// Every other JSON value maps to one hour. Never fails.
pub fn normalize_duration(candidate: &Value) -> ExpiryHours {
    match candidate {
        Value::Number(n) => n.as_f64().map_or(ExpiryHours::One, normalize_hours),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_or(ExpiryHours::One, normalize_hours),
        _ => ExpiryHours::One,
    }
}

/// `created_at + hours`.
pub fn compute_expiry(created_at: DateTime<Utc>, hours: ExpiryHours) -> DateTime<Utc> {
    created_at + hours.duration()
}

/// A post is expired at its expiry instant, not after it.
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}
