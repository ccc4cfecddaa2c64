//! # Domain Models
//!
//! The gossip post as it is stored, and the JSON shapes exchanged between
//! the HTTP surface and the client. Ids are UUID v7, so they sort by
//! creation time.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::expiry::{self, ExpiryHours};

/// The categories the composer offers. The server does not enforce them.
pub const KNOWN_CATEGORIES: [&str; 5] = ["General", "Traffic", "Emergency", "Event", "News"];
pub const DEFAULT_CATEGORY: &str = "General";

pub const MAX_SUBJECT_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 250;

/// Upper bound on the number of records a single listing reads.
pub const LIST_CAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Whether the author pinned the post at their device location or picked
/// a point on the map. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationPreference {
    #[default]
    Current,
    Map,
}

impl LocationPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationPreference::Current => "current",
            LocationPreference::Map => "map",
        }
    }

    /// Unknown or missing values fall back to `current`.
    pub fn parse_lossy(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("map") => LocationPreference::Map,
            _ => LocationPreference::Current,
        }
    }
}

/// Attribution for a post. Backed by a fixed value until real accounts exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A persisted gossip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipPost {
    pub id: Uuid,
    pub author_id: AuthorId,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub location_preference: LocationPreference,
    pub coordinates: Option<Coordinates>,
    /// Stamped by the server at insertion.
    pub created_at: DateTime<Utc>,
    pub expires_in_hours: ExpiryHours,
    /// Always `created_at + expires_in_hours`; the persisted source of truth.
    pub expires_at: DateTime<Utc>,
}

impl GossipPost {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        expiry::is_expired(self.expires_at, now)
    }
}

/// A validated post waiting for the store to assign its id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGossip {
    pub author_id: AuthorId,
    pub subject: String,
    pub description: String,
    pub category: String,
    pub location_preference: LocationPreference,
    pub coordinates: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
    pub expires_in_hours: ExpiryHours,
    pub expires_at: DateTime<Utc>,
}

impl NewGossip {
    pub fn into_post(self, id: Uuid) -> GossipPost {
        GossipPost {
            id,
            author_id: self.author_id,
            subject: self.subject,
            description: self.description,
            category: self.category,
            location_preference: self.location_preference,
            coordinates: self.coordinates,
            created_at: self.created_at,
            expires_in_hours: self.expires_in_hours,
            expires_at: self.expires_at,
        }
    }
}

/// Ordered-limited read against the store: newest first, at most `limit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GossipQuery {
    pub limit: usize,
    pub category: Option<String>,
}

impl GossipQuery {
    pub fn matches(&self, post: &GossipPost) -> bool {
        self.category.as_deref().map_or(true, |c| post.category == c)
    }
}

/// Raw input to [`crate::GossipService::submit`], before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub subject: String,
    pub description: String,
    pub category: Option<String>,
    pub location_preference: LocationPreference,
    pub coordinates: Option<Coordinates>,
    /// Anything the caller sent; normalized by the expiry policy.
    pub expires_in_hours: Option<Value>,
}

// ── Wire shapes ─────────────────────────────────────────────────────────────

/// Body of `POST /submitGossip`. Every field is optional here so that the
/// handler can answer a missing one with a 400 instead of a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGossipRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gossip_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_preference: Option<String>,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in_hours: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitGossipResponse {
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListGossipsResponse {
    pub items: Vec<GossipView>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteGossipRequest {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A post as the listing endpoint returns it.
///
/// Timestamps travel as RFC 3339 strings. The optional fields are optional
/// so that the client tolerates records written before they existed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GossipView {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub category: String,
    /// Creation time.
    pub freshness: String,
    #[serde(default)]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub expires_in_hours: Option<ExpiryHours>,
    #[serde(default)]
    pub expired: bool,
    #[serde(default)]
    pub location_preference: Option<LocationPreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
}

impl GossipView {
    /// Projects a post, computing `expired` against `now`.
    pub fn from_post(post: &GossipPost, now: DateTime<Utc>) -> Self {
        Self {
            id: post.id,
            title: post.subject.clone(),
            body: post.description.clone(),
            category: post.category.clone(),
            freshness: to_wire_timestamp(post.created_at),
            location: post.coordinates,
            expires_at: Some(to_wire_timestamp(post.expires_at)),
            expires_in_hours: Some(post.expires_in_hours),
            expired: post.is_expired(now),
            location_preference: Some(post.location_preference),
            author_id: Some(post.author_id.clone()),
        }
    }
}

pub fn to_wire_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_preference_is_lossy() {
        assert_eq!(LocationPreference::parse_lossy(Some("map")), LocationPreference::Map);
        assert_eq!(LocationPreference::parse_lossy(Some(" MAP ")), LocationPreference::Map);
        assert_eq!(LocationPreference::parse_lossy(Some("satellite")), LocationPreference::Current);
        assert_eq!(LocationPreference::parse_lossy(None), LocationPreference::Current);
    }

    #[test]
    fn test_coordinates_range() {
        assert!(Coordinates { latitude: 17.44, longitude: 78.37 }.is_valid());
        assert!(Coordinates { latitude: -90.0, longitude: 180.0 }.is_valid());
        assert!(!Coordinates { latitude: 91.0, longitude: 0.0 }.is_valid());
        assert!(!Coordinates { latitude: 0.0, longitude: f64::NAN }.is_valid());
    }

    #[test]
    fn test_submit_request_uses_camel_case() {
        let request: SubmitGossipRequest = serde_json::from_value(json!({
            "subject": "Speed trap",
            "description": "Checking till 9pm",
            "gossipType": "Safety",
            "locationPreference": "map",
            "location": { "latitude": 17.4, "longitude": 78.3 },
            "expiresInHours": "6"
        }))
        .unwrap();
        assert_eq!(request.gossip_type.as_deref(), Some("Safety"));
        assert_eq!(request.expires_in_hours, Some(json!("6")));
        assert_eq!(request.location.map(|c| c.latitude), Some(17.4));
    }

    #[test]
    fn test_view_tolerates_missing_optional_fields() {
        let view: GossipView = serde_json::from_value(json!({
            "id": "0190a8e4-0000-7000-8000-000000000000",
            "title": "Old",
            "body": "Record without expiry",
            "category": "General",
            "freshness": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(!view.expired);
        assert_eq!(view.expires_at, None);
        assert_eq!(view.location_preference, None);
    }
}
