//! Client configuration, passed explicitly to the [`crate::SyncController`].
//!
//! Loaded from `GEOGOSSIP_CLIENT__*` environment variables, for example
//! `GEOGOSSIP_CLIENT__ENDPOINT__BASE_URL=http://127.0.0.1:8080`.

use chrono::{FixedOffset, Offset, Utc};
use config::{Config, Environment};
use gg_core::models::Coordinates;
use serde::Deserialize;

use crate::theme::ThemeName;

/// Fallback pin for posts composed without a location.
pub const DEFAULT_LOCATION: Coordinates = Coordinates {
    latitude: 17.4435,
    longitude: 78.3772,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSettings {
    #[serde(default)]
    pub endpoint: EndpointSettings,
    /// Offset used when rendering timestamps for display.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub theme: ThemeName,
    #[serde(default = "default_location")]
    pub default_location: Coordinates,
}

fn default_location() -> Coordinates {
    DEFAULT_LOCATION
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: EndpointSettings::default(),
            utc_offset_minutes: 0,
            theme: ThemeName::default(),
            default_location: DEFAULT_LOCATION,
        }
    }
}

impl ClientSettings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("GEOGOSSIP_CLIENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Talks to an explicit base URL with everything else defaulted.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            endpoint: EndpointSettings {
                base_url: Some(base_url.into()),
                ..EndpointSettings::default()
            },
            ..Self::default()
        }
    }

    /// Out-of-range offsets fall back to UTC.
    pub fn display_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }
}

/// Where the gossip functions live.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointSettings {
    /// Wins over everything below when set.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub emulator_host: Option<String>,
    #[serde(default)]
    pub use_emulator: bool,
}

fn default_project_id() -> String {
    "geogossip-dev".to_string()
}

fn default_region() -> String {
    "us-central1".to_string()
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            project_id: default_project_id(),
            region: default_region(),
            emulator_host: None,
            use_emulator: false,
        }
    }
}

impl EndpointSettings {
    pub fn base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim().trim_end_matches('/').to_string();
        }
        match self.emulator_host.as_deref().filter(|_| self.use_emulator) {
            Some(host) => format!(
                "{}/{}/{}",
                host.trim_end_matches('/'),
                self.project_id,
                self.region
            ),
            None => format!("https://{}-{}.cloudfunctions.net", self.region, self.project_id),
        }
    }
}
