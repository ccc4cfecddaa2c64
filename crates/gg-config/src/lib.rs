//! # gg-config
//!
//! Layered server settings: built-in defaults, then an optional
//! `geogossip.toml` next to the binary, then `GEOGOSSIP__*` environment
//! variables (`GEOGOSSIP__SERVER__PORT=9000`). A `.env` file is loaded into
//! the environment first.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "geogossip";
pub const ENV_PREFIX: &str = "GEOGOSSIP";

/// Sentinel `database.url` selecting the in-process store.
pub const MEMORY_DATABASE_URL: &str = "memory";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub author: AuthorSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Defaults to actix-web's choice (one per physical core).
    #[serde(default)]
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseSettings {
    /// `memory`, or a sqlx SQLite URL such as `sqlite:geogossip.db`.
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthorSettings {
    /// Attribution stamped on every post until accounts exist.
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogSettings {
    /// `tracing-subscriber` env-filter directives; `RUST_LOG` wins when set.
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Settings {
    /// Loads `.env`, then the default file and environment layers.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        Self::from_builder(
            defaults()?
                .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
                .add_source(environment()),
        )
    }

    /// Defaults overlaid with a TOML document.
    pub fn from_toml(toml: &str) -> Result<Self, SettingsError> {
        Self::from_builder(defaults()?.add_source(File::from_str(toml, config::FileFormat::Toml)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.database.url.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "database.url",
                reason: "must not be empty".to_string(),
            });
        }
        if self.author.id.trim().is_empty() {
            return Err(SettingsError::Invalid {
                key: "author.id",
                reason: "must not be empty".to_string(),
            });
        }
        if self.server.workers == Some(0) {
            return Err(SettingsError::Invalid {
                key: "server.workers",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database.url.eq_ignore_ascii_case(MEMORY_DATABASE_URL)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite:geogossip.db")?
        .set_default("database.max_connections", 5)?
        .set_default("author.id", "local-user")?
        .set_default("log.filter", "info")?
        .set_default("log.format", "pretty")
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
