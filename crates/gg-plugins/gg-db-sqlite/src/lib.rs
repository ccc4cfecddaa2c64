//! # gg-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `gg-core` domain models.
//!
//! Timestamps are stored as Unix milliseconds so that `ORDER BY` on the
//! column is a plain integer sort.

use std::str::FromStr;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gg_core::expiry::ExpiryHours;
use gg_core::models::{AuthorId, Coordinates, GossipPost, GossipQuery, LocationPreference, NewGossip};
use gg_core::traits::GossipStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS gossips (
    id                  BLOB PRIMARY KEY NOT NULL,
    author_id           TEXT NOT NULL,
    subject             TEXT NOT NULL,
    description         TEXT NOT NULL,
    category            TEXT NOT NULL,
    location_preference TEXT NOT NULL,
    latitude            REAL,
    longitude           REAL,
    created_at_ms       INTEGER NOT NULL,
    expires_in_hours    INTEGER NOT NULL,
    expires_at_ms       INTEGER NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS gossips_by_created_at ON gossips (created_at_ms DESC)";

const SELECT_RECENT: &str = "SELECT id, author_id, subject, description, category, \
    location_preference, latitude, longitude, created_at_ms, expires_in_hours, expires_at_ms \
    FROM gossips ORDER BY created_at_ms DESC, id DESC LIMIT ?";

const SELECT_RECENT_IN_CATEGORY: &str = "SELECT id, author_id, subject, description, category, \
    location_preference, latitude, longitude, created_at_ms, expires_in_hours, expires_at_ms \
    FROM gossips WHERE category = ? ORDER BY created_at_ms DESC, id DESC LIMIT ?";

pub struct SqliteGossipStore {
    pool: SqlitePool,
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> anyhow::Result<Uuid> {
    Uuid::from_slice(blob).context("malformed gossip id")
}

fn millis_to_datetime(ms: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| anyhow!("timestamp out of range: {ms}"))
}

impl SqliteGossipStore {
    /// Connects with a default pool size of 5.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    /// Opens (creating if needed) the database at `url` and ensures the schema.
    ///
    /// In-memory databases are tied to a single connection, so the pool is
    /// pinned to one connection that never idles out.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url {url}"))?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        sqlx::query(CREATE_TABLE).execute(&pool).await?;
        sqlx::query(CREATE_INDEX).execute(&pool).await?;

        info!(url, in_memory, "sqlite gossip store ready");
        Ok(Self { pool })
    }

    fn row_to_post(row: &SqliteRow) -> anyhow::Result<GossipPost> {
        let latitude: Option<f64> = row.try_get("latitude")?;
        let longitude: Option<f64> = row.try_get("longitude")?;
        let hours: i64 = row.try_get("expires_in_hours")?;
        let preference: String = row.try_get("location_preference")?;

        Ok(GossipPost {
            id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice())?,
            author_id: AuthorId::new(row.try_get::<String, _>("author_id")?),
            subject: row.try_get("subject")?,
            description: row.try_get("description")?,
            category: row.try_get("category")?,
            location_preference: LocationPreference::parse_lossy(Some(&preference)),
            coordinates: latitude
                .zip(longitude)
                .map(|(latitude, longitude)| Coordinates { latitude, longitude }),
            created_at: millis_to_datetime(row.try_get("created_at_ms")?)?,
            expires_in_hours: ExpiryHours::try_from(u32::try_from(hours)?)?,
            expires_at: millis_to_datetime(row.try_get("expires_at_ms")?)?,
        })
    }
}

#[async_trait]
impl GossipStore for SqliteGossipStore {
    async fn insert(&self, gossip: NewGossip) -> anyhow::Result<GossipPost> {
        let post = gossip.into_post(Uuid::now_v7());

        sqlx::query(
            "INSERT INTO gossips (id, author_id, subject, description, category, location_preference, \
             latitude, longitude, created_at_ms, expires_in_hours, expires_at_ms) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(post.id))
        .bind(post.author_id.as_str())
        .bind(post.subject.as_str())
        .bind(post.description.as_str())
        .bind(post.category.as_str())
        .bind(post.location_preference.as_str())
        .bind(post.coordinates.map(|c| c.latitude))
        .bind(post.coordinates.map(|c| c.longitude))
        .bind(post.created_at.timestamp_millis())
        .bind(i64::from(post.expires_in_hours.hours()))
        .bind(post.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        debug!(id = %post.id, "stored gossip in sqlite");
        Ok(post)
    }

    async fn query_recent(&self, query: GossipQuery) -> anyhow::Result<Vec<GossipPost>> {
        let limit = i64::try_from(query.limit)?;
        let rows = match query.category.as_deref() {
            Some(category) => {
                sqlx::query(SELECT_RECENT_IN_CATEGORY)
                    .bind(category)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query(SELECT_RECENT)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(Self::row_to_post).collect()
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM gossips WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
