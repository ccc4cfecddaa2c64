//! # Gossip Service
//!
//! Validates submissions, stamps them with server time and expiry, and
//! serves the listing and deletion paths. Holds no mutable state of its own;
//! the store is the only shared resource.

use std::sync::Arc;

use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{GossipError, Result};
use crate::expiry::{self, ExpiryHours};
use crate::models::{
    GossipQuery, GossipView, NewGossip, Submission, DEFAULT_CATEGORY, LIST_CAP,
    MAX_DESCRIPTION_CHARS, MAX_SUBJECT_CHARS,
};
use crate::traits::{AuthorProvider, GossipStore};

#[derive(Clone)]
pub struct GossipService {
    store: Arc<dyn GossipStore>,
    clock: Arc<dyn Clock>,
    author: Arc<dyn AuthorProvider>,
}

impl GossipService {
    pub fn new(
        store: Arc<dyn GossipStore>,
        clock: Arc<dyn Clock>,
        author: Arc<dyn AuthorProvider>,
    ) -> Self {
        Self { store, clock, author }
    }

    /// Validates and persists a new gossip, returning its id.
    ///
    /// Nothing reaches the store unless subject and description survive
    /// trimming. The category is advisory: blanks become `General`, unknown
    /// names are kept as sent.
    #[instrument(skip_all, name = "gossip.submit")]
    pub async fn submit(&self, submission: Submission) -> Result<Uuid> {
        let subject = required_text("subject", &submission.subject, MAX_SUBJECT_CHARS)?;
        let description =
            required_text("description", &submission.description, MAX_DESCRIPTION_CHARS)?;

        if let Some(coordinates) = submission.coordinates {
            if !coordinates.is_valid() {
                return Err(GossipError::validation("location is out of range"));
            }
        }

        let category = submission
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();

        let expires_in_hours = submission
            .expires_in_hours
            .as_ref()
            .map_or(ExpiryHours::One, expiry::normalize_duration);

        let created_at = self.clock.now();
        let draft = NewGossip {
            author_id: self.author.current_author(),
            subject,
            description,
            category,
            location_preference: submission.location_preference,
            coordinates: submission.coordinates,
            created_at,
            expires_in_hours,
            expires_at: expiry::compute_expiry(created_at, expires_in_hours),
        };

        let post = self
            .store
            .insert(draft)
            .await
            .map_err(|e| persistence("insert", e))?;

        info!(id = %post.id, category = %post.category, expires_at = %post.expires_at, "gossip submitted");
        Ok(post.id)
    }

    /// Newest gossips first, capped at [`LIST_CAP`].
    ///
    /// The cap applies to the store query; expired records are dropped
    /// afterwards, so an active-only listing can come back short even when
    /// older active records exist.
    #[instrument(skip(self), name = "gossip.list")]
    pub async fn list(&self, include_expired: bool, category: Option<&str>) -> Result<Vec<GossipView>> {
        let query = GossipQuery {
            limit: LIST_CAP,
            category: category
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_owned),
        };

        let posts = self
            .store
            .query_recent(query)
            .await
            .map_err(|e| persistence("query", e))?;

        let now = self.clock.now();
        Ok(posts
            .iter()
            .filter(|post| include_expired || !post.is_expired(now))
            .map(|post| GossipView::from_post(post, now))
            .collect())
    }

    /// Permanently removes a gossip.
    #[instrument(skip(self), name = "gossip.delete")]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self
            .store
            .delete(id)
            .await
            .map_err(|e| persistence("delete", e))?;

        if !removed {
            return Err(GossipError::NotFound(id));
        }
        info!(%id, "gossip deleted");
        Ok(())
    }
}

fn required_text(field: &str, raw: &str, max_chars: usize) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(GossipError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(GossipError::validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn persistence(op: &str, err: anyhow::Error) -> GossipError {
    error!(error = %err, op, "gossip store failure");
    GossipError::Persistence(err)
}
