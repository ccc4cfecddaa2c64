//! # Core Traits (Ports)
//!
//! Any store plugin must implement [`GossipStore`] to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{AuthorId, GossipPost, GossipQuery, NewGossip};

/// Document-store contract for gossip records.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GossipStore: Send + Sync {
    /// Persists a new record and assigns its id.
    async fn insert(&self, gossip: NewGossip) -> anyhow::Result<GossipPost>;

    /// Records matching `query`, newest `created_at` first, at most `query.limit`.
    async fn query_recent(&self, query: GossipQuery) -> anyhow::Result<Vec<GossipPost>>;

    /// Removes a record. `Ok(false)` when no record had that id.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Who a new post is attributed to.
pub trait AuthorProvider: Send + Sync {
    fn current_author(&self) -> AuthorId;
}

/// Attributes every post to the same author.
#[derive(Debug, Clone)]
pub struct FixedAuthor(AuthorId);

impl FixedAuthor {
    pub const DEFAULT_ID: &'static str = "local-user";

    pub fn new(id: impl Into<String>) -> Self {
        Self(AuthorId::new(id))
    }
}

impl Default for FixedAuthor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ID)
    }
}

impl AuthorProvider for FixedAuthor {
    fn current_author(&self) -> AuthorId {
        self.0.clone()
    }
}
