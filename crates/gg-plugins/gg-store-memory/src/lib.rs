//! # gg-store-memory
//!
//! In-process implementation of `GossipStore`. Records live in a `DashMap`
//! keyed by id and disappear with the process; useful for tests and for
//! running the server without a database.

use async_trait::async_trait;
use dashmap::DashMap;
use gg_core::models::{GossipPost, GossipQuery, NewGossip};
use gg_core::traits::GossipStore;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryGossipStore {
    records: DashMap<Uuid, GossipPost>,
}

impl MemoryGossipStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl GossipStore for MemoryGossipStore {
    async fn insert(&self, gossip: NewGossip) -> anyhow::Result<GossipPost> {
        let post = gossip.into_post(Uuid::now_v7());
        self.records.insert(post.id, post.clone());
        debug!(id = %post.id, "stored gossip in memory");
        Ok(post)
    }

    /// Full scan, then newest first. Ties on `created_at` fall back to the
    /// id, which is time-ordered as well.
    async fn query_recent(&self, query: GossipQuery) -> anyhow::Result<Vec<GossipPost>> {
        let mut posts: Vec<GossipPost> = self
            .records
            .iter()
            .filter(|entry| query.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();

        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        posts.truncate(query.limit);
        Ok(posts)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }
}
