//! HTTP binding for the three gossip endpoints.

use async_trait::async_trait;
use gg_core::models::{
    ErrorBody, GossipView, ListGossipsResponse, SubmitGossipRequest, SubmitGossipResponse,
};
use reqwest::{Response, StatusCode};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ClientError, Result};

/// Which slice of the collection a listing asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub include_expired: bool,
    pub category: Option<String>,
}

impl ListFilter {
    /// Active posts, optionally restricted to one category.
    pub fn active(category: Option<String>) -> Self {
        Self { include_expired: false, category }
    }

    /// Everything still stored, expired or not.
    pub fn everything() -> Self {
        Self { include_expired: true, category: None }
    }
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait GossipApi: Send + Sync {
    async fn submit(&self, request: &SubmitGossipRequest) -> Result<Uuid>;
    async fn list(&self, filter: ListFilter) -> Result<Vec<GossipView>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpGossipApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGossipApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }
}

/// Turns a non-2xx response into the matching [`ClientError`].
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);

    Err(match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Transport(format!("{status}: {message}")),
    })
}

#[async_trait]
impl GossipApi for HttpGossipApi {
    async fn submit(&self, request: &SubmitGossipRequest) -> Result<Uuid> {
        let response = self
            .client
            .post(self.url("submitGossip"))
            .json(request)
            .send()
            .await?;
        let created: SubmitGossipResponse = check(response).await?.json().await?;
        debug!(id = %created.id, "gossip submitted");
        Ok(created.id)
    }

    async fn list(&self, filter: ListFilter) -> Result<Vec<GossipView>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if filter.include_expired {
            params.push(("includeExpired", "true".to_string()));
        }
        if let Some(category) = filter.category {
            params.push(("category", category));
        }

        let response = self
            .client
            .get(self.url("listGossips"))
            .query(&params)
            .send()
            .await?;
        let listed: ListGossipsResponse = check(response).await?.json().await?;
        Ok(listed.items)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.url("deleteGossip"))
            .query(&[("id", id.to_string())])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
