use crate::config::RemoteConfig;
use anyhow::{Context, Result};
use futures_util::future::join_all;
use serde_json::Value;

/// Pulls the public post listings of other nodes. Responses are passed
/// through untouched; a node that fails contributes nothing.
#[derive(Clone)]
pub struct RemotePostClient {
    client: reqwest::Client,
    nodes: Vec<String>,
}

impl RemotePostClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("Spongebook/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .context("failed to build remote HTTP client")?;
        Ok(Self {
            client,
            nodes: config.nodes.clone(),
        })
    }

    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    pub async fn fetch_public_posts(&self) -> Vec<Value> {
        if self.nodes.is_empty() {
            return Vec::new();
        }
        let fetches = self.nodes.iter().map(|node| async move {
            match self.fetch_from(node).await {
                Ok(posts) => posts,
                Err(err) => {
                    tracing::warn!(node = %node, error = ?err, "failed to fetch remote posts");
                    Vec::new()
                }
            }
        });
        join_all(fetches).await.into_iter().flatten().collect()
    }

    async fn fetch_from(&self, node: &str) -> Result<Vec<Value>> {
        let url = format!("{node}/posts");
        let posts = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()?
            .json::<Vec<Value>>()
            .await
            .with_context(|| format!("invalid post listing from {url}"))?;
        tracing::debug!(node = %node, count = posts.len(), "fetched remote posts");
        Ok(posts)
    }
}
