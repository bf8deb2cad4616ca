//! Client for ORDS AutoREST collections (`{base}/claims/`, `{base}/customers/`, ...).

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::error::{ClaimsError, Result};

/// Rows requested per page; ORDS otherwise caps collections at 25 items.
pub const PAGE_SIZE: usize = 1000;

/// One page of an AutoREST collection
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdsPage {
    #[serde(default)]
    pub items: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Clone)]
pub struct OrdsClient {
    client: reqwest::Client,
    base_url: String,
}

impl OrdsClient {
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `{base}{endpoint}` and decode the JSON body.
    pub async fn call(&self, endpoint: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(%url, "Calling ORDS");

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(%url, error = %e, "ORDS request failed");
            ClaimsError::Http(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%url, status = status.as_u16(), "ORDS returned an error status");
            return Err(ClaimsError::Upstream {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<Value>().await?)
    }

    pub async fn get_collection(
        &self,
        collection: &str,
        offset: usize,
        limit: usize,
    ) -> Result<OrdsPage> {
        let separator = if collection.contains('?') { '&' } else { '?' };
        let endpoint = format!("{collection}{separator}offset={offset}&limit={limit}");
        let page: OrdsPage = serde_json::from_value(self.call(&endpoint).await?)?;
        debug!(
            collection,
            offset,
            items = page.items.len(),
            has_more = page.has_more,
            "Fetched ORDS page"
        );
        Ok(page)
    }

    pub async fn fetch_first_page(&self, collection: &str) -> Result<Vec<Value>> {
        Ok(self.get_collection(collection, 0, PAGE_SIZE).await?.items)
    }

    /// Walks every page until ORDS reports no more rows or a page comes back short.
    pub async fn fetch_all(&self, collection: &str) -> Result<Vec<Value>> {
        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let page = self.get_collection(collection, offset, PAGE_SIZE).await?;
            let count = page.items.len();
            all.extend(page.items);
            if !page.has_more || count < PAGE_SIZE {
                break;
            }
            offset += PAGE_SIZE;
        }
        info!(collection, total = all.len(), "Fetched ORDS collection");
        Ok(all)
    }

    /// Connectivity probe used by the health check.
    pub async fn probe(&self) -> Result<()> {
        self.call("/claims/").await.map(|_| ())
    }
}
