//! Thin NetBox REST client: token auth, one retry, pagination draining.

use crate::error::{ClientError, Result};
use crate::settings::NetBoxSettings;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const RETRY_BACKOFF: Duration = Duration::from_millis(250);

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default)]
    next: Option<String>,
    results: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct NetBoxClient {
    http: Client,
    base_url: String,
    token: String,
    page_size: usize,
}

impl NetBoxClient {
    pub fn new(settings: &NetBoxSettings) -> Result<Self> {
        let base_url = settings
            .url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ClientError::Config("NETBOX_URL is not set".to_string()))?;
        let token = settings
            .token
            .clone()
            .ok_or_else(|| ClientError::Config("NETBOX_API_TOKEN is not set".to_string()))?;
        let http = Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms.max(1)))
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url,
            token,
            page_size: settings.page_size.max(1),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` (relative to the API root, e.g. `/api/dcim/devices/1/`) and decode the body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        self.get_url(&url, query).await
    }

    /// Every result of a paginated list endpoint, following `next` links until exhausted.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut params = query.to_vec();
        params.push(("limit", self.page_size.to_string()));

        let first: Page<T> = self.get(path, &params).await?;
        let mut results = first.results;
        let mut next = first.next;
        while let Some(url) = next.take() {
            // `next` already carries every query parameter.
            let page: Page<T> = self.get_url(&url, &[]).await?;
            results.extend(page.results);
            next = page.next;
        }
        Ok(results)
    }

    async fn get_url<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        match self.try_get(url, query).await {
            Err(err) if err.is_retryable() => {
                log::warn!("NetBox request failed, retrying once: {err}");
                tokio::time::sleep(RETRY_BACKOFF).await;
                self.try_get(url, query).await
            }
            other => other,
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        log::debug!("GET {url} {query:?}");
        let response = self
            .http
            .get(url)
            .query(query)
            .header("Authorization", format!("Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|source| ClientError::Transport {
            url: url.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
