//! HTTP fetcher for single pages.

use reqwest::Client;
use serde::de::DeserializeOwned;

use super::Page;
use crate::errors::AppError;

/// Fetches one page of a paginated endpoint. Never retries.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch_page<T: DeserializeOwned>(&self, url: &str) -> Result<Page<T>, AppError> {
        tracing::info!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("GET {} -> HTTP {}", url, status);
            return Err(AppError::fetch(url, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::network(url, e))?;

        serde_json::from_slice(&body)
            .map_err(|e| AppError::Decode(format!("Invalid page from {}: {}", url, e)))
    }
}

impl Default for PageFetcher {
    fn default() -> Self {
        Self::new(Client::new())
    }
}
