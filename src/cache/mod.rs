//! Client cache sync.
//!
//! Materializes a published snapshot locally. The small timestamp marker is
//! always fetched; the payload only when the marker differs from the cached one
//! or nothing is cached yet. There is no stale fallback: a failed request fails
//! the sync.

use reqwest::Client;

use crate::db::CacheRepository;
use crate::errors::AppError;
use crate::models::{DataKind, Entity, Snapshot};
use crate::store::{codec, parse_marker};

/// Where a materialized snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Cached,
    Downloaded,
}

/// A decoded snapshot plus the marker it was published under.
#[derive(Debug, Clone)]
pub struct Materialized<T> {
    pub snapshot: Snapshot<T>,
    pub timestamp: i64,
    pub source: CacheSource,
}

pub struct CacheSync {
    client: Client,
    publish_url: String,
    repo: CacheRepository,
}

impl CacheSync {
    pub fn new(client: Client, publish_url: &str, repo: CacheRepository) -> Self {
        Self {
            client,
            publish_url: publish_url.trim_end_matches('/').to_string(),
            repo,
        }
    }

    pub async fn sync<T: Entity>(&self) -> Result<Materialized<T>, AppError> {
        let kind = T::KIND;
        let timestamp_key = kind.timestamp_key();
        let data_key = kind.data_key();

        let remote = parse_marker(&self.get(&self.url(&kind.marker_file())).await?)?;

        let mut cached = self
            .repo
            .get_many(&[timestamp_key.as_str(), data_key.as_str()])
            .await?;
        let local = cached
            .get(&timestamp_key)
            .and_then(|value| value.parse::<i64>().ok());

        if local == Some(remote) {
            if let Some(data) = cached.remove(&data_key) {
                match serde_json::from_str::<Snapshot<T>>(&data) {
                    Ok(snapshot) => {
                        tracing::info!("{} cache is current ({})", kind.as_str(), remote);
                        return Ok(Materialized {
                            snapshot,
                            timestamp: remote,
                            source: CacheSource::Cached,
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Cached {} payload is unreadable, downloading: {}", kind.as_str(), e);
                    }
                }
            }
        }

        tracing::info!(
            "{} cache is stale (local {:?}, remote {}), downloading",
            kind.as_str(),
            local,
            remote
        );
        let snapshot = self.download::<T>(kind, remote).await?;

        Ok(Materialized {
            snapshot,
            timestamp: remote,
            source: CacheSource::Downloaded,
        })
    }

    async fn download<T: Entity>(&self, kind: DataKind, remote: i64) -> Result<Snapshot<T>, AppError> {
        let payload = self.get(&self.url(&kind.payload_file())).await?;
        let json = codec::decompress(&payload)?;
        let snapshot: Snapshot<T> = serde_json::from_slice(&json)?;

        let text = String::from_utf8(json)
            .map_err(|e| AppError::Decode(format!("Payload is not UTF-8: {}", e)))?;
        self.repo
            .put_many(&[
                (kind.timestamp_key(), remote.to_string()),
                (kind.data_key(), text),
            ])
            .await?;

        tracing::info!(
            "Cached {} {} records ({} compressed bytes)",
            snapshot.len(),
            kind.as_str(),
            payload.len()
        );
        Ok(snapshot)
    }

    fn url(&self, file: &str) -> String {
        format!("{}/{}", self.publish_url, file)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, AppError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::network(url, e))?;
        Ok(body.to_vec())
    }
}
