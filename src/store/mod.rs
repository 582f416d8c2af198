//! On-disk snapshot store.
//!
//! Each entity kind is published as two sibling files in the data directory: the
//! compressed snapshot (`<kind>.bin`) and its timestamp marker (`<kind>.txt`,
//! decimal epoch milliseconds). The marker only moves when the snapshot content
//! does. The two writes are not transactional; the store has a single writer.

pub mod codec;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{DataKind, Entity, Snapshot};

/// Outcome of a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub timestamp: i64,
    pub changed: bool,
    pub payload_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn payload_path(&self, kind: DataKind) -> PathBuf {
        self.dir.join(kind.payload_file())
    }

    fn marker_path(&self, kind: DataKind) -> PathBuf {
        self.dir.join(kind.marker_file())
    }

    /// Load the published snapshot, or an empty one if nothing was published yet.
    pub async fn load<T: Entity>(&self) -> Result<Snapshot<T>, AppError> {
        let Some(payload) = read_optional(&self.payload_path(T::KIND)).await? else {
            tracing::info!("No {} snapshot yet, starting empty", T::KIND.as_str());
            return Ok(Snapshot::new());
        };

        let snapshot: Snapshot<T> = codec::decode(&payload)?;

        let misplaced = snapshot.misplaced_keys();
        if !misplaced.is_empty() {
            return Err(AppError::Decode(format!(
                "{} snapshot has entries under foreign keys: {}",
                T::KIND.as_str(),
                misplaced.join(", ")
            )));
        }

        tracing::info!(
            "Loaded {} snapshot with {} records",
            T::KIND.as_str(),
            snapshot.len()
        );
        Ok(snapshot)
    }

    /// Current timestamp marker for `kind`, if one was published.
    pub async fn marker(&self, kind: DataKind) -> Result<Option<i64>, AppError> {
        let Some(raw) = read_optional(&self.marker_path(kind)).await? else {
            return Ok(None);
        };

        parse_marker(&raw).map(Some)
    }

    /// Publish `snapshot` with a fresh timestamp marker.
    ///
    /// If the published payload already holds exactly this content, nothing is
    /// written and the existing marker is returned.
    pub async fn save<T: Entity>(&self, snapshot: &Snapshot<T>) -> Result<Published, AppError> {
        let kind = T::KIND;
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_vec(snapshot)?;
        let previous_marker = self.marker(kind).await?;

        if let Some(marker) = previous_marker {
            if let Some(existing) = read_optional(&self.payload_path(kind)).await? {
                if codec::decompress(&existing).ok().as_deref() == Some(json.as_slice()) {
                    tracing::info!("{} snapshot unchanged, keeping marker {}", kind.as_str(), marker);
                    return Ok(Published {
                        timestamp: marker,
                        changed: false,
                        payload_bytes: existing.len(),
                    });
                }
            }
        }

        let payload = codec::compress(&json)?;

        // Never reuse the previous marker, even within the same millisecond.
        let mut timestamp = Utc::now().timestamp_millis();
        if let Some(marker) = previous_marker {
            timestamp = timestamp.max(marker + 1);
        }

        tokio::fs::write(self.payload_path(kind), &payload).await?;
        tokio::fs::write(self.marker_path(kind), timestamp.to_string()).await?;

        tracing::info!(
            "Published {} snapshot: {} records, {} bytes, marker {}",
            kind.as_str(),
            snapshot.len(),
            payload.len(),
            timestamp
        );

        Ok(Published {
            timestamp,
            changed: true,
            payload_bytes: payload.len(),
        })
    }
}

/// Parse a decimal epoch-millisecond marker.
pub fn parse_marker(raw: &[u8]) -> Result<i64, AppError> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(|| AppError::Decode("Timestamp marker is not a decimal integer".to_string()))
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, AppError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
