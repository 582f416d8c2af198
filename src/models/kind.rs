//! Entity kinds published by the scraper.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Keyed, Scrimmage, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Teams,
    Scrimmages,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Teams => "teams",
            DataKind::Scrimmages => "scrimmages",
        }
    }

    /// Name of the compressed snapshot file.
    pub fn payload_file(&self) -> String {
        format!("{}.bin", self.as_str())
    }

    /// Name of the timestamp marker file.
    pub fn marker_file(&self) -> String {
        format!("{}.txt", self.as_str())
    }

    pub fn timestamp_key(&self) -> String {
        format!("{}-timestamp", self.as_str())
    }

    pub fn data_key(&self) -> String {
        format!("{}-data", self.as_str())
    }
}

/// A record type that is scraped and published as its own snapshot.
pub trait Entity: Keyed + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: DataKind;
}

impl Entity for Team {
    const KIND: DataKind = DataKind::Teams;
}

impl Entity for Scrimmage {
    const KIND: DataKind = DataKind::Scrimmages;
}
