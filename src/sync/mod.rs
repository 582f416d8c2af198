//! Scrape runs: crawl the paginated upstream collections and publish snapshots.

mod scrimmages;
mod teams;

pub use scrimmages::*;
pub use teams::*;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::Config;
use crate::store::SnapshotStore;
use crate::upstream::{Endpoints, PageFetcher};

/// Everything a scrape run needs.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub fetcher: PageFetcher,
    pub endpoints: Endpoints,
    pub store: SnapshotStore,
    pub concurrency: usize,
}

impl SyncContext {
    pub fn from_config(config: &Config, fetcher: PageFetcher) -> Self {
        Self {
            fetcher,
            endpoints: Endpoints::from_config(config),
            store: SnapshotStore::new(&config.data_dir),
            concurrency: config.concurrency,
        }
    }
}

/// Page tasks only hold the snapshot lock for the synchronous merge step.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
