//! Team sync: full rescan on every run.
//!
//! The roster is small and every field is mutable, so there is no change
//! detection. Each page's teams overwrite whatever the snapshot held.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{lock, SyncContext};
use crate::errors::AppError;
use crate::models::{Snapshot, Team};
use crate::queue::WorkQueue;
use crate::store::Published;
use crate::upstream::{page_count, Page};

#[derive(Debug, Clone)]
pub struct TeamSyncReport {
    pub page_count: u32,
    pub records_merged: usize,
    pub teams: usize,
    pub published: Published,
}

pub async fn sync_teams(ctx: &SyncContext) -> Result<TeamSyncReport, AppError> {
    tracing::info!("Scraping teams");

    let first: Page<Team> = ctx.fetcher.fetch_page(&ctx.endpoints.team_page(1)).await?;
    let page_count = page_count(first.count);

    let snapshot = Arc::new(Mutex::new(Snapshot::<Team>::new()));
    let merged = Arc::new(AtomicUsize::new(0));
    let queue = WorkQueue::new(ctx.concurrency);

    for page in 1..=page_count {
        let fetcher = ctx.fetcher.clone();
        let url = ctx.endpoints.team_page(page);
        let snapshot = Arc::clone(&snapshot);
        let merged = Arc::clone(&merged);

        queue.add(async move {
            let data: Page<Team> = fetcher.fetch_page(&url).await?;
            let count = data.results.len();

            let mut guard = lock(&snapshot);
            for team in data.results {
                guard.upsert(team);
            }
            drop(guard);
            merged.fetch_add(count, Ordering::SeqCst);
            Ok(())
        });
    }

    queue.on_idle().await?;

    let snapshot = std::mem::take(&mut *lock(&snapshot));
    let published = ctx.store.save(&snapshot).await?;

    Ok(TeamSyncReport {
        page_count,
        records_merged: merged.load(Ordering::SeqCst),
        teams: snapshot.len(),
        published,
    })
}
