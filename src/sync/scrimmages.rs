//! Scrimmage sync: incremental crawl with early exit.
//!
//! The match feed is newest-first, so page 1 holds the latest scrimmages and
//! higher pages walk back in time. Pages are merged into the previously published
//! snapshot, and every page that introduces a new or modified record raises the
//! "last changed page" mark. At each checkpoint (every `concurrency * factor`
//! pages) the driver waits for the checkpoint page and stops enqueueing once more
//! than `window` pages have passed since the last change.
//!
//! The check only sees pages that finished before the checkpoint page did, so a
//! slow page can be missed. Worst case a change is picked up one run later.
//! The heuristic also assumes the upstream keeps ordering by creation time.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{lock, SyncContext};
use crate::errors::AppError;
use crate::models::{Scrimmage, Snapshot};
use crate::queue::WorkQueue;
use crate::store::Published;
use crate::upstream::{page_count, Page, PageFetcher};

/// Early-exit tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarlyExit {
    /// Unchanged pages tolerated after the last change before stopping
    pub window: u32,
    /// Checkpoint every `concurrency * checkpoint_factor` pages
    pub checkpoint_factor: u32,
}

impl Default for EarlyExit {
    fn default() -> Self {
        Self {
            window: 10,
            checkpoint_factor: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrimmageSyncReport {
    pub page_count: u32,
    pub last_enqueued_page: u32,
    pub stopped_early: bool,
    /// Highest page that produced a change, 0 if none did
    pub last_changed_page: u32,
    pub changed_records: usize,
    pub scrimmages: usize,
    /// Scrimmages still queued or running upstream
    pub unresolved: usize,
    pub published: Published,
}

/// State shared by the page tasks of one run.
struct MergeState {
    snapshot: Mutex<Snapshot<Scrimmage>>,
    last_changed: AtomicU32,
    changed_records: AtomicUsize,
}

impl MergeState {
    fn merge(&self, page: u32, scrimmages: Vec<Scrimmage>) {
        let mut changed = 0;
        {
            let mut snapshot = lock(&self.snapshot);
            for scrimmage in scrimmages {
                if snapshot.upsert(scrimmage) {
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            tracing::debug!("Page {} changed {} scrimmages", page, changed);
            self.last_changed.fetch_max(page, Ordering::SeqCst);
            self.changed_records.fetch_add(changed, Ordering::SeqCst);
        }
    }
}

pub async fn sync_scrimmages(
    ctx: &SyncContext,
    early_exit: EarlyExit,
) -> Result<ScrimmageSyncReport, AppError> {
    tracing::info!("Scraping scrimmages");

    let previous: Snapshot<Scrimmage> = ctx.store.load().await?;

    let first: Page<Scrimmage> = ctx
        .fetcher
        .fetch_page(&ctx.endpoints.scrimmage_page(1))
        .await?;
    let page_count = page_count(first.count);

    let state = Arc::new(MergeState {
        snapshot: Mutex::new(previous),
        last_changed: AtomicU32::new(0),
        changed_records: AtomicUsize::new(0),
    });
    let queue = WorkQueue::new(ctx.concurrency);
    let checkpoint_every = queue.concurrency() as u32 * early_exit.checkpoint_factor.max(1);

    let mut last_enqueued_page = 0;
    let mut stopped_early = false;

    for page in 1..=page_count {
        let handle = queue.add(fetch_and_merge(
            ctx.fetcher.clone(),
            ctx.endpoints.scrimmage_page(page),
            page,
            Arc::clone(&state),
        ));
        last_enqueued_page = page;

        if page % checkpoint_every == 0 {
            handle.join().await?;

            let unchanged_run = page - state.last_changed.load(Ordering::SeqCst);
            if unchanged_run > early_exit.window {
                tracing::info!(
                    "No new scrimmage data for >{} pages, stopping at page {}/{}",
                    early_exit.window,
                    page,
                    page_count
                );
                stopped_early = true;
                break;
            }
        }
    }

    queue.on_idle().await?;

    let snapshot = std::mem::take(&mut *lock(&state.snapshot));
    let published = ctx.store.save(&snapshot).await?;

    Ok(ScrimmageSyncReport {
        page_count,
        last_enqueued_page,
        stopped_early,
        last_changed_page: state.last_changed.load(Ordering::SeqCst),
        changed_records: state.changed_records.load(Ordering::SeqCst),
        scrimmages: snapshot.len(),
        unresolved: snapshot.values().filter(|s| !s.status.is_terminal()).count(),
        published,
    })
}

async fn fetch_and_merge(
    fetcher: PageFetcher,
    url: String,
    page: u32,
    state: Arc<MergeState>,
) -> Result<(), AppError> {
    let data: Page<Scrimmage> = fetcher.fetch_page(&url).await?;
    state.merge(page, data.results);
    Ok(())
}
