//! Bounded work queue.
//!
//! Accepts any number of futures and runs at most `concurrency` of them at once,
//! starting them in the order they were added. Completion order is unspecified.
//! The first failing task poisons the queue: tasks that have not started yet are
//! discarded and every waiter observes that failure.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{oneshot, Notify};

use crate::errors::AppError;

pub const DEFAULT_CONCURRENCY: usize = 4;

type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Cloneable handle to a shared queue.
#[derive(Clone)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

struct Inner {
    concurrency: usize,
    state: Mutex<State>,
    idle: Notify,
}

#[derive(Default)]
struct State {
    pending: VecDeque<Job>,
    running: usize,
    failure: Option<AppError>,
}

/// Result of one queued task, awaitable independently of the rest of the queue.
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, AppError>>,
    inner: Arc<Inner>,
}

/// Occupies one concurrency slot for as long as a job runs, panics included.
struct Slot {
    inner: Arc<Inner>,
    finished: bool,
}

impl WorkQueue {
    pub fn new(concurrency: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                concurrency: concurrency.max(1),
                state: Mutex::new(State::default()),
                idle: Notify::new(),
            }),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    /// Enqueue `task`. It starts as soon as a slot is free.
    pub fn add<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = Result<T, AppError>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let inner = Arc::clone(&self.inner);
        let job: Job = Box::pin(async move {
            let result = task.await;
            if let Err(err) = &result {
                inner.fail(err.clone());
            }
            let _ = tx.send(result);
        });

        let rejected = {
            let mut state = self.inner.lock();
            if state.failure.is_some() {
                Some(job)
            } else {
                state.pending.push_back(job);
                None
            }
        };

        match rejected {
            Some(job) => drop(job),
            None => self.inner.pump(),
        }

        TaskHandle {
            rx,
            inner: Arc::clone(&self.inner),
        }
    }

    /// Wait until nothing is pending or running, including tasks added while
    /// waiting. Returns the queue's first failure, if any.
    pub async fn on_idle(&self) -> Result<(), AppError> {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.inner.lock();
                if state.running == 0 && state.pending.is_empty() {
                    return match &state.failure {
                        Some(err) => Err(err.clone()),
                        None => Ok(()),
                    };
                }
            }

            notified.await;
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn pump(self: &Arc<Self>) {
        let mut state = self.lock();
        while state.running < self.concurrency {
            let Some(job) = state.pending.pop_front() else {
                break;
            };
            state.running += 1;

            let slot = Slot {
                inner: Arc::clone(self),
                finished: false,
            };
            tokio::spawn(async move {
                // Bind the whole guard so it lives as long as the task.
                let mut slot = slot;
                job.await;
                slot.finished = true;
            });
        }
    }

    fn release(self: &Arc<Self>) {
        let idle = {
            let mut state = self.lock();
            state.running -= 1;
            state.running == 0 && state.pending.is_empty()
        };

        if idle {
            self.idle.notify_waiters();
        } else {
            self.pump();
        }
    }

    fn fail(&self, err: AppError) {
        let discarded = {
            let mut state = self.lock();
            if state.failure.is_none() {
                state.failure = Some(err);
            }
            std::mem::take(&mut state.pending)
        };

        if !discarded.is_empty() {
            tracing::warn!("Discarding {} queued tasks after failure", discarded.len());
        }
    }
}

impl Drop for Slot {
    fn drop(&mut self) {
        // A job that never reached its end panicked mid-poll.
        if !self.finished {
            self.inner
                .fail(AppError::Internal("Queued task panicked".to_string()));
        }
        self.inner.release();
    }
}

impl<T> TaskHandle<T> {
    pub async fn join(self) -> Result<T, AppError> {
        let TaskHandle { rx, inner } = self;
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(inner.lock().failure.clone().unwrap_or_else(|| {
                AppError::Internal("Queued task was dropped".to_string())
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    const WAIT: Duration = Duration::from_secs(5);

    async fn settle(queue: &WorkQueue) -> Result<(), AppError> {
        tokio::time::timeout(WAIT, queue.on_idle())
            .await
            .expect("queue did not drain")
    }

    async fn joined<T>(handle: TaskHandle<T>) -> Result<T, AppError> {
        tokio::time::timeout(WAIT, handle.join())
            .await
            .expect("task did not finish")
    }

    #[tokio::test]
    async fn test_single_task_completes_cleanly() {
        let queue = WorkQueue::new(4);

        let handle = queue.add(async { Ok(1) });

        assert_eq!(joined(handle).await.unwrap(), 1);
        settle(&queue).await.unwrap();

        // The slot was released and the queue still accepts work.
        let again = queue.add(async { Ok(2) });
        assert_eq!(joined(again).await.unwrap(), 2);
        settle(&queue).await.unwrap();
    }

    #[tokio::test]
    async fn test_never_exceeds_concurrency() {
        let queue = WorkQueue::new(3);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..20 {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            queue.add(async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }

        settle(&queue).await.unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 3);
        assert_eq!(current.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_starts_in_enqueue_order() {
        let queue = WorkQueue::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..6 {
            let order = Arc::clone(&order);
            queue.add(async move {
                order.lock().unwrap().push(i);
                tokio::task::yield_now().await;
                Ok(())
            });
        }

        settle(&queue).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_on_idle_waits_for_work_added_while_waiting() {
        let queue = WorkQueue::new(2);
        let done = Arc::new(AtomicBool::new(false));

        let nested_queue = queue.clone();
        let nested_done = Arc::clone(&done);
        queue.add(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            nested_queue.add(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                nested_done.store(true, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        settle(&queue).await.unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_join_does_not_wait_for_later_tasks() {
        let queue = WorkQueue::new(2);
        let slow_done = Arc::new(AtomicBool::new(false));

        let first = queue.add(async { Ok(7) });
        let flag = Arc::clone(&slow_done);
        queue.add(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(joined(first).await.unwrap(), 7);
        assert!(!slow_done.load(Ordering::SeqCst));

        settle(&queue).await.unwrap();
        assert!(slow_done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failure_discards_pending_tasks() {
        let queue = WorkQueue::new(1);
        let ran = Arc::new(AtomicUsize::new(0));

        let failing = queue.add(async {
            Err::<(), _>(AppError::Fetch {
                url: "http://upstream/page=2".to_string(),
                status: 500,
            })
        });

        let mut later = Vec::new();
        for _ in 0..3 {
            let ran = Arc::clone(&ran);
            later.push(queue.add(async move {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }

        let err = settle(&queue).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { status: 500, .. }));
        assert_eq!(joined(failing).await.unwrap_err(), err);
        for handle in later {
            assert_eq!(joined(handle).await.unwrap_err(), err);
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        let rejected = queue.add(async { Ok(1) });
        assert_eq!(joined(rejected).await.unwrap_err(), err);
    }

    #[tokio::test]
    async fn test_panicking_task_releases_its_slot() {
        let queue = WorkQueue::new(1);

        queue.add(async {
            if true {
                panic!("boom");
            }
            Ok(())
        });

        let err = settle(&queue).await.unwrap_err();
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }
}
