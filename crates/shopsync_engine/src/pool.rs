//! Bounded worker pool for load-time fan-out.
//!
//! Each job runs on its own tokio task; a semaphore caps how many run at
//! once, which caps concurrent outbound connections. A failing job is logged
//! and counted but never cancels its siblings.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Outcome of a pool run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolOutcome {
    /// Jobs that finished with `Ok`.
    pub succeeded: usize,
    /// Messages of failed or panicked jobs.
    pub failures: Vec<String>,
}

impl PoolOutcome {
    /// Returns true if every job succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A fixed-size pool of concurrent jobs.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `workers` jobs at once.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Returns the worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `job` for every item and waits for all of them.
    pub async fn run<I, F, Fut, E>(&self, label: &str, items: I, job: F) -> PoolOutcome
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = Vec::new();

        for item in items {
            let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                break;
            };
            let fut = job(item);
            tasks.push(tokio::spawn(async move {
                let _permit = permit;
                fut.await
            }));
        }

        let mut outcome = PoolOutcome::default();
        for task in tasks {
            match task.await {
                Ok(Ok(())) => outcome.succeeded += 1,
                Ok(Err(e)) => {
                    warn!(pool = label, error = %e, "worker job failed");
                    outcome.failures.push(e.to_string());
                }
                Err(e) => {
                    error!(pool = label, error = %e, "worker job panicked");
                    outcome.failures.push(e.to_string());
                }
            }
        }
        debug!(
            pool = label,
            succeeded = outcome.succeeded,
            failed = outcome.failures.len(),
            "worker pool finished"
        );
        outcome
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn failures_do_not_cancel_siblings() {
        let pool = WorkerPool::new(3);
        let done = Arc::new(AtomicUsize::new(0));
        let outcome = pool
            .run("test", 0..10, |i| {
                let done = Arc::clone(&done);
                async move {
                    if i % 4 == 0 {
                        return Err(format!("job {i} failed"));
                    }
                    done.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        assert_eq!(outcome.succeeded, 7);
        assert_eq!(outcome.failures.len(), 3);
        assert_eq!(done.load(Ordering::SeqCst), 7);
        assert!(!outcome.is_success());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrency_is_bounded() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let outcome = pool
            .run("bounded", 0..8, |_| {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            })
            .await;
        assert!(outcome.is_success());
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }
}
