//! Bounded-concurrency batch execution.
//!
//! [`ParallelExecutor`] runs one caller-supplied operation per item with at most
//! `max_workers` invocations in flight, isolates failures to the item that caused
//! them, and returns exactly one [`TaskResult`] per item in submission order.
//!
//! Split into focused submodules:
//! - [`batch`] - the collecting loop (spawn, join, order, progress)
//! - [`progress`] - completion counter owned by the collecting loop
//!
//! # Worker cap
//!
//! `max_workers` must be at least 1. Zero is rejected with
//! [`Error::Config`] when the executor is built; it is never clamped.
//!
//! # Failure isolation
//!
//! An `Err` from the operation becomes a failed result whose message is the
//! error's `Display` text. A panic becomes a failed result too. Neither stops
//! the remaining items.
//!
//! # Cancellation and timeouts
//!
//! With a cancellation token attached, cancelling it aborts in-flight
//! invocations and stops new ones from starting. Items that had already
//! finished keep their results; every other item is reported as `"cancelled"`.
//! A per-item timeout fails only the slow item and frees its slot.
//!
//! Blocking operations (see [`ParallelExecutor::run_blocking_batch`]) run on
//! tokio's blocking pool. A blocking call cannot be interrupted, so a timed-out
//! call keeps its worker slot until the thread returns, and a cancelled batch
//! waits for its running calls before returning. No blocking call outlives the
//! batch that started it.

mod batch;
mod progress;


use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::ExecutorConfig;
use crate::error::{Error, Result, TaskFailure};
use crate::types::TaskResult;

use batch::BatchLimits;

/// Runs a per-item operation across a batch with bounded parallelism.
///
/// The executor holds only limits, so one instance can run any number of
/// batches; no state is carried from one batch to the next.
///
/// # Example
///
/// ```no_run
/// use parallel_ingest::{ParallelExecutor, TaskResult};
///
/// # async fn example() -> parallel_ingest::Result<()> {
/// let executor = ParallelExecutor::new(4)?;
/// let paths = vec!["a.pdf".to_string(), "b.pdf".to_string()];
///
/// let results = executor
///     .run_batch(paths, |path: String| async move {
///         Ok::<_, std::io::Error>(TaskResult::success(format!("{path} loaded")))
///     })
///     .await;
///
/// assert_eq!(results.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct ParallelExecutor {
    max_workers: usize,
    item_timeout: Option<Duration>,
    cancel_token: Option<CancellationToken>,
}

impl ParallelExecutor {
    /// Create an executor that runs at most `max_workers` items at once.
    ///
    /// Returns [`Error::Config`] if `max_workers` is zero.
    pub fn new(max_workers: usize) -> Result<Self> {
        if max_workers == 0 {
            return Err(Error::config(
                "max_workers",
                "max_workers must be at least 1",
            ));
        }

        Ok(Self {
            max_workers,
            item_timeout: None,
            cancel_token: None,
        })
    }

    /// Create an executor from configuration.
    pub fn from_config(config: &ExecutorConfig) -> Result<Self> {
        let executor = Self::new(config.max_workers)?;
        Ok(match config.item_timeout {
            Some(timeout) => executor.with_item_timeout(timeout),
            None => executor,
        })
    }

    /// Fail any single item that runs longer than `timeout`.
    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.item_timeout = Some(timeout);
        self
    }

    /// Attach a token that cancels every batch run by this executor.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Maximum number of concurrent invocations
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Per-item timeout, if any
    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout
    }

    fn limits(&self) -> BatchLimits<'_> {
        BatchLimits {
            max_workers: self.max_workers,
            item_timeout: self.item_timeout,
            cancel_token: self.cancel_token.as_ref(),
        }
    }

    /// Run `process` on the blocking pool for each item, then wait for any
    /// call a cancelled batch stopped waiting on before returning.
    async fn run_blocking<T, F, E, P>(
        &self,
        items: Vec<T>,
        process: F,
        on_progress: P,
    ) -> Vec<TaskResult>
    where
        T: Send + 'static,
        F: Fn(T) -> std::result::Result<TaskResult, E> + Send + Sync + 'static,
        E: std::fmt::Display + Send + 'static,
        P: FnMut(usize, usize),
    {
        let tracker = TaskTracker::new();
        // The timeout is applied inside `offload` so a timed-out call keeps its slot.
        let limits = BatchLimits {
            item_timeout: None,
            ..self.limits()
        };

        let results = batch::run_batch(
            limits,
            items,
            offload(process, tracker.clone(), self.item_timeout),
            on_progress,
        )
        .await;

        tracker.close();
        if !tracker.is_empty() {
            tracing::debug!(running = tracker.len(), "Waiting for blocking calls to return");
        }
        tracker.wait().await;
        results
    }

    /// Run an async operation once per item.
    ///
    /// Returns one result per item, in the order the items were given.
    pub async fn run_batch<T, F, Fut, E>(&self, items: Vec<T>, process: F) -> Vec<TaskResult>
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<TaskResult, E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        batch::run_batch(self.limits(), items, process, |_, _| {}).await
    }

    /// Run an async operation once per item, reporting progress.
    ///
    /// `on_progress(completed, total)` is called exactly once per item, with
    /// `completed` going 1, 2, ..., `total`. Calls are made one at a time from
    /// the task awaiting this method, never from worker tasks.
    pub async fn run_batch_with_progress<T, F, Fut, E, P>(
        &self,
        items: Vec<T>,
        process: F,
        on_progress: P,
    ) -> Vec<TaskResult>
    where
        T: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<TaskResult, E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
        P: FnMut(usize, usize),
    {
        batch::run_batch(self.limits(), items, process, on_progress).await
    }

    /// Run a blocking operation once per item on the blocking thread pool.
    pub async fn run_blocking_batch<T, F, E>(&self, items: Vec<T>, process: F) -> Vec<TaskResult>
    where
        T: Send + 'static,
        F: Fn(T) -> std::result::Result<TaskResult, E> + Send + Sync + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        self.run_blocking(items, process, |_, _| {}).await
    }

    /// Run a blocking operation once per item on the blocking thread pool,
    /// reporting progress as [`run_batch_with_progress`](Self::run_batch_with_progress) does.
    pub async fn run_blocking_batch_with_progress<T, F, E, P>(
        &self,
        items: Vec<T>,
        process: F,
        on_progress: P,
    ) -> Vec<TaskResult>
    where
        T: Send + 'static,
        F: Fn(T) -> std::result::Result<TaskResult, E> + Send + Sync + 'static,
        E: std::fmt::Display + Send + 'static,
        P: FnMut(usize, usize),
    {
        self.run_blocking(items, process, on_progress).await
    }
}

/// Wrap a blocking operation so each call runs under `spawn_blocking`.
///
/// With `item_timeout` set, a call that overruns is reported as timed out only
/// after its thread returns, so its worker slot stays occupied meanwhile.
/// A panic on the blocking thread is resumed inside the returned future, where
/// the collecting loop's panic guard reports it like any other panic.
fn offload<T, F, E>(
    process: F,
    tracker: TaskTracker,
    item_timeout: Option<Duration>,
) -> impl Fn(T) -> BoxFuture<'static, std::result::Result<TaskResult, TaskFailure>> + Send + Sync + 'static
where
    T: Send + 'static,
    F: Fn(T) -> std::result::Result<TaskResult, E> + Send + Sync + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let process = Arc::new(process);
    move |item: T| {
        let process = Arc::clone(&process);
        let tracker = tracker.clone();
        Box::pin(async move {
            let mut handle = tracker.spawn_blocking(move || (*process)(item));

            let joined = match item_timeout {
                Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        let _ = handle.await;
                        return Err(TaskFailure::TimedOut(limit));
                    }
                },
                None => handle.await,
            };

            match joined {
                Ok(outcome) => outcome.map_err(|e| TaskFailure::Failed(e.to_string())),
                Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
                Err(e) => Err(TaskFailure::Failed(e.to_string())),
            }
        })
    }
}

/// Run `process` across `items` with at most `max_workers` concurrent calls.
///
/// Shorthand for [`ParallelExecutor::new`] followed by
/// [`ParallelExecutor::run_batch`]. Fails only if `max_workers` is zero, in
/// which case nothing is spawned.
pub async fn process_in_parallel<T, F, Fut, E>(
    items: Vec<T>,
    process: F,
    max_workers: usize,
) -> Result<Vec<TaskResult>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<TaskResult, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let executor = ParallelExecutor::new(max_workers)?;
    Ok(executor.run_batch(items, process).await)
}

/// Progress-reporting variant of [`process_in_parallel`].
pub async fn process_in_parallel_with_progress<T, F, Fut, E, P>(
    items: Vec<T>,
    process: F,
    max_workers: usize,
    on_progress: P,
) -> Result<Vec<TaskResult>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<TaskResult, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
    P: FnMut(usize, usize),
{
    let executor = ParallelExecutor::new(max_workers)?;
    Ok(executor
        .run_batch_with_progress(items, process, on_progress)
        .await)
}
