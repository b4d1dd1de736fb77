//! The collecting loop: spawns item invocations up to the worker cap, joins
//! them as they finish, and writes each outcome into its submission slot.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::error::TaskFailure;
use crate::types::TaskResult;

use super::progress::ProgressCounter;

/// Per-call execution limits, borrowed from the executor.
pub(super) struct BatchLimits<'a> {
    pub(super) max_workers: usize,
    pub(super) item_timeout: Option<Duration>,
    pub(super) cancel_token: Option<&'a CancellationToken>,
}

/// Run `process` once per item with at most `limits.max_workers` in flight.
///
/// Returns one result per item in submission order. `on_progress` is called
/// from this loop only, once per item, with a strictly increasing count.
pub(super) async fn run_batch<T, F, Fut, E, P>(
    limits: BatchLimits<'_>,
    items: Vec<T>,
    process: F,
    mut on_progress: P,
) -> Vec<TaskResult>
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<TaskResult, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
    P: FnMut(usize, usize),
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let BatchLimits {
        max_workers,
        item_timeout,
        cancel_token,
    } = limits;

    tracing::debug!(total, max_workers, ?item_timeout, "Starting batch");
    let batch_start = Instant::now();

    let process = Arc::new(process);
    let mut slots: Vec<Option<TaskResult>> = vec![None; total];
    let mut progress = ProgressCounter::new(total);
    let mut pending = items.into_iter().enumerate();
    let mut in_flight: JoinSet<(usize, TaskResult)> = JoinSet::new();
    let mut cancelled = false;

    loop {
        if !cancelled && cancel_token.is_some_and(|t| t.is_cancelled()) {
            cancelled = true;
            in_flight.abort_all();
        }

        if !cancelled {
            while in_flight.len() < max_workers {
                let Some((index, item)) = pending.next() else {
                    break;
                };
                in_flight.spawn(run_item(index, item, Arc::clone(&process), item_timeout));
            }
        }

        let joined = match cancel_token {
            Some(token) if !cancelled => {
                tokio::select! {
                    // Completions win ties so finished work is never discarded.
                    biased;
                    joined = in_flight.join_next() => joined,
                    _ = token.cancelled() => continue,
                }
            }
            _ => in_flight.join_next().await,
        };

        let Some(joined) = joined else {
            break;
        };

        match joined {
            Ok((index, result)) => {
                if !result.success {
                    tracing::warn!(index, error = %result.message, "Task failed");
                }
                slots[index] = Some(result);
                let completed = progress.advance();
                tracing::trace!(completed, total, percent = progress.percent(), "Task completed");
                on_progress(completed, total);
            }
            Err(e) if e.is_cancelled() => {
                // Aborted on cancellation; its slot stays empty and is filled below.
                tracing::debug!(error = %e, "In-flight task aborted");
            }
            Err(e) => {
                // run_item catches panics, so this only happens if the runtime
                // itself failed the task. The slot is filled below.
                tracing::error!(error = %e, "Task join failed");
            }
        }
    }

    if cancelled {
        tracing::info!(
            completed = progress.completed(),
            total = progress.total(),
            "Batch cancelled, marking unfinished items as cancelled"
        );
    }

    let results: Vec<TaskResult> = slots
        .into_iter()
        .map(|slot| match slot {
            Some(result) => result,
            None => {
                let completed = progress.advance();
                on_progress(completed, total);
                TaskFailure::Cancelled.into()
            }
        })
        .collect();

    let succeeded = results.iter().filter(|r| r.success).count();
    tracing::info!(
        total,
        succeeded,
        failed = total - succeeded,
        elapsed_ms = batch_start.elapsed().as_millis() as u64,
        "Parallel batch completed"
    );

    results
}

/// Invoke `process` for one item, converting every way it can go wrong into
/// a failed result tagged with the item's index.
async fn run_item<T, F, Fut, E>(
    index: usize,
    item: T,
    process: Arc<F>,
    item_timeout: Option<Duration>,
) -> (usize, TaskResult)
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<TaskResult, E>>,
    E: std::fmt::Display,
{
    // The call happens inside the guarded future so a panic while building
    // the future is caught too.
    let invocation = AssertUnwindSafe(async move { (*process)(item).await }).catch_unwind();

    let outcome = match item_timeout {
        Some(limit) => match tokio::time::timeout(limit, invocation).await {
            Ok(outcome) => outcome,
            Err(_) => return (index, TaskFailure::TimedOut(limit).into()),
        },
        None => invocation.await,
    };

    let result = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => TaskFailure::Failed(e.to_string()).into(),
        Err(panic) => TaskFailure::Panicked(panic_message(panic.as_ref())).into(),
    };

    (index, result)
}

/// Best-effort extraction of a panic payload's message.
pub(super) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
