//! # parallel-ingest
//!
//! Bounded-concurrency batch processing for uploaded documents.
//!
//! ## Design Philosophy
//!
//! parallel-ingest is designed to be:
//! - **Failure-isolated** - One bad file never takes down the batch
//! - **Order-preserving** - Results line up with the files that produced them
//! - **Library-first** - The knowledge-base loader plugs in through a trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use parallel_ingest::{process_in_parallel, TaskResult};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let files = vec!["a.pdf".to_string(), "b.pdf".to_string(), "c.pdf".to_string()];
//!
//!     let results = process_in_parallel(
//!         files,
//!         |file: String| async move {
//!             if file.starts_with('c') {
//!                 return Err(format!("{file}: disk error"));
//!             }
//!             Ok(TaskResult::success(format!("{file} loaded")))
//!         },
//!         2,
//!     )
//!     .await?;
//!
//!     for result in &results {
//!         println!("{}: {}", result.success, result.message);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! To serve uploads over HTTP, implement [`DocumentIngester`] and pass it to
//! [`api::start_api_server`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Bounded-concurrency batch executor
pub mod executor;
/// Upload staging and document ingestion
pub mod ingest;
/// Result types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ExecutorConfig, IngestConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, TaskFailure, ToHttpStatus};
pub use executor::{ParallelExecutor, process_in_parallel, process_in_parallel_with_progress};
pub use ingest::{
    DocumentIngester, Upload, ingest_upload, ingest_uploads, ingest_uploads_with_progress,
};
pub use types::{BatchSummary, TaskResult};

/// Wait for a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
#[cfg(unix)]
pub(crate) async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
pub(crate) async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
