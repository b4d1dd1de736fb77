//! Document ingestion built on the parallel executor.
//!
//! The knowledge-base ingester itself lives outside this crate and plugs in
//! through [`DocumentIngester`]. This module owns what surrounds it:
//! - staging uploaded bytes as temp files ([`staging`])
//! - running one ingester call per file under the executor's worker cap
//! - removing the staged files once the batch has returned, on every path

mod staging;


use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::executor::ParallelExecutor;
use crate::types::TaskResult;

use staging::stage_uploads_blocking;

/// Loads one document into the knowledge base.
///
/// Implementations are called concurrently from several worker tasks, so any
/// state they share must be synchronized by the implementation.
#[async_trait]
pub trait DocumentIngester: Send + Sync {
    /// Load the document at `path`.
    ///
    /// `path` is a staged temp file that is deleted after the batch returns;
    /// `original_filename` is the name the client uploaded it under.
    /// Returning `Err` marks only this document as failed.
    async fn load_document(&self, path: &Path, original_filename: &str) -> Result<TaskResult>;
}

/// A file received from a client
#[derive(Clone, Debug)]
pub struct Upload {
    /// Name the client gave the file
    pub filename: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Create an upload from a filename and its contents
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Ingest several uploads in parallel.
///
/// Returns one result per upload, in upload order. Fails as a whole only when
/// `uploads` is empty ([`Error::NoUploads`]) or staging fails; a document the
/// ingester rejects is a failed [`TaskResult`], not an error.
pub async fn ingest_uploads(
    ingester: Arc<dyn DocumentIngester>,
    uploads: Vec<Upload>,
    executor: &ParallelExecutor,
    config: &IngestConfig,
) -> Result<Vec<TaskResult>> {
    ingest_uploads_with_progress(ingester, uploads, executor, config, |_, _| {}).await
}

/// Ingest several uploads in parallel, reporting `(completed, total)` after each one.
pub async fn ingest_uploads_with_progress<P>(
    ingester: Arc<dyn DocumentIngester>,
    uploads: Vec<Upload>,
    executor: &ParallelExecutor,
    config: &IngestConfig,
    on_progress: P,
) -> Result<Vec<TaskResult>>
where
    P: FnMut(usize, usize) + Send,
{
    if uploads.is_empty() {
        return Err(Error::NoUploads);
    }

    let staged = stage_uploads_blocking(uploads, config).await?;
    tracing::info!(
        files = staged.len(),
        max_workers = executor.max_workers(),
        "Ingesting uploads in parallel"
    );

    let results = executor
        .run_batch_with_progress(
            staged.items(),
            move |(path, original_filename): (PathBuf, String)| {
                let ingester = Arc::clone(&ingester);
                async move { ingester.load_document(&path, &original_filename).await }
            },
            on_progress,
        )
        .await;

    // The batch has joined every worker, so nothing still reads these files.
    staged.cleanup_blocking().await;
    Ok(results)
}

/// Ingest a single upload.
///
/// The staged file is removed whether or not the ingester succeeds.
pub async fn ingest_upload(
    ingester: &dyn DocumentIngester,
    upload: Upload,
    config: &IngestConfig,
) -> Result<TaskResult> {
    let staged = stage_uploads_blocking(vec![upload], config).await?;

    let outcome = match staged.items().into_iter().next() {
        Some((path, original_filename)) => {
            ingester.load_document(&path, &original_filename).await
        }
        None => Err(Error::NoUploads),
    };

    staged.cleanup_blocking().await;
    outcome
}
