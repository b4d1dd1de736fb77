//! Document ingestion handlers.

use super::BatchIngestResponse;
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::executor::ParallelExecutor;
use crate::ingest::{Upload, ingest_upload, ingest_uploads_with_progress};
use crate::types::{BatchSummary, TaskResult};
use axum::{
    Json,
    extract::{Multipart, State},
};
use chrono::Utc;
use std::sync::Arc;

/// Multipart field names that carry files
const UPLOAD_FIELDS: [&str; 2] = ["files", "file"];

/// POST /documents - Ingest one uploaded file
#[utoipa::path(
    post,
    path = "/documents",
    tag = "documents",
    request_body(content = Vec<u8>, description = "Document upload in the 'file' field (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Document loaded", body = crate::types::TaskResult),
        (status = 400, description = "No file, more than one file, or a malformed upload", body = crate::error::ApiError),
        (status = 422, description = "The ingester rejected the document", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn ingest_document(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TaskResult>> {
    let mut uploads = read_uploads(multipart).await?;
    if uploads.len() > 1 {
        return Err(Error::InvalidUpload(format!(
            "expected one file, got {}; use /documents/batch for several",
            uploads.len()
        )));
    }
    let upload = uploads.pop().ok_or(Error::NoUploads)?;

    tracing::info!(filename = %upload.filename, bytes = upload.bytes.len(), "Ingesting document");
    let result = ingest_upload(state.ingester.as_ref(), upload, &state.config.ingest).await?;
    Ok(Json(result))
}

/// POST /documents/batch - Ingest several uploaded files in parallel
///
/// Every file is loaded even if others fail; the per-file outcome is in
/// `results`. If the client disconnects mid-batch, in-flight loads are
/// aborted and staged files are still removed.
#[utoipa::path(
    post,
    path = "/documents/batch",
    tag = "documents",
    request_body(content = Vec<u8>, description = "One or more documents in 'files' fields (multipart/form-data)", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Batch processed; see per-file results", body = BatchIngestResponse),
        (status = 400, description = "No files or a malformed upload", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn ingest_documents_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchIngestResponse>> {
    let uploads = read_uploads(multipart).await?;
    let executor = ParallelExecutor::from_config(&state.config.executor)?;

    let results = ingest_uploads_with_progress(
        Arc::clone(&state.ingester),
        uploads,
        &executor,
        &state.config.ingest,
        |completed, total| tracing::debug!(completed, total, "Batch ingest progress"),
    )
    .await?;

    let summary = BatchSummary::from_results(&results);
    tracing::info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Batch ingest finished: {}",
        summary
    );

    Ok(Json(BatchIngestResponse {
        success: true,
        results,
        summary,
        completed_at: Utc::now(),
    }))
}

/// Collect every file field of a multipart body, in the order sent.
///
/// Fields other than `files`/`file` are ignored. A part without a filename is
/// named after its position.
async fn read_uploads(mut multipart: Multipart) -> Result<Vec<Upload>> {
    let mut uploads = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(Error::InvalidUpload(format!("malformed multipart body: {e}")));
            }
        };

        let name = field.name().unwrap_or("").to_string();
        if !UPLOAD_FIELDS.contains(&name.as_str()) {
            tracing::debug!(field = %name, "Ignoring non-file multipart field");
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("upload-{}", uploads.len() + 1));

        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidUpload(format!("failed to read {filename}: {e}")))?;

        uploads.push(Upload::new(filename, bytes.to_vec()));
    }

    Ok(uploads)
}
