//! Upload staging: materialize uploaded bytes as temp files for the duration of
//! one ingest call, then remove them.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tracing::{debug, warn};

use crate::config::IngestConfig;
use crate::error::{Error, Result};

use super::Upload;

/// Prefix for staged file names, so stray files are recognizable.
const STAGED_FILE_PREFIX: &str = "upload-";

/// One upload written to disk, paired with the name the client gave it.
#[derive(Debug)]
pub(crate) struct StagedUpload {
    path: TempPath,
    original_filename: String,
}

/// Every upload of one request, staged.
///
/// Files are removed by [`StagedBatch::cleanup`]. If the batch is dropped
/// without cleanup (an early return or a dropped request future), each
/// `TempPath` still deletes its file on drop.
#[derive(Debug, Default)]
pub(crate) struct StagedBatch {
    uploads: Vec<StagedUpload>,
}

impl StagedBatch {
    /// `(path, original_filename)` pairs in upload order, owned so each can be
    /// moved into a separate invocation.
    pub(crate) fn items(&self) -> Vec<(PathBuf, String)> {
        self.uploads
            .iter()
            .map(|u| (u.path.to_path_buf(), u.original_filename.clone()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.uploads.len()
    }

    /// Delete every staged file. Failures are logged and otherwise ignored.
    pub(crate) fn cleanup(self) {
        for upload in self.uploads {
            let path = upload.path.to_path_buf();
            match upload.path.close() {
                Ok(()) => debug!(?path, "removed staged upload"),
                Err(e) => warn!(
                    ?path,
                    original_filename = %upload.original_filename,
                    error = %e,
                    "failed to remove staged upload"
                ),
            }
        }
    }

    /// [`cleanup`](Self::cleanup) on the blocking pool, so request tasks are
    /// not stalled by file removal.
    pub(crate) async fn cleanup_blocking(self) {
        if let Err(e) = tokio::task::spawn_blocking(move || self.cleanup()).await {
            warn!(error = %e, "staged upload cleanup task failed");
        }
    }
}

/// Write every upload to its own temp file.
///
/// All-or-nothing: if any upload cannot be written, the files staged so far
/// are removed and the I/O error is returned.
pub(crate) fn stage_uploads(uploads: Vec<Upload>, config: &IngestConfig) -> Result<StagedBatch> {
    let dir = match &config.temp_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => std::env::temp_dir(),
    };

    let mut batch = StagedBatch::default();
    for upload in uploads {
        match stage_one(upload, &dir, &config.file_suffix) {
            Ok(staged) => batch.uploads.push(staged),
            Err(e) => {
                warn!(dir = ?dir, error = %e, "failed to stage upload, discarding batch");
                batch.cleanup();
                return Err(Error::Io(e));
            }
        }
    }

    debug!(count = batch.len(), dir = ?dir, "staged uploads");
    Ok(batch)
}

/// Stage uploads on the blocking pool so request tasks are not stalled by disk writes.
pub(crate) async fn stage_uploads_blocking(
    uploads: Vec<Upload>,
    config: &IngestConfig,
) -> Result<StagedBatch> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || stage_uploads(uploads, &config))
        .await
        .map_err(|e| Error::Other(format!("upload staging task failed: {e}")))?
}

fn stage_one(upload: Upload, dir: &Path, suffix: &str) -> std::io::Result<StagedUpload> {
    let mut file = tempfile::Builder::new()
        .prefix(STAGED_FILE_PREFIX)
        .suffix(suffix)
        .tempfile_in(dir)?;
    file.write_all(&upload.bytes)?;
    file.flush()?;

    Ok(StagedUpload {
        path: file.into_temp_path(),
        original_filename: upload.filename,
    })
}
