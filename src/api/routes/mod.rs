//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`documents`] - Single and batch document ingestion
//! - [`system`] - Health, OpenAPI

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BatchSummary, TaskResult};

mod documents;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use documents::*;
pub use system::*;

// ============================================================================
// Response Types (shared across handlers)
// ============================================================================

/// Response body for POST /documents/batch
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchIngestResponse {
    /// True when the batch ran; individual documents may still have failed
    pub success: bool,
    /// One result per uploaded file, in upload order
    pub results: Vec<TaskResult>,
    /// Counts over `results`
    pub summary: BatchSummary,
    /// When the last document finished
    pub completed_at: DateTime<Utc>,
}
