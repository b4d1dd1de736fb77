//! Core types for parallel-ingest

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of processing a single task item
///
/// Exactly one `TaskResult` exists per submitted item, produced either by the
/// processing function or synthesized by the executor when the invocation
/// failed, panicked, timed out or was cancelled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TaskResult {
    /// Whether the item was processed successfully
    pub success: bool,

    /// Human-readable description of the outcome
    pub message: String,

    /// Optional structured data returned by the processing function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub payload: Option<serde_json::Value>,
}

impl TaskResult {
    /// Create a successful result
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: None,
        }
    }

    /// Create a failed result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: None,
        }
    }

    /// Attach structured data to this result
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Success/failure tally for a completed batch
///
/// Lets callers present partial success, e.g. "3 of 5 files loaded".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    /// Number of items in the batch
    pub total: usize,
    /// Items that completed successfully
    pub succeeded: usize,
    /// Items that failed, timed out or were cancelled
    pub failed: usize,
}

impl BatchSummary {
    /// Tally a batch of results
    pub fn from_results(results: &[TaskResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    /// True when every item succeeded (vacuously true for an empty batch)
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} of {} files loaded", self.succeeded, self.total)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summary_counts_successes_and_failures() {
        let results = vec![
            TaskResult::success("a.pdf loaded"),
            TaskResult::failure("disk error"),
            TaskResult::success("c.pdf loaded"),
        ];

        let summary = BatchSummary::from_results(&results);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.to_string(), "2 of 3 files loaded");
    }

    #[test]
    fn summary_of_empty_batch() {
        let summary = BatchSummary::from_results(&[]);
        assert_eq!(summary, BatchSummary::default());
        assert!(summary.all_succeeded());
    }

    #[test]
    fn payload_is_omitted_when_absent() {
        let value = serde_json::to_value(TaskResult::failure("nope")).unwrap();
        assert_eq!(value, json!({"success": false, "message": "nope"}));
    }

    #[test]
    fn payload_round_trips_through_json() {
        let result = TaskResult::success("ok").with_payload(json!({"chunks": 12}));
        let text = serde_json::to_string(&result).unwrap();
        let parsed: TaskResult = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed, result);
        assert_eq!(parsed.payload.unwrap()["chunks"], 12);
    }
}
