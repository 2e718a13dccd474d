//! Facade result types.
//!
//! Nothing above the facade sees a `KirimeError`; every operation collapses
//! into an `OperationOutcome` that callers (and the CLI's JSON output) can
//! inspect uniformly.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::KirimeError;

#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_files: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            output_file: None,
            output_files: None,
            text: None,
            subtitle: None,
            error: None,
            message: None,
        }
    }

    pub fn failed(error: &KirimeError) -> Self {
        Self {
            success: false,
            output_file: None,
            output_files: None,
            text: None,
            subtitle: None,
            error: Some(error.to_string()),
            message: None,
        }
    }

    pub fn with_output_file(mut self, path: PathBuf) -> Self {
        self.output_file = Some(path);
        self
    }

    pub fn with_output_files(mut self, paths: Vec<PathBuf>) -> Self {
        self.output_files = Some(paths);
        self
    }

    pub fn with_text(mut self, text: String) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_subtitle(mut self, path: PathBuf) -> Self {
        self.subtitle = Some(path);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Result of one job inside a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRow {
    pub input: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_files: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate of a whole batch. `success` holds only when every row succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub rows: Vec<BatchRow>,
}

impl BatchOutcome {
    pub fn from_rows(rows: Vec<BatchRow>) -> Self {
        let total = rows.len();
        let succeeded = rows.iter().filter(|r| r.success).count();
        let failed = total - succeeded;
        Self {
            success: failed == 0,
            total,
            succeeded,
            failed,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_serializes_without_empty_fields() {
        let outcome = OperationOutcome::ok().with_output_file(PathBuf::from("/out/a.mp4"));
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("a.mp4"));
        assert!(!json.contains("error"));
        assert!(!json.contains("text"));
    }

    #[test]
    fn test_failed_outcome_carries_error_string() {
        let outcome = OperationOutcome::failed(&KirimeError::Cancelled);
        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn test_batch_outcome_aggregates() {
        let rows = vec![
            BatchRow {
                input: PathBuf::from("a.mp4"),
                success: true,
                output_files: None,
                output_file: None,
                error: None,
            },
            BatchRow {
                input: PathBuf::from("b.mp4"),
                success: false,
                output_files: None,
                output_file: None,
                error: Some("boom".to_string()),
            },
        ];
        let batch = BatchOutcome::from_rows(rows);
        assert!(!batch.success);
        assert_eq!(batch.total, 2);
        assert_eq!(batch.succeeded, 1);
        assert_eq!(batch.failed, 1);
    }

    #[test]
    fn test_empty_batch_is_success() {
        let batch = BatchOutcome::from_rows(Vec::new());
        assert!(batch.success);
        assert_eq!(batch.total, 0);
    }
}
