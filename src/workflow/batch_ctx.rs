//! Batch context
//!
//! Captures "which slice of which run am I grading" so every log line and
//! every `GradeError` can name the batch without re-running the call.

use std::fmt::Display;

/// Identity of one validation batch within a run.
#[derive(Debug, Clone)]
pub struct BatchCtx {
    /// Run this batch belongs to
    pub run_id: String,

    /// 1-based batch number (for logs)
    pub batch_num: usize,

    /// Absolute index of the batch's first question within the run sample
    pub start: usize,

    /// Number of questions in the batch
    pub len: usize,
}

impl BatchCtx {
    pub fn new(run_id: String, batch_num: usize, start: usize, len: usize) -> Self {
        Self {
            run_id,
            batch_num,
            start,
            len,
        }
    }

    /// Label used in errors and logs, e.g. `run_20250830_101500 batch 3 (questions 4-5)`.
    pub fn label(&self) -> String {
        format!(
            "{} batch {} (questions {}-{})",
            self.run_id,
            self.batch_num,
            self.start,
            self.start + self.len.saturating_sub(1)
        )
    }
}

impl Display for BatchCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
