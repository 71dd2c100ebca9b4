//! Error types for the grading pipeline and its collaborators.
//!
//! The grading contract is all-or-nothing: any violation fails the whole
//! batch, carrying the batch label and the offending index/value so the raw
//! completion output can be inspected without re-running the call.

use thiserror::Error;

/// A failed `grade` call. One variant per contract rule.
#[derive(Debug, Error)]
pub enum GradeError {
    /// The completion output was not parseable as a JSON array of objects.
    #[error("{batch}: malformed response: {detail}")]
    MalformedResponse { batch: String, detail: String },

    /// The array length did not match the batch length.
    #[error("{batch}: verdict count mismatch: expected {expected}, got {got}")]
    CountMismatch {
        batch: String,
        expected: usize,
        got: usize,
    },

    /// A verdict named an answer id the question never declared.
    #[error("{batch}: question {index}: final_answer '{answer}' is not a declared choice id")]
    InvalidAnswerReference {
        batch: String,
        index: usize,
        answer: String,
    },

    /// A verdict's difficulty was outside easy/medium/hard.
    #[error("{batch}: question {index}: difficulty '{value}' is not one of easy/medium/hard")]
    InvalidEnumValue {
        batch: String,
        index: usize,
        value: String,
    },

    /// The completion call itself failed.
    #[error("{batch}: completion service unavailable: {detail}")]
    ServiceUnavailable { batch: String, detail: String },

    /// The completion call exceeded the configured bound.
    #[error("{batch}: completion call timed out after {secs}s")]
    Timeout { batch: String, secs: u64 },
}

/// Failures of a single chat-completion call.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API call failed (model: {model}): {detail}")]
    ApiCallFailed { model: String, detail: String },

    #[error("LLM returned no choices (model: {model})")]
    EmptyResponse { model: String },

    #[error("LLM returned empty content (model: {model})")]
    EmptyContent { model: String },

    #[error("LLM call timed out after {secs}s (model: {model})")]
    Timeout { model: String, secs: u64 },
}

/// Failures of the question/evaluation store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("BSON conversion failed: {0}")]
    Bson(String),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    JsonParseFailed {
        path: String,
        source: serde_json::Error,
    },

    #[error("{path}: expected a JSON array of MCQs or an object keyed by problem_id")]
    UnexpectedShape { path: String },
}
