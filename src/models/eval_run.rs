//! Evaluation-run document shapes (schema `eval-run-1.0`)
//!
//! One `EvalRun` is produced per invocation and upserted into the
//! `evaluations` collection (or appended to the test-mode JSON file). The
//! dashboard reads these documents as-is, so the field names are fixed.

use serde::{Deserialize, Serialize};

use super::mcq::Validation;

/// Pointer back to the question document a result belongs to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct McqRef {
    pub problem_id: String,
    pub collection: String,
}

/// One student model's attempt at one question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentEvaluation {
    pub model: String,
    /// Extracted answer letter; None when no letter could be extracted or
    /// the call failed.
    pub answer: Option<String>,
    pub reasoning: String,
    pub correct: bool,
    pub time_ms: u64,
}

/// Aggregate stats over one question's student evaluations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionStats {
    /// Fraction of student models that answered correctly, rounded to 3 dp.
    pub accuracy: f64,
    pub avg_time_ms: u64,
}

/// Everything recorded for one validated question.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestionResult {
    pub original_mcq_ref: McqRef,
    pub validation: Validation,
    pub student_evaluations: Vec<StudentEvaluation>,
    pub question_stats: QuestionStats,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Summary {
    pub overall_accuracy: f64,
    pub avg_question_time_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunMetadata {
    pub schema_version: String,
}

/// The persisted document for one evaluation run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvalRun {
    pub test_run_id: String,
    /// RFC 3339, UTC
    pub evaluated_at: String,
    pub mode: String,
    pub sampler: String,
    pub batch_size: usize,
    pub validation_model: String,
    pub student_models: Vec<String>,
    pub shuffle_enabled: bool,
    pub questions: Vec<QuestionResult>,
    pub summary: Summary,
    /// Set when every validation batch failed and nothing was evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: RunMetadata,
}

pub const EVAL_RUN_SCHEMA_VERSION: &str = "eval-run-1.0";

impl QuestionStats {
    /// accuracy / mean latency over the student rows; zeros for an empty set.
    pub fn from_evaluations(evals: &[StudentEvaluation]) -> Self {
        if evals.is_empty() {
            return Self {
                accuracy: 0.0,
                avg_time_ms: 0,
            };
        }
        let correct = evals.iter().filter(|e| e.correct).count();
        let accuracy = correct as f64 / evals.len() as f64;
        let avg_time = evals.iter().map(|e| e.time_ms).sum::<u64>() / evals.len() as u64;
        Self {
            accuracy: (accuracy * 1000.0).round() / 1000.0,
            avg_time_ms: avg_time,
        }
    }
}

impl Summary {
    pub fn from_questions(questions: &[QuestionResult]) -> Self {
        if questions.is_empty() {
            return Self {
                overall_accuracy: 0.0,
                avg_question_time_ms: 0,
            };
        }
        let acc = questions
            .iter()
            .map(|q| q.question_stats.accuracy)
            .sum::<f64>()
            / questions.len() as f64;
        let avg = questions
            .iter()
            .map(|q| q.question_stats.avg_time_ms)
            .sum::<u64>()
            / questions.len() as u64;
        Self {
            overall_accuracy: (acc * 1000.0).round() / 1000.0,
            avg_question_time_ms: avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(correct: bool, time_ms: u64) -> StudentEvaluation {
        StudentEvaluation {
            model: "m".to_string(),
            answer: Some("A".to_string()),
            reasoning: String::new(),
            correct,
            time_ms,
        }
    }

    #[test]
    fn question_stats_rounds_to_three_decimals() {
        let stats =
            QuestionStats::from_evaluations(&[eval(true, 100), eval(false, 200), eval(false, 300)]);
        assert_eq!(stats.accuracy, 0.333);
        assert_eq!(stats.avg_time_ms, 200);
    }

    #[test]
    fn empty_sets_produce_zeroed_stats() {
        let stats = QuestionStats::from_evaluations(&[]);
        assert_eq!(stats.accuracy, 0.0);
        assert_eq!(stats.avg_time_ms, 0);

        let summary = Summary::from_questions(&[]);
        assert_eq!(summary.overall_accuracy, 0.0);
        assert_eq!(summary.avg_question_time_ms, 0);
    }
}
