//! Batch grading service
//!
//! The validation core: render a batch of MCQs into one prompt, send it to
//! the master model, parse the raw response as a JSON array of verdicts and
//! validate it against the batch. All-or-nothing: any contract violation
//! fails the whole batch with a `GradeError` naming the rule, the batch and
//! (where it applies) the offending index and value. The service never
//! retries and never substitutes a default verdict.
//!
//! Verdict `i` corresponds to batch question `i` strictly by position; the
//! response's `problem_id` echoes (if any) are ignored.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

use crate::clients::LlmClient;
use crate::error::{GradeError, LlmError};
use crate::models::{Difficulty, Mcq, RawVerdict, Verdict};
use crate::workflow::BatchCtx;

/// Batch grading service: one completion call per batch.
pub struct GradingService {
    client: LlmClient,
    model: String,
}

impl GradingService {
    pub fn new(client: LlmClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Render the validation prompt for a batch.
    ///
    /// Pure and deterministic: the same batch always yields byte-identical
    /// text (no timestamps, no reordering). Each question carries its
    /// zero-based `QUESTION <i>` label, problem_id, statement, choice
    /// lines, claimed answer and claimed difficulty (literal `unknown`
    /// when absent).
    pub fn render_prompt(batch: &[Mcq]) -> String {
        let mut parts = vec![
            "You are a discrete professor. For every question below, return **only** a JSON array with one object per question. \
             Each object must contain:\n\
             \x20 - final_answer: the correct letter (A/B/C/D)\n\
             \x20 - difficulty: easy / medium / hard\n\
             \x20 - shuffle: true / false\n\
             \x20 - issues: [] (or list of strings)\n\n\
             Return **nothing else** \u{2013} no markdown, no extra text.\n\n"
                .to_string(),
        ];

        for (i, q) in batch.iter().enumerate() {
            let choices = q
                .choices
                .iter()
                .map(|c| format!("{}) {}", c.id, c.text))
                .collect::<Vec<_>>()
                .join("\n");
            parts.push(format!(
                "QUESTION {} (problem_id: {})\n{}\n\n{}\n\nClaimed answer: {}\nClaimed difficulty: {}\n---\n",
                i,
                q.problem_id,
                q.statement,
                choices,
                q.claimed_answer().unwrap_or(""),
                q.claimed_difficulty(),
            ));
        }

        let joined = parts.concat();
        format!(
            "{}\n\nOutput JSON array now:",
            joined.trim_end_matches("---\n").trim_end()
        )
    }

    /// Grade a batch: one bounded completion call, then strict validation.
    pub async fn grade(&self, batch: &[Mcq], ctx: &BatchCtx) -> Result<Vec<Verdict>, GradeError> {
        let prompt = Self::render_prompt(batch);
        debug!("[{}] validation prompt: {} chars", ctx, prompt.len());

        let raw = self
            .client
            .simple_chat(&self.model, &prompt)
            .await
            .map_err(|e| match e {
                LlmError::Timeout { secs, .. } => GradeError::Timeout {
                    batch: ctx.label(),
                    secs,
                },
                other => GradeError::ServiceUnavailable {
                    batch: ctx.label(),
                    detail: other.to_string(),
                },
            })?;

        Self::parse_verdicts(batch, &raw, ctx)
    }

    /// Parse and validate a raw completion response against a batch.
    ///
    /// Validation order matches the contract: array shape, then count, then
    /// per-element answer reference, difficulty enum and field types. The
    /// first violation wins and nothing is partially accepted.
    pub fn parse_verdicts(
        batch: &[Mcq],
        raw: &str,
        ctx: &BatchCtx,
    ) -> Result<Vec<Verdict>, GradeError> {
        let array_text = extract_json_array(raw).ok_or_else(|| GradeError::MalformedResponse {
            batch: ctx.label(),
            detail: "no JSON array of objects found in response".to_string(),
        })?;

        let value: Value =
            serde_json::from_str(array_text).map_err(|e| GradeError::MalformedResponse {
                batch: ctx.label(),
                detail: format!("JSON parse error: {}", e),
            })?;

        let elements = value.as_array().ok_or_else(|| GradeError::MalformedResponse {
            batch: ctx.label(),
            detail: "top-level value is not an array".to_string(),
        })?;

        if elements.len() != batch.len() {
            return Err(GradeError::CountMismatch {
                batch: ctx.label(),
                expected: batch.len(),
                got: elements.len(),
            });
        }

        let mut verdicts = Vec::with_capacity(batch.len());
        for (i, (element, question)) in elements.iter().zip(batch).enumerate() {
            let raw_verdict: RawVerdict =
                serde_json::from_value(element.clone()).map_err(|e| {
                    GradeError::MalformedResponse {
                        batch: ctx.label(),
                        detail: format!("question {}: {}", i, e),
                    }
                })?;

            if !question.has_choice(&raw_verdict.final_answer) {
                return Err(GradeError::InvalidAnswerReference {
                    batch: ctx.label(),
                    index: i,
                    answer: raw_verdict.final_answer,
                });
            }

            let difficulty = Difficulty::parse(&raw_verdict.difficulty).ok_or_else(|| {
                GradeError::InvalidEnumValue {
                    batch: ctx.label(),
                    index: i,
                    value: raw_verdict.difficulty.clone(),
                }
            })?;

            verdicts.push(Verdict {
                final_answer: raw_verdict.final_answer,
                difficulty,
                shuffle: raw_verdict.shuffle,
                issues: raw_verdict.issues,
            });
        }

        Ok(verdicts)
    }
}

/// Locate the first JSON array of objects inside a raw response.
///
/// Documented leniency: the prompt forbids surrounding prose and markdown,
/// but completion services routinely wrap output in code fences anyway.
/// Rather than failing strict parsing on the wrapper, this strips it by
/// extracting the array substring; everything after extraction is strict.
fn extract_json_array(text: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?s)\[\s*\{.*?\}\s*(?:,\s*\{.*?\}\s*)*\]").expect("array regex compiles")
    });
    re.find(text).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(pid: &str, answer: &str, difficulty: Option<&str>) -> Mcq {
        serde_json::from_value(serde_json::json!({
            "problem_id": pid,
            "statement": format!("Statement for {pid}"),
            "choices": [
                {"id": "A", "text": "first"},
                {"id": "B", "text": "second"},
                {"id": "C", "text": "third"},
                {"id": "D", "text": "fourth"}
            ],
            "answer": {"correct_ids": [answer]},
            "difficulty": difficulty,
        }))
        .unwrap()
    }

    fn ctx() -> BatchCtx {
        BatchCtx::new("run_test".to_string(), 1, 0, 2)
    }

    #[test]
    fn render_is_deterministic() {
        let batch = vec![question("p1", "A", Some("easy")), question("p2", "C", None)];
        assert_eq!(
            GradingService::render_prompt(&batch),
            GradingService::render_prompt(&batch)
        );
    }

    #[test]
    fn render_embeds_labels_ids_choices_and_claims() {
        let batch = vec![question("p1", "B", Some("medium")), question("p2", "D", None)];
        let prompt = GradingService::render_prompt(&batch);

        assert!(prompt.contains("QUESTION 0 (problem_id: p1)"));
        assert!(prompt.contains("QUESTION 1 (problem_id: p2)"));
        assert!(prompt.contains("A) first"));
        assert!(prompt.contains("D) fourth"));
        assert!(prompt.contains("Claimed answer: B"));
        assert!(prompt.contains("Claimed difficulty: medium"));
        // missing difficulty renders as the literal "unknown"
        assert!(prompt.contains("Claimed difficulty: unknown"));
        assert!(prompt.ends_with("Output JSON array now:"));
        // the trailing separator of the last question is stripped
        assert!(!prompt.contains("---\n\n\nOutput"));
    }

    #[test]
    fn parse_accepts_exact_round_trip() {
        let batch = vec![question("p1", "A", Some("easy")), question("p2", "C", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"easy","shuffle":false,"issues":[]},{"final_answer":"C","difficulty":"medium","shuffle":true,"issues":["ambiguous wording"]}]"#;

        let verdicts = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap();
        assert_eq!(verdicts.len(), 2);
        assert_eq!(verdicts[0].final_answer, "A");
        assert_eq!(verdicts[0].difficulty, Difficulty::Easy);
        assert!(!verdicts[0].shuffle);
        assert!(verdicts[0].issues.is_empty());
        assert_eq!(verdicts[1].final_answer, "C");
        assert_eq!(verdicts[1].difficulty, Difficulty::Medium);
        assert!(verdicts[1].shuffle);
        assert_eq!(verdicts[1].issues, vec!["ambiguous wording".to_string()]);
    }

    #[test]
    fn parse_strips_code_fences_and_prose() {
        let batch = vec![question("p1", "A", Some("easy"))];
        let raw = "Sure, here are the verdicts:\n```json\n[{\"final_answer\":\"B\",\"difficulty\":\"hard\",\"shuffle\":false}]\n```\nLet me know if you need anything else.";

        let verdicts = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap();
        assert_eq!(verdicts[0].final_answer, "B");
        assert_eq!(verdicts[0].difficulty, Difficulty::Hard);
        assert!(verdicts[0].issues.is_empty());
    }

    #[test]
    fn parse_rejects_non_json() {
        let batch = vec![question("p1", "A", None)];
        let err = GradingService::parse_verdicts(&batch, "I cannot help with that.", &ctx())
            .unwrap_err();
        assert!(matches!(err, GradeError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_rejects_count_mismatch_short() {
        let batch = vec![question("p1", "A", None), question("p2", "B", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"easy","shuffle":false}]"#;
        let err = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap_err();
        match err {
            GradeError::CountMismatch { expected, got, .. } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 1);
            }
            other => panic!("expected CountMismatch, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_count_mismatch_long() {
        let batch = vec![question("p1", "A", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"easy","shuffle":false},{"final_answer":"B","difficulty":"easy","shuffle":false}]"#;
        let err = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap_err();
        assert!(matches!(
            err,
            GradeError::CountMismatch {
                expected: 1,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn parse_rejects_undeclared_answer_id() {
        let batch = vec![question("p1", "A", None), question("p2", "B", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"easy","shuffle":false},{"final_answer":"E","difficulty":"easy","shuffle":false}]"#;
        let err = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap_err();
        match err {
            GradeError::InvalidAnswerReference { index, answer, .. } => {
                assert_eq!(index, 1);
                assert_eq!(answer, "E");
            }
            other => panic!("expected InvalidAnswerReference, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_off_scale_difficulty() {
        let batch = vec![question("p1", "A", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"trivial","shuffle":false}]"#;
        let err = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap_err();
        match err {
            GradeError::InvalidEnumValue { index, value, .. } => {
                assert_eq!(index, 0);
                assert_eq!(value, "trivial");
            }
            other => panic!("expected InvalidEnumValue, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_non_boolean_shuffle() {
        let batch = vec![question("p1", "A", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"easy","shuffle":"yes"}]"#;
        let err = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap_err();
        assert!(matches!(err, GradeError::MalformedResponse { .. }));
    }

    #[test]
    fn parse_rejects_non_string_issues() {
        let batch = vec![question("p1", "A", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"easy","shuffle":false,"issues":[1,2]}]"#;
        let err = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap_err();
        assert!(matches!(err, GradeError::MalformedResponse { .. }));
    }

    #[test]
    fn missing_issues_defaults_to_empty() {
        let batch = vec![question("p1", "A", None)];
        let raw = r#"[{"final_answer":"A","difficulty":"easy","shuffle":true}]"#;
        let verdicts = GradingService::parse_verdicts(&batch, raw, &ctx()).unwrap();
        assert!(verdicts[0].issues.is_empty());
    }

    #[test]
    fn errors_carry_the_batch_label() {
        let batch = vec![question("p1", "A", None)];
        let err = GradingService::parse_verdicts(&batch, "nope", &ctx()).unwrap_err();
        assert!(err.to_string().contains("run_test batch 1"));
    }
}
