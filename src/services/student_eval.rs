//! Student evaluation service
//!
//! After a question passes validation, every configured "student" model is
//! asked to solve it. Calls for one question fan out concurrently, one per
//! model; a failed call is recorded as an incorrect attempt with the error
//! text as reasoning, never as a run failure.

use std::path::Path;
use std::sync::OnceLock;
use std::time::Instant;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use futures::future::join_all;
use regex::Regex;
use tracing::{debug, warn};

use crate::clients::LlmClient;
use crate::models::{Mcq, QuestionStats, StudentEvaluation};

const REASONING_MAX_CHARS: usize = 500;

/// Runs the student models against validated questions.
pub struct StudentEvalService {
    client: LlmClient,
    models: Vec<String>,
    image_dir: String,
}

impl StudentEvalService {
    pub fn new(client: LlmClient, models: Vec<String>, image_dir: impl Into<String>) -> Self {
        Self {
            client,
            models,
            image_dir: image_dir.into(),
        }
    }

    /// Ask every student model the question and score the answers against
    /// the validated correct id.
    pub async fn evaluate_question(
        &self,
        mcq: &Mcq,
        ground_truth: &str,
    ) -> (Vec<StudentEvaluation>, QuestionStats) {
        let prompt = build_student_prompt(mcq);
        let image_data_url = mcq.image_path().and_then(|p| self.load_image(p));

        let calls = self.models.iter().map(|model| {
            let prompt = prompt.clone();
            let image = image_data_url.clone();
            async move {
                let started = Instant::now();
                let result = self
                    .client
                    .chat(model, &prompt, None, image.as_deref())
                    .await;
                let time_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(content) => {
                        let answer = extract_answer(&content);
                        let correct = answer.as_deref() == Some(ground_truth);
                        StudentEvaluation {
                            model: model.clone(),
                            answer,
                            reasoning: extract_reasoning(&content),
                            correct,
                            time_ms,
                        }
                    }
                    Err(e) => {
                        warn!("student call failed ({}): {}", model, e);
                        StudentEvaluation {
                            model: model.clone(),
                            answer: None,
                            reasoning: e.to_string(),
                            correct: false,
                            time_ms,
                        }
                    }
                }
            }
        });

        let evaluations = join_all(calls).await;
        let stats = QuestionStats::from_evaluations(&evaluations);
        (evaluations, stats)
    }

    /// Read a diagram image and encode it as a data URL. Failures degrade
    /// to a text-only call.
    fn load_image(&self, image_path: &str) -> Option<String> {
        let file_name = Path::new(image_path).file_name()?;
        let full_path = Path::new(&self.image_dir).join(file_name);
        match std::fs::read(&full_path) {
            Ok(bytes) => Some(format!(
                "data:image/png;base64,{}",
                BASE64.encode(bytes)
            )),
            Err(e) => {
                warn!("image read failed ({}): {}", full_path.display(), e);
                None
            }
        }
    }
}

/// Render the single-question prompt shown to student models.
pub fn build_student_prompt(mcq: &Mcq) -> String {
    let choices = mcq
        .choices
        .iter()
        .map(|c| format!("{}) {}", c.id, c.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Answer this MCQ.\n\n{}\n\n{}\n\nANSWER: <letter>\nREASONING: <2-3 sentences>",
        mcq.statement, choices
    )
}

/// Extract the chosen letter from a student response.
///
/// Prefers the `ANSWER: X` line; falls back to the first bare A-D token in
/// the opening of the response.
pub fn extract_answer(text: &str) -> Option<String> {
    static ANSWER_RE: OnceLock<Regex> = OnceLock::new();
    let re = ANSWER_RE
        .get_or_init(|| Regex::new(r"(?i)ANSWER:\s*([A-D])").expect("answer regex compiles"));
    if let Some(caps) = re.captures(text) {
        return Some(caps[1].to_uppercase());
    }

    static BARE_RE: OnceLock<Regex> = OnceLock::new();
    let bare = BARE_RE.get_or_init(|| Regex::new(r"\b([A-D])\b").expect("bare regex compiles"));
    let head: String = text.chars().take(120).collect();
    bare.captures(&head).map(|caps| caps[1].to_string())
}

/// Extract the reasoning text, capped at 500 characters.
pub fn extract_reasoning(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?is)REASONING:\s*(.+)").expect("reasoning regex compiles")
    });
    let body = re
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .unwrap_or_else(|| text.to_string());
    body.chars().take(REASONING_MAX_CHARS).collect()
}

impl std::fmt::Debug for StudentEvalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentEvalService")
            .field("models", &self.models)
            .field("image_dir", &self.image_dir)
            .finish()
    }
}
