//! Evaluation run processor - orchestration layer
//!
//! ## Responsibilities
//!
//! 1. **Initialization**: connect the store, build the LLM client and flows
//! 2. **Loading**: sample questions out of the store
//! 3. **Batching**: chunk the sample and validate one batch per LLM call
//! 4. **Failure policy**: a failed batch is logged and skipped as a unit;
//!    the run continues with the next batch (no retries here)
//! 5. **Student evaluation**: fan the validated questions out to the
//!    student models
//! 6. **Persistence**: assemble the `eval-run-1.0` document and save it;
//!    in db mode also write validation fields back onto the questions
//!    (best effort; a write-back failure never aborts the run)

use std::time::Duration;

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use tracing::{error, info, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::models::{
    EvalRun, McqRef, QuestionResult, RunMetadata, Summary, EVAL_RUN_SCHEMA_VERSION,
};
use crate::services::StudentEvalService;
use crate::store::EvalStore;
use crate::utils::logging;
use crate::workflow::{BatchCtx, ValidationFlow};

/// Pause between validation batches, to stay polite with the endpoint.
const BATCH_PAUSE: Duration = Duration::from_secs(1);

/// Application main structure
pub struct App {
    config: Config,
    store: EvalStore,
    validation: ValidationFlow,
    student_eval: StudentEvalService,
}

impl App {
    /// Connect the store and build the services.
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::log_startup(&config);

        let store = EvalStore::connect(&config).await?;
        let client = LlmClient::new(&config);
        let validation = ValidationFlow::new(&config, client.clone());
        let student_eval = StudentEvalService::new(
            client,
            config.student_models.clone(),
            config.image_dir.clone(),
        );

        Ok(Self {
            config,
            store,
            validation,
            student_eval,
        })
    }

    /// Run one full evaluation and return the persisted document.
    pub async fn run(&self) -> Result<EvalRun> {
        let selected = self
            .store
            .load_mcqs(self.config.sampler, self.config.sample_size)
            .await?;

        if selected.is_empty() {
            warn!("no questions selected, nothing to do");
        }
        let run_id = format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S"));
        logging::log_questions_loaded(selected.len(), self.config.batch_size);

        let mut question_results = Vec::new();
        let mut failed_batches = 0usize;
        let batch_size = self.config.batch_size.max(1);
        let total_batches = selected.len().div_ceil(batch_size);

        for (batch_idx, batch) in selected.chunks(batch_size).enumerate() {
            let ctx = BatchCtx::new(
                run_id.clone(),
                batch_idx + 1,
                batch_idx * batch_size,
                batch.len(),
            );
            logging::log_batch_start(ctx.batch_num, total_batches, batch.len());

            let merged = match self.validation.run(batch, &ctx).await {
                Ok(merged) => merged,
                Err(e) => {
                    // fail the batch as a unit; nothing from it is kept
                    error!("validation failed, skipping batch: {}", e);
                    failed_batches += 1;
                    continue;
                }
            };

            for mcq in &merged {
                write_back_validation(&self.store, mcq).await;
                question_results.push(self.evaluate_question(mcq).await);
            }

            logging::log_batch_complete(ctx.batch_num, merged.len());
            tokio::time::sleep(BATCH_PAUSE).await;
        }

        let run = self.assemble_run(run_id, selected.len(), question_results, failed_batches);
        self.store.save_evaluation(&run).await?;

        logging::print_final_stats(&run, failed_batches);
        Ok(run)
    }

    /// Run the student models against one validated question.
    async fn evaluate_question(&self, mcq: &crate::models::Mcq) -> QuestionResult {
        // merge always records validation before this point
        let validation = mcq
            .validation
            .clone()
            .unwrap_or_else(|| fallback_validation(mcq));
        let ground_truth = validation.final_answer.clone();

        info!(
            "evaluating {} against {} student models",
            mcq.problem_id,
            self.config.student_models.len()
        );
        let (student_evaluations, question_stats) =
            self.student_eval.evaluate_question(mcq, &ground_truth).await;

        QuestionResult {
            original_mcq_ref: McqRef {
                problem_id: mcq.problem_id.clone(),
                collection: self.store.mcq_collection_name().to_string(),
            },
            validation,
            student_evaluations,
            question_stats,
        }
    }

    fn assemble_run(
        &self,
        run_id: String,
        sample_len: usize,
        questions: Vec<QuestionResult>,
        failed_batches: usize,
    ) -> EvalRun {
        let error = if questions.is_empty() && failed_batches > 0 {
            Some("All validation batches failed".to_string())
        } else {
            None
        };
        let summary = Summary::from_questions(&questions);

        EvalRun {
            test_run_id: run_id,
            evaluated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            mode: self.config.mode.to_string(),
            sampler: self.config.sampler.to_string(),
            batch_size: sample_len,
            validation_model: self.config.master_model.clone(),
            student_models: self.config.student_models.clone(),
            shuffle_enabled: self.config.shuffle_choices,
            questions,
            summary,
            error,
            metadata: RunMetadata {
                schema_version: EVAL_RUN_SCHEMA_VERSION.to_string(),
            },
        }
    }
}

/// Best-effort validation write-back. A store failure on one question must
/// not lose the rest of the run: the evaluation document is still assembled
/// and saved, so the write-back is logged and the run continues.
pub async fn write_back_validation(store: &EvalStore, mcq: &crate::models::Mcq) {
    if let Err(e) = store.apply_validation(mcq).await {
        error!(
            "validation write-back failed for {}, continuing: {}",
            mcq.problem_id, e
        );
    }
}

/// Placeholder validation for the unreachable no-validation case; keeps the
/// run document well-formed without panicking mid-run.
fn fallback_validation(mcq: &crate::models::Mcq) -> crate::models::Validation {
    warn!("{}: missing validation block at evaluation time", mcq.problem_id);
    crate::models::Validation {
        validated_by: String::new(),
        validated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        original_answer: mcq.claimed_answer().unwrap_or("").to_string(),
        final_answer: mcq.claimed_answer().unwrap_or("").to_string(),
        original_difficulty: mcq.claimed_difficulty().to_string(),
        final_difficulty: mcq.claimed_difficulty().to_string(),
        shuffle_applied: false,
        issues: Vec::new(),
    }
}
