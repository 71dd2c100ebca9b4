//! Batch validation flow
//!
//! The complete handling of one batch: grade it (one completion call),
//! then merge each verdict into its question. Holds no store handle and no
//! run state; the orchestrator decides what happens to a failed batch.

use tracing::{info, warn};

use crate::clients::LlmClient;
use crate::config::Config;
use crate::error::GradeError;
use crate::models::Mcq;
use crate::services::{apply_verdict, GradingService};
use crate::utils::logging::truncate_text;
use crate::workflow::BatchCtx;

pub struct ValidationFlow {
    grading: GradingService,
    master_model: String,
    shuffle_choices: bool,
    verbose_logging: bool,
}

impl ValidationFlow {
    pub fn new(config: &Config, client: LlmClient) -> Self {
        Self {
            grading: GradingService::new(client, config.master_model.clone()),
            master_model: config.master_model.clone(),
            shuffle_choices: config.shuffle_choices,
            verbose_logging: config.verbose_logging,
        }
    }

    /// Grade a batch and merge the verdicts. Fails as a unit: on any
    /// contract violation the questions come back unchanged inside the
    /// error, never partially merged.
    pub async fn run(&self, batch: &[Mcq], ctx: &BatchCtx) -> Result<Vec<Mcq>, GradeError> {
        if self.verbose_logging {
            for (i, q) in batch.iter().enumerate() {
                info!(
                    "[{}] question {}: {} | {}",
                    ctx,
                    i,
                    q.problem_id,
                    truncate_text(&q.statement, 80)
                );
            }
        }

        let verdicts = self.grading.grade(batch, ctx).await?;

        let merged: Vec<Mcq> = batch
            .iter()
            .zip(&verdicts)
            .map(|(mcq, verdict)| {
                apply_verdict(mcq, verdict, &self.master_model, self.shuffle_choices)
            })
            .collect();

        let flagged = merged
            .iter()
            .filter(|m| m.validation_status.as_deref() == Some("flagged"))
            .count();
        if flagged > 0 {
            warn!("[{}] {} of {} questions flagged", ctx, flagged, merged.len());
        }
        info!("[{}] validated {} questions", ctx, merged.len());

        Ok(merged)
    }
}
