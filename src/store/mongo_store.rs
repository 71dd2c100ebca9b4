//! MongoDB store (db mode)
//!
//! Typed collections over the `questions` and `evaluations` collections.
//! Each write is an independent, non-transactional document update;
//! `problem_id` values are unique so no cross-document consistency is
//! needed.

use futures::stream::TryStreamExt;
use mongodb::bson::{doc, from_document, to_bson, to_document, Document};
use mongodb::{Client, Collection};
use tracing::{debug, info};

use crate::config::{Config, Sampler};
use crate::error::StoreError;
use crate::models::{EvalRun, Mcq};

pub struct MongoStore {
    mcqs: Collection<Mcq>,
    evals: Collection<Document>,
    mcq_collection_name: String,
}

impl MongoStore {
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let db = client.database(&config.db_name);
        info!(
            "connected to MongoDB: db={} questions={} evaluations={}",
            config.db_name, config.mcq_collection, config.eval_collection
        );
        Ok(Self {
            mcqs: db.collection(&config.mcq_collection),
            evals: db.collection(&config.eval_collection),
            mcq_collection_name: config.mcq_collection.clone(),
        })
    }

    /// Name of the questions collection, recorded in `original_mcq_ref`.
    pub fn mcq_collection_name(&self) -> &str {
        &self.mcq_collection_name
    }

    /// Pull `sample_size` questions, either via `$sample` or sorted by
    /// `problem_id`.
    pub async fn load_mcqs(
        &self,
        sampler: Sampler,
        sample_size: usize,
    ) -> Result<Vec<Mcq>, StoreError> {
        let selected = match sampler {
            Sampler::Random => {
                let pipeline = vec![doc! {"$sample": {"size": sample_size as i64}}];
                let docs: Vec<Document> = self
                    .mcqs
                    .clone_with_type::<Document>()
                    .aggregate(pipeline)
                    .await?
                    .try_collect()
                    .await?;
                docs.into_iter()
                    .map(|d| from_document::<Mcq>(d).map_err(|e| StoreError::Bson(e.to_string())))
                    .collect::<Result<Vec<_>, _>>()?
            }
            Sampler::Sequential => {
                self.mcqs
                    .find(doc! {})
                    .sort(doc! {"problem_id": 1})
                    .limit(sample_size as i64)
                    .await?
                    .try_collect()
                    .await?
            }
        };
        debug!("loaded {} questions from MongoDB", selected.len());
        Ok(selected)
    }

    /// Upsert the run document by `test_run_id`.
    pub async fn save_evaluation(&self, run: &EvalRun) -> Result<(), StoreError> {
        let run_doc = to_document(run).map_err(|e| StoreError::Bson(e.to_string()))?;
        self.evals
            .update_one(
                doc! {"test_run_id": &run.test_run_id},
                doc! {"$set": run_doc},
            )
            .upsert(true)
            .await?;
        info!("saved evaluation run to MongoDB: {}", run.test_run_id);
        Ok(())
    }

    /// Write a merged MCQ's validation fields back onto its stored document.
    pub async fn apply_validation(&self, mcq: &Mcq) -> Result<(), StoreError> {
        let validation = mcq
            .validation
            .as_ref()
            .map(to_bson)
            .transpose()
            .map_err(|e| StoreError::Bson(e.to_string()))?;

        let mut set = doc! {
            "answer.correct_ids": mcq.answer.correct_ids.clone(),
            "choices": to_bson(&mcq.choices).map_err(|e| StoreError::Bson(e.to_string()))?,
        };
        if let Some(difficulty) = &mcq.difficulty {
            set.insert("difficulty", difficulty);
        }
        if let Some(validation) = validation {
            set.insert("validation", validation);
        }
        if let Some(status) = &mcq.validation_status {
            set.insert("validation_status", status);
        }
        if let Some(flags) = &mcq.flags {
            set.insert("flags", flags.clone());
        }

        self.mcqs
            .update_one(doc! {"problem_id": &mcq.problem_id}, doc! {"$set": set})
            .await?;
        debug!("validation written back for {}", mcq.problem_id);
        Ok(())
    }
}
