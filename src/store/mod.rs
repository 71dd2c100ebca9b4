//! Question/evaluation persistence
//!
//! Two backends behind one enum, selected by `Config::mode`. The store is
//! an explicitly passed handle, created once per run and dropped with it.

pub mod json_store;
pub mod mongo_store;

pub use json_store::JsonStore;
pub use mongo_store::MongoStore;

use tracing::debug;

use crate::config::{Config, Mode, Sampler};
use crate::error::StoreError;
use crate::models::{EvalRun, Mcq};

pub enum EvalStore {
    Mongo(MongoStore),
    Json(JsonStore),
}

impl EvalStore {
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        match config.mode {
            Mode::Db => Ok(EvalStore::Mongo(MongoStore::connect(config).await?)),
            Mode::Test => Ok(EvalStore::Json(JsonStore::new(config))),
        }
    }

    /// Collection name recorded in `original_mcq_ref`.
    pub fn mcq_collection_name(&self) -> &str {
        match self {
            EvalStore::Mongo(store) => store.mcq_collection_name(),
            EvalStore::Json(_) => "questions",
        }
    }

    pub async fn load_mcqs(
        &self,
        sampler: Sampler,
        sample_size: usize,
    ) -> Result<Vec<Mcq>, StoreError> {
        match self {
            EvalStore::Mongo(store) => store.load_mcqs(sampler, sample_size).await,
            EvalStore::Json(store) => store.load_mcqs(sampler, sample_size),
        }
    }

    pub async fn save_evaluation(&self, run: &EvalRun) -> Result<(), StoreError> {
        match self {
            EvalStore::Mongo(store) => store.save_evaluation(run).await,
            EvalStore::Json(store) => store.save_evaluation(run),
        }
    }

    /// Write merged validation fields back onto the stored question
    /// document. Test mode keeps the baseline file untouched.
    pub async fn apply_validation(&self, mcq: &Mcq) -> Result<(), StoreError> {
        match self {
            EvalStore::Mongo(store) => store.apply_validation(mcq).await,
            EvalStore::Json(_) => {
                debug!(
                    "test mode: validation for {} kept in the run document only",
                    mcq.problem_id
                );
                Ok(())
            }
        }
    }
}
