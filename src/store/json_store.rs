//! JSON file store (test mode)
//!
//! Reads MCQs from a baseline JSON file (either an array of records or an
//! object keyed by problem_id, as the dataset scripts produce both) and
//! appends evaluation runs to a local JSON array file.

use rand::seq::IteratorRandom;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::{Config, Sampler};
use crate::error::StoreError;
use crate::models::{EvalRun, Mcq};

pub struct JsonStore {
    mcq_file: PathBuf,
    eval_file: PathBuf,
}

impl JsonStore {
    pub fn new(config: &Config) -> Self {
        Self {
            mcq_file: PathBuf::from(&config.mcq_json_file),
            eval_file: PathBuf::from(&config.eval_json_file),
        }
    }

    /// Load and sample MCQs from the baseline file.
    pub fn load_mcqs(&self, sampler: Sampler, sample_size: usize) -> Result<Vec<Mcq>, StoreError> {
        let path = self.mcq_file.display().to_string();
        let raw = std::fs::read_to_string(&self.mcq_file)
            .map_err(|source| StoreError::ReadFailed {
                path: path.clone(),
                source,
            })?;
        let data: Value =
            serde_json::from_str(&raw).map_err(|source| StoreError::JsonParseFailed {
                path: path.clone(),
                source,
            })?;

        let mut all = Vec::new();
        match data {
            Value::Array(entries) => {
                for entry in entries {
                    match serde_json::from_value::<Mcq>(entry) {
                        Ok(mcq) => all.push(mcq),
                        Err(e) => warn!("{}: skipping malformed record: {}", path, e),
                    }
                }
            }
            Value::Object(map) => {
                // master files are keyed by problem_id, with a schema_version entry
                for (pid, mut entry) in map {
                    if pid == "schema_version" {
                        continue;
                    }
                    if let Value::Object(obj) = &mut entry {
                        obj.entry("problem_id".to_string())
                            .or_insert_with(|| Value::String(pid.clone()));
                    }
                    match serde_json::from_value::<Mcq>(entry) {
                        Ok(mcq) => all.push(mcq),
                        Err(e) => warn!("{}: skipping malformed record {}: {}", path, pid, e),
                    }
                }
            }
            _ => return Err(StoreError::UnexpectedShape { path }),
        }

        let selected = match sampler {
            Sampler::Random => all
                .into_iter()
                .choose_multiple(&mut rand::rng(), sample_size),
            Sampler::Sequential => {
                all.truncate(sample_size);
                all
            }
        };
        debug!("loaded {} questions from {}", selected.len(), path);
        Ok(selected)
    }

    /// Append the run to the evaluations file (created on first use).
    pub fn save_evaluation(&self, run: &EvalRun) -> Result<(), StoreError> {
        let path = self.eval_file.display().to_string();

        let mut existing: Vec<Value> = match std::fs::read_to_string(&self.eval_file) {
            Ok(raw) => {
                serde_json::from_str(&raw).map_err(|source| StoreError::JsonParseFailed {
                    path: path.clone(),
                    source,
                })?
            }
            Err(_) => Vec::new(),
        };

        let run_value = serde_json::to_value(run).map_err(|source| StoreError::JsonParseFailed {
            path: path.clone(),
            source,
        })?;
        existing.push(run_value);

        let pretty = serde_json::to_string_pretty(&existing).map_err(|source| {
            StoreError::JsonParseFailed {
                path: path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.eval_file, pretty)
            .map_err(|source| StoreError::WriteFailed { path: path.clone(), source })?;

        info!("saved evaluation run to {}", path);
        Ok(())
    }
}
