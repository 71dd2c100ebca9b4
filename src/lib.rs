//! # MathLabs Eval
//!
//! Batch validation and model evaluation for math MCQ datasets.
//!
//! ## Architecture
//!
//! The system is layered strictly from the bottom up:
//!
//! ### ① Clients
//! - `clients/` - protocol-level access to external services
//! - `LlmClient` - chat completions against any OpenAI-compatible endpoint
//!
//! ### ② Services
//! - `services/` - single capabilities, no flow knowledge
//! - `GradingService` - render a batch prompt, parse and validate verdicts
//! - `apply_verdict` - merge one verdict into one MCQ
//! - `StudentEvalService` - score student models on one question
//!
//! ### ③ Workflow
//! - `workflow/` - the complete handling of one batch
//! - `BatchCtx` - batch identity (run id + index range)
//! - `ValidationFlow` - grade → merge, all-or-nothing per batch
//!
//! ### ④ Orchestration
//! - `orchestrator/run_processor` - one evaluation run: load → validate →
//!   student-eval → persist
//!
//! The store (`store/`) is an explicitly passed handle over MongoDB or
//! local JSON files; models (`models/`) hold the `mcq-1.0` and
//! `eval-run-1.0` document shapes.

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

pub use clients::LlmClient;
pub use config::{Config, Mode, Sampler};
pub use error::{GradeError, LlmError, StoreError};
pub use models::{Difficulty, EvalRun, Mcq, Verdict};
pub use orchestrator::App;
pub use services::{apply_verdict, GradingService, StudentEvalService};
pub use store::EvalStore;
pub use workflow::{BatchCtx, ValidationFlow};
