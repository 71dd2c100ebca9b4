pub mod eval_run;
pub mod mcq;
pub mod verdict;

pub use eval_run::{
    EvalRun, McqRef, QuestionResult, QuestionStats, RunMetadata, StudentEvaluation, Summary,
    EVAL_RUN_SCHEMA_VERSION,
};
pub use mcq::{Answer, Choice, DiagramData, Mcq, Validation};
pub use verdict::{Difficulty, RawVerdict, Verdict};
