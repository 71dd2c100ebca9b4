pub mod grading;
pub mod merge;
pub mod student_eval;

pub use grading::GradingService;
pub use merge::apply_verdict;
pub use student_eval::StudentEvalService;
