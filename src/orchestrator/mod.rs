pub mod run_processor;

pub use run_processor::{write_back_validation, App};
