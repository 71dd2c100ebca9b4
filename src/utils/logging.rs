//! Logging helpers
//!
//! Subscriber setup plus the banner-style run/batch log lines.

use tracing::info;

use crate::config::Config;
use crate::models::EvalRun;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// `info` level.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 MathLabs evaluation run");
    info!(
        "📊 mode: {} | sampler: {} | sample: {} | batch size: {}",
        config.mode, config.sampler, config.sample_size, config.batch_size
    );
    info!("🧑‍🏫 validator: {}", config.master_model);
    info!("🧑‍🎓 students: {}", config.student_models.join(", "));
    info!("{}", "=".repeat(60));
}

pub fn log_questions_loaded(total: usize, batch_size: usize) {
    info!("✓ selected {} questions", total);
    info!("📋 validating in batches of {}\n", batch_size);
}

pub fn log_batch_start(batch_num: usize, total_batches: usize, len: usize) {
    info!("\n{}", "=".repeat(60));
    info!(
        "📦 validating batch {}/{} ({} questions)",
        batch_num, total_batches, len
    );
    info!("{}", "=".repeat(60));
}

pub fn log_batch_complete(batch_num: usize, validated: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ batch {} done: {} questions validated", batch_num, validated);
    info!("{}", "─".repeat(60));
}

pub fn print_final_stats(run: &EvalRun, failed_batches: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 run complete: {}", run.test_run_id);
    info!("{}", "=".repeat(60));
    info!("✅ questions evaluated: {}", run.questions.len());
    info!("❌ failed batches: {}", failed_batches);
    info!(
        "🎯 overall accuracy: {:.3} | avg question time: {} ms",
        run.summary.overall_accuracy, run.summary.avg_question_time_ms
    );
    info!("{}", "=".repeat(60));
}

/// Truncate long text for log display.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_text("short", 80), "short");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        // multi-byte input must not be sliced mid-character
        assert_eq!(truncate_text("αβγδε", 2), "αβ...");
    }
}
