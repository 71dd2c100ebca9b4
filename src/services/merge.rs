//! Verdict merge
//!
//! Applies an accepted verdict to its MCQ: answer override, difficulty
//! override, optional choice shuffle, and the `validation` metadata block.
//! The verdict is transient; after the merge only the MCQ's validation
//! fields carry it.

use chrono::{SecondsFormat, Utc};
use rand::seq::SliceRandom;
use tracing::debug;

use crate::models::{Mcq, Validation, Verdict};

/// Merge a verdict into a copy of the MCQ.
///
/// When `shuffle_enabled` is set and the verdict asks for a shuffle, the
/// choice *texts* are re-dealt across the fixed id sequence (A stays the
/// first tag, B the second, ...) and `correct_ids` is remapped to wherever
/// the correct text landed.
///
/// Invariant: `validation.final_answer` always equals the merged record's
/// `answer.correct_ids[0]`. A shuffle moves the correct text to a new id,
/// so the recorded letter is taken *after* the shuffle; anything scoring
/// against the validation block sees the same letter the stored choices do.
pub fn apply_verdict(mcq: &Mcq, verdict: &Verdict, validated_by: &str, shuffle_enabled: bool) -> Mcq {
    let mut merged = mcq.clone();

    let original_answer = mcq.claimed_answer().unwrap_or("").to_string();
    let original_difficulty = mcq.claimed_difficulty().to_string();

    if verdict.final_answer != original_answer {
        debug!(
            "{}: answer override {} -> {}",
            mcq.problem_id, original_answer, verdict.final_answer
        );
        merged.answer.correct_ids = vec![verdict.final_answer.clone()];
    }
    if verdict.difficulty.as_str() != original_difficulty {
        merged.difficulty = Some(verdict.difficulty.as_str().to_string());
    }

    let shuffle_applied = shuffle_enabled && verdict.shuffle;
    if shuffle_applied {
        shuffle_choices(&mut merged, &verdict.final_answer);
    }

    // post-shuffle letter; equal to the verdict's letter when no shuffle ran
    let final_answer = merged
        .claimed_answer()
        .unwrap_or(verdict.final_answer.as_str())
        .to_string();

    merged.validation = Some(Validation {
        validated_by: validated_by.to_string(),
        validated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        original_answer,
        final_answer,
        original_difficulty,
        final_difficulty: verdict.difficulty.as_str().to_string(),
        shuffle_applied,
        issues: verdict.issues.clone(),
    });
    merged.validation_status = Some(if verdict.issues.is_empty() {
        "validated".to_string()
    } else {
        "flagged".to_string()
    });
    merged.flags = Some(verdict.issues.clone());

    merged
}

/// Re-deal choice texts across the fixed id sequence and remap the correct id.
fn shuffle_choices(mcq: &mut Mcq, correct_id: &str) {
    let correct_text = match mcq.choices.iter().find(|c| c.id == correct_id) {
        Some(c) => c.text.clone(),
        // validated upstream; nothing sensible to shuffle against
        None => return,
    };

    let ids: Vec<String> = mcq.choices.iter().map(|c| c.id.clone()).collect();
    let mut texts: Vec<String> = mcq.choices.iter().map(|c| c.text.clone()).collect();
    texts.shuffle(&mut rand::rng());

    for (choice, (id, text)) in mcq.choices.iter_mut().zip(ids.into_iter().zip(texts)) {
        choice.id = id;
        choice.text = text;
    }

    if let Some(new_correct) = mcq.choices.iter().find(|c| c.text == correct_text) {
        mcq.answer.correct_ids = vec![new_correct.id.clone()];
    }
}
