//! MCQ document shapes (schema `mcq-1.0`)
//!
//! These mirror the documents in the `questions` collection / baseline JSON
//! files. Unknown fields are ignored on read and never written back, so the
//! structs stay usable against both storage backends.

use serde::{Deserialize, Serialize};

/// One answer choice: a single-letter tag plus its text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

/// The claimed answer block. `correct_ids` is ordered; the first entry is
/// the claimed correct choice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub correct_ids: Vec<String>,
}

/// Optional diagram attachment.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

/// Validation metadata merged onto an MCQ after a grading call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub validated_by: String,
    /// RFC 3339, UTC
    pub validated_at: String,
    pub original_answer: String,
    pub final_answer: String,
    pub original_difficulty: String,
    pub final_difficulty: String,
    pub shuffle_applied: bool,
    pub issues: Vec<String>,
}

/// A multiple-choice question record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mcq {
    pub problem_id: String,
    pub statement: String,
    pub choices: Vec<Choice>,
    pub answer: Answer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram_data: Option<DiagramData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flags: Option<Vec<String>>,
}

impl Mcq {
    /// The claimed correct choice id, if the record declares one.
    pub fn claimed_answer(&self) -> Option<&str> {
        self.answer.correct_ids.first().map(String::as_str)
    }

    /// The claimed difficulty, or the literal "unknown".
    pub fn claimed_difficulty(&self) -> &str {
        self.difficulty.as_deref().unwrap_or("unknown")
    }

    /// Whether `id` is one of this question's declared choice ids.
    pub fn has_choice(&self, id: &str) -> bool {
        self.choices.iter().any(|c| c.id == id)
    }

    /// Path of the attached diagram image, if any.
    pub fn image_path(&self) -> Option<&str> {
        self.diagram_data
            .as_ref()
            .and_then(|d| d.image_path.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mcq {
        serde_json::from_value(serde_json::json!({
            "problem_id": "rosen_ch1_001",
            "statement": "How many subsets does a set with 3 elements have?",
            "choices": [
                {"id": "A", "text": "6"},
                {"id": "B", "text": "8"},
                {"id": "C", "text": "9"},
                {"id": "D", "text": "12"}
            ],
            "answer": {"correct_ids": ["B"]},
            "difficulty": "easy",
            "validation_status": "unverified",
            "source": {"type": "extract", "book_title": "ignored"}
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_and_ignores_unknown_fields() {
        let mcq = sample();
        assert_eq!(mcq.problem_id, "rosen_ch1_001");
        assert_eq!(mcq.claimed_answer(), Some("B"));
        assert_eq!(mcq.claimed_difficulty(), "easy");
        assert!(mcq.has_choice("D"));
        assert!(!mcq.has_choice("E"));
        assert!(mcq.image_path().is_none());
    }

    #[test]
    fn missing_difficulty_reads_as_unknown() {
        let mut mcq = sample();
        mcq.difficulty = None;
        assert_eq!(mcq.claimed_difficulty(), "unknown");
    }
}
