//! Per-question grading verdicts, as promised by the validation prompt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The difficulty scale the validator is allowed to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Strict parse; anything outside the scale is rejected by the caller.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One element of the completion response, before contract validation.
///
/// `issues` defaults to empty when the key is missing, per the prompt's own
/// documented default. Everything else is required.
#[derive(Clone, Debug, Deserialize)]
pub struct RawVerdict {
    pub final_answer: String,
    pub difficulty: String,
    pub shuffle: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

/// A fully validated verdict: `final_answer` is known to reference one of
/// the question's declared choice ids, and `difficulty` is on the scale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub final_answer: String,
    pub difficulty: Difficulty,
    pub shuffle: bool,
    pub issues: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parse_is_strict() {
        assert_eq!(Difficulty::parse("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("hard"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("trivial"), None);
        assert_eq!(Difficulty::parse("Easy"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn raw_verdict_defaults_missing_issues() {
        let raw: RawVerdict = serde_json::from_str(
            r#"{"final_answer":"A","difficulty":"easy","shuffle":false}"#,
        )
        .unwrap();
        assert!(raw.issues.is_empty());
    }

    #[test]
    fn raw_verdict_rejects_non_boolean_shuffle() {
        let res: Result<RawVerdict, _> = serde_json::from_str(
            r#"{"final_answer":"A","difficulty":"easy","shuffle":"yes"}"#,
        );
        assert!(res.is_err());
    }
}
