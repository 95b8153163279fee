use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::problem::Problem;

/// Parse learner input into an integer.
///
/// Reads an optional sign and the run of decimal digits at the start of the
/// trimmed input, ignoring whatever follows (`"12abc"` is 12, `"3.0"` is 3).
/// Input without leading digits, or too large for `i64`, yields `None`,
/// which never equals a correct answer.
#[must_use]
pub fn parse_answer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.trim_start_matches(['+', '-']);
    let sign_len = trimmed.len() - unsigned.len();
    if sign_len > 1 {
        return None;
    }
    let digits_len = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits_len == 0 {
        return None;
    }
    trimmed[..sign_len + digits_len].parse().ok()
}

/// Record of a single answered problem. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredRecord {
    pub problem: Problem,
    pub user_answer: String,
    pub user_remainder: Option<String>,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl AnsweredRecord {
    /// Grade `user_answer` (and `user_remainder` for remainder problems)
    /// against `problem`.
    #[must_use]
    pub fn grade(
        problem: &Problem,
        user_answer: &str,
        user_remainder: Option<&str>,
        answered_at: DateTime<Utc>,
    ) -> Self {
        let answer_ok = parse_answer(user_answer) == Some(problem.correct_answer());
        let is_correct = if problem.requires_remainder() {
            answer_ok && user_remainder.and_then(parse_answer) == problem.correct_remainder()
        } else {
            answer_ok
        };

        Self {
            problem: problem.clone(),
            user_answer: user_answer.to_owned(),
            user_remainder: if problem.requires_remainder() {
                user_remainder.map(str::to_owned)
            } else {
                None
            },
            is_correct,
            answered_at,
        }
    }
}
