use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::answer::AnsweredRecord;

/// `round(100 * correct / total)` with halves rounded up; `0` when `total` is `0`.
#[must_use]
pub fn rate_percent(correct: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    let rounded = (200 * correct + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Aggregate result of a session, derived from its answered records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub correct_count: u32,
    pub total_count: u32,
    pub correct_rate_percent: u32,
    pub elapsed_ms: u64,
}

impl SessionSummary {
    /// Build a summary from answered records.
    ///
    /// Elapsed time saturates at zero if `completed_at` precedes `started_at`.
    #[must_use]
    pub fn from_records(
        records: &[AnsweredRecord],
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let total = records.len();
        let correct = records.iter().filter(|r| r.is_correct).count();
        let elapsed_ms = u64::try_from((completed_at - started_at).num_milliseconds()).unwrap_or(0);

        Self {
            correct_count: u32::try_from(correct).unwrap_or(u32::MAX),
            total_count: u32::try_from(total).unwrap_or(u32::MAX),
            correct_rate_percent: rate_percent(correct as u64, total as u64),
            elapsed_ms,
        }
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.total_count.saturating_sub(self.correct_count)
    }

    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.total_count > 0 && self.correct_count == self.total_count
    }
}
