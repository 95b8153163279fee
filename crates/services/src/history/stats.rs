use drill_core::model::rate_percent;
use serde::Serialize;

use super::record::HistoryRecord;

/// Aggregate of one app's records for a single calendar date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: String,
    pub attempts: usize,
    pub correct_rate_percent: u32,
    pub total_correct: u64,
    pub total_questions: u64,
    pub records: Vec<HistoryRecord>,
}

impl DailyStats {
    /// `None` when `records` is empty.
    #[must_use]
    pub fn from_records(date: impl Into<String>, records: Vec<HistoryRecord>) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let total_correct: u64 = records.iter().map(|r| u64::from(r.correct_count)).sum();
        let total_questions: u64 = records.iter().map(|r| u64::from(r.total_count)).sum();
        Some(Self {
            date: date.into(),
            attempts: records.len(),
            correct_rate_percent: rate_percent(total_correct, total_questions),
            total_correct,
            total_questions,
            records,
        })
    }
}
