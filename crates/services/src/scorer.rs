use chrono::{DateTime, Utc};
use drill_core::Clock;
use drill_core::model::{AnsweredRecord, Problem, SessionSummary};

/// Grades answers for one attempt and keeps them in answer order.
///
/// Elapsed time is measured from construction, or from the last `reset`.
#[derive(Debug, Clone)]
pub struct Scorer {
    clock: Clock,
    records: Vec<AnsweredRecord>,
    started_at: DateTime<Utc>,
}

impl Scorer {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            records: Vec::new(),
            started_at: clock.now(),
        }
    }

    /// Grade an answer and append it to the record list.
    ///
    /// `user_remainder` only matters for problems that ask for a remainder.
    /// Input that is not an integer is simply wrong.
    pub fn score(
        &mut self,
        problem: &Problem,
        user_answer: &str,
        user_remainder: Option<&str>,
    ) -> bool {
        let record = AnsweredRecord::grade(problem, user_answer, user_remainder, self.clock.now());
        let is_correct = record.is_correct;
        self.records.push(record);
        is_correct
    }

    #[must_use]
    pub fn records(&self) -> &[AnsweredRecord] {
        &self.records
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Summary as of now.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        self.summary_at(self.clock.now())
    }

    #[must_use]
    pub fn summary_at(&self, now: DateTime<Utc>) -> SessionSummary {
        SessionSummary::from_records(&self.records, self.started_at, now)
    }

    /// Clear all records and restart the elapsed-time measurement.
    pub fn reset(&mut self) {
        self.records.clear();
        self.started_at = self.clock.now();
    }

    /// Advance a fixed clock, for tests and replays.
    pub fn advance_clock(&mut self, delta: chrono::Duration) {
        self.clock.advance(delta);
    }
}
