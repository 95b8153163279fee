use chrono::{DateTime, Utc};
use drill_core::model::{AppId, Problem, SessionSummary};
use drill_core::{Clock, ProblemGenerator};
use rand::Rng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use tracing::debug;

use super::plan::{ProblemSource, SessionOptions};
use super::service::SessionEngine;
use crate::error::SessionError;
use crate::history::{HistoryFields, HistoryRecord, HistoryStore};
use crate::scorer::Scorer;

/// Result of submitting an answer for the current problem.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOutcome {
    pub problem: Problem,
    pub is_correct: bool,
    pub is_complete: bool,
}

/// One quiz attempt: the session, its scorer, and what to record at the end.
///
/// Owned by a single caller; a new attempt either builds a new run or
/// calls `retry`.
pub struct DrillRun<R = StdRng> {
    app_id: AppId,
    source: ProblemSource,
    options: SessionOptions,
    generator: ProblemGenerator<R>,
    engine: SessionEngine<Problem>,
    scorer: Scorer,
    clock: Clock,
    completed_at: Option<DateTime<Utc>>,
}

impl<R: Rng> DrillRun<R> {
    /// Build the session for `app_id` and start timing it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot be generated or is empty.
    pub fn start(
        app_id: AppId,
        source: ProblemSource,
        options: SessionOptions,
        generator: ProblemGenerator<R>,
        clock: Clock,
    ) -> Result<Self, SessionError> {
        let mut run = Self {
            app_id,
            source,
            options,
            generator,
            engine: SessionEngine::new(),
            scorer: Scorer::new(clock),
            clock,
            completed_at: None,
        };
        run.engine
            .start(&run.source, run.options, &mut run.generator)?;
        debug!(app_id = %run.app_id, size = run.engine.size()?, "drill run started");
        Ok(run)
    }

    #[must_use]
    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    #[must_use]
    pub fn engine(&self) -> &SessionEngine<Problem> {
        &self.engine
    }

    #[must_use]
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the run lost its session.
    pub fn current(&self) -> Result<Option<&Problem>, SessionError> {
        self.engine.current()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the run lost its session.
    pub fn question_number(&self) -> Result<usize, SessionError> {
        self.engine.question_number()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the run lost its session.
    pub fn size(&self) -> Result<usize, SessionError> {
        self.engine.size()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.engine.is_complete()
    }

    /// Score `answer` against the current problem and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` once every problem was answered.
    pub fn submit(
        &mut self,
        answer: &str,
        remainder: Option<&str>,
    ) -> Result<AnswerOutcome, SessionError> {
        let problem = self.engine.current()?.cloned().ok_or(SessionError::Completed)?;
        let is_correct = self.scorer.score(&problem, answer, remainder);
        self.engine.advance()?;

        let is_complete = self.engine.is_complete();
        if is_complete {
            self.completed_at = Some(self.clock.now());
        }
        Ok(AnswerOutcome {
            problem,
            is_correct,
            is_complete,
        })
    }

    /// Summary so far; elapsed time stops when the last answer is submitted.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        match self.completed_at {
            Some(at) => self.scorer.summary_at(at),
            None => self.scorer.summary(),
        }
    }

    /// Record the finished run in `history` with app-specific `extra` fields.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` before the last answer, or
    /// `SessionError::History` if the write fails.
    pub fn finish(
        &self,
        history: &HistoryStore,
        extra: Map<String, Value>,
    ) -> Result<HistoryRecord, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::Incomplete);
        }
        let fields = HistoryFields::from_summary(&self.summary()).with_extra(extra);
        Ok(history.record(&self.app_id, fields)?)
    }

    /// Start over with fresh problems from the same source and a clean scorer.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session cannot be regenerated.
    pub fn retry(&mut self) -> Result<(), SessionError> {
        self.engine.abandon();
        self.engine
            .start(&self.source, self.options, &mut self.generator)?;
        self.scorer.reset();
        self.completed_at = None;
        debug!(app_id = %self.app_id, "drill run restarted");
        Ok(())
    }
}

impl<R> std::fmt::Debug for DrillRun<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrillRun")
            .field("app_id", &self.app_id)
            .field("options", &self.options)
            .field("engine", &self.engine)
            .field("answered", &self.scorer.records().len())
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}
