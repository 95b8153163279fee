use std::fmt;

use drill_core::ProblemGenerator;
use drill_core::model::{Problem, SessionOrder};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

use super::plan::{ProblemSource, SessionOptions};
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Fixed-length sequence of items with a forward-only cursor.
///
/// The cursor starts at 0 and moves up by exactly one per advance;
/// `cursor == len` is terminal.
#[derive(Clone, PartialEq, Eq)]
pub struct Session<T = Problem> {
    items: Vec<T>,
    cursor: usize,
}

impl<T> Session<T> {
    fn new(items: Vec<T>) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self { items, cursor: 0 })
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Never true: sessions are rejected at start when they would be empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.items.len()
    }

    /// Item under the cursor, or `None` once the session is complete.
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.items.get(self.cursor)
    }

    /// Move to the next item and return it.
    ///
    /// Returns `None` when this call completes the session, and on every
    /// later call, which leaves the cursor where it is.
    pub fn advance(&mut self) -> Option<&T> {
        if self.is_complete() {
            return None;
        }
        self.cursor += 1;
        self.items.get(self.cursor)
    }

    /// 1-based position of the current item, pinned to `len` once complete.
    #[must_use]
    pub fn question_number(&self) -> usize {
        (self.cursor + 1).min(self.items.len())
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress::at(self.cursor, self.items.len())
    }
}

impl<T> fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("items_len", &self.items.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Owns at most one session for a single attempt and answers cursor queries.
///
/// Every query before `start` fails with `SessionError::NotStarted`.
pub struct SessionEngine<T = Problem> {
    session: Option<Session<T>>,
}

impl<T> Default for SessionEngine<T> {
    fn default() -> Self {
        Self { session: None }
    }
}

impl<T> SessionEngine<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session over `items`, shuffling them first for random order.
    ///
    /// Replaces any session already held.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if `items` is empty.
    pub fn start_items<R: Rng + ?Sized>(
        &mut self,
        mut items: Vec<T>,
        order: SessionOrder,
        rng: &mut R,
    ) -> Result<&Session<T>, SessionError> {
        if order == SessionOrder::Random {
            items.shuffle(rng);
        }
        let session = Session::new(items)?;
        debug!(len = session.len(), %order, "session started");
        Ok(&*self.session.insert(session))
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.session.is_some()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`.
    pub fn session(&self) -> Result<&Session<T>, SessionError> {
        self.session.as_ref().ok_or(SessionError::NotStarted)
    }

    fn session_mut(&mut self) -> Result<&mut Session<T>, SessionError> {
        self.session.as_mut().ok_or(SessionError::NotStarted)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`.
    pub fn current(&self) -> Result<Option<&T>, SessionError> {
        Ok(self.session()?.current())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`.
    pub fn advance(&mut self) -> Result<Option<&T>, SessionError> {
        Ok(self.session_mut()?.advance())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`.
    pub fn question_number(&self) -> Result<usize, SessionError> {
        Ok(self.session()?.question_number())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`.
    pub fn size(&self) -> Result<usize, SessionError> {
        Ok(self.session()?.len())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` before `start`.
    pub fn progress(&self) -> Result<SessionProgress, SessionError> {
        Ok(self.session()?.progress())
    }

    /// False until a started session reaches its terminal cursor.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_complete)
    }

    /// Discard the current session, returning it if there was one.
    pub fn abandon(&mut self) -> Option<Session<T>> {
        let abandoned = self.session.take();
        if let Some(session) = &abandoned {
            debug!(cursor = session.cursor(), len = session.len(), "session abandoned");
        }
        abandoned
    }
}

impl SessionEngine<Problem> {
    /// Build the problem list from `source` and start a session over it.
    ///
    /// The generator's random source also drives the shuffle for random order.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Generation` if problem generation fails, and
    /// `SessionError::Empty` if the source yields no problems.
    pub fn start<R: Rng>(
        &mut self,
        source: &ProblemSource,
        options: SessionOptions,
        generator: &mut ProblemGenerator<R>,
    ) -> Result<&Session<Problem>, SessionError> {
        let problems = source.build(generator, options.length)?;
        self.start_items(problems, options.order, generator.rng_mut())
    }
}

impl<T> fmt::Debug for SessionEngine<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEngine")
            .field("session", &self.session)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::{Difficulty, NumberRange, Operator};
    use drill_core::{GenerationPolicy, multiplication_facts};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn add_policy() -> ProblemSource {
        ProblemSource::Policy(GenerationPolicy::single(
            Operator::Add,
            Difficulty::Easy,
            NumberRange::from_digits(1).unwrap(),
        ))
    }

    #[test]
    fn queries_before_start_fail() {
        let mut engine: SessionEngine = SessionEngine::new();
        assert!(matches!(engine.current(), Err(SessionError::NotStarted)));
        assert!(matches!(engine.advance(), Err(SessionError::NotStarted)));
        assert!(matches!(engine.size(), Err(SessionError::NotStarted)));
        assert!(matches!(engine.question_number(), Err(SessionError::NotStarted)));
        assert!(!engine.is_complete());
    }

    #[test]
    fn walks_to_completion() {
        let mut engine = SessionEngine::new();
        let mut generator = ProblemGenerator::seeded(1);
        engine
            .start(&add_policy(), SessionOptions::default(), &mut generator)
            .unwrap();

        assert_eq!(engine.size().unwrap(), 10);
        assert_eq!(engine.question_number().unwrap(), 1);

        for step in 1..10 {
            assert!(engine.advance().unwrap().is_some());
            assert_eq!(engine.question_number().unwrap(), step + 1);
        }
        assert!(engine.advance().unwrap().is_none());
        assert!(engine.is_complete());
        assert_eq!(engine.current().unwrap(), None);
        assert_eq!(engine.question_number().unwrap(), 10);

        // Terminal advance is a no-op.
        assert!(engine.advance().unwrap().is_none());
        assert_eq!(engine.session().unwrap().cursor(), 10);
    }

    #[test]
    fn progress_tracks_cursor() {
        let mut engine = SessionEngine::new();
        let mut rng = StdRng::seed_from_u64(0);
        engine
            .start_items(vec!['a', 'b', 'c'], SessionOrder::Sequential, &mut rng)
            .unwrap();
        engine.advance().unwrap();

        let progress = engine.progress().unwrap();
        assert_eq!(progress.total, 3);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 2);
        assert!(!progress.is_complete);
    }

    #[test]
    fn sequential_keeps_generation_order() {
        let facts = multiplication_facts(&[3]).unwrap();
        let mut engine = SessionEngine::new();
        let mut generator = ProblemGenerator::seeded(9);
        let session = engine
            .start(
                &ProblemSource::Precomputed(facts.clone()),
                SessionOptions::default(),
                &mut generator,
            )
            .unwrap();
        assert_eq!(session.items(), facts.as_slice());
    }

    #[test]
    fn zero_length_is_empty() {
        let mut engine = SessionEngine::new();
        let mut generator = ProblemGenerator::seeded(1);
        let result = engine.start(
            &add_policy(),
            SessionOptions::new(0, SessionOrder::Sequential),
            &mut generator,
        );
        assert!(matches!(result, Err(SessionError::Empty)));
        assert!(!engine.is_started());
    }

    #[test]
    fn abandon_discards_session() {
        let mut engine = SessionEngine::new();
        let mut rng = StdRng::seed_from_u64(0);
        engine
            .start_items(vec![1, 2], SessionOrder::Sequential, &mut rng)
            .unwrap();
        let abandoned = engine.abandon().unwrap();
        assert_eq!(abandoned.len(), 2);
        assert!(matches!(engine.current(), Err(SessionError::NotStarted)));
    }

    #[test]
    fn random_order_is_a_permutation() {
        let facts = multiplication_facts(&[2, 7]).unwrap();
        for seed in 0..20 {
            let mut engine = SessionEngine::new();
            let mut generator = ProblemGenerator::seeded(seed);
            let session = engine
                .start(
                    &ProblemSource::Precomputed(facts.clone()),
                    SessionOptions::default().with_order(SessionOrder::Random),
                    &mut generator,
                )
                .unwrap();

            let mut shuffled: Vec<_> = session.items().to_vec();
            let mut original = facts.clone();
            shuffled.sort_by_key(Problem::id);
            original.sort_by_key(Problem::id);
            assert_eq!(shuffled, original);
        }
    }
}
