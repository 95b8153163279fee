use drill_core::model::{Problem, SessionOrder};
use drill_core::{GenerationPolicy, ProblemGenerator};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of questions in a session unless configured otherwise.
pub const DEFAULT_SESSION_LENGTH: usize = 10;

/// Where the problems of a session come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ProblemSource {
    /// Generate a fresh problem per slot from the same policy.
    Policy(GenerationPolicy),
    /// Use a fixed problem set in full, such as multiplication facts.
    Precomputed(Vec<Problem>),
}

impl ProblemSource {
    /// Materialize the problem list for one session.
    ///
    /// `length` only applies to `Policy`; a precomputed set is used whole.
    ///
    /// # Errors
    ///
    /// Propagates generator failures.
    pub fn build<R: Rng>(
        &self,
        generator: &mut ProblemGenerator<R>,
        length: usize,
    ) -> Result<Vec<Problem>, drill_core::Error> {
        match self {
            ProblemSource::Policy(policy) => generator.generate_batch(policy, length),
            ProblemSource::Precomputed(problems) => Ok(problems.clone()),
        }
    }
}

/// Length and ordering of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    pub length: usize,
    pub order: SessionOrder,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            length: DEFAULT_SESSION_LENGTH,
            order: SessionOrder::Sequential,
        }
    }
}

impl SessionOptions {
    #[must_use]
    pub fn new(length: usize, order: SessionOrder) -> Self {
        Self { length, order }
    }

    #[must_use]
    pub fn with_order(mut self, order: SessionOrder) -> Self {
        self.order = order;
        self
    }
}
