//! Constrained random problem generation.
//!
//! One generator covers every operator; the per-operator rules live in
//! small functions selected by matching on [`Operator`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::Error;
use crate::model::{Difficulty, NumberRange, Operator, Problem, ProblemId};

/// Highest multiplication-table level and multiplier.
pub const TABLE_SIZE: u32 = 9;

//
// ─── POLICY ───────────────────────────────────────────────────────────────────
//

/// How to build each problem of a generated session.
///
/// Holds a non-empty, duplicate-free operator set; one operator is drawn per
/// problem, so a single-element set yields single-operator drills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPolicy {
    operators: Vec<Operator>,
    difficulty: Difficulty,
    range: NumberRange,
}

impl GenerationPolicy {
    /// # Errors
    ///
    /// Returns `Error::EmptyOperatorSet` if no operator is given.
    pub fn new(
        operators: impl IntoIterator<Item = Operator>,
        difficulty: Difficulty,
        range: NumberRange,
    ) -> Result<Self, Error> {
        let mut unique = Vec::new();
        for op in operators {
            if !unique.contains(&op) {
                unique.push(op);
            }
        }
        if unique.is_empty() {
            return Err(Error::EmptyOperatorSet);
        }
        Ok(Self {
            operators: unique,
            difficulty,
            range,
        })
    }

    #[must_use]
    pub fn single(operator: Operator, difficulty: Difficulty, range: NumberRange) -> Self {
        Self {
            operators: vec![operator],
            difficulty,
            range,
        }
    }

    #[must_use]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    #[must_use]
    pub fn range(&self) -> NumberRange {
        self.range
    }
}

//
// ─── GENERATOR ────────────────────────────────────────────────────────────────
//

/// Produces problems from a random source, numbering them in creation order.
#[derive(Debug, Clone)]
pub struct ProblemGenerator<R = StdRng> {
    rng: R,
    next_id: u64,
}

impl ProblemGenerator<StdRng> {
    /// Generator seeded from the operating system.
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    /// Reproducible generator, mainly for tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> ProblemGenerator<R> {
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng, next_id: 0 }
    }

    /// Random source, shared with session shuffling.
    pub fn rng_mut(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Generate one problem.
    ///
    /// # Errors
    ///
    /// Returns `Error::Problem` if the drawn operands break a problem
    /// invariant. Ranges are bounded by `OPERAND_LIMIT`, so this does not
    /// happen for ranges built through `NumberRange`.
    pub fn generate(
        &mut self,
        operator: Operator,
        difficulty: Difficulty,
        range: NumberRange,
    ) -> Result<Problem, Error> {
        let id = self.next_id();
        let problem = match operator {
            Operator::Add | Operator::Mul => self.plain(id, operator, range)?,
            Operator::Sub => self.subtraction(id, difficulty, range)?,
            Operator::Div => match difficulty {
                Difficulty::Easy => self.exact_division(id, range)?,
                Difficulty::Hard => self.division_with_remainder(id, range)?,
            },
        };
        Ok(problem)
    }

    /// Generate one problem, drawing the operator uniformly from the policy.
    ///
    /// # Errors
    ///
    /// See [`ProblemGenerator::generate`].
    pub fn generate_from(&mut self, policy: &GenerationPolicy) -> Result<Problem, Error> {
        let ops = policy.operators();
        let operator = if ops.len() == 1 {
            ops[0]
        } else {
            ops[self.rng.random_range(0..ops.len())]
        };
        self.generate(operator, policy.difficulty(), policy.range())
    }

    /// Generate `count` independent problems from a policy.
    ///
    /// # Errors
    ///
    /// See [`ProblemGenerator::generate`].
    pub fn generate_batch(
        &mut self,
        policy: &GenerationPolicy,
        count: usize,
    ) -> Result<Vec<Problem>, Error> {
        debug!(
            count,
            operators = ?policy.operators(),
            difficulty = %policy.difficulty(),
            range = %policy.range(),
            "generating problem batch"
        );
        (0..count).map(|_| self.generate_from(policy)).collect()
    }

    fn next_id(&mut self) -> ProblemId {
        let id = ProblemId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn draw(&mut self, range: NumberRange) -> i64 {
        self.rng.random_range(range.min()..=range.max())
    }

    fn plain(&mut self, id: ProblemId, op: Operator, range: NumberRange) -> Result<Problem, Error> {
        let a = self.draw(range);
        let b = self.draw(range);
        Ok(Problem::arithmetic(id, op, a, b)?)
    }

    fn subtraction(
        &mut self,
        id: ProblemId,
        difficulty: Difficulty,
        range: NumberRange,
    ) -> Result<Problem, Error> {
        let mut a = self.draw(range);
        let mut b = self.draw(range);
        if difficulty == Difficulty::Easy && range.min() >= 0 && a < b {
            std::mem::swap(&mut a, &mut b);
        }
        Ok(Problem::arithmetic(id, Operator::Sub, a, b)?)
    }

    // Built backwards from divisor and quotient so it always divides evenly.
    fn exact_division(&mut self, id: ProblemId, range: NumberRange) -> Result<Problem, Error> {
        let divisor = self.draw(range).max(1);
        let highest = range.max().div_euclid(divisor);
        let quotient = if highest >= 0 {
            self.rng.random_range(0..=highest)
        } else {
            self.rng.random_range(0..=1)
        };
        Ok(Problem::arithmetic(id, Operator::Div, divisor * quotient, divisor)?)
    }

    fn division_with_remainder(
        &mut self,
        id: ProblemId,
        range: NumberRange,
    ) -> Result<Problem, Error> {
        let divisor = self.draw(range).max(1);
        let dividend = self.draw(range);
        Ok(Problem::with_remainder(id, dividend, divisor)?)
    }
}

//
// ─── PRECOMPUTED SETS ─────────────────────────────────────────────────────────
//

/// Every fact `level × m` for `m` in `1..=9`, grouped by level in the given
/// order. Repeated levels are included once.
///
/// # Errors
///
/// Returns `Error::InvalidTableLevel` for a level outside `1..=9`.
pub fn multiplication_facts(levels: &[u32]) -> Result<Vec<Problem>, Error> {
    let mut seen = Vec::new();
    for &level in levels {
        if !(1..=TABLE_SIZE).contains(&level) {
            return Err(Error::InvalidTableLevel(level));
        }
        if !seen.contains(&level) {
            seen.push(level);
        }
    }

    let mut facts = Vec::with_capacity(seen.len() * TABLE_SIZE as usize);
    for level in seen {
        for multiplier in 1..=TABLE_SIZE {
            let id = ProblemId::new(facts.len() as u64);
            facts.push(Problem::arithmetic(
                id,
                Operator::Mul,
                i64::from(level),
                i64::from(multiplier),
            )?);
        }
    }
    Ok(facts)
}
