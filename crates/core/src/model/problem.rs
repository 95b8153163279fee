use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::ProblemId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Raised when an operator name is not one of the four supported operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperatorError {
    #[error("unsupported operator: {0:?}")]
    Unsupported(String),
}

/// Raised when operands would break a problem invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProblemError {
    #[error("divisor must be at least 1, got {0}")]
    InvalidDivisor(i64),
    #[error("{dividend} is not exactly divisible by {divisor}")]
    NotDivisible { dividend: i64, divisor: i64 },
    #[error("arithmetic overflow computing {a} {op} {b}")]
    Overflow { a: i64, op: Operator, b: i64 },
}

//
// ─── OPERATOR ─────────────────────────────────────────────────────────────────
//

/// One of the four arithmetic operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub const ALL: [Operator; 4] = [Operator::Add, Operator::Sub, Operator::Mul, Operator::Div];

    /// Short machine name (`add`, `sub`, `mul`, `div`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Add => "add",
            Operator::Sub => "sub",
            Operator::Mul => "mul",
            Operator::Div => "div",
        }
    }

    /// Symbol shown to the learner.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "−",
            Operator::Mul => "×",
            Operator::Div => "÷",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = OperatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "plus" | "+" => Ok(Operator::Add),
            "sub" | "minus" | "subtract" | "-" => Ok(Operator::Sub),
            "mul" | "multiply" | "times" | "*" | "x" => Ok(Operator::Mul),
            "div" | "divide" | "/" => Ok(Operator::Div),
            _ => Err(OperatorError::Unsupported(s.to_owned())),
        }
    }
}

//
// ─── PROBLEM ──────────────────────────────────────────────────────────────────
//

/// A single practice problem. Immutable once built.
///
/// Construction goes through [`Problem::arithmetic`] or
/// [`Problem::with_remainder`], which enforce the division invariants:
/// the divisor is always at least 1, exact division has no remainder,
/// and a remainder problem satisfies `a == b * answer + remainder` with
/// `0 <= remainder < b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    id: ProblemId,
    operand_a: i64,
    operand_b: i64,
    operator: Operator,
    correct_answer: i64,
    correct_remainder: Option<i64>,
    requires_remainder: bool,
}

impl Problem {
    /// Build a problem whose answer is a single integer.
    ///
    /// Division must be exact here; use [`Problem::with_remainder`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::InvalidDivisor` for a divisor below 1,
    /// `ProblemError::NotDivisible` for inexact division, and
    /// `ProblemError::Overflow` if the answer does not fit in `i64`.
    pub fn arithmetic(
        id: ProblemId,
        operator: Operator,
        operand_a: i64,
        operand_b: i64,
    ) -> Result<Self, ProblemError> {
        let overflow = || ProblemError::Overflow {
            a: operand_a,
            op: operator,
            b: operand_b,
        };
        let (correct_answer, correct_remainder) = match operator {
            Operator::Add => (operand_a.checked_add(operand_b).ok_or_else(overflow)?, None),
            Operator::Sub => (operand_a.checked_sub(operand_b).ok_or_else(overflow)?, None),
            Operator::Mul => (operand_a.checked_mul(operand_b).ok_or_else(overflow)?, None),
            Operator::Div => {
                if operand_b < 1 {
                    return Err(ProblemError::InvalidDivisor(operand_b));
                }
                if operand_a.rem_euclid(operand_b) != 0 {
                    return Err(ProblemError::NotDivisible {
                        dividend: operand_a,
                        divisor: operand_b,
                    });
                }
                (operand_a.div_euclid(operand_b), Some(0))
            }
        };

        Ok(Self {
            id,
            operand_a,
            operand_b,
            operator,
            correct_answer,
            correct_remainder,
            requires_remainder: false,
        })
    }

    /// Build a division problem that asks for both quotient and remainder.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::InvalidDivisor` if `divisor < 1`.
    pub fn with_remainder(id: ProblemId, dividend: i64, divisor: i64) -> Result<Self, ProblemError> {
        if divisor < 1 {
            return Err(ProblemError::InvalidDivisor(divisor));
        }
        Ok(Self {
            id,
            operand_a: dividend,
            operand_b: divisor,
            operator: Operator::Div,
            correct_answer: dividend.div_euclid(divisor),
            correct_remainder: Some(dividend.rem_euclid(divisor)),
            requires_remainder: true,
        })
    }

    #[must_use]
    pub fn id(&self) -> ProblemId {
        self.id
    }

    #[must_use]
    pub fn operand_a(&self) -> i64 {
        self.operand_a
    }

    #[must_use]
    pub fn operand_b(&self) -> i64 {
        self.operand_b
    }

    #[must_use]
    pub fn operator(&self) -> Operator {
        self.operator
    }

    #[must_use]
    pub fn correct_answer(&self) -> i64 {
        self.correct_answer
    }

    #[must_use]
    pub fn correct_remainder(&self) -> Option<i64> {
        self.correct_remainder
    }

    #[must_use]
    pub fn requires_remainder(&self) -> bool {
        self.requires_remainder
    }

    /// Question text without the answer, e.g. `17 ÷ 5 = ?`.
    #[must_use]
    pub fn prompt(&self) -> String {
        format!(
            "{} {} {} = ?",
            self.operand_a,
            self.operator.symbol(),
            self.operand_b
        )
    }

    /// Worked solution, e.g. `17 ÷ 5 = 3 r 2`.
    #[must_use]
    pub fn solution(&self) -> String {
        let base = format!(
            "{} {} {} = {}",
            self.operand_a,
            self.operator.symbol(),
            self.operand_b,
            self.correct_answer
        );
        match self.correct_remainder {
            Some(rem) if self.requires_remainder => format!("{base} r {rem}"),
            _ => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ProblemId {
        ProblemId::new(0)
    }

    #[test]
    fn operator_parses_short_and_long_names() {
        assert_eq!("add".parse::<Operator>().unwrap(), Operator::Add);
        assert_eq!("Minus".parse::<Operator>().unwrap(), Operator::Sub);
        assert_eq!("subtract".parse::<Operator>().unwrap(), Operator::Sub);
        assert_eq!("multiply".parse::<Operator>().unwrap(), Operator::Mul);
        assert_eq!(" div ".parse::<Operator>().unwrap(), Operator::Div);
    }

    #[test]
    fn operator_rejects_unknown_names() {
        let err = "mod".parse::<Operator>().unwrap_err();
        assert_eq!(err, OperatorError::Unsupported("mod".into()));
    }

    #[test]
    fn arithmetic_computes_answers() {
        assert_eq!(Problem::arithmetic(id(), Operator::Add, 4, 5).unwrap().correct_answer(), 9);
        assert_eq!(Problem::arithmetic(id(), Operator::Sub, 3, 8).unwrap().correct_answer(), -5);
        assert_eq!(Problem::arithmetic(id(), Operator::Mul, 7, 6).unwrap().correct_answer(), 42);

        let div = Problem::arithmetic(id(), Operator::Div, 42, 6).unwrap();
        assert_eq!(div.correct_answer(), 7);
        assert_eq!(div.correct_remainder(), Some(0));
        assert!(!div.requires_remainder());
    }

    #[test]
    fn exact_division_rejects_zero_and_remainders() {
        assert_eq!(
            Problem::arithmetic(id(), Operator::Div, 4, 0).unwrap_err(),
            ProblemError::InvalidDivisor(0)
        );
        assert!(matches!(
            Problem::arithmetic(id(), Operator::Div, 17, 5).unwrap_err(),
            ProblemError::NotDivisible { .. }
        ));
    }

    #[test]
    fn remainder_problem_matches_worked_example() {
        let p = Problem::with_remainder(id(), 17, 5).unwrap();
        assert_eq!(p.correct_answer(), 3);
        assert_eq!(p.correct_remainder(), Some(2));
        assert!(p.requires_remainder());
        assert_eq!(p.solution(), "17 ÷ 5 = 3 r 2");
    }

    #[test]
    fn remainder_is_never_negative() {
        let p = Problem::with_remainder(id(), -7, 3).unwrap();
        assert_eq!(p.correct_answer(), -3);
        assert_eq!(p.correct_remainder(), Some(2));
        assert_eq!(p.operand_a(), p.operand_b() * p.correct_answer() + 2);
    }

    #[test]
    fn overflow_is_reported() {
        let err = Problem::arithmetic(id(), Operator::Mul, i64::MAX, 2).unwrap_err();
        assert!(matches!(err, ProblemError::Overflow { .. }));
    }

    #[test]
    fn prompt_uses_symbols() {
        let p = Problem::arithmetic(id(), Operator::Mul, 3, 4).unwrap();
        assert_eq!(p.prompt(), "3 × 4 = ?");
    }
}
