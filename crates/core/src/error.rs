use thiserror::Error;

use crate::model::{OperatorError, ParseOptionError, ProblemError, RangeError};

/// Errors raised while building problems or problem sets.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Operator(#[from] OperatorError),
    #[error(transparent)]
    Option(#[from] ParseOptionError),
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error("at least one operator must be selected")]
    EmptyOperatorSet,
    #[error("multiplication table level must be between 1 and 9, got {0}")]
    InvalidTableLevel(u32),
}
