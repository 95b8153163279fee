use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseOptionError {
    #[error("unknown difficulty: {0:?} (expected easy or hard)")]
    Difficulty(String),
    #[error("unknown order: {0:?} (expected sequential or random)")]
    Order(String),
}

/// Ruleset controlling subtraction ordering and division remainders.
///
/// - `Easy`: subtraction never goes negative when the range starts at or
///   above zero, and division is always exact.
/// - `Hard`: subtraction operands keep their drawn order, and division
///   asks for a quotient plus a remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseOptionError::Difficulty(s.to_owned())),
        }
    }
}

/// Presentation order of a session's items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrder {
    #[default]
    Sequential,
    Random,
}

impl SessionOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionOrder::Sequential => "sequential",
            SessionOrder::Random => "random",
        }
    }
}

impl fmt::Display for SessionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionOrder {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(SessionOrder::Sequential),
            "random" | "shuffle" => Ok(SessionOrder::Random),
            _ => Err(ParseOptionError::Order(s.to_owned())),
        }
    }
}
