use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a generated problem, unique within one generator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProblemId(u64);

impl ProblemId {
    /// Creates a new `ProblemId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Identifier of a drill application, used to partition learning history.
///
/// Always non-empty and free of surrounding whitespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);

impl AppId {
    pub const KUKU: &'static str = "kuku";
    pub const CALC: &'static str = "calc";
    pub const SHISOKU: &'static str = "shisoku";
    pub const TANKANJI: &'static str = "tankanji";

    /// Creates a new `AppId`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `ParseIdError` if the trimmed identifier is empty.
    pub fn new(id: impl AsRef<str>) -> Result<Self, ParseIdError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ParseIdError {
                kind: "AppId".to_string(),
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Multiplication-table practice.
    #[must_use]
    pub fn kuku() -> Self {
        Self(Self::KUKU.to_owned())
    }

    /// Single-operator arithmetic practice.
    #[must_use]
    pub fn calc() -> Self {
        Self(Self::CALC.to_owned())
    }

    /// Mixed four-operation arithmetic practice.
    #[must_use]
    pub fn shisoku() -> Self {
        Self(Self::SHISOKU.to_owned())
    }

    /// Single-kanji reading practice.
    #[must_use]
    pub fn tankanji() -> Self {
        Self(Self::TANKANJI.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProblemId({})", self.0)
    }
}

impl fmt::Debug for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AppId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── Conversions ───────────────────────────────────────────────────────────────

/// Error type for parsing ID from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ProblemId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(ProblemId::new)
            .map_err(|_| ParseIdError {
                kind: "ProblemId".to_string(),
            })
    }
}

impl FromStr for AppId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppId::new(s)
    }
}

impl TryFrom<String> for AppId {
    type Error = ParseIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AppId::new(value)
    }
}

impl From<AppId> for String {
    fn from(id: AppId) -> Self {
        id.0
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
