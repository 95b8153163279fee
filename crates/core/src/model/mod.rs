mod answer;
mod ids;
mod options;
mod problem;
mod range;
mod summary;

pub use answer::{AnsweredRecord, parse_answer};
pub use ids::{AppId, ParseIdError, ProblemId};
pub use options::{Difficulty, ParseOptionError, SessionOrder};
pub use problem::{Operator, OperatorError, Problem, ProblemError};
pub use range::{MAX_DIGITS, NumberRange, OPERAND_LIMIT, RangeError};
pub use summary::{SessionSummary, rate_percent};
