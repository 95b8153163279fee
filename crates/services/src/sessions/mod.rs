mod plan;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{DEFAULT_SESSION_LENGTH, ProblemSource, SessionOptions};
pub use progress::SessionProgress;
pub use service::{Session, SessionEngine};
pub use workflow::{AnswerOutcome, DrillRun};
