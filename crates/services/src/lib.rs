#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod history;
pub mod kanji_service;
pub mod scorer;
pub mod sessions;
pub mod sync;

pub use drill_core::Clock;
pub use sessions as session;

pub use config::{DrillConfig, StorageBackend};
pub use error::{ConfigError, HistoryError, KanjiError, SessionError};
pub use history::{DailyStats, HistoryFields, HistoryRecord, HistoryStore};
pub use kanji_service::{KanjiDrill, KanjiDrillService};
pub use scorer::Scorer;
pub use sessions::{
    AnswerOutcome, DrillRun, ProblemSource, Session, SessionEngine, SessionOptions,
    SessionProgress,
};
pub use sync::{HttpSyncSink, NoopSink, SyncEvent, SyncSink};
