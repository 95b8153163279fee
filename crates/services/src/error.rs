//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use storage::StorageError;

/// Errors emitted by the session engine and drill runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("no problems available for session")]
    Empty,
    #[error("session already completed")]
    Completed,
    #[error("session is not complete yet")]
    Incomplete,
    #[error(transparent)]
    Generation(#[from] drill_core::Error),
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Errors emitted by `HistoryStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("history snapshot is malformed: {0}")]
    Deserialization(#[source] serde_json::Error),
    #[error("failed to serialize history: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `KanjiDrillService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KanjiError {
    #[error("no kanji entries were provided")]
    NoEntries,
    #[error("stored kanji progress is malformed: {0}")]
    Progress(#[source] serde_json::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while loading `DrillConfig`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config value: {0}")]
    Invalid(String),
}
