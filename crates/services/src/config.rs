//! TOML configuration for the drill apps.
//!
//! Every field has a default, so an empty or missing file is a valid
//! configuration. The default location is `config.toml` in the platform
//! config directory.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use directories::ProjectDirs;
use drill_core::model::SessionOrder;
use serde::{Deserialize, Serialize};
use storage::{Storage, StorageError, default_data_dir};

use crate::error::ConfigError;
use crate::history::DEFAULT_MAX_RECORDS_PER_APP;
use crate::sessions::{DEFAULT_SESSION_LENGTH, SessionOptions};

/// Session defaults applied to every drill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_length")]
    pub length: usize,
    #[serde(default)]
    pub order: SessionOrder,
}

/// History store tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_records_per_app")]
    pub max_records_per_app: usize,
    /// Offset from UTC, in minutes, used for record dates and "today".
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Directory for `file`, database file for `sqlite`; ignored for `memory`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Remote history sync. Disabled when `endpoint` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillConfig {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_session_length() -> usize {
    DEFAULT_SESSION_LENGTH
}

fn default_max_records_per_app() -> usize {
    DEFAULT_MAX_RECORDS_PER_APP
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            length: default_session_length(),
            order: SessionOrder::default(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_records_per_app: default_max_records_per_app(),
            utc_offset_minutes: 0,
        }
    }
}

impl Default for DrillConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            history: HistoryConfig::default(),
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl DrillConfig {
    /// `config.toml` in the platform config directory, if there is one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "drill").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load from `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid TOML,
    /// or holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for a zero session length, a zero
    /// history cap, or an offset outside ±24h.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.length == 0 {
            return Err(ConfigError::Invalid("session.length must be at least 1".into()));
        }
        if self.history.max_records_per_app == 0 {
            return Err(ConfigError::Invalid(
                "history.max_records_per_app must be at least 1".into(),
            ));
        }
        self.utc_offset()?;
        Ok(())
    }

    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::new(self.session.length, self.session.order)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the offset is out of range.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.history
            .utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "history.utc_offset_minutes out of range: {}",
                    self.history.utc_offset_minutes
                ))
            })
    }

    /// Open the configured key-value backend.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be opened.
    pub fn open_storage(&self) -> Result<Storage, StorageError> {
        match self.storage.backend {
            StorageBackend::Memory => Ok(Storage::in_memory()),
            StorageBackend::File => {
                let dir = self.storage.path.clone().unwrap_or_else(default_data_dir);
                Storage::file(dir)
            }
            StorageBackend::Sqlite => {
                let file = self
                    .storage
                    .path
                    .clone()
                    .unwrap_or_else(|| default_data_dir().join("drill.db"));
                Storage::sqlite(file)
            }
        }
    }
}
