#![forbid(unsafe_code)]

pub mod file;
pub mod repository;
pub mod sqlite;

pub use file::{FileStore, default_data_dir};
pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
pub use sqlite::SqliteStore;
