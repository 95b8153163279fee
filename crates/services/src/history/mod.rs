//! Persisted learning history, partitioned by app id.
//!
//! The whole history lives as one JSON object under [`HISTORY_KEY`] in the
//! injected key-value store: `{ "<appId>": [record, ...], ... }`, newest
//! record first in every partition. Each write re-serializes the whole
//! object, so read-modify-write sequences are serialized by a store-wide
//! lock.

mod record;
mod stats;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{FixedOffset, Offset, Utc};
use drill_core::Clock;
use drill_core::model::{AppId, rate_percent};
use storage::{KeyValueStore, StorageError};
use tracing::{info, warn};

use crate::error::HistoryError;
use crate::sync::{NoopSink, SyncEvent, SyncSink};

pub use record::{HistoryFields, HistoryRecord, RESERVED_KEYS};
pub use stats::DailyStats;

use record::StoredRecord;

/// Key under which the history blob is stored.
pub const HISTORY_KEY: &str = "study_history";
pub const DEFAULT_MAX_RECORDS_PER_APP: usize = 50;
pub const DEFAULT_LATEST_COUNT: usize = 5;

type Snapshot = BTreeMap<AppId, Vec<StoredRecord>>;

pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Clock,
    max_records_per_app: usize,
    utc_offset: FixedOffset,
    sync: Arc<dyn SyncSink>,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>, clock: Clock) -> Self {
        Self {
            kv,
            clock,
            max_records_per_app: DEFAULT_MAX_RECORDS_PER_APP,
            utc_offset: Utc.fix(),
            sync: Arc::new(NoopSink),
            write_lock: Mutex::new(()),
        }
    }

    /// Cap on records kept per app; older records are evicted on insert.
    #[must_use]
    pub fn with_max_records_per_app(mut self, max: usize) -> Self {
        self.max_records_per_app = max;
        self
    }

    /// Offset used for the `date`/`time` stamps and for "today".
    #[must_use]
    pub fn with_utc_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    /// Sink notified after every successful `record`.
    #[must_use]
    pub fn with_sync_sink(mut self, sink: Arc<dyn SyncSink>) -> Self {
        self.sync = sink;
        self
    }

    #[must_use]
    pub fn max_records_per_app(&self) -> usize {
        self.max_records_per_app
    }

    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    //
    // ─── WRITES ────────────────────────────────────────────────────────────────
    //

    /// Stamp `fields` with the current date and time, prepend the result to
    /// the app's partition and evict anything past the cap.
    ///
    /// Extra fields named like a stamped key are dropped. The sync sink is
    /// notified after the write; its outcome never reaches the caller.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the stored history cannot be read, parsed
    /// or written back.
    pub fn record(
        &self,
        app_id: &AppId,
        fields: HistoryFields,
    ) -> Result<HistoryRecord, HistoryError> {
        let stamp = self.clock.stamp(self.utc_offset);
        let mut extra = fields.extra;
        for key in RESERVED_KEYS {
            if extra.remove(key).is_some() {
                warn!(app_id = %app_id, key, "dropping extra history field that shadows a stamped key");
            }
        }

        let stored = StoredRecord {
            date: stamp.date,
            time: stamp.time,
            timestamp: stamp.timestamp,
            correct_count: fields.correct_count,
            total_count: fields.total_count,
            correct_rate_percent: rate_percent(
                u64::from(fields.correct_count),
                u64::from(fields.total_count),
            ),
            extra,
        };

        {
            let _guard = self.lock()?;
            let mut snapshot = self.load()?;
            let partition = snapshot.entry(app_id.clone()).or_default();
            partition.insert(0, stored.clone());
            partition.truncate(self.max_records_per_app);
            self.save(&snapshot)?;
        }

        let record = stored.into_record(app_id.clone());
        info!(
            app_id = %app_id,
            correct = record.correct_count,
            total = record.total_count,
            rate = record.correct_rate_percent,
            "history recorded"
        );

        // Sinks swallow their own failures; nothing comes back here.
        self.sync.notify(SyncEvent {
            app_id: app_id.clone(),
            record: record.clone(),
        });
        Ok(record)
    }

    /// Empty one app's partition, or drop the whole history when `app_id`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the store cannot be read or written.
    pub fn clear(&self, app_id: Option<&AppId>) -> Result<(), HistoryError> {
        let _guard = self.lock()?;
        match app_id {
            Some(app_id) => {
                let mut snapshot = self.load()?;
                snapshot.insert(app_id.clone(), Vec::new());
                self.save(&snapshot)?;
                info!(app_id = %app_id, "history partition cleared");
            }
            None => {
                self.kv.remove(HISTORY_KEY)?;
                info!("history cleared");
            }
        }
        Ok(())
    }

    /// Replace the whole history with a snapshot produced by [`export`].
    ///
    /// The snapshot is parsed completely before anything is written, so a
    /// malformed snapshot leaves the stored history untouched.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Deserialization` for malformed input, or a
    /// storage error if the write fails.
    ///
    /// [`export`]: HistoryStore::export
    pub fn import(&self, snapshot: &str) -> Result<(), HistoryError> {
        let parsed: Snapshot =
            serde_json::from_str(snapshot).map_err(HistoryError::Deserialization)?;
        let _guard = self.lock()?;
        self.save(&parsed)?;
        info!(apps = parsed.len(), "history imported");
        Ok(())
    }

    //
    // ─── READS ─────────────────────────────────────────────────────────────────
    //

    /// Up to `count` records for `app_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the stored history cannot be read.
    pub fn latest(&self, app_id: &AppId, count: usize) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self
            .partition(app_id)?
            .into_iter()
            .take(count)
            .collect())
    }

    /// Aggregate of today's records for `app_id`, or `None` if there are none.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the stored history cannot be read.
    pub fn stats_for_today(&self, app_id: &AppId) -> Result<Option<DailyStats>, HistoryError> {
        let today = self.today();
        let records = self.partition(app_id)?;
        Ok(Self::stats_for_date(&today, records))
    }

    /// Records dated within `start..=end` (inclusive, `YYYY-MM-DD`), newest first.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the stored history cannot be read.
    pub fn stats_for_range(
        &self,
        app_id: &AppId,
        start: &str,
        end: &str,
    ) -> Result<Vec<HistoryRecord>, HistoryError> {
        Ok(self
            .partition(app_id)?
            .into_iter()
            .filter(|r| r.date.as_str() >= start && r.date.as_str() <= end)
            .collect())
    }

    /// Today's aggregate for every app that has a partition.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the stored history cannot be read.
    pub fn all_today_stats(&self) -> Result<BTreeMap<AppId, Option<DailyStats>>, HistoryError> {
        let today = self.today();
        Ok(self
            .load()?
            .into_iter()
            .map(|(app_id, stored)| {
                let records = stored
                    .into_iter()
                    .map(|s| s.into_record(app_id.clone()))
                    .collect();
                let stats = Self::stats_for_date(&today, records);
                (app_id, stats)
            })
            .collect())
    }

    /// Every app id with a partition, in sorted order.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the stored history cannot be read.
    pub fn app_ids(&self) -> Result<Vec<AppId>, HistoryError> {
        Ok(self.load()?.into_keys().collect())
    }

    /// Pretty-printed JSON snapshot of the whole history.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError` if the stored history cannot be read or
    /// serialized.
    pub fn export(&self) -> Result<String, HistoryError> {
        let snapshot = self.load()?;
        serde_json::to_string_pretty(&snapshot).map_err(HistoryError::Serialization)
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    fn today(&self) -> String {
        self.clock.stamp(self.utc_offset).date
    }

    fn stats_for_date(date: &str, records: Vec<HistoryRecord>) -> Option<DailyStats> {
        let todays = records.into_iter().filter(|r| r.date == date).collect();
        DailyStats::from_records(date, todays)
    }

    fn partition(&self, app_id: &AppId) -> Result<Vec<HistoryRecord>, HistoryError> {
        let mut snapshot = self.load()?;
        Ok(snapshot
            .remove(app_id)
            .unwrap_or_default()
            .into_iter()
            .map(|s| s.into_record(app_id.clone()))
            .collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, HistoryError> {
        self.write_lock
            .lock()
            .map_err(|e| HistoryError::Storage(StorageError::Connection(e.to_string())))
    }

    // Missing key means no history yet.
    fn load(&self) -> Result<Snapshot, HistoryError> {
        match self.kv.get(HISTORY_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(HistoryError::Deserialization),
            None => Ok(Snapshot::new()),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), HistoryError> {
        let raw = serde_json::to_string(snapshot).map_err(HistoryError::Serialization)?;
        self.kv.set(HISTORY_KEY, &raw)?;
        Ok(())
    }
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore")
            .field("clock", &self.clock)
            .field("max_records_per_app", &self.max_records_per_app)
            .field("utc_offset", &self.utc_offset)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::time::fixed_clock;
    use serde_json::json;
    use storage::InMemoryStore;

    fn store() -> (Arc<InMemoryStore>, HistoryStore) {
        let kv = Arc::new(InMemoryStore::new());
        let history = HistoryStore::new(kv.clone(), fixed_clock());
        (kv, history)
    }

    #[test]
    fn record_stamps_and_computes_rate() {
        let (_, history) = store();
        let record = history
            .record(&AppId::calc(), HistoryFields::new(7, 10))
            .unwrap();
        assert_eq!(record.date, "2023-11-14");
        assert_eq!(record.time, "22:13:20");
        assert_eq!(record.timestamp, drill_core::time::FIXED_TEST_TIMESTAMP);
        assert_eq!(record.correct_rate_percent, 70);
    }

    #[test]
    fn zero_total_rate_is_zero() {
        let (_, history) = store();
        let record = history
            .record(&AppId::calc(), HistoryFields::new(0, 0))
            .unwrap();
        assert_eq!(record.correct_rate_percent, 0);
    }

    #[test]
    fn reserved_extra_fields_are_dropped() {
        let (_, history) = store();
        let fields = HistoryFields::new(1, 2)
            .with_field("date", "1999-01-01")
            .with_field("correctRate", 999)
            .with_field("mode", "random");
        let record = history.record(&AppId::kuku(), fields).unwrap();
        assert_eq!(record.date, "2023-11-14");
        assert_eq!(record.correct_rate_percent, 50);
        assert_eq!(record.extra.len(), 1);
        assert_eq!(record.extra["mode"], json!("random"));
    }

    #[test]
    fn missing_key_reads_as_empty() {
        let (_, history) = store();
        assert!(history.latest(&AppId::kuku(), 5).unwrap().is_empty());
        assert!(history.stats_for_today(&AppId::kuku()).unwrap().is_none());
        assert!(history.app_ids().unwrap().is_empty());
        assert_eq!(history.export().unwrap(), "{}");
    }

    #[test]
    fn clear_one_app_keeps_its_key() {
        let (kv, history) = store();
        history.record(&AppId::kuku(), HistoryFields::new(1, 1)).unwrap();
        history.record(&AppId::calc(), HistoryFields::new(1, 1)).unwrap();

        history.clear(Some(&AppId::kuku())).unwrap();
        assert!(history.latest(&AppId::kuku(), 5).unwrap().is_empty());
        assert_eq!(history.latest(&AppId::calc(), 5).unwrap().len(), 1);
        assert_eq!(history.app_ids().unwrap(), vec![AppId::calc(), AppId::kuku()]);

        history.clear(None).unwrap();
        assert_eq!(kv.get(HISTORY_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_blob_surfaces_as_deserialization_error() {
        let (kv, history) = store();
        kv.set(HISTORY_KEY, "not json").unwrap();
        assert!(matches!(
            history.latest(&AppId::kuku(), 5),
            Err(HistoryError::Deserialization(_))
        ));
    }
}
