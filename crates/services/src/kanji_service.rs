use std::collections::HashSet;
use std::sync::Arc;

use drill_core::kanji::{DEFAULT_BATCH_SIZE, KanjiEntry, KanjiOrder, select_kanji_batch};
use drill_core::model::{AppId, SessionOrder};
use rand::Rng;
use serde_json::Value;
use storage::KeyValueStore;
use tracing::{debug, info};

use crate::error::{KanjiError, SessionError};
use crate::history::{HistoryFields, HistoryRecord, HistoryStore};
use crate::sessions::SessionEngine;

/// Reading-practice drill type recorded in history.
pub const READING_DRILL: &str = "read";

/// Storage key holding the ids already shown for `grade`.
#[must_use]
pub fn progress_key(grade: u8) -> String {
    format!("tankanji_progress_{grade}_{READING_DRILL}")
}

/// Picks kanji batches that avoid repeats until a grade is exhausted.
#[derive(Clone)]
pub struct KanjiDrillService {
    kv: Arc<dyn KeyValueStore>,
    batch_size: usize,
}

impl KanjiDrillService {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Ids already shown for `grade`, in the order they were shown.
    ///
    /// Numeric ids written by older clients are read as their decimal text.
    ///
    /// # Errors
    ///
    /// Returns `KanjiError::Progress` if the stored list is not a JSON array.
    pub fn used_ids(&self, grade: u8) -> Result<Vec<String>, KanjiError> {
        let Some(raw) = self.kv.get(&progress_key(grade))? else {
            return Ok(Vec::new());
        };
        let values: Vec<Value> = serde_json::from_str(&raw).map_err(KanjiError::Progress)?;
        Ok(values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect())
    }

    /// Forget which kanji of `grade` were shown.
    ///
    /// # Errors
    ///
    /// Returns `KanjiError::Storage` if the key cannot be removed.
    pub fn reset_progress(&self, grade: u8) -> Result<(), KanjiError> {
        self.kv.remove(&progress_key(grade))?;
        Ok(())
    }

    /// Select the next batch for `grade` from `entries` and start a drill.
    ///
    /// The selected ids are stored as shown right away. When every entry had
    /// been shown, progress starts over from an empty list.
    ///
    /// # Errors
    ///
    /// Returns `KanjiError::NoEntries` if `entries` is empty, or a storage
    /// error if progress cannot be read or written.
    pub fn start<R: Rng + ?Sized>(
        &self,
        entries: &[KanjiEntry],
        grade: u8,
        order: KanjiOrder,
        rng: &mut R,
    ) -> Result<KanjiDrill, KanjiError> {
        if entries.is_empty() {
            return Err(KanjiError::NoEntries);
        }

        let mut used = self.used_ids(grade)?;
        let used_set: HashSet<String> = used.iter().cloned().collect();
        let batch = select_kanji_batch(entries, &used_set, order, self.batch_size, rng);
        if batch.progress_reset {
            info!(grade, "all kanji shown; progress reset");
            used.clear();
        }

        used.extend(batch.entries.iter().map(|e| e.id.clone()));
        let raw = serde_json::to_string(&used).map_err(KanjiError::Progress)?;
        self.kv.set(&progress_key(grade), &raw)?;
        debug!(grade, %order, selected = batch.entries.len(), used = used.len(), "kanji batch selected");

        let mut engine = SessionEngine::new();
        // Batch is already ordered.
        engine.start_items(batch.entries, SessionOrder::Sequential, rng)?;
        Ok(KanjiDrill {
            grade,
            order,
            engine,
            progress_reset: batch.progress_reset,
        })
    }

    /// Record a completed drill: every shown kanji counts as done.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` (wrapped) if the drill has not
    /// reached its end, or a history error if the write fails.
    pub fn finish(
        &self,
        drill: &KanjiDrill,
        history: &HistoryStore,
    ) -> Result<HistoryRecord, KanjiError> {
        if !drill.is_complete() {
            return Err(SessionError::Incomplete.into());
        }
        let count = u32::try_from(drill.entries()?.len()).unwrap_or(u32::MAX);
        let fields = HistoryFields::new(count, count)
            .with_field("grade", drill.grade)
            .with_field("type", READING_DRILL)
            .with_field("order", drill.order.as_str())
            .with_field("kanjis", drill.kanji_list()?);
        Ok(history.record(&AppId::tankanji(), fields)?)
    }
}

/// One kanji reading drill in progress.
#[derive(Debug)]
pub struct KanjiDrill {
    grade: u8,
    order: KanjiOrder,
    engine: SessionEngine<KanjiEntry>,
    progress_reset: bool,
}

impl KanjiDrill {
    #[must_use]
    pub fn grade(&self) -> u8 {
        self.grade
    }

    #[must_use]
    pub fn order(&self) -> KanjiOrder {
        self.order
    }

    /// True when this batch started over because every kanji had been shown.
    #[must_use]
    pub fn progress_reset(&self) -> bool {
        self.progress_reset
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the drill holds no session.
    pub fn current(&self) -> Result<Option<&KanjiEntry>, SessionError> {
        self.engine.current()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the drill holds no session.
    pub fn advance(&mut self) -> Result<Option<&KanjiEntry>, SessionError> {
        self.engine.advance()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the drill holds no session.
    pub fn question_number(&self) -> Result<usize, SessionError> {
        self.engine.question_number()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the drill holds no session.
    pub fn size(&self) -> Result<usize, SessionError> {
        self.engine.size()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.engine.is_complete()
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the drill holds no session.
    pub fn entries(&self) -> Result<&[KanjiEntry], SessionError> {
        Ok(self.engine.session()?.items())
    }

    /// The batch's kanji joined into one string, as stored in history.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotStarted` if the drill holds no session.
    pub fn kanji_list(&self) -> Result<String, SessionError> {
        Ok(self.entries()?.iter().map(|e| e.kanji.as_str()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::time::fixed_clock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;
    use storage::InMemoryStore;

    fn entries(n: u32) -> Vec<KanjiEntry> {
        (1..=n)
            .map(|i| KanjiEntry {
                id: i.to_string(),
                kanji: char::from_u32(0x4E00 + i).map(String::from).unwrap_or_default(),
                grade: 1,
                strokes: n - i + 1,
                kun_reading: None,
                on_reading: None,
            })
            .collect()
    }

    #[test]
    fn empty_entries_are_rejected() {
        let service = KanjiDrillService::new(Arc::new(InMemoryStore::new()));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            service.start(&[], 1, KanjiOrder::Stroke, &mut rng),
            Err(KanjiError::NoEntries)
        ));
    }

    #[test]
    fn batches_avoid_repeats_then_reset() {
        let kv = Arc::new(InMemoryStore::new());
        let service = KanjiDrillService::new(kv.clone()).with_batch_size(4);
        let all = entries(10);
        let mut rng = StdRng::seed_from_u64(5);

        let mut seen = HashSet::new();
        for _ in 0..3 {
            let drill = service.start(&all, 1, KanjiOrder::Random, &mut rng).unwrap();
            assert!(!drill.progress_reset());
            for e in drill.entries().unwrap() {
                assert!(seen.insert(e.id.clone()), "kanji {} repeated", e.id);
            }
        }
        assert_eq!(seen.len(), 10);
        assert_eq!(service.used_ids(1).unwrap().len(), 10);

        let drill = service.start(&all, 1, KanjiOrder::Random, &mut rng).unwrap();
        assert!(drill.progress_reset());
        assert_eq!(drill.size().unwrap(), 4);
        assert_eq!(service.used_ids(1).unwrap().len(), 4);
    }

    #[test]
    fn numeric_progress_ids_are_accepted() {
        let kv = Arc::new(InMemoryStore::new());
        kv.set(&progress_key(2), "[1, \"2\", null]").unwrap();
        let service = KanjiDrillService::new(kv);
        assert_eq!(service.used_ids(2).unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn finish_records_tankanji_history() {
        let kv = Arc::new(InMemoryStore::new());
        let service = KanjiDrillService::new(kv.clone()).with_batch_size(3);
        let history = HistoryStore::new(kv, fixed_clock());
        let mut rng = StdRng::seed_from_u64(1);

        let mut drill = service
            .start(&entries(5), 1, KanjiOrder::Stroke, &mut rng)
            .unwrap();
        assert!(matches!(
            service.finish(&drill, &history),
            Err(KanjiError::Session(SessionError::Incomplete))
        ));

        while drill.advance().unwrap().is_some() {}
        let record = service.finish(&drill, &history).unwrap();

        assert_eq!(record.app_id, AppId::tankanji());
        assert_eq!(record.correct_count, 3);
        assert_eq!(record.total_count, 3);
        assert_eq!(record.correct_rate_percent, 100);
        assert_eq!(record.extra["type"], json!("read"));
        assert_eq!(record.extra["order"], json!("stroke"));
        assert_eq!(record.extra["grade"], json!(1));
        assert_eq!(record.extra["kanjis"], json!(drill.kanji_list().unwrap()));
    }

    #[test]
    fn progress_key_format() {
        assert_eq!(progress_key(3), "tankanji_progress_3_read");
    }
}
