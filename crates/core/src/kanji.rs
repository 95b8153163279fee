//! Kanji reading practice: batch selection over an injected entry list.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::model::ParseOptionError;

/// Default number of kanji shown per session.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// One kanji from a pre-fetched dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KanjiEntry {
    pub id: String,
    pub kanji: String,
    pub grade: u8,
    pub strokes: u32,
    #[serde(default)]
    pub kun_reading: Option<String>,
    #[serde(default)]
    pub on_reading: Option<String>,
}

/// How a kanji batch is ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KanjiOrder {
    /// Fewest strokes first.
    #[default]
    Stroke,
    Random,
}

impl KanjiOrder {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            KanjiOrder::Stroke => "stroke",
            KanjiOrder::Random => "random",
        }
    }
}

impl fmt::Display for KanjiOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KanjiOrder {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stroke" | "strokes" => Ok(KanjiOrder::Stroke),
            "random" => Ok(KanjiOrder::Random),
            _ => Err(ParseOptionError::Order(s.to_owned())),
        }
    }
}

/// Result of picking the next kanji batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KanjiBatch {
    pub entries: Vec<KanjiEntry>,
    /// True when every entry had been shown already and the pool restarted.
    pub progress_reset: bool,
}

/// Pick up to `count` entries that have not been shown yet.
///
/// Once every entry has been used the pool starts over from the full list.
pub fn select_kanji_batch<R: Rng + ?Sized>(
    entries: &[KanjiEntry],
    used_ids: &HashSet<String>,
    order: KanjiOrder,
    count: usize,
    rng: &mut R,
) -> KanjiBatch {
    let mut available: Vec<KanjiEntry> = entries
        .iter()
        .filter(|e| !used_ids.contains(&e.id))
        .cloned()
        .collect();

    let progress_reset = available.is_empty() && !entries.is_empty();
    if progress_reset {
        available = entries.to_vec();
    }

    match order {
        KanjiOrder::Stroke => available.sort_by_key(|e| e.strokes),
        KanjiOrder::Random => available.shuffle(rng),
    }
    available.truncate(count);

    KanjiBatch {
        entries: available,
        progress_reset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn entry(id: &str, kanji: &str, strokes: u32) -> KanjiEntry {
        KanjiEntry {
            id: id.into(),
            kanji: kanji.into(),
            grade: 1,
            strokes,
            kun_reading: None,
            on_reading: None,
        }
    }

    fn dataset() -> Vec<KanjiEntry> {
        vec![
            entry("1", "森", 12),
            entry("2", "一", 1),
            entry("3", "木", 4),
            entry("4", "山", 3),
        ]
    }

    #[test]
    fn stroke_order_sorts_ascending() {
        let mut rng = StdRng::seed_from_u64(0);
        let batch = select_kanji_batch(&dataset(), &HashSet::new(), KanjiOrder::Stroke, 10, &mut rng);
        let kanji: Vec<_> = batch.entries.iter().map(|e| e.kanji.as_str()).collect();
        assert_eq!(kanji, ["一", "山", "木", "森"]);
        assert!(!batch.progress_reset);
    }

    #[test]
    fn skips_used_entries_and_caps_count() {
        let mut rng = StdRng::seed_from_u64(0);
        let used: HashSet<String> = ["2".to_string()].into_iter().collect();
        let batch = select_kanji_batch(&dataset(), &used, KanjiOrder::Stroke, 2, &mut rng);
        let ids: Vec<_> = batch.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["4", "3"]);
    }

    #[test]
    fn resets_when_everything_was_used() {
        let mut rng = StdRng::seed_from_u64(0);
        let used: HashSet<String> = dataset().into_iter().map(|e| e.id).collect();
        let batch = select_kanji_batch(&dataset(), &used, KanjiOrder::Random, 10, &mut rng);
        assert!(batch.progress_reset);
        assert_eq!(batch.entries.len(), 4);
    }

    #[test]
    fn empty_dataset_is_not_a_reset() {
        let mut rng = StdRng::seed_from_u64(0);
        let batch = select_kanji_batch(&[], &HashSet::new(), KanjiOrder::Random, 10, &mut rng);
        assert!(batch.entries.is_empty());
        assert!(!batch.progress_reset);
    }

    #[test]
    fn parses_order() {
        assert_eq!("Stroke".parse::<KanjiOrder>().unwrap(), KanjiOrder::Stroke);
        assert!("alphabetical".parse::<KanjiOrder>().is_err());
    }
}
