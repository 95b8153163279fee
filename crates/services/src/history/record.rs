use drill_core::model::{AppId, SessionSummary};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// JSON keys stamped by the store; extra fields may not reuse them.
pub const RESERVED_KEYS: [&str; 6] = [
    "date",
    "time",
    "timestamp",
    "correctCount",
    "totalCount",
    "correctRate",
];

/// Caller-supplied part of a history record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFields {
    pub correct_count: u32,
    pub total_count: u32,
    pub extra: Map<String, Value>,
}

impl HistoryFields {
    #[must_use]
    pub fn new(correct_count: u32, total_count: u32) -> Self {
        Self {
            correct_count,
            total_count,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn from_summary(summary: &SessionSummary) -> Self {
        Self::new(summary.correct_count, summary.total_count)
    }

    /// Attach an app-specific field such as `operator` or `levels`.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra.extend(extra);
        self
    }
}

/// One persisted session result.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub app_id: AppId,
    /// `YYYY-MM-DD` in the store's UTC offset.
    pub date: String,
    /// `HH:MM:SS` in the store's UTC offset.
    pub time: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub correct_count: u32,
    pub total_count: u32,
    pub correct_rate_percent: u32,
    pub extra: Map<String, Value>,
}

/// Serializes in the stored shape; `app_id` is not included.
impl Serialize for HistoryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StoredRecord::from(self).serialize(serializer)
    }
}

/// On-disk shape of a record inside its app partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredRecord {
    pub date: String,
    pub time: String,
    pub timestamp: i64,
    pub correct_count: u32,
    pub total_count: u32,
    /// Browser exports store the rate of an empty session as `null`.
    #[serde(rename = "correctRate", deserialize_with = "null_as_zero")]
    pub correct_rate_percent: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or(0))
}

impl StoredRecord {
    pub(crate) fn into_record(self, app_id: AppId) -> HistoryRecord {
        HistoryRecord {
            app_id,
            date: self.date,
            time: self.time,
            timestamp: self.timestamp,
            correct_count: self.correct_count,
            total_count: self.total_count,
            correct_rate_percent: self.correct_rate_percent,
            extra: self.extra,
        }
    }
}

impl From<&HistoryRecord> for StoredRecord {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            date: record.date.clone(),
            time: record.time.clone(),
            timestamp: record.timestamp,
            correct_count: record.correct_count,
            total_count: record.total_count,
            correct_rate_percent: record.correct_rate_percent,
            extra: record.extra.clone(),
        }
    }
}
