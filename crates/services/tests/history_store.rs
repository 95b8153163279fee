use std::sync::Arc;

use chrono::{Duration, FixedOffset};
use drill_core::model::AppId;
use drill_core::time::{fixed_clock, fixed_now};
use drill_core::Clock;
use serde_json::json;
use services::history::HISTORY_KEY;
use services::{HistoryError, HistoryFields, HistoryStore};
use storage::{FileStore, InMemoryStore, KeyValueStore, SqliteStore};

fn backends(dir: &std::path::Path) -> Vec<Arc<dyn KeyValueStore>> {
    vec![
        Arc::new(InMemoryStore::new()),
        Arc::new(FileStore::open(dir.join("files")).unwrap()),
        Arc::new(SqliteStore::open(dir.join("history.db")).unwrap()),
    ]
}

#[test]
fn cap_keeps_the_fifty_most_recent() {
    let dir = tempfile::tempdir().unwrap();
    for kv in backends(dir.path()) {
        let history = HistoryStore::new(kv, fixed_clock()).with_max_records_per_app(50);
        for i in 0..51 {
            history
                .record(&AppId::kuku(), HistoryFields::new(i, 100))
                .unwrap();
        }

        let records = history.latest(&AppId::kuku(), 100).unwrap();
        assert_eq!(records.len(), 50);
        // Newest first: 50 down to 1; the very first record (0) was evicted.
        let counts: Vec<u32> = records.iter().map(|r| r.correct_count).collect();
        let expected: Vec<u32> = (1..=50).rev().collect();
        assert_eq!(counts, expected);
    }
}

#[test]
fn latest_defaults_to_newest_first() {
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()), fixed_clock());
    for i in 0..8 {
        history.record(&AppId::calc(), HistoryFields::new(i, 10)).unwrap();
    }
    let latest = history
        .latest(&AppId::calc(), services::history::DEFAULT_LATEST_COUNT)
        .unwrap();
    let counts: Vec<u32> = latest.iter().map(|r| r.correct_count).collect();
    assert_eq!(counts, vec![7, 6, 5, 4, 3]);
}

#[test]
fn export_import_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    for kv in backends(dir.path()) {
        let history = HistoryStore::new(kv, fixed_clock());
        history
            .record(
                &AppId::kuku(),
                HistoryFields::new(8, 9)
                    .with_field("levels", json!([2, 3]))
                    .with_field("mode", "random"),
            )
            .unwrap();
        history
            .record(&AppId::tankanji(), HistoryFields::new(10, 10).with_field("kanjis", "一二三"))
            .unwrap();

        let snapshot = history.export().unwrap();
        let before_kuku = history.latest(&AppId::kuku(), 50).unwrap();

        history.clear(None).unwrap();
        assert!(history.app_ids().unwrap().is_empty());

        history.import(&snapshot).unwrap();
        assert_eq!(history.export().unwrap(), snapshot);
        assert_eq!(history.latest(&AppId::kuku(), 50).unwrap(), before_kuku);
    }
}

#[test]
fn malformed_import_leaves_history_intact() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());
    let history = HistoryStore::new(kv.clone(), fixed_clock());
    history.record(&AppId::calc(), HistoryFields::new(3, 4)).unwrap();
    let before = kv.get(HISTORY_KEY).unwrap();

    for bad in ["not json", "[1, 2]", r#"{"calc": [{"date": 5}]}"#, r#"{"": []}"#] {
        assert!(
            matches!(history.import(bad), Err(HistoryError::Deserialization(_))),
            "{bad:?} should be rejected"
        );
        assert_eq!(kv.get(HISTORY_KEY).unwrap(), before);
    }
}

#[test]
fn import_accepts_browser_exports() {
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()), fixed_clock());
    let snapshot = r#"{
        "shisoku": [
            {
                "operator": "plus",
                "difficulty": "easy",
                "range": 100,
                "correctCount": 9,
                "totalCount": 10,
                "date": "2023-11-14",
                "time": "08:00:00",
                "timestamp": 1699948800,
                "correctRate": 90
            },
            {
                "operator": "minus",
                "correctCount": 0,
                "totalCount": 0,
                "date": "2023-11-14",
                "time": "07:00:00",
                "timestamp": 1699945200,
                "correctRate": null
            }
        ]
    }"#;
    history.import(snapshot).unwrap();

    let records = history.latest(&AppId::shisoku(), 5).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].correct_rate_percent, 90);
    assert_eq!(records[0].extra["operator"], json!("plus"));
    assert_eq!(records[0].extra.len(), 3);
    // An empty session exported with a null rate comes back as 0%.
    assert_eq!(records[1].extra["operator"], json!("minus"));
    assert_eq!(records[1].correct_rate_percent, 0);
}

#[test]
fn today_and_range_queries() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());

    // Two days ago, yesterday and today (2023-11-12 .. 2023-11-14 UTC).
    for (days_back, correct) in [(2, 1), (1, 2), (0, 7), (0, 8)] {
        let clock = Clock::fixed(fixed_now() - Duration::days(days_back));
        HistoryStore::new(kv.clone(), clock)
            .record(&AppId::calc(), HistoryFields::new(correct, 10))
            .unwrap();
    }

    let history = HistoryStore::new(kv.clone(), fixed_clock());
    let today = history.stats_for_today(&AppId::calc()).unwrap().unwrap();
    assert_eq!(today.date, "2023-11-14");
    assert_eq!(today.attempts, 2);
    assert_eq!(today.total_correct, 15);
    assert_eq!(today.total_questions, 20);
    assert_eq!(today.correct_rate_percent, 75);

    assert!(history.stats_for_today(&AppId::kuku()).unwrap().is_none());

    let range = history
        .stats_for_range(&AppId::calc(), "2023-11-12", "2023-11-13")
        .unwrap();
    let dates: Vec<_> = range.iter().map(|r| r.date.as_str()).collect();
    assert_eq!(dates, vec!["2023-11-13", "2023-11-12"]);

    let all = history.all_today_stats().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[&AppId::calc()].as_ref().map(|s| s.attempts), Some(2));
}

#[test]
fn utc_offset_moves_the_calendar_day() {
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()), fixed_clock())
        .with_utc_offset(jst);
    let record = history.record(&AppId::kuku(), HistoryFields::new(1, 1)).unwrap();
    assert_eq!(record.date, "2023-11-15");
    assert_eq!(record.time, "07:13:20");
    assert!(history.stats_for_today(&AppId::kuku()).unwrap().is_some());
}

#[test]
fn history_survives_reopening_the_backend() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.db");
    {
        let history = HistoryStore::new(Arc::new(SqliteStore::open(&path).unwrap()), fixed_clock());
        history.record(&AppId::calc(), HistoryFields::new(5, 5)).unwrap();
    }
    let history = HistoryStore::new(Arc::new(SqliteStore::open(&path).unwrap()), fixed_clock());
    assert_eq!(history.latest(&AppId::calc(), 5).unwrap().len(), 1);
}

#[test]
fn concurrent_writers_do_not_lose_updates() {
    let history = Arc::new(HistoryStore::new(Arc::new(InMemoryStore::new()), fixed_clock()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let history = Arc::clone(&history);
            std::thread::spawn(move || {
                for _ in 0..10 {
                    history.record(&AppId::calc(), HistoryFields::new(1, 1)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(history.latest(&AppId::calc(), 100).unwrap().len(), 40);
}
