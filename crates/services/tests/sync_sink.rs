use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use drill_core::model::AppId;
use drill_core::time::fixed_clock;
use mockito::Matcher;
use serde_json::json;
use services::{HistoryFields, HistoryStore, HttpSyncSink, SyncEvent, SyncSink};
use storage::InMemoryStore;

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<SyncEvent>>,
}

impl SyncSink for RecordingSink {
    fn notify(&self, event: SyncEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[test]
fn record_notifies_the_sink_once() {
    let sink = Arc::new(RecordingSink::default());
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()), fixed_clock())
        .with_sync_sink(sink.clone());

    let record = history
        .record(&AppId::kuku(), HistoryFields::new(9, 9))
        .unwrap();

    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].app_id, AppId::kuku());
    assert_eq!(events[0].record, record);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_sink_posts_app_id_and_record() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/rireki/api/save")
        .match_header("content-type", "application/json")
        .match_body(Matcher::PartialJson(json!({
            "appId": "calc",
            "record": {"correctCount": 4, "totalCount": 5, "correctRate": 80, "digits": 1}
        })))
        .with_status(200)
        .create_async()
        .await;

    let url = format!("{}/rireki/api/save", server.url());
    let sink = HttpSyncSink::new(url, tokio::runtime::Handle::current());
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()), fixed_clock())
        .with_sync_sink(Arc::new(sink));

    history
        .record(&AppId::calc(), HistoryFields::new(4, 5).with_field("digits", 1))
        .unwrap();

    // The post runs on a spawned task; give it a moment to land.
    for _ in 0..100 {
        if mock.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    mock.assert_async().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_endpoint_never_fails_the_write() {
    // Bind then drop so nothing is listening on the port.
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let sink = HttpSyncSink::new(format!("http://{addr}/"), tokio::runtime::Handle::current());
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()), fixed_clock())
        .with_sync_sink(Arc::new(sink));

    let record = history.record(&AppId::calc(), HistoryFields::new(1, 1));
    assert!(record.is_ok());
    assert_eq!(history.latest(&AppId::calc(), 5).unwrap().len(), 1);
}
