//! Best-effort forwarding of history records to a remote endpoint.

use drill_core::model::AppId;
use reqwest::Client;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::debug;

use crate::history::HistoryRecord;

/// Payload sent after each recorded session: `{ "appId": ..., "record": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub app_id: AppId,
    pub record: HistoryRecord,
}

/// Receives a notification after every history write.
///
/// `notify` must return promptly and must not fail: whatever the sink does
/// with the event, the caller never learns about it.
pub trait SyncSink: Send + Sync {
    fn notify(&self, event: SyncEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl SyncSink for NoopSink {
    fn notify(&self, _event: SyncEvent) {}
}

/// POSTs each event as JSON to `endpoint` on a background tokio task.
///
/// Delivery is not guaranteed. Transport errors and non-success statuses
/// are logged at debug level and otherwise discarded.
#[derive(Clone)]
pub struct HttpSyncSink {
    client: Client,
    endpoint: String,
    runtime: Handle,
}

impl HttpSyncSink {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, runtime: Handle) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            runtime,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SyncSink for HttpSyncSink {
    fn notify(&self, event: SyncEvent) {
        let request = self.client.post(&self.endpoint).json(&event);
        let endpoint = self.endpoint.clone();
        self.runtime.spawn(async move {
            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%endpoint, app_id = %event.app_id, "history synced");
                }
                Ok(response) => {
                    debug!(%endpoint, status = %response.status(), "history sync rejected");
                }
                Err(err) => {
                    debug!(%endpoint, error = %err, "history sync failed");
                }
            }
        });
    }
}

impl std::fmt::Debug for HttpSyncSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSyncSink")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
