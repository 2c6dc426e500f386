//! Evidence correlation
//!
//! Backend responses triggered by UI actions land in an append-only log. An
//! [`EvidenceCorrelator`] waits for the first response whose URL contains a
//! fragment and whose status passes a predicate. Every await scans the log
//! from the beginning with its own cursor and nothing is ever removed, so
//! concurrent awaits never steal each other's responses and a response that
//! arrived before the await was registered still matches.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use gatecheck_common::ApiEnvelope;

use crate::error::{E2eError, E2eResult};

/// A completed backend exchange as observed from the page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

impl BackendResponse {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status,
            body: body.into(),
            received_at: Utc::now(),
        }
    }

    /// Build a response whose body is `{ "data": <payload> }`
    pub fn with_data(url: impl Into<String>, status: u16, payload: serde_json::Value) -> Self {
        let body = serde_json::json!({ "data": payload }).to_string();
        Self::new(url, status, body)
    }

    /// Deserialize the `data` member of the body
    pub fn data<T: DeserializeOwned>(&self) -> E2eResult<T> {
        let envelope: ApiEnvelope<T> = serde_json::from_str(&self.body)?;
        Ok(envelope.into_inner())
    }
}

type Entries = Arc<RwLock<Vec<Arc<BackendResponse>>>>;

/// Create a connected recorder / stream pair for one scenario
pub fn response_stream() -> (ResponseRecorder, ResponseStream) {
    let entries: Entries = Arc::new(RwLock::new(Vec::new()));
    let (tx, rx) = watch::channel(0usize);
    (
        ResponseRecorder {
            entries: entries.clone(),
            notify: Arc::new(tx),
        },
        ResponseStream {
            entries,
            notify: rx,
        },
    )
}

/// Write side of the response log, held by whatever observes the network
#[derive(Clone)]
pub struct ResponseRecorder {
    entries: Entries,
    notify: Arc<watch::Sender<usize>>,
}

impl ResponseRecorder {
    pub fn record(&self, response: BackendResponse) {
        debug!("Recorded response {} ({})", response.url, response.status);
        let len = {
            let mut entries = self.entries.write();
            entries.push(Arc::new(response));
            entries.len()
        };
        self.notify.send_replace(len);
    }
}

/// Read side of the response log; cheap to clone and never consumes entries
#[derive(Clone)]
pub struct ResponseStream {
    entries: Entries,
    notify: watch::Receiver<usize>,
}

impl ResponseStream {
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of entries from `from` onwards
    fn entries_from(&self, from: usize) -> Vec<Arc<BackendResponse>> {
        let entries = self.entries.read();
        entries.get(from..).map(|s| s.to_vec()).unwrap_or_default()
    }
}

/// Status predicate matching exactly one code
pub fn status_is(code: u16) -> impl Fn(u16) -> bool + Send + Sync {
    move |status| status == code
}

/// Waits for backend exchanges by content rather than arrival order
#[derive(Clone)]
pub struct EvidenceCorrelator {
    stream: ResponseStream,
}

impl EvidenceCorrelator {
    pub fn new(stream: ResponseStream) -> Self {
        Self { stream }
    }

    /// Wait for the first response whose URL contains `fragment` and whose
    /// status satisfies `success`.
    ///
    /// There is no timeout here; see [`await_within`](Self::await_within).
    /// Fails with [`E2eError::StreamClosed`] once every recorder is dropped
    /// without a match.
    pub async fn await_response<P>(&self, fragment: &str, success: P) -> E2eResult<Arc<BackendResponse>>
    where
        P: Fn(u16) -> bool,
    {
        let mut notify = self.stream.notify.clone();
        let mut cursor = 0;

        loop {
            // Mark the current length seen before scanning so a record racing
            // with the scan still wakes us
            notify.borrow_and_update();
            let batch = self.stream.entries_from(cursor);
            cursor += batch.len();

            if let Some(found) = batch
                .into_iter()
                .find(|r| r.url.contains(fragment) && success(r.status))
            {
                debug!("Correlated {} with {}", fragment, found.url);
                return Ok(found);
            }

            if notify.changed().await.is_err() {
                return self
                    .stream
                    .entries_from(cursor)
                    .into_iter()
                    .find(|r| r.url.contains(fragment) && success(r.status))
                    .ok_or_else(|| E2eError::StreamClosed(fragment.to_string()));
            }
        }
    }

    /// [`await_response`](Self::await_response) bounded by `window`
    pub async fn await_within<P>(
        &self,
        fragment: &str,
        success: P,
        window: Duration,
    ) -> E2eResult<Arc<BackendResponse>>
    where
        P: Fn(u16) -> bool,
    {
        match tokio::time::timeout(window, self.await_response(fragment, success)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("No response for {} within {:?}", fragment, window);
                Err(E2eError::CorrelationTimeout {
                    fragment: fragment.to_string(),
                    window_ms: window.as_millis() as u64,
                })
            }
        }
    }

    /// Wait for a matching response and deserialize its `data` member
    pub async fn await_data<T, P>(&self, fragment: &str, success: P, window: Duration) -> E2eResult<T>
    where
        T: DeserializeOwned,
        P: Fn(u16) -> bool,
    {
        self.await_within(fragment, success, window).await?.data()
    }
}
