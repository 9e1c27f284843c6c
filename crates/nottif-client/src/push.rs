use futures_util::StreamExt;
use nottif_core::config::PayloadShape;
use nottif_core::types::lenient_list;
use nottif_core::Event;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::StreamError;
use crate::sse::SseDecoder;

/// What the live event stream reports to its consumer.
#[derive(Debug)]
pub enum PushUpdate {
    /// The server accepted the stream request.
    Opened,
    /// Full, authoritative event log (snapshot contract).
    Snapshot(Vec<Event>),
    /// One new event (incremental contract).
    Event(Event),
    /// The stream is gone. Always the last update of a channel.
    Failed(StreamError),
}

/// A single, never-reconnecting `GET /api/events/stream` connection.
pub struct PushChannel {
    client: reqwest::Client,
    url: String,
    shape: PayloadShape,
}

impl PushChannel {
    pub fn new(client: reqwest::Client, url: String, shape: PayloadShape) -> Self {
        Self { client, url, shape }
    }

    /// Run the stream on its own task. Aborting the handle closes the connection.
    pub fn spawn(self, tx: mpsc::Sender<PushUpdate>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }

    /// Connect, forward every message, and finish with exactly one
    /// [`PushUpdate::Failed`]. Returns early if the receiver is dropped.
    pub async fn run(self, tx: mpsc::Sender<PushUpdate>) {
        debug!(url = %self.url, "opening event stream");
        let resp = match self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                let _ = tx
                    .send(PushUpdate::Failed(StreamError::Connect(e.to_string())))
                    .await;
                return;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let _ = tx
                .send(PushUpdate::Failed(StreamError::Rejected {
                    status: status.as_u16(),
                }))
                .await;
            return;
        }

        info!(url = %self.url, shape = ?self.shape, "event stream open");
        if tx.send(PushUpdate::Opened).await.is_err() {
            return; // receiver dropped
        }

        let mut decoder = SseDecoder::new();
        let mut byte_stream = resp.bytes_stream();

        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    let _ = tx
                        .send(PushUpdate::Failed(StreamError::Transport(e.to_string())))
                        .await;
                    return;
                }
            };

            for data in decoder.feed(&chunk) {
                if let Some(update) = decode_message(&data, self.shape) {
                    if tx.send(update).await.is_err() {
                        return;
                    }
                }
            }
        }

        let _ = tx.send(PushUpdate::Failed(StreamError::Closed)).await;
    }
}

/// Turn one message payload into an update under the configured contract.
///
/// Messages that are not JSON, or whose shape belongs to the other contract,
/// are dropped with a warning; they do not end the stream.
pub fn decode_message(data: &str, shape: PayloadShape) -> Option<PushUpdate> {
    let value: Value = match serde_json::from_str(data) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "dropping non-JSON stream message");
            return None;
        }
    };

    match (shape, value) {
        (PayloadShape::Snapshot, value @ (Value::Array(_) | Value::Null)) => {
            Some(PushUpdate::Snapshot(lenient_list(value)))
        }
        (PayloadShape::Incremental, value @ Value::Object(_)) => {
            match serde_json::from_value::<Event>(value) {
                Ok(event) => Some(PushUpdate::Event(event)),
                Err(e) => {
                    warn!(error = %e, "dropping undecodable stream event");
                    None
                }
            }
        }
        (shape, _) => {
            warn!(?shape, "stream message does not match the configured payload shape, dropped");
            None
        }
    }
}
