// SPDX-License-Identifier: MIT

//! Background task that subscribes to an agent's `/event` SSE stream and
//! translates frames into core `Event` values, selecting between the
//! stream and a shutdown signal (spec.md §4.2; grounded in the coop
//! adapter's WebSocket event bridge, swapped to HTTP SSE per §6). Tees the
//! raw bytes into a per-session `Recorder` alongside the translated events.

use crate::recorder::Recorder;
use crate::sse::SseDecoder;
use futures_util::StreamExt;
use incrementum_core::Event as CoreEvent;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const CONNECT_RETRIES: u32 = 10;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// Connect to `{base_url}/event`, decode SSE frames, tee the raw bytes into
/// `<events_dir>/<entity_id>.sse`, and forward translated frames as
/// `Event`s tagged with `entity_id` until the stream ends, errors, or
/// `shutdown_rx` fires.
pub async fn run(base_url: String, entity_id: String, events_dir: &Path, event_tx: mpsc::Sender<CoreEvent>, mut shutdown_rx: oneshot::Receiver<()>) {
    let client = reqwest::Client::new();
    let url = format!("{base_url}/event");

    let mut recorder = match Recorder::open(events_dir, &entity_id).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(entity_id, error = %e, "event bridge: failed to open recorder");
            emit_gone(&event_tx, &entity_id).await;
            return;
        }
    };

    let response = match connect_with_retries(&client, &url).await {
        Some(r) => r,
        None => {
            tracing::warn!(entity_id, "event bridge: connection failed, emitting gone event");
            emit_gone(&event_tx, &entity_id).await;
            let _ = recorder.close().await;
            return;
        }
    };

    let mut stream = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            chunk = stream.next() => {
                match chunk {
                    Some(Ok(bytes)) => {
                        if let Err(e) = recorder.write(&bytes).await {
                            tracing::warn!(entity_id, error = %e, "event bridge: failed to write to recorder");
                        }
                        let text = String::from_utf8_lossy(&bytes);
                        for frame in decoder.push(&text) {
                            seq += 1;
                            emit_frame(&event_tx, &entity_id, &mut seq, frame).await;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(entity_id, error = %e, "event bridge: stream error");
                        emit_gone(&event_tx, &entity_id).await;
                        break;
                    }
                    None => {
                        tracing::info!(entity_id, "event bridge: stream ended");
                        if let Some(frame) = decoder.finish() {
                            seq += 1;
                            emit_frame(&event_tx, &entity_id, &mut seq, frame).await;
                        }
                        emit_gone(&event_tx, &entity_id).await;
                        break;
                    }
                }
            }
            _ = &mut shutdown_rx => {
                tracing::info!(entity_id, "event bridge: shutdown requested");
                if let Some(frame) = decoder.finish() {
                    seq += 1;
                    emit_frame(&event_tx, &entity_id, &mut seq, frame).await;
                }
                let _ = recorder.flush().await;
                break;
            }
        }
    }

    let _ = recorder.close().await;
}

async fn emit_frame(event_tx: &mpsc::Sender<CoreEvent>, entity_id: &str, seq: &mut u64, frame: crate::sse::SseFrame) {
    let kind = frame.event.clone().unwrap_or_else(|| "message".to_string());
    let payload: Value = serde_json::from_str(&frame.data).unwrap_or(Value::String(frame.data.clone()));
    let event = CoreEvent::new(*seq, kind, entity_id.to_string(), payload, chrono::Utc::now());
    let _ = event_tx.send(event).await;
}

async fn connect_with_retries(client: &reqwest::Client, url: &str) -> Option<reqwest::Response> {
    for attempt in 0..CONNECT_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(CONNECT_RETRY_DELAY).await;
        }
        if let Ok(resp) = client.get(url).send().await {
            if resp.status().is_success() {
                return Some(resp);
            }
        }
    }
    None
}

async fn emit_gone(event_tx: &mpsc::Sender<CoreEvent>, entity_id: &str) {
    let event = CoreEvent::new(0, "agent.gone", entity_id.to_string(), Value::Null, chrono::Utc::now());
    let _ = event_tx.send(event).await;
}

#[cfg(test)]
#[path = "bridge_tests.rs"]
mod tests;
