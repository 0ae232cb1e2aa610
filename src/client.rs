use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::app::Role;
use crate::tui::AppEvent;

#[derive(Serialize, Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    messages: Vec<Turn>,
}

/// What the stream task reports back to the UI loop. Transport errors,
/// bad statuses and unreadable bodies all collapse into `Failed`.
#[derive(Debug)]
pub enum StreamEvent {
    Opened,
    Chunk(String),
    Done,
    Failed(String),
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send one conversation request and feed the plain-text response
    /// stream into the event channel chunk by chunk. No timeout: an
    /// unresponsive backend is handled by the user cancelling.
    pub async fn stream_chat(&self, turns: Vec<Turn>, events: mpsc::UnboundedSender<AppEvent>) {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest { messages: turns };

        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                let _ = events.send(AppEvent::Stream(StreamEvent::Failed(e.to_string())));
                return;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "chat request rejected");
            let _ = events.send(AppEvent::Stream(StreamEvent::Failed(format!(
                "backend returned status {}",
                response.status()
            ))));
            return;
        }

        let _ = events.send(AppEvent::Stream(StreamEvent::Opened));

        // Network chunks do not align with code point boundaries, so a
        // truncated trailing sequence is held back until its remaining
        // bytes arrive.
        let mut pending: Vec<u8> = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(item) = stream.next().await {
            match item {
                Ok(bytes) => {
                    pending.extend_from_slice(&bytes);
                    let text = decode_complete_prefix(&mut pending);
                    if text.is_empty() {
                        continue;
                    }
                    if events.send(AppEvent::Stream(StreamEvent::Chunk(text))).is_err() {
                        // UI is gone; nothing left to stream to.
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "chat stream read failed");
                    let _ = events.send(AppEvent::Stream(StreamEvent::Failed(e.to_string())));
                    return;
                }
            }
        }

        if !pending.is_empty() {
            // Stream ended mid code point; emit what is left.
            let text = String::from_utf8_lossy(&pending).into_owned();
            let _ = events.send(AppEvent::Stream(StreamEvent::Chunk(text)));
        }

        let _ = events.send(AppEvent::Stream(StreamEvent::Done));
    }
}

/// Drain the longest valid UTF-8 prefix from the buffer. A truncated
/// sequence at the end stays in the buffer; invalid bytes anywhere
/// earlier are replaced rather than held.
fn decode_complete_prefix(buf: &mut Vec<u8>) -> String {
    match std::str::from_utf8(buf) {
        Ok(text) => {
            let text = text.to_string();
            buf.clear();
            text
        }
        Err(e) if e.error_len().is_none() => {
            let valid = e.valid_up_to();
            let text = String::from_utf8_lossy(&buf[..valid]).into_owned();
            buf.drain(..valid);
            text
        }
        Err(_) => {
            let text = String::from_utf8_lossy(buf).into_owned();
            buf.clear();
            text
        }
    }
}
