//! Admin server-push feed.
//!
//! The backend streams `text/event-stream` messages whose `data` is a JSON
//! object tagged by `type`. Messages are split on blank lines; comment lines,
//! keep-alives and payloads that do not parse are skipped.

use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::debug;

use super::{ApiError, Order};

/// A message from the admin feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum AdminEvent {
    #[serde(rename = "order.created")]
    OrderCreated { order: Order },
    #[serde(rename = "order.updated")]
    OrderUpdated { order: Order },
    /// An event type this client does not handle.
    #[serde(other)]
    Other,
}

/// Turn a streaming response into admin events. A transport error is yielded
/// once and ends the feed.
pub(crate) fn admin_event_stream(
    response: reqwest::Response,
) -> impl Stream<Item = Result<AdminEvent, ApiError>> + Send {
    stream! {
        let mut buffer = Vec::new();
        let mut chunks = std::pin::pin!(response.bytes_stream());

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(chunk) => {
                    buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
                    while let Some(message) = next_message(&mut buffer) {
                        if let Some(event) = parse_message(&message) {
                            yield Ok(event);
                        }
                    }
                }
                Err(e) => {
                    yield Err(ApiError::Http(e));
                    break;
                }
            }
        }
    }
}

/// Take one complete message off the front of the buffer.
fn next_message(buffer: &mut Vec<u8>) -> Option<String> {
    let end = buffer.windows(2).position(|w| w == b"\n\n")?;
    let message: Vec<u8> = buffer.drain(..end + 2).collect();
    Some(String::from_utf8_lossy(&message).into_owned())
}

fn parse_message(message: &str) -> Option<AdminEvent> {
    let data = message
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|line| line.strip_prefix(' ').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n");
    if data.trim().is_empty() {
        return None;
    }

    match serde_json::from_str(&data) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!(error = %e, "Skipping unreadable admin event");
            None
        }
    }
}
