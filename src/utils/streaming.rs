//! SSE decoding for run streams
//!
//! Uses eventsource-stream for UTF-8 boundary handling and SSE framing, then
//! decodes each message into an [`AssistantStreamEvent`].

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};

use crate::client::AssistantEventStream;
use crate::error::RelayError;
use crate::types::AssistantStreamEvent;

/// Decode a raw SSE byte stream into assistant events.
///
/// - `done` (or a `[DONE]` payload) ends the stream without an item.
/// - An `error` event is yielded as `Err(RelayError::ApiError)` and ends the stream.
/// - Transport and decoding failures are yielded once and end the stream.
pub fn decode_event_stream<S, B, E>(byte_stream: S) -> AssistantEventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let s = async_stream::stream! {
        let mut sse = Box::pin(byte_stream.eventsource());

        while let Some(item) = sse.next().await {
            let event = match item {
                Ok(ev) => ev,
                Err(e) => {
                    yield Err(RelayError::StreamError(format!("SSE stream error: {e}")));
                    return;
                }
            };

            if event.data.trim().is_empty() && event.event != "done" {
                continue;
            }

            match AssistantStreamEvent::decode(&event.event, &event.data) {
                Ok(AssistantStreamEvent::Done) => return,
                Ok(AssistantStreamEvent::Error(body)) => {
                    yield Err(body.into_error());
                    return;
                }
                Ok(ev) => yield Ok(ev),
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    };
    Box::pin(s)
}
