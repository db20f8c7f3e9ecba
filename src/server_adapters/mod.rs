//! Server adapters: turn a relay stream into an HTTP response body
//!
//! - **Framework-agnostic**: [`protocol_lines`] encodes parts as text lines
//! - **Axum integration**: [`axum::router`] serves the chat API and page
//! - **Error masking**: optional replacement of streamed error text

use std::convert::Infallible;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use tokio_util::sync::DropGuard;
use tracing::{Instrument, Span};

use crate::protocol::StreamPart;
use crate::relay::RelayStream;

pub mod axum;

/// Options for encoding the outbound stream.
#[derive(Debug, Clone, Default)]
pub struct ProtocolOptions {
    /// Replace the text of error parts with `masked_error_message`.
    pub mask_errors: bool,

    /// Message used when `mask_errors` is `true`. Defaults to "internal error".
    pub masked_error_message: Option<String>,
}

impl ProtocolOptions {
    /// Errors are streamed verbatim.
    pub fn development() -> Self {
        Self::default()
    }

    /// Errors are replaced with a generic message.
    pub fn production() -> Self {
        Self {
            mask_errors: true,
            masked_error_message: None,
        }
    }

    fn apply(&self, part: StreamPart) -> StreamPart {
        match part {
            StreamPart::Error(_) if self.mask_errors => StreamPart::Error(
                self.masked_error_message
                    .clone()
                    .unwrap_or_else(|| "internal error".to_string()),
            ),
            other => other,
        }
    }
}

pub type LineStream = Pin<Box<dyn Stream<Item = Result<String, Infallible>> + Send>>;

/// Encode a relay stream as protocol lines.
///
/// `guard` is held until the line stream is dropped, so a caller that goes
/// away cancels the request's outbound work. The relay stream is polled
/// inside `span`, so everything it logs carries the request's fields.
pub fn protocol_lines(
    stream: RelayStream,
    opts: ProtocolOptions,
    guard: Option<DropGuard>,
    span: Span,
) -> LineStream {
    let mut inner = stream;
    let s = async_stream::stream! {
        let _guard = guard;
        while let Some(part) = inner.next().instrument(span.clone()).await {
            yield Ok(opts.apply(part).encode());
        }
    };
    Box::pin(s)
}
