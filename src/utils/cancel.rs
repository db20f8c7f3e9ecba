//! Cancellation utilities
//!
//! Every outbound operation races the request's [`CancellationToken`]. Losing
//! the race drops the in-flight future, which closes the HTTP connection.

use std::future::Future;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::client::AssistantEventStream;
use crate::error::RelayError;

/// Run `future` unless `token` is cancelled first.
///
/// An already-cancelled token never polls the future, so no request is sent.
pub async fn cancellable<F, T>(token: &CancellationToken, future: F) -> Result<T, RelayError>
where
    F: Future<Output = Result<T, RelayError>>,
{
    if token.is_cancelled() {
        return Err(RelayError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(RelayError::Cancelled),
        res = future => res,
    }
}

/// Make an event stream end as soon as `token` is cancelled.
///
/// The wrapped stream yields a single `Err(RelayError::Cancelled)` and then
/// finishes, dropping the inner stream.
pub fn make_cancellable_stream(
    stream: AssistantEventStream,
    token: CancellationToken,
) -> AssistantEventStream {
    let mut inner = stream;
    let s = async_stream::stream! {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    yield Err(RelayError::Cancelled);
                    break;
                }
                item = inner.next() => {
                    let Some(item) = item else { break };
                    yield item;
                }
            }
        }
    };
    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssistantStreamEvent;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn cancelled_token_never_polls_the_future() {
        let token = CancellationToken::new();
        token.cancel();
        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();

        let res: Result<(), RelayError> = cancellable(&token, async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(matches!(res, Err(RelayError::Cancelled)));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_pending_future() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let res: Result<(), RelayError> = cancellable(&token, futures::future::pending()).await;
        assert!(matches!(res, Err(RelayError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellable_stream_stops_after_cancel() {
        let token = CancellationToken::new();
        let inner: AssistantEventStream = Box::pin(
            futures::stream::iter(vec![Ok::<_, RelayError>(AssistantStreamEvent::Done)])
                .chain(futures::stream::pending()),
        );
        let mut stream = make_cancellable_stream(inner, token.clone());

        assert!(matches!(
            stream.next().await,
            Some(Ok(AssistantStreamEvent::Done))
        ));
        token.cancel();
        assert!(matches!(stream.next().await, Some(Err(RelayError::Cancelled))));
        assert!(stream.next().await.is_none());
    }
}
