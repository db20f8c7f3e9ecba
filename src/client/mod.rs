//! Hosted platform access
//!
//! [`AssistantsApi`] is the seam between the relay and the hosted Assistants
//! service. [`OpenAiAssistantsClient`] talks to it over HTTP; tests plug in
//! scripted implementations.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use tokio_util::sync::CancellationToken;

use crate::error::RelayError;
use crate::types::{
    AssistantStreamEvent, CreateMessageRequest, CreateRunRequest, SubmitToolOutputsRequest,
    Thread, ThreadMessage,
};

pub mod openai;

pub use openai::OpenAiAssistantsClient;

/// Events of one streamed run segment.
pub type AssistantEventStream =
    Pin<Box<dyn Stream<Item = Result<AssistantStreamEvent, RelayError>> + Send>>;

/// Remote thread/message/run operations.
///
/// Every method observes `cancel`: a cancelled token means no request is
/// sent, and cancellation while waiting abandons the call with
/// [`RelayError::Cancelled`].
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    async fn create_thread(&self, cancel: &CancellationToken) -> Result<Thread, RelayError>;

    async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
        cancel: &CancellationToken,
    ) -> Result<ThreadMessage, RelayError>;

    /// Start a run and stream its events.
    async fn create_run_stream(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
        cancel: &CancellationToken,
    ) -> Result<AssistantEventStream, RelayError>;

    /// Submit a batch of tool outputs and stream the resumed run.
    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        request: SubmitToolOutputsRequest,
        cancel: &CancellationToken,
    ) -> Result<AssistantEventStream, RelayError>;
}
