//! Request relay and tool dispatch loop
//!
//! One relay request: make sure a thread exists, append the user message,
//! then stream a run back as protocol parts. Whenever a streamed segment
//! ends with the run waiting on tool outputs, the outputs are computed
//! locally and submitted in one batch, and the resumed stream is forwarded.
//! The loop ends when a segment ends in any other state.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::AssistantsApi;
use crate::error::RelayError;
use crate::protocol::StreamPart;
use crate::tools::resolve_tool_calls;
use crate::types::{
    AssistantStreamEvent, CreateMessageRequest, CreateRunRequest, Run, RunStatus, RunToolCall,
    SubmitToolOutputsRequest,
};
use crate::utils::make_cancellable_stream;

/// Inbound chat request.
///
/// The conversation id may arrive as `conversationId` or `threadId`. When
/// both are present, a non-blank `conversationId` wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireRelayRequest")]
pub struct RelayRequest {
    #[serde(rename = "conversationId")]
    pub conversation_id: Option<String>,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRelayRequest {
    #[serde(default)]
    conversation_id: Option<String>,
    #[serde(default)]
    thread_id: Option<String>,
    message: String,
}

impl From<WireRelayRequest> for RelayRequest {
    fn from(wire: WireRelayRequest) -> Self {
        let conversation_id = wire
            .conversation_id
            .filter(|id| !id.trim().is_empty())
            .or(wire.thread_id);
        Self {
            conversation_id,
            message: wire.message,
        }
    }
}

/// Outbound protocol parts of one request.
pub type RelayStream = Pin<Box<dyn Stream<Item = StreamPart> + Send>>;

/// An opened relay request: identifiers are known, the run has not started.
pub struct RelaySession {
    pub thread_id: String,
    pub message_id: String,
    pub stream: RelayStream,
}

impl std::fmt::Debug for RelaySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySession")
            .field("thread_id", &self.thread_id)
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}

/// Relays chat turns to the hosted assistant.
#[derive(Clone)]
pub struct AssistantRelay {
    api: Arc<dyn AssistantsApi>,
    assistant_id: Option<String>,
}

impl AssistantRelay {
    pub fn new(api: Arc<dyn AssistantsApi>, assistant_id: Option<String>) -> Self {
        Self { api, assistant_id }
    }

    /// Resolve the thread, append the message and prepare the run stream.
    ///
    /// The returned stream always starts with the control-data part, so the
    /// caller learns the conversation id before any content.
    pub async fn open(
        &self,
        request: RelayRequest,
        cancel: CancellationToken,
    ) -> Result<RelaySession, RelayError> {
        if request.message.trim().is_empty() {
            return Err(RelayError::InvalidInput("message must not be empty".into()));
        }

        let thread_id = match request.conversation_id.filter(|id| !id.trim().is_empty()) {
            Some(id) => id,
            None => {
                let thread = self.api.create_thread(&cancel).await?;
                info!(thread_id = %thread.id, "Created thread");
                thread.id
            }
        };

        let created = self
            .api
            .create_message(&thread_id, CreateMessageRequest::user(request.message), &cancel)
            .await?;
        info!(thread_id = %thread_id, message_id = %created.id, "Appended user message");

        let stream = run_parts(
            self.api.clone(),
            self.assistant_id.clone(),
            thread_id.clone(),
            created.id.clone(),
            cancel,
        );

        Ok(RelaySession {
            thread_id,
            message_id: created.id,
            stream,
        })
    }
}

/// Turns run events into protocol parts and remembers the latest run.
#[derive(Debug, Default)]
pub struct RunForwarder {
    last_run: Option<Run>,
}

impl RunForwarder {
    pub fn forward(&mut self, event: AssistantStreamEvent) -> Vec<StreamPart> {
        match event {
            AssistantStreamEvent::MessageCreated(message) => {
                vec![StreamPart::AssistantMessage { id: message.id }]
            }
            AssistantStreamEvent::MessageDelta(delta) => delta
                .text_values()
                .map(|text| StreamPart::Text(text.to_string()))
                .collect(),
            AssistantStreamEvent::Run { run, .. } => {
                self.last_run = Some(run);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Latest run seen in the segment.
    pub fn finish(self) -> Option<Run> {
        self.last_run
    }
}

/// What to do once a streamed segment has ended.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    SubmitToolOutputs {
        run_id: String,
        calls: Vec<RunToolCall>,
    },
    Finish(Option<Run>),
}

impl NextStep {
    pub fn after(last_run: Option<Run>) -> Self {
        match last_run {
            Some(run) => match run.pending_tool_calls() {
                Some(calls) => Self::SubmitToolOutputs {
                    run_id: run.id.clone(),
                    calls: calls.to_vec(),
                },
                None => Self::Finish(Some(run)),
            },
            None => Self::Finish(None),
        }
    }
}

/// Error part for `err`, or nothing when the request was cancelled.
fn error_part(thread_id: &str, err: RelayError) -> Option<StreamPart> {
    if err.is_cancelled() {
        info!(thread_id = %thread_id, "Relay cancelled by caller");
        return None;
    }
    warn!(thread_id = %thread_id, error = %err, "Relay aborted");
    Some(StreamPart::Error(err.user_message()))
}

fn run_parts(
    api: Arc<dyn AssistantsApi>,
    assistant_id: Option<String>,
    thread_id: String,
    message_id: String,
    cancel: CancellationToken,
) -> RelayStream {
    let s = async_stream::stream! {
        yield StreamPart::AssistantControlData {
            thread_id: thread_id.clone(),
            message_id,
        };

        let Some(assistant_id) = assistant_id else {
            let err = RelayError::ConfigurationError("ASSISTANT_ID is not set".into());
            if let Some(part) = error_part(&thread_id, err) {
                yield part;
            }
            return;
        };

        let mut segment = if cancel.is_cancelled() {
            Err(RelayError::Cancelled)
        } else {
            api.create_run_stream(&thread_id, CreateRunRequest::streaming(assistant_id), &cancel)
                .await
        };

        loop {
            let events = match segment {
                Ok(events) => events,
                Err(err) => {
                    if let Some(part) = error_part(&thread_id, err) {
                        yield part;
                    }
                    return;
                }
            };

            let mut events = make_cancellable_stream(events, cancel.clone());
            let mut forwarder = RunForwarder::default();
            let mut failure = None;
            while let Some(item) = events.next().await {
                match item {
                    Ok(event) => {
                        for part in forwarder.forward(event) {
                            yield part;
                        }
                    }
                    Err(err) => {
                        failure = Some(err);
                        break;
                    }
                }
            }
            drop(events);

            if let Some(err) = failure {
                if let Some(part) = error_part(&thread_id, err) {
                    yield part;
                }
                return;
            }
            if cancel.is_cancelled() {
                return;
            }

            match NextStep::after(forwarder.finish()) {
                NextStep::SubmitToolOutputs { run_id, calls } => {
                    let outputs = match resolve_tool_calls(&calls) {
                        Ok(outputs) => outputs,
                        Err(err) => {
                            if let Some(part) = error_part(&thread_id, err) {
                                yield part;
                            }
                            return;
                        }
                    };
                    info!(
                        thread_id = %thread_id,
                        run_id = %run_id,
                        tool_outputs = outputs.len(),
                        "Submitting tool outputs"
                    );
                    segment = api
                        .submit_tool_outputs_stream(
                            &thread_id,
                            &run_id,
                            SubmitToolOutputsRequest::streaming(outputs),
                            &cancel,
                        )
                        .await;
                }
                NextStep::Finish(Some(run))
                    if run.status.is_terminal() && run.status != RunStatus::Completed =>
                {
                    warn!(thread_id = %thread_id, run_id = %run.id, status = %run.status, "Run did not complete");
                    yield StreamPart::run_settled(&run);
                    return;
                }
                NextStep::Finish(run) => {
                    info!(
                        thread_id = %thread_id,
                        status = run.as_ref().map(|r| r.status.as_str()).unwrap_or("unknown"),
                        "Run stream finished"
                    );
                    return;
                }
            }
        }
    };
    Box::pin(s)
}
