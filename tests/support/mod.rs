//! Test support: a scripted in-memory Assistants API and event builders

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::StreamExt;
use stock_assistant_relay::client::{AssistantEventStream, AssistantsApi};
use stock_assistant_relay::error::RelayError;
use stock_assistant_relay::types::{
    AssistantStreamEvent, CreateMessageRequest, CreateRunRequest, MessageDelta,
    MessageDeltaContent, MessageDeltaEvent, MessageRole, RequiredAction, Run, RunStatus,
    RunToolCall, SubmitToolOutputsAction, SubmitToolOutputsRequest, TextDelta, Thread,
    ThreadMessage, ToolOutput,
};
use tokio_util::sync::CancellationToken;

/// A remote call the relay made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateThread,
    CreateMessage { thread_id: String, content: String },
    CreateRun { thread_id: String, assistant_id: String },
    SubmitToolOutputs {
        thread_id: String,
        run_id: String,
        outputs: Vec<ToolOutput>,
    },
}

/// How one streamed segment behaves.
pub enum Segment {
    /// Yield the events, then end.
    Events(Vec<AssistantStreamEvent>),
    /// Yield the events, then never end.
    EventsThenPending(Vec<AssistantStreamEvent>),
    /// Fail before any event.
    Fail(RelayError),
}

/// Replays queued segments for `create_run_stream` and
/// `submit_tool_outputs_stream`, recording every call.
#[derive(Clone, Default)]
pub struct ScriptedApi {
    calls: Arc<Mutex<Vec<Call>>>,
    segments: Arc<Mutex<VecDeque<Segment>>>,
}

impl ScriptedApi {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            calls: Arc::default(),
            segments: Arc::new(Mutex::new(segments.into())),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SubmitToolOutputs { outputs, .. } => Some(outputs),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_segment(&self) -> Result<AssistantEventStream, RelayError> {
        let segment = self
            .segments
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Segment::Events(Vec::new()));
        match segment {
            Segment::Events(events) => {
                Ok(futures_util::stream::iter(events.into_iter().map(Ok)).boxed())
            }
            Segment::EventsThenPending(events) => Ok(futures_util::stream::iter(
                events.into_iter().map(Ok),
            )
            .chain(futures_util::stream::pending())
            .boxed()),
            Segment::Fail(err) => Err(err),
        }
    }
}

#[async_trait]
impl AssistantsApi for ScriptedApi {
    async fn create_thread(&self, cancel: &CancellationToken) -> Result<Thread, RelayError> {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }
        self.record(Call::CreateThread);
        Ok(Thread {
            id: "thread_new".into(),
            created_at: None,
            metadata: None,
        })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        request: CreateMessageRequest,
        cancel: &CancellationToken,
    ) -> Result<ThreadMessage, RelayError> {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }
        self.record(Call::CreateMessage {
            thread_id: thread_id.to_string(),
            content: request.content,
        });
        Ok(ThreadMessage {
            id: "msg_user".into(),
            thread_id: Some(thread_id.to_string()),
            role: MessageRole::User,
            content: Vec::new(),
            run_id: None,
        })
    }

    async fn create_run_stream(
        &self,
        thread_id: &str,
        request: CreateRunRequest,
        cancel: &CancellationToken,
    ) -> Result<AssistantEventStream, RelayError> {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }
        self.record(Call::CreateRun {
            thread_id: thread_id.to_string(),
            assistant_id: request.assistant_id,
        });
        self.next_segment()
    }

    async fn submit_tool_outputs_stream(
        &self,
        thread_id: &str,
        run_id: &str,
        request: SubmitToolOutputsRequest,
        cancel: &CancellationToken,
    ) -> Result<AssistantEventStream, RelayError> {
        if cancel.is_cancelled() {
            return Err(RelayError::Cancelled);
        }
        self.record(Call::SubmitToolOutputs {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            outputs: request.tool_outputs,
        });
        self.next_segment()
    }
}

pub fn run(id: &str, status: RunStatus) -> Run {
    Run {
        id: id.into(),
        thread_id: None,
        assistant_id: None,
        status,
        required_action: None,
        last_error: None,
    }
}

pub fn run_event(id: &str, status: RunStatus) -> AssistantStreamEvent {
    AssistantStreamEvent::Run {
        kind: status.as_str().into(),
        run: run(id, status),
    }
}

/// `thread.run.requires_action` asking for `calls`.
pub fn requires_action(id: &str, calls: Vec<RunToolCall>) -> AssistantStreamEvent {
    let mut run = run(id, RunStatus::RequiresAction);
    run.required_action = Some(RequiredAction::SubmitToolOutputs {
        submit_tool_outputs: SubmitToolOutputsAction { tool_calls: calls },
    });
    AssistantStreamEvent::Run {
        kind: "requires_action".into(),
        run,
    }
}

pub fn message_created(id: &str) -> AssistantStreamEvent {
    AssistantStreamEvent::MessageCreated(ThreadMessage {
        id: id.into(),
        thread_id: None,
        role: MessageRole::Assistant,
        content: Vec::new(),
        run_id: None,
    })
}

pub fn text_delta(id: &str, text: &str) -> AssistantStreamEvent {
    AssistantStreamEvent::MessageDelta(MessageDeltaEvent {
        id: id.into(),
        delta: MessageDelta {
            content: vec![MessageDeltaContent::Text {
                index: 0,
                text: Some(TextDelta {
                    value: Some(text.into()),
                }),
            }],
        },
    })
}
