//! Decoded Assistants streaming events
//!
//! The hosted platform sends one SSE message per event, naming the event in
//! the `event:` field (`thread.run.created`, `thread.message.delta`, ...) and
//! carrying the affected object as JSON in `data:`.

use serde::{Deserialize, Serialize};

use super::message::{MessageDeltaEvent, ThreadMessage};
use super::run::Run;
use super::thread::Thread;
use crate::error::RelayError;

/// Body of an `error` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

impl ApiErrorBody {
    pub fn into_error(self) -> RelayError {
        let details = serde_json::to_value(&self).ok();
        RelayError::ApiError {
            code: 500,
            message: self.message,
            details,
        }
    }
}

/// One event of a run stream.
#[derive(Debug, Clone, PartialEq)]
pub enum AssistantStreamEvent {
    ThreadCreated(Thread),
    /// Any `thread.run.<status>` event; `kind` is the suffix after `thread.run.`
    Run { kind: String, run: Run },
    /// `thread.run.step.*` events; the step payload is not used
    RunStep { kind: String },
    MessageCreated(ThreadMessage),
    MessageInProgress(ThreadMessage),
    MessageDelta(MessageDeltaEvent),
    MessageCompleted(ThreadMessage),
    Error(ApiErrorBody),
    Done,
    Unknown { event: String },
}

impl AssistantStreamEvent {
    /// Decode an SSE message. Unrecognised event names are kept as
    /// [`AssistantStreamEvent::Unknown`]; malformed payloads of known events
    /// are parse errors.
    pub fn decode(event: &str, data: &str) -> Result<Self, RelayError> {
        let parse_err = |e: serde_json::Error| {
            RelayError::ParseError(format!("Failed to parse '{event}' event: {e}"))
        };

        if event == "done" || data.trim() == "[DONE]" {
            return Ok(Self::Done);
        }

        if let Some(kind) = event.strip_prefix("thread.run.step.") {
            return Ok(Self::RunStep {
                kind: kind.to_string(),
            });
        }

        if let Some(kind) = event.strip_prefix("thread.run.") {
            let run: Run = serde_json::from_str(data).map_err(parse_err)?;
            return Ok(Self::Run {
                kind: kind.to_string(),
                run,
            });
        }

        let decoded = match event {
            "thread.created" => Self::ThreadCreated(serde_json::from_str(data).map_err(parse_err)?),
            "thread.message.created" => {
                Self::MessageCreated(serde_json::from_str(data).map_err(parse_err)?)
            }
            "thread.message.in_progress" => {
                Self::MessageInProgress(serde_json::from_str(data).map_err(parse_err)?)
            }
            "thread.message.delta" => {
                Self::MessageDelta(serde_json::from_str(data).map_err(parse_err)?)
            }
            "thread.message.completed" => {
                Self::MessageCompleted(serde_json::from_str(data).map_err(parse_err)?)
            }
            "error" => Self::Error(serde_json::from_str(data).map_err(parse_err)?),
            other => Self::Unknown {
                event: other.to_string(),
            },
        };
        Ok(decoded)
    }

    /// The run carried by this event, if it is a run lifecycle event.
    pub fn run(&self) -> Option<&Run> {
        match self {
            Self::Run { run, .. } => Some(run),
            _ => None,
        }
    }
}
