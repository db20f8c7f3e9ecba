//! Assistant stream protocol
//!
//! The browser reads the response body as newline-delimited parts of the form
//! `<code>:<json>`. Only the part types the relay emits are modelled.

use serde::Serialize;
use serde_json::{Value, json};

use crate::types::Run;

/// One line of the outbound stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamPart {
    /// `0` incremental assistant text
    Text(String),
    /// `3` error message; always the last part of a stream
    Error(String),
    /// `4` a new assistant message, content filled in by later text parts
    AssistantMessage { id: String },
    /// `5` conversation and created-message identifiers; always the first part
    AssistantControlData {
        thread_id: String,
        message_id: String,
    },
    /// `6` a `data` role message
    DataMessage { data: Value },
}

impl StreamPart {
    pub const fn code(&self) -> char {
        match self {
            Self::Text(_) => '0',
            Self::Error(_) => '3',
            Self::AssistantMessage { .. } => '4',
            Self::AssistantControlData { .. } => '5',
            Self::DataMessage { .. } => '6',
        }
    }

    fn payload(&self) -> Value {
        match self {
            Self::Text(text) | Self::Error(text) => Value::String(text.clone()),
            Self::AssistantMessage { id } => json!({
                "id": id,
                "role": "assistant",
                "content": [{"type": "text", "text": {"value": ""}}],
            }),
            Self::AssistantControlData {
                thread_id,
                message_id,
            } => json!({"threadId": thread_id, "messageId": message_id}),
            Self::DataMessage { data } => json!({"role": "data", "data": data}),
        }
    }

    /// Encode as a single protocol line, including the trailing newline.
    ///
    /// JSON string encoding escapes embedded newlines, so a part never spans
    /// more than one line.
    pub fn encode(&self) -> String {
        format!("{}:{}\n", self.code(), self.payload())
    }

    /// Data message describing a run that settled without completing.
    pub fn run_settled(run: &Run) -> Self {
        let last_error = run.last_error.as_ref().map(|e| {
            json!({
                "code": e.code,
                "message": e.message,
            })
        });
        Self::DataMessage {
            data: serde_json::to_value(RunSettledData {
                description: format!("Run {} ended with status {}", run.id, run.status),
                run_id: &run.id,
                status: run.status.as_str(),
                last_error,
            })
            .unwrap_or(Value::Null),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSettledData<'a> {
    description: String,
    run_id: &'a str,
    status: &'static str,
    last_error: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RunError, RunStatus};

    #[test]
    fn encodes_each_part_on_one_line() {
        assert_eq!(
            StreamPart::Text("Hello\nworld".into()).encode(),
            "0:\"Hello\\nworld\"\n"
        );
        assert_eq!(
            StreamPart::Error("Unknown tool call function: x".into()).encode(),
            "3:\"Unknown tool call function: x\"\n"
        );

        let line = StreamPart::AssistantControlData {
            thread_id: "thread_1".into(),
            message_id: "msg_1".into(),
        }
        .encode();
        let json = line.strip_prefix("5:").unwrap();
        assert!(json.ends_with('\n'));
        let value: Value = serde_json::from_str(json).unwrap();
        assert_eq!(value, json!({"threadId": "thread_1", "messageId": "msg_1"}));
    }

    #[test]
    fn assistant_message_starts_empty() {
        let line = StreamPart::AssistantMessage { id: "msg_2".into() }.encode();
        let (code, json) = line.trim_end().split_once(':').unwrap();
        assert_eq!(code, "4");
        let value: Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["id"], "msg_2");
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"][0]["text"]["value"], "");
    }

    #[test]
    fn settled_run_becomes_data_message() {
        let run = Run {
            id: "run_1".into(),
            thread_id: None,
            assistant_id: None,
            status: RunStatus::Failed,
            required_action: None,
            last_error: Some(RunError {
                code: Some("server_error".into()),
                message: Some("boom".into()),
            }),
        };
        let StreamPart::DataMessage { data } = StreamPart::run_settled(&run) else {
            panic!("expected data message");
        };
        assert_eq!(data["status"], "failed");
        assert_eq!(data["runId"], "run_1");
        assert_eq!(data["lastError"]["message"], "boom");
        assert!(data["description"].as_str().unwrap().contains("failed"));
    }
}
