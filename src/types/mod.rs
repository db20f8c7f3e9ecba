//! Wire types for the hosted Assistants API
//!
//! Threads, messages and runs live server-side; these types only mirror the
//! fields the relay reads or writes. Unknown fields are ignored on decode.

pub mod events;
pub mod message;
pub mod run;
pub mod thread;
pub mod tools;

pub use events::{ApiErrorBody, AssistantStreamEvent};
pub use message::{
    CreateMessageRequest, MessageContent, MessageDelta, MessageDeltaContent, MessageDeltaEvent,
    MessageRole, TextDelta, TextValue, ThreadMessage,
};
pub use run::{CreateRunRequest, RequiredAction, Run, RunError, RunStatus, SubmitToolOutputsAction};
pub use thread::Thread;
pub use tools::{FunctionCall, RunToolCall, SubmitToolOutputsRequest, ToolOutput};
