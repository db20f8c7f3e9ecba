use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
    Function,
    Data,
}

impl MessageRole {
    pub const ALL: [MessageRole; 6] = [
        MessageRole::System,
        MessageRole::User,
        MessageRole::Assistant,
        MessageRole::Tool,
        MessageRole::Function,
        MessageRole::Data,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Function => "function",
            Self::Data => "data",
        }
    }

    /// Transcript text color for this role.
    pub const fn color(self) -> &'static str {
        match self {
            Self::System => "red",
            Self::User => "black",
            Self::Function => "blue",
            Self::Tool => "purple",
            Self::Assistant => "green",
            Self::Data => "orange",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    pub value: String,
}

/// One content block of a stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: TextValue,
    },
    /// Image files, refusals and other blocks the relay does not render
    #[serde(other)]
    Other,
}

/// A message as stored on the hosted platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub role: MessageRole,
    #[serde(default)]
    pub content: Vec<MessageContent>,
    #[serde(default)]
    pub run_id: Option<String>,
}

impl ThreadMessage {
    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                MessageContent::Text { text } => Some(text.value.as_str()),
                MessageContent::Other => None,
            })
            .collect()
    }
}

/// Body of `POST /threads/{thread_id}/messages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    pub role: MessageRole,
    pub content: String,
}

impl CreateMessageRequest {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDelta {
    #[serde(default)]
    pub value: Option<String>,
}

/// One content fragment of a `thread.message.delta` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageDeltaContent {
    Text {
        #[serde(default)]
        index: usize,
        #[serde(default)]
        text: Option<TextDelta>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageDelta {
    #[serde(default)]
    pub content: Vec<MessageDeltaContent>,
}

/// Payload of a `thread.message.delta` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDeltaEvent {
    pub id: String,
    #[serde(default)]
    pub delta: MessageDelta,
}

impl MessageDeltaEvent {
    /// Text fragments carrying a value, in arrival order.
    pub fn text_values(&self) -> impl Iterator<Item = &str> {
        self.delta.content.iter().filter_map(|c| match c {
            MessageDeltaContent::Text {
                text: Some(TextDelta { value: Some(v) }),
                ..
            } => Some(v.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn roles_use_lowercase_names() {
        let roles: Vec<String> = MessageRole::ALL
            .iter()
            .map(|r| serde_json::to_value(r).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            roles,
            ["system", "user", "assistant", "tool", "function", "data"]
        );
        assert_eq!(MessageRole::Tool.color(), "purple");
        assert_eq!(MessageRole::Data.color(), "orange");
    }

    #[test]
    fn message_tolerates_unrendered_blocks() {
        let msg: ThreadMessage = serde_json::from_value(json!({
            "id": "msg_1",
            "object": "thread.message",
            "thread_id": "thread_1",
            "role": "assistant",
            "content": [
                {"type": "image_file", "image_file": {"file_id": "f"}},
                {"type": "text", "text": {"value": "hi", "annotations": []}}
            ]
        }))
        .unwrap();
        assert_eq!(msg.text(), "hi");
        assert_eq!(msg.content[0], MessageContent::Other);
    }

    #[test]
    fn delta_skips_fragments_without_value() {
        let ev: MessageDeltaEvent = serde_json::from_value(json!({
            "id": "msg_1",
            "delta": {"content": [
                {"index": 0, "type": "text", "text": {"value": "Hel"}},
                {"index": 0, "type": "text", "text": {"annotations": []}},
                {"index": 1, "type": "image_file", "image_file": {"file_id": "f"}},
                {"index": 0, "type": "text", "text": {"value": "lo"}}
            ]}
        }))
        .unwrap();
        assert_eq!(ev.text_values().collect::<Vec<_>>(), ["Hel", "lo"]);
    }
}
