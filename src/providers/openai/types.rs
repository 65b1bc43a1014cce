use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One conversation turn, kept as the raw JSON object so fields the relay
/// does not know about (`name`, `tool_calls`, multi-part `content`) reach the
/// upstream untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message(Map<String, Value>);

impl Message {
    fn text(role: &str, content: String) -> Self {
        let mut fields = Map::new();
        fields.insert("role".to_string(), Value::String(role.to_string()));
        fields.insert("content".to_string(), Value::String(content));
        Self(fields)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::text("system", content.into())
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::text("user", content.into())
    }

    /// Wraps a caller-supplied turn; anything but a JSON object is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }
}

/// The two upstream endpoint shapes tried by the chat relay, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatEndpoint {
    /// `POST {base}/chat/completions` with a `messages` array.
    ChatCompletions,
    /// `POST {base}/responses` with an `input` array.
    Responses,
}

impl ChatEndpoint {
    pub const PRIMARY: ChatEndpoint = ChatEndpoint::ChatCompletions;

    pub fn path(self) -> &'static str {
        match self {
            ChatEndpoint::ChatCompletions => "chat/completions",
            ChatEndpoint::Responses => "responses",
        }
    }

    /// The endpoint to try after this one failed, if any.
    pub fn fallback(self) -> Option<ChatEndpoint> {
        match self {
            ChatEndpoint::ChatCompletions => Some(ChatEndpoint::Responses),
            ChatEndpoint::Responses => None,
        }
    }

    pub fn payload(self, model: &str, conversation: Vec<Message>) -> UpstreamChatPayload {
        let model = model.to_string();
        match self {
            ChatEndpoint::ChatCompletions => UpstreamChatPayload::ChatCompletions {
                model,
                messages: conversation,
                stream: true,
            },
            ChatEndpoint::Responses => UpstreamChatPayload::Responses {
                model,
                input: conversation,
                stream: true,
            },
        }
    }
}

/// Request body sent upstream; serializes without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamChatPayload {
    ChatCompletions {
        model: String,
        messages: Vec<Message>,
        stream: bool,
    },
    Responses {
        model: String,
        input: Vec<Message>,
        stream: bool,
    },
}
