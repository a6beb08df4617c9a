use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message of the client-held conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_invocations: Vec<ToolInvocation>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_invocations: Vec::new(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Lifecycle of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum InvocationState {
    /// Requested by the model, no result yet
    #[serde(alias = "call")]
    PartialCall,
    Result,
}

/// A tool call attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_name: String,
    #[serde(alias = "callId")]
    pub tool_call_id: String,
    pub state: InvocationState,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub args: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub result: Option<Value>,
}

impl ToolInvocation {
    pub fn call(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        args: Value,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            tool_call_id: tool_call_id.into(),
            state: InvocationState::PartialCall,
            args,
            result: None,
        }
    }

    /// Move to the `result` state.
    pub fn complete(mut self, result: Value) -> Self {
        self.state = InvocationState::Result;
        self.result = Some(result);
        self
    }

    pub fn is_complete(&self) -> bool {
        self.state == InvocationState::Result && self.result.is_some()
    }
}

/// Body of `POST /api/chat` and `POST /api/hybridquery`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Why a chat stream ended normally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    StepLimit,
}

/// One server-sent event of a chat response.
///
/// Serializes to the event's `data` payload; [`ChatEvent::name`] gives the
/// SSE event name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatEvent {
    Text { content: String },
    ToolCall(ToolInvocation),
    ToolResult(ToolInvocation),
    Finish { reason: FinishReason, steps: u32 },
    Error { error: String },
}

impl ChatEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ChatEvent::Text { .. } => "text",
            ChatEvent::ToolCall(_) => "tool_call",
            ChatEvent::ToolResult(_) => "tool_result",
            ChatEvent::Finish { .. } => "finish",
            ChatEvent::Error { .. } => "error",
        }
    }
}

/// Starter questions shown before the first message
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Suggestions {
    pub questions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_wire_shape_is_camel_case() {
        let message: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": "",
            "toolInvocations": [{
                "toolName": "getHybridQuery",
                "callId": "call-1",
                "state": "result",
                "args": {"productRequest": "red lipstick"},
                "result": [{"id": 2}]
            }]
        }))
        .unwrap();

        assert_eq!(message.role, Role::Assistant);
        let invocation = &message.tool_invocations[0];
        assert_eq!(invocation.tool_call_id, "call-1");
        assert!(invocation.is_complete());

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["toolInvocations"][0]["toolCallId"], "call-1");
    }

    #[test]
    fn test_plain_message_omits_invocations() {
        let value = serde_json::to_value(Message::user("hi")).unwrap();
        assert_eq!(value, json!({"role": "user", "content": "hi"}));

        let parsed: Message = serde_json::from_value(json!({"role": "system"})).unwrap();
        assert_eq!(parsed.content, "");
    }

    #[test]
    fn test_chat_request_without_messages_is_empty() {
        let request: ChatRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.messages.is_empty());
    }

    #[test]
    fn test_event_payloads() {
        let call = ToolInvocation::call("c1", "getHybridQuery", json!({"productRequest": "x"}));
        assert_eq!(
            serde_json::to_value(ChatEvent::ToolCall(call.clone())).unwrap(),
            json!({
                "toolName": "getHybridQuery",
                "toolCallId": "c1",
                "state": "partial-call",
                "args": {"productRequest": "x"}
            })
        );

        let done = ChatEvent::ToolResult(call.complete(json!([])));
        assert_eq!(done.name(), "tool_result");
        assert_eq!(serde_json::to_value(&done).unwrap()["state"], "result");

        let finish = ChatEvent::Finish {
            reason: FinishReason::StepLimit,
            steps: 15,
        };
        assert_eq!(
            serde_json::to_value(&finish).unwrap(),
            json!({"reason": "step-limit", "steps": 15})
        );
    }
}
