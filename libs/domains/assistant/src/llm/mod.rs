//! Chat model abstraction
//!
//! The orchestrator and the synthesis service talk to the model through
//! [`ChatModel`]; [`OpenAiChatModel`] speaks the OpenAI-compatible
//! chat-completions protocol.

mod openai;

pub use openai::{DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL, LlmConfig, OpenAiChatModel};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AssistantResult;

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Parsed arguments, or the raw string when the model sent invalid JSON
    pub arguments: Value,
}

/// Conversation entry sent to the model
#[derive(Debug, Clone, PartialEq)]
pub enum ChatMessage {
    System(String),
    User(String),
    Assistant {
        content: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    Tool {
        call_id: String,
        content: String,
    },
}

/// Function declaration offered to the model
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// JSON-schema constrained output
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Offered with `tool_choice: auto` when non-empty
    pub tools: Vec<ToolSpec>,
    pub response_format: Option<ResponseFormat>,
}

/// One model step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            finish_reason: Some("stop".to_string()),
            ..Self::default()
        }
    }

    pub fn tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: calls,
            finish_reason: Some("tool_calls".to_string()),
            ..Self::default()
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> AssistantResult<Completion>;
}
