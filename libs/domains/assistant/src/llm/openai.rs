use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{ChatMessage, ChatModel, Completion, CompletionRequest, ToolCall, ToolSpec};
use crate::error::{AssistantError, AssistantResult};

/// Google's OpenAI-compatible Gemini endpoint
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

pub const DEFAULT_LLM_MODEL: &str = "gemini-1.5-flash-8b";

const BODY_PREVIEW_LEN: usize = 300;

#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Environment variables:
/// - `GOOGLE_API_KEY` (required)
/// - `LLM_BASE_URL` (default: Gemini OpenAI-compatible endpoint)
/// - `LLM_MODEL` (default: `gemini-1.5-flash-8b`)
impl FromEnv for LlmConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("GOOGLE_API_KEY")?;
        Ok(Self::new(api_key)
            .with_base_url(env_or_default("LLM_BASE_URL", DEFAULT_LLM_BASE_URL))
            .with_model(env_or_default("LLM_MODEL", DEFAULT_LLM_MODEL)))
    }
}

/// Chat-completions client with function calling and JSON-schema output.
pub struct OpenAiChatModel {
    client: Client,
    config: LlmConfig,
}

impl OpenAiChatModel {
    pub fn new(config: LlmConfig) -> AssistantResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReply,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

fn function_kind() -> String {
    "function".to_string()
}

impl From<ChatMessage> for WireMessage {
    fn from(message: ChatMessage) -> Self {
        match message {
            ChatMessage::System(content) => WireMessage::plain("system", content),
            ChatMessage::User(content) => WireMessage::plain("user", content),
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => WireMessage {
                role: "assistant",
                content,
                tool_calls: tool_calls.into_iter().map(WireToolCall::from).collect(),
                tool_call_id: None,
            },
            ChatMessage::Tool { call_id, content } => WireMessage {
                role: "tool",
                content: Some(content),
                tool_calls: Vec::new(),
                tool_call_id: Some(call_id),
            },
        }
    }
}

impl WireMessage {
    fn plain(role: &'static str, content: String) -> Self {
        Self {
            role,
            content: Some(content),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

impl From<ToolCall> for WireToolCall {
    fn from(call: ToolCall) -> Self {
        let arguments = match call.arguments {
            Value::String(raw) => raw,
            other => other.to_string(),
        };
        Self {
            id: call.id,
            kind: function_kind(),
            function: WireFunction {
                name: call.name,
                arguments,
            },
        }
    }
}

impl From<WireToolCall> for ToolCall {
    fn from(call: WireToolCall) -> Self {
        let raw = call.function.arguments;
        let arguments = if raw.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&raw).unwrap_or(Value::String(raw))
        };
        Self {
            id: call.id,
            name: call.function.name,
            arguments,
        }
    }
}

fn tool_declaration(spec: ToolSpec) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": spec.name,
            "description": spec.description,
            "parameters": spec.parameters,
        }
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    #[instrument(
        skip(self, request),
        fields(model = %self.config.model, messages = request.messages.len())
    )]
    async fn complete(&self, request: CompletionRequest) -> AssistantResult<Completion> {
        let tool_choice = (!request.tools.is_empty()).then_some("auto");
        let body = WireRequest {
            model: &self.config.model,
            messages: request.messages.into_iter().map(WireMessage::from).collect(),
            tools: request.tools.into_iter().map(tool_declaration).collect(),
            tool_choice,
            response_format: request.response_format.map(|format| {
                json!({
                    "type": "json_schema",
                    "json_schema": {
                        "name": format.name,
                        "schema": format.schema,
                        "strict": true,
                    }
                })
            }),
        };

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(AssistantError::Model(format!(
                "model API returned {}: {}",
                status,
                preview(&text)
            )));
        }

        let parsed: WireResponse =
            serde_json::from_str(&text).map_err(|e| AssistantError::UpstreamFormat {
                raw: preview(&text).to_string(),
                reason: e.to_string(),
            })?;

        let choice =
            parsed
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| AssistantError::UpstreamFormat {
                    raw: preview(&text).to_string(),
                    reason: "response has no choices".to_string(),
                })?;

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(ToolCall::from)
            .collect();

        debug!(
            tool_calls = tool_calls.len(),
            finish_reason = ?choice.finish_reason,
            "Model step completed"
        );

        Ok(Completion {
            content: choice.message.content.filter(|c| !c.is_empty()),
            tool_calls,
            finish_reason: choice.finish_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ResponseFormat;
    use mockito::Matcher;

    fn model_for(server: &mockito::ServerGuard) -> OpenAiChatModel {
        let config = LlmConfig::new("gemini-key").with_base_url(format!("{}/openai/", server.url()));
        OpenAiChatModel::new(config).unwrap()
    }

    fn search_tool() -> ToolSpec {
        ToolSpec {
            name: "getHybridQuery".to_string(),
            description: "Get a hybrid SQL query from a user's product request.".to_string(),
            parameters: json!({"type": "object", "properties": {"productRequest": {"type": "string"}}}),
        }
    }

    #[tokio::test]
    async fn test_complete_sends_tools_and_parses_tool_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/chat/completions")
            .match_header("authorization", "Bearer gemini-key")
            .match_body(Matcher::PartialJson(json!({
                "model": DEFAULT_LLM_MODEL,
                "tool_choice": "auto",
                "tools": [{"type": "function", "function": {"name": "getHybridQuery"}}],
                "messages": [
                    {"role": "system", "content": "be helpful"},
                    {"role": "user", "content": "comfortable shoes"}
                ]
            })))
            .with_status(200)
            .with_body(
                json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": {
                                    "name": "getHybridQuery",
                                    "arguments": "{\"productRequest\":\"comfortable shoes\"}"
                                }
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let completion = model_for(&server)
            .complete(CompletionRequest {
                messages: vec![
                    ChatMessage::System("be helpful".to_string()),
                    ChatMessage::User("comfortable shoes".to_string()),
                ],
                tools: vec![search_tool()],
                response_format: None,
            })
            .await
            .unwrap();

        assert_eq!(completion.content, None);
        assert_eq!(
            completion.tool_calls,
            vec![ToolCall {
                id: "call_1".to_string(),
                name: "getHybridQuery".to_string(),
                arguments: json!({"productRequest": "comfortable shoes"}),
            }]
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_requests_json_schema_without_tools() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "response_format": {
                    "type": "json_schema",
                    "json_schema": {"name": "intent"}
                }
            })))
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"content":"{\"embedding_text\":\"\"}"},"finish_reason":"stop"}]}"#,
            )
            .create_async()
            .await;

        let completion = model_for(&server)
            .complete(CompletionRequest {
                messages: vec![ChatMessage::User("cheap lipstick".to_string())],
                tools: Vec::new(),
                response_format: Some(ResponseFormat {
                    name: "intent".to_string(),
                    schema: json!({"type": "object"}),
                }),
            })
            .await
            .unwrap();

        assert_eq!(completion.content.as_deref(), Some(r#"{"embedding_text":""}"#));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_replayed_tool_history_uses_wire_format() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/chat/completions")
            .match_body(Matcher::PartialJson(json!({
                "messages": [
                    {
                        "role": "assistant",
                        "tool_calls": [{
                            "id": "c1",
                            "type": "function",
                            "function": {"name": "getHybridQuery", "arguments": "{\"productRequest\":\"bags\"}"}
                        }]
                    },
                    {"role": "tool", "tool_call_id": "c1", "content": "[]"}
                ]
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"Nothing found."},"finish_reason":"stop"}]}"#)
            .create_async()
            .await;

        let completion = model_for(&server)
            .complete(CompletionRequest {
                messages: vec![
                    ChatMessage::Assistant {
                        content: None,
                        tool_calls: vec![ToolCall {
                            id: "c1".to_string(),
                            name: "getHybridQuery".to_string(),
                            arguments: json!({"productRequest": "bags"}),
                        }],
                    },
                    ChatMessage::Tool {
                        call_id: "c1".to_string(),
                        content: "[]".to_string(),
                    },
                ],
                ..CompletionRequest::default()
            })
            .await
            .unwrap();

        assert_eq!(completion.content.as_deref(), Some("Nothing found."));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_model_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/chat/completions")
            .with_status(429)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = model_for(&server)
            .complete(CompletionRequest::default())
            .await
            .unwrap_err();

        match err {
            AssistantError::Model(msg) => {
                assert!(msg.contains("429"));
                assert!(msg.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_garbled_body_is_upstream_format_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/openai/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;

        let err = model_for(&server)
            .complete(CompletionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::UpstreamFormat { .. }));
    }

    #[test]
    fn test_invalid_arguments_are_kept_raw() {
        let call = ToolCall::from(WireToolCall {
            id: "c9".to_string(),
            kind: function_kind(),
            function: WireFunction {
                name: "getHybridQuery".to_string(),
                arguments: "{productRequest:".to_string(),
            },
        });
        assert_eq!(call.arguments, Value::String("{productRequest:".to_string()));
    }

    #[test]
    fn test_config_from_env_defaults() {
        temp_env::with_vars(
            [
                ("GOOGLE_API_KEY", Some("k")),
                ("LLM_BASE_URL", None::<&str>),
                ("LLM_MODEL", None),
            ],
            || {
                let config = LlmConfig::from_env().unwrap();
                assert_eq!(config.base_url, DEFAULT_LLM_BASE_URL);
                assert_eq!(config.model, DEFAULT_LLM_MODEL);
                assert!(!format!("{:?}", config).contains("\"k\""));
            },
        );

        temp_env::with_var_unset("GOOGLE_API_KEY", || {
            assert!(matches!(
                LlmConfig::from_env(),
                Err(ConfigError::MissingEnvVar(key)) if key == "GOOGLE_API_KEY"
            ));
        });
    }
}
