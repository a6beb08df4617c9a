//! Conversation Orchestrator
//!
//! Drives the model/tool loop for one chat request and turns it into a
//! stream of [`ChatEvent`]s.

use core_config::{ConfigError, FromEnv, env_parse};
use futures::stream::Stream;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, warn};

use super::prompts::SHOPPING_ASSISTANT_PROMPT;
use super::tools::ToolRegistry;
use crate::error::{AssistantError, AssistantResult};
use crate::llm::{ChatMessage, ChatModel, CompletionRequest, ToolCall};
use crate::models::{ChatEvent, FinishReason, Message, Role, ToolInvocation};

pub const MAX_TOOL_STEPS: u32 = 15;

pub const REQUEST_TIMEOUT_SECS: u64 = 30;

pub type ChatStream = Pin<Box<dyn Stream<Item = AssistantResult<ChatEvent>> + Send>>;

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Model calls allowed per request
    pub max_steps: u32,
    /// Wall-clock budget for the whole request
    pub request_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: MAX_TOOL_STEPS,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

impl OrchestratorConfig {
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Environment variables:
/// - `MAX_TOOL_STEPS` (default: 15, must be positive)
impl FromEnv for OrchestratorConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let max_steps = env_parse("MAX_TOOL_STEPS", MAX_TOOL_STEPS)?;
        if max_steps == 0 {
            return Err(ConfigError::ParseError {
                key: "MAX_TOOL_STEPS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            max_steps,
            ..Self::default()
        })
    }
}

/// Prepend the shopping assistant directive unless a system message exists.
///
/// Returns whether a message was inserted.
pub fn ensure_system_message(messages: &mut Vec<Message>) -> bool {
    if messages.iter().any(|m| m.role == Role::System) {
        return false;
    }
    messages.insert(0, Message::system(SHOPPING_ASSISTANT_PROMPT));
    true
}

/// Convert client history into model messages.
///
/// Completed tool invocations are replayed as an assistant tool call followed
/// by its tool result; invocations still in `partial-call` are dropped.
pub fn to_chat_messages(messages: &[Message]) -> Vec<ChatMessage> {
    let mut history = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            Role::System => history.push(ChatMessage::System(message.content.clone())),
            Role::User => history.push(ChatMessage::User(message.content.clone())),
            Role::Assistant => {
                let completed: Vec<&ToolInvocation> = message
                    .tool_invocations
                    .iter()
                    .filter(|inv| inv.is_complete())
                    .collect();

                if !completed.is_empty() {
                    history.push(ChatMessage::Assistant {
                        content: None,
                        tool_calls: completed
                            .iter()
                            .map(|inv| ToolCall {
                                id: inv.tool_call_id.clone(),
                                name: inv.tool_name.clone(),
                                arguments: inv.args.clone(),
                            })
                            .collect(),
                    });
                    for inv in &completed {
                        history.push(ChatMessage::Tool {
                            call_id: inv.tool_call_id.clone(),
                            content: result_text(inv.result.as_ref().unwrap_or(&Value::Null)),
                        });
                    }
                }

                if !message.content.trim().is_empty() {
                    history.push(ChatMessage::Assistant {
                        content: Some(message.content.clone()),
                        tool_calls: Vec::new(),
                    });
                }
            }
            // No call id to attach it to
            Role::Tool => debug!("Dropping bare tool message from history"),
        }
    }

    history
}

fn result_text(result: &Value) -> String {
    match result {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Runs the model/tool loop for chat requests.
pub struct ConversationOrchestrator {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    config: OrchestratorConfig,
}

impl Clone for ConversationOrchestrator {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            tools: Arc::clone(&self.tools),
            config: self.config.clone(),
        }
    }
}

impl ConversationOrchestrator {
    pub fn new(model: Arc<dyn ChatModel>, tools: ToolRegistry, config: OrchestratorConfig) -> Self {
        Self {
            model,
            tools: Arc::new(tools),
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Stream the response to `messages`.
    ///
    /// The stream ends after a `finish` event, or after a single `Err` item
    /// when the model fails or the request budget runs out.
    pub fn run(&self, mut messages: Vec<Message>) -> ChatStream {
        let this = self.clone();
        let deadline = Instant::now() + self.config.request_timeout;

        Box::pin(async_stream::stream! {
            if ensure_system_message(&mut messages) {
                debug!("Injected shopping assistant directive");
            }
            let mut history = to_chat_messages(&messages);
            let tools = this.tools.specs();
            let mut steps: u32 = 0;

            loop {
                if steps >= this.config.max_steps {
                    warn!(steps, "Step limit reached");
                    yield Ok(ChatEvent::Finish { reason: FinishReason::StepLimit, steps });
                    break;
                }
                steps += 1;

                let request = CompletionRequest {
                    messages: history.clone(),
                    tools: tools.clone(),
                    response_format: None,
                };
                let completion = match this
                    .within(deadline, this.model.complete(request))
                    .await
                    .and_then(|result| result)
                {
                    Ok(completion) => completion,
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                };

                let content = completion.content.filter(|c| !c.trim().is_empty());
                if let Some(text) = &content {
                    yield Ok(ChatEvent::Text { content: text.clone() });
                }

                if completion.tool_calls.is_empty() {
                    info!(steps, "Chat completed");
                    yield Ok(ChatEvent::Finish { reason: FinishReason::Stop, steps });
                    break;
                }

                let calls: Vec<ToolCall> = completion
                    .tool_calls
                    .into_iter()
                    .enumerate()
                    .map(|(index, mut call)| {
                        if call.id.is_empty() {
                            call.id = format!("call-{}-{}", steps, index);
                        }
                        call
                    })
                    .collect();
                history.push(ChatMessage::Assistant { content, tool_calls: calls.clone() });

                for call in calls {
                    let invocation = ToolInvocation::call(&call.id, &call.name, call.arguments.clone());
                    yield Ok(ChatEvent::ToolCall(invocation.clone()));

                    let result = match this
                        .within(deadline, this.tools.execute(&call.name, call.arguments))
                        .await
                    {
                        Ok(result) => result,
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    };

                    history.push(ChatMessage::Tool {
                        call_id: call.id.clone(),
                        content: result_text(&result),
                    });
                    yield Ok(ChatEvent::ToolResult(invocation.complete(result)));
                }
            }
        })
    }

    async fn within<F: Future>(&self, deadline: Instant, work: F) -> AssistantResult<F::Output> {
        timeout_at(deadline, work)
            .await
            .map_err(|_| AssistantError::Timeout(self.config.request_timeout))
    }
}
