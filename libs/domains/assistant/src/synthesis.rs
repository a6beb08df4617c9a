//! Two-stage query synthesis
//!
//! Stage 1 extracts the qualitative phrase to embed (or `""`), stage 2 writes
//! the SQL for the branch stage 1 chose. Both stages ask the model for
//! JSON-schema constrained output.

use async_trait::async_trait;
use domain_products::{QueryPlan, StatementKind, models::normalize_limit, statement};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::agent::prompts::{INTENT_PROMPT, plain_sql_prompt, vector_sql_prompt};
use crate::error::{SynthesisError, SynthesisResult};
use crate::llm::{ChatMessage, ChatModel, CompletionRequest, ResponseFormat};
use crate::models::{Message, Role};
use crate::planner::QueryPlanner;

#[derive(Debug, Deserialize)]
struct IntentOutput {
    embedding_text: String,
}

#[derive(Debug, Deserialize)]
struct SqlOutput {
    query: String,
    #[serde(default)]
    limit: Option<Value>,
}

#[derive(Debug)]
enum Stage {
    ExtractIntent,
    SynthesizeSql { embedding_text: String },
    Done(QueryPlan),
}

/// Inputs shared by both stages
struct SynthesisInput<'a> {
    request: &'a str,
    /// Caller-supplied directive replacing the stage 2 prompt
    directive: Option<&'a str>,
}

pub struct QuerySynthesisService {
    model: Arc<dyn ChatModel>,
}

impl Clone for QuerySynthesisService {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
        }
    }
}

impl QuerySynthesisService {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Turn a conversation into a validated [`QueryPlan`].
    ///
    /// The request is the last user message. A system message in `messages`
    /// is used as the SQL-writing directive instead of the built-in one.
    #[instrument(skip(self, messages), fields(messages = messages.len()))]
    pub async fn synthesize(&self, messages: &[Message]) -> SynthesisResult<QueryPlan> {
        let request = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User && !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
            .ok_or(SynthesisError::MissingRequest)?;
        let directive = messages
            .iter()
            .find(|m| m.role == Role::System && !m.content.trim().is_empty())
            .map(|m| m.content.as_str());
        let input = SynthesisInput { request, directive };

        let mut stage = Stage::ExtractIntent;
        loop {
            stage = match stage {
                Stage::ExtractIntent => Stage::SynthesizeSql {
                    embedding_text: self.extract_intent(&input).await?,
                },
                Stage::SynthesizeSql { embedding_text } => {
                    Stage::Done(self.synthesize_sql(&input, embedding_text).await?)
                }
                Stage::Done(plan) => {
                    debug!(semantic = plan.is_semantic(), limit = plan.limit, "Query synthesized");
                    return Ok(plan);
                }
            };
        }
    }

    async fn extract_intent(&self, input: &SynthesisInput<'_>) -> SynthesisResult<String> {
        let schema = json!({
            "type": "object",
            "properties": {"embedding_text": {"type": "string"}},
            "required": ["embedding_text"],
            "additionalProperties": false
        });
        let output: IntentOutput = self
            .structured(INTENT_PROMPT.to_string(), input.request, "intent", schema)
            .await?;
        Ok(output.embedding_text.trim().to_string())
    }

    async fn synthesize_sql(
        &self,
        input: &SynthesisInput<'_>,
        embedding_text: String,
    ) -> SynthesisResult<QueryPlan> {
        let kind = if embedding_text.is_empty() {
            StatementKind::Plain
        } else {
            StatementKind::VectorSearch
        };
        let directive = match (input.directive, kind) {
            (Some(directive), _) => directive.to_string(),
            (None, StatementKind::Plain) => plain_sql_prompt(),
            (None, StatementKind::VectorSearch) => vector_sql_prompt(&embedding_text),
        };
        let schema = json!({
            "type": "object",
            "properties": {
                "query": {"type": "string"},
                "limit": {"type": ["integer", "null"]}
            },
            "required": ["query", "limit"],
            "additionalProperties": false
        });

        let output: SqlOutput = self
            .structured(directive, input.request, "hybrid_query", schema)
            .await?;
        let query = output.query.trim().to_string();
        statement::guard(&query, kind)?;

        Ok(QueryPlan::new(
            query,
            embedding_text,
            normalize_limit(output.limit.as_ref()),
        ))
    }

    async fn structured<T: DeserializeOwned>(
        &self,
        directive: String,
        request: &str,
        name: &str,
        schema: Value,
    ) -> SynthesisResult<T> {
        let completion = self
            .model
            .complete(CompletionRequest {
                messages: vec![
                    ChatMessage::System(directive),
                    ChatMessage::User(request.to_string()),
                ],
                tools: Vec::new(),
                response_format: Some(ResponseFormat {
                    name: name.to_string(),
                    schema,
                }),
            })
            .await
            .map_err(|e| SynthesisError::Model(e.to_string()))?;

        let raw = completion.content.unwrap_or_default();
        parse_structured(&raw)
    }
}

/// Parse a structured answer, tolerating a surrounding markdown code fence.
fn parse_structured<T: DeserializeOwned>(raw: &str) -> SynthesisResult<T> {
    serde_json::from_str(strip_code_fence(raw)).map_err(|e| SynthesisError::Format {
        raw: raw.to_string(),
        reason: e.to_string(),
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[async_trait]
impl QueryPlanner for QuerySynthesisService {
    async fn plan(&self, product_request: &str) -> SynthesisResult<QueryPlan> {
        self.synthesize(&[Message::user(product_request)]).await
    }
}
