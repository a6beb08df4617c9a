//! HTTP handlers for the assistant with SSE streaming

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use axum_helpers::errors::responses::{GatewayTimeoutResponse, InternalServerErrorResponse};
use domain_products::QueryPlan;
use futures::StreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, instrument};
use utoipa::OpenApi;

use crate::agent::prompts::SUGGESTED_QUESTIONS;
use crate::agent::{ConversationOrchestrator, REQUEST_TIMEOUT_SECS};
use crate::error::{AssistantError, AssistantResult};
use crate::models::{
    ChatEvent, ChatRequest, FinishReason, InvocationState, Message, Role, Suggestions,
    ToolInvocation,
};
use crate::synthesis::QuerySynthesisService;

/// Shared state for handlers
pub struct AssistantState {
    pub orchestrator: Arc<ConversationOrchestrator>,
    pub synthesis: Arc<QuerySynthesisService>,
    /// Budget for one `/hybridquery` request
    pub request_timeout: Duration,
}

impl Clone for AssistantState {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            synthesis: Arc::clone(&self.synthesis),
            request_timeout: self.request_timeout,
        }
    }
}

impl AssistantState {
    pub fn new(orchestrator: ConversationOrchestrator, synthesis: QuerySynthesisService) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            synthesis: Arc::new(synthesis),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// OpenAPI documentation for the assistant API
#[derive(OpenApi)]
#[openapi(
    paths(chat_handler, hybrid_query_handler, suggestions_handler),
    components(
        schemas(
            ChatRequest,
            Message,
            Role,
            ToolInvocation,
            InvocationState,
            FinishReason,
            QueryPlan,
            Suggestions,
        ),
        responses(InternalServerErrorResponse, GatewayTimeoutResponse)
    ),
    tags(
        (name = "assistant", description = "Conversational product search")
    )
)]
pub struct ApiDoc;

/// Create the assistant router
pub fn router(state: AssistantState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/hybridquery", post(hybrid_query_handler))
        .route("/suggestions", get(suggestions_handler))
        .with_state(state)
}

fn into_request(payload: Result<Json<ChatRequest>, JsonRejection>) -> AssistantResult<ChatRequest> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| AssistantError::InvalidRequest(rejection.body_text()))
}

fn client_message(err: &AssistantError) -> &'static str {
    match err {
        AssistantError::Timeout(_) => "Request timed out",
        _ => "Internal Server Error",
    }
}

fn to_sse(item: AssistantResult<ChatEvent>) -> Result<Event, Infallible> {
    let event = item.unwrap_or_else(|err| {
        error!(error = %err, "Chat stream failed");
        ChatEvent::Error {
            error: client_message(&err).to_string(),
        }
    });

    let sse = Event::default().event(event.name());
    Ok(match sse.json_data(&event) {
        Ok(sse) => sse,
        Err(err) => {
            error!(error = %err, "Failed to encode chat event");
            Event::default()
                .event("error")
                .data(r#"{"error":"Internal Server Error"}"#)
        }
    })
}

/// Chat with the shopping assistant
///
/// Streams `text`, `tool_call`, `tool_result`, `finish` and `error` events.
/// Fails with a JSON error instead of a stream when the first model step fails.
#[utoipa::path(
    post,
    path = "/chat",
    tag = "assistant",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Server-sent event stream", content_type = "text/event-stream", body = String),
        (status = 500, response = InternalServerErrorResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
#[instrument(skip_all)]
async fn chat_handler(
    State(state): State<AssistantState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let request = match into_request(payload) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    let mut stream = state.orchestrator.run(request.messages);
    let first = match stream.next().await {
        Some(Ok(event)) => event,
        Some(Err(err)) => return err.into_response(),
        None => {
            return AssistantError::Internal("chat stream ended without events".to_string())
                .into_response();
        }
    };

    let events = futures::stream::once(async move { Ok(first) })
        .chain(stream)
        .map(to_sse);

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Synthesize a hybrid query plan
///
/// Runs intent extraction then SQL synthesis for the last user message.
#[utoipa::path(
    post,
    path = "/hybridquery",
    tag = "assistant",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Query plan", body = QueryPlan),
        (status = 500, response = InternalServerErrorResponse),
        (status = 504, response = GatewayTimeoutResponse)
    )
)]
#[instrument(skip_all)]
async fn hybrid_query_handler(
    State(state): State<AssistantState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AssistantResult<Json<QueryPlan>> {
    let request = into_request(payload)?;

    let plan = tokio::time::timeout(
        state.request_timeout,
        state.synthesis.synthesize(&request.messages),
    )
    .await
    .map_err(|_| AssistantError::Timeout(state.request_timeout))??;

    Ok(Json(plan))
}

/// Starter questions for an empty conversation
#[utoipa::path(
    get,
    path = "/suggestions",
    tag = "assistant",
    responses(
        (status = 200, description = "Suggested questions", body = Suggestions)
    )
)]
async fn suggestions_handler() -> Json<Suggestions> {
    Json(Suggestions {
        questions: SUGGESTED_QUESTIONS.iter().map(|q| q.to_string()).collect(),
    })
}
