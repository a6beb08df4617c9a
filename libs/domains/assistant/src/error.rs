use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use domain_products::{ProductError, StatementError};
use domain_vector::VectorError;
use std::time::Duration;
use thiserror::Error;

/// Result type for assistant operations
pub type AssistantResult<T> = Result<T, AssistantError>;

/// Errors that end a chat or synthesis request
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Transport failure or non-success status from the model API
    #[error("Model error: {0}")]
    Model(String),

    /// Model answered with a payload we cannot interpret
    #[error("Unexpected model output: {reason}")]
    UpstreamFormat { raw: String, reason: String },

    #[error("Query synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Request exceeded its {0:?} budget")]
    Timeout(Duration),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the two-stage query synthesis.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Structured output did not match the stage schema
    #[error("model output did not match the expected schema: {reason}")]
    Format { raw: String, reason: String },

    #[error("unsafe statement: {0}")]
    UnsafeStatement(#[from] StatementError),

    #[error("no user request found in messages")]
    MissingRequest,

    #[error("{0}")]
    Model(String),

    /// Non-success answer from a remote synthesis endpoint
    #[error("synthesis endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },

    #[error("synthesis endpoint unreachable: {0}")]
    Transport(String),
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Retrieval failures inside the product search tool.
///
/// These never leave the tool: they are rendered as the tool result text.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Query synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("Embedding service error: {0}")]
    Embedding(#[from] VectorError),

    #[error("Database query error: {0}")]
    Query(#[from] ProductError),
}

/// Convert AssistantError to AppError for standardized error responses.
///
/// Everything except a timeout is reported as a generic internal error.
impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Timeout(_) => AppError::GatewayTimeout(err.to_string()),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for AssistantError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        AssistantError::Model(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_tool_error_prefixes() {
        let err = ToolError::from(VectorError::Embedding("returned 500".to_string()));
        assert!(err.to_string().starts_with("Embedding service error:"));

        let err = ToolError::from(ProductError::StoreExecution(
            "no such column: discount".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Database query error: no such column: discount"
        );

        let err = ToolError::from(SynthesisError::MissingRequest);
        assert!(err.to_string().starts_with("Query synthesis error:"));
    }

    #[test]
    fn test_timeout_is_gateway_timeout_and_rest_is_internal() {
        let response = AssistantError::Timeout(Duration::from_secs(30)).into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);

        let response = AssistantError::UpstreamFormat {
            raw: "{".to_string(),
            reason: "EOF".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AssistantError::InvalidRequest("bad body".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
