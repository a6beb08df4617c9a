use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

use crate::statement::StatementError;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("semantic query requires an embedding vector")]
    MissingEmbedding,

    #[error("invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("unsafe statement: {0}")]
    UnsafeStatement(#[from] StatementError),

    #[error("{0}")]
    StoreExecution(String),
}

pub type ProductResult<T> = Result<T, ProductError>;

/// Convert ProductError to AppError for standardized error responses
impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::StoreExecution(msg) => AppError::Database(msg),
            other => AppError::InternalServerError(other.to_string()),
        }
    }
}

impl IntoResponse for ProductError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<libsql::Error> for ProductError {
    fn from(err: libsql::Error) -> Self {
        ProductError::StoreExecution(err.to_string())
    }
}
