use async_trait::async_trait;

use crate::error::VectorResult;
use crate::models::EmbeddingVector;

/// Turns a short descriptive phrase into a dense vector for the product index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> VectorResult<EmbeddingVector>;
}
