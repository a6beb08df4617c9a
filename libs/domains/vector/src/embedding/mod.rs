mod http;
mod provider;

pub use http::{DEFAULT_EMBEDDING_SERVICE_URL, EmbeddingServiceConfig, HttpEmbeddingProvider};
pub use provider::EmbeddingProvider;
