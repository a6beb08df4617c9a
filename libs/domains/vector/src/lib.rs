//! Vector Domain Library
//!
//! Embedding generation for semantic product search: the [`EmbeddingProvider`]
//! seam, the hosted-worker HTTP client and the validated [`EmbeddingVector`]
//! value handed to the product executor.
//!
//! ```ignore
//! use domain_vector::{EmbeddingProvider, EmbeddingServiceConfig, HttpEmbeddingProvider};
//! use core_config::FromEnv;
//!
//! let provider = HttpEmbeddingProvider::new(EmbeddingServiceConfig::from_env()?)?;
//! let vector = provider.embed("soft breathable cotton").await?;
//! ```

pub mod embedding;
pub mod error;
pub mod models;

pub use embedding::{
    DEFAULT_EMBEDDING_SERVICE_URL, EmbeddingProvider, EmbeddingServiceConfig,
    HttpEmbeddingProvider,
};
pub use error::{VectorError, VectorResult};
pub use models::EmbeddingVector;
