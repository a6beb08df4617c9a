use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::EmbeddingVector;

pub const DEFAULT_EMBEDDING_SERVICE_URL: &str =
    "https://vector-embedding.nevilramani20.workers.dev/";

const BODY_PREVIEW_LEN: usize = 200;

/// Embedding worker configuration
#[derive(Clone)]
pub struct EmbeddingServiceConfig {
    pub url: String,
    pub secret_key: String,
    /// Expected vector length; unchecked when `None`
    pub dimension: Option<usize>,
    pub timeout: Duration,
}

impl EmbeddingServiceConfig {
    pub fn new(url: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret_key: secret_key.into(),
            dimension: None,
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl std::fmt::Debug for EmbeddingServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingServiceConfig")
            .field("url", &self.url)
            .field("secret_key", &"<redacted>")
            .field("dimension", &self.dimension)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Environment variables:
/// - `EMBEDDING_SECRET_KEY` (required)
/// - `EMBEDDING_SERVICE_URL` (defaults to the hosted worker)
/// - `EMBEDDING_DIMENSION` (optional, must be positive)
impl FromEnv for EmbeddingServiceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret_key = env_required("EMBEDDING_SECRET_KEY")?;
        let url = env_or_default("EMBEDDING_SERVICE_URL", DEFAULT_EMBEDDING_SERVICE_URL);

        let dimension = match env_optional("EMBEDDING_DIMENSION") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::ParseError {
                        key: "EMBEDDING_DIMENSION".to_string(),
                        details: format!("expected a positive integer, got '{}'", raw),
                    });
                }
                Ok(dimension) => Some(dimension),
            },
            None => None,
        };

        Ok(Self {
            dimension,
            ..Self::new(url, secret_key)
        })
    }
}

/// Client for the hosted text-embedding worker.
///
/// POSTs `{"text": ...}` with a bearer key and expects
/// `{"embedding": {"data": [..]}}` or `{"embedding": [..]}` back.
pub struct HttpEmbeddingProvider {
    client: Client,
    config: EmbeddingServiceConfig,
}

impl HttpEmbeddingProvider {
    pub fn new(config: EmbeddingServiceConfig) -> VectorResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn with_client(client: Client, config: EmbeddingServiceConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingPayload,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbeddingPayload {
    Wrapped { data: Vec<f64> },
    Flat(Vec<f64>),
}

impl EmbeddingPayload {
    fn into_values(self) -> Vec<f64> {
        match self {
            EmbeddingPayload::Wrapped { data } => data,
            EmbeddingPayload::Flat(values) => values,
        }
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed(&self, text: &str) -> VectorResult<EmbeddingVector> {
        if text.trim().is_empty() {
            return Err(VectorError::Validation(
                "embedding text must not be empty".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.secret_key)
            .json(&EmbedRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(VectorError::Embedding(format!(
                "embedding service returned {}: {}",
                status,
                preview(&body)
            )));
        }

        let parsed: EmbedResponse = serde_json::from_str(&body).map_err(|e| {
            VectorError::MalformedPayload(format!("{} (body: {})", e, preview(&body)))
        })?;

        let values: Vec<f32> = parsed
            .embedding
            .into_values()
            .into_iter()
            .map(|v| v as f32)
            .collect();
        let vector = EmbeddingVector::new(values)
            .map_err(|e| VectorError::MalformedPayload(e.to_string()))?;

        if let Some(expected) = self.config.dimension {
            vector.ensure_dimension(expected)?;
        }

        debug!(dimension = vector.dimension(), "Embedding generated");
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    async fn provider_for(server: &mockito::ServerGuard) -> HttpEmbeddingProvider {
        let config = EmbeddingServiceConfig::new(format!("{}/", server.url()), "worker-secret");
        HttpEmbeddingProvider::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_embed_parses_worker_shape_and_sends_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer worker-secret")
            .match_body(Matcher::Json(json!({"text": "soft breathable cotton"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"embedding":{"data":[0.1,0.2,-0.3]}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server).await;
        let vector = provider.embed("soft breathable cotton").await.unwrap();

        assert_eq!(vector.dimension(), 3);
        assert!((vector.as_slice()[2] + 0.3).abs() < 1e-6);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_accepts_flat_array() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"embedding":[1.0,2.0]}"#)
            .create_async()
            .await;

        let provider = provider_for(&server).await;
        let vector = provider.embed("cushioned").await.unwrap();
        assert_eq!(vector.as_slice(), &[1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_embed_server_error_carries_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(500)
            .with_body("worker exploded")
            .create_async()
            .await;

        let provider = provider_for(&server).await;
        let err = provider.embed("cozy").await.unwrap_err();

        match err {
            VectorError::Embedding(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("worker exploded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_embed_invalid_json_is_malformed_payload() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let provider = provider_for(&server).await;
        let err = provider.embed("cozy").await.unwrap_err();
        assert!(matches!(err, VectorError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_embed_empty_vector_is_malformed_payload() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"embedding":{"data":[]}}"#)
            .create_async()
            .await;

        let provider = provider_for(&server).await;
        assert!(matches!(
            provider.embed("cozy").await,
            Err(VectorError::MalformedPayload(_))
        ));
    }

    #[tokio::test]
    async fn test_embed_rejects_empty_text_without_calling_service() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", "/").expect(0).create_async().await;

        let provider = provider_for(&server).await;
        let err = provider.embed("   ").await.unwrap_err();

        assert!(matches!(err, VectorError::Validation(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_checks_configured_dimension() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"embedding":{"data":[0.1,0.2]}}"#)
            .create_async()
            .await;

        let config =
            EmbeddingServiceConfig::new(format!("{}/", server.url()), "k").with_dimension(768);
        let provider = HttpEmbeddingProvider::new(config).unwrap();

        assert!(matches!(
            provider.embed("warm").await,
            Err(VectorError::DimensionMismatch {
                expected: 768,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_config_from_env_defaults() {
        temp_env::with_vars(
            [
                ("EMBEDDING_SECRET_KEY", Some("s3cret")),
                ("EMBEDDING_SERVICE_URL", None),
                ("EMBEDDING_DIMENSION", None),
            ],
            || {
                let config = EmbeddingServiceConfig::from_env().unwrap();
                assert_eq!(config.url, DEFAULT_EMBEDDING_SERVICE_URL);
                assert_eq!(config.secret_key, "s3cret");
                assert!(config.dimension.is_none());
                assert!(!format!("{:?}", config).contains("s3cret"));
            },
        );
    }

    #[test]
    fn test_config_from_env_requires_secret() {
        temp_env::with_var_unset("EMBEDDING_SECRET_KEY", || {
            let err = EmbeddingServiceConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("EMBEDDING_SECRET_KEY"));
        });
    }

    #[test]
    fn test_config_from_env_rejects_zero_dimension() {
        temp_env::with_vars(
            [
                ("EMBEDDING_SECRET_KEY", Some("s3cret")),
                ("EMBEDDING_DIMENSION", Some("0")),
            ],
            || {
                assert!(matches!(
                    EmbeddingServiceConfig::from_env(),
                    Err(ConfigError::ParseError { .. })
                ));
            },
        );
    }
}
