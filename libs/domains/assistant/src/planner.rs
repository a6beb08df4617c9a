use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_required};
use domain_products::QueryPlan;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{SynthesisError, SynthesisResult};
use crate::models::{ChatRequest, Message};

/// Produces a [`QueryPlan`] for a single product request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueryPlanner: Send + Sync {
    async fn plan(&self, product_request: &str) -> SynthesisResult<QueryPlan>;
}

/// Where the product search tool reaches the synthesis endpoint.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Public base URL of this service, e.g. `http://localhost:8080`
    pub base_url: String,
    pub timeout: Duration,
}

impl PlannerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/hybridquery", self.base_url.trim_end_matches('/'))
    }
}

/// Environment variables:
/// - `BASE_URL` (required)
impl FromEnv for PlannerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(env_required("BASE_URL")?))
    }
}

/// Calls `POST {BASE_URL}/api/hybridquery`.
pub struct HttpQueryPlanner {
    client: Client,
    endpoint: String,
}

impl HttpQueryPlanner {
    pub fn new(config: &PlannerConfig) -> SynthesisResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint(),
        })
    }
}

#[async_trait]
impl QueryPlanner for HttpQueryPlanner {
    #[instrument(skip(self, product_request), fields(endpoint = %self.endpoint))]
    async fn plan(&self, product_request: &str) -> SynthesisResult<QueryPlan> {
        let body = ChatRequest {
            messages: vec![Message::user(product_request)],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(SynthesisError::Endpoint {
                status: status.as_u16(),
                body: text,
            });
        }

        let plan: QueryPlan = serde_json::from_str(&text).map_err(|e| SynthesisError::Format {
            reason: e.to_string(),
            raw: text,
        })?;
        debug!(semantic = plan.is_semantic(), limit = plan.limit, "Received query plan");
        Ok(plan)
    }
}
