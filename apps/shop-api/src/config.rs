//! Configuration for the Shop API

use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use database::libsql::LibsqlConfig;
use domain_assistant::{LlmConfig, OrchestratorConfig, PlannerConfig};
use domain_vector::EmbeddingServiceConfig;

pub use core_config::Environment;

/// Application configuration
///
/// Loaded once at startup; any missing required variable aborts the process.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: LibsqlConfig,
    pub embedding: EmbeddingServiceConfig,
    pub llm: LlmConfig,
    pub planner: PlannerConfig,
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?;
        let database = LibsqlConfig::from_env()?;
        let embedding = EmbeddingServiceConfig::from_env()?;
        let llm = LlmConfig::from_env()?;
        let planner = PlannerConfig::from_env()?;
        let orchestrator =
            OrchestratorConfig::from_env()?.with_request_timeout(server.request_timeout);

        Ok(Self {
            app: app_info!(),
            environment,
            server,
            database,
            embedding,
            llm,
            planner,
            orchestrator,
        })
    }
}
