//! API routes module

pub mod health;

use axum::Router;
use domain_assistant::{
    AssistantState, ChatModel, ConversationOrchestrator, HttpQueryPlanner, HybridQueryTool,
    OpenAiChatModel, QuerySynthesisService, ToolRegistry,
};
use domain_products::{HybridQueryExecutor, LibsqlProductStore};
use domain_vector::HttpEmbeddingProvider;
use std::sync::Arc;
use tracing::info;

use crate::state::AppState;

/// Wire the model, embedding, planner and store clients into the assistant.
pub fn assistant_state(state: &AppState) -> eyre::Result<AssistantState> {
    let config = &state.config;

    let model: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(config.llm.clone())?);
    let synthesis = QuerySynthesisService::new(Arc::clone(&model));
    let planner = HttpQueryPlanner::new(&config.planner)?;
    let embeddings = HttpEmbeddingProvider::new(config.embedding.clone())?;

    let store = LibsqlProductStore::new(Arc::clone(&state.db));
    let executor = match config.embedding.dimension {
        Some(dimension) => HybridQueryExecutor::new(Arc::new(store)).with_index_dimension(dimension),
        None => HybridQueryExecutor::new(Arc::new(store)),
    };

    let mut tools = ToolRegistry::new();
    tools.register(HybridQueryTool::new(
        Arc::new(planner),
        Arc::new(embeddings),
        executor,
    ));

    info!(
        model = %config.llm.model,
        planner = %config.planner.endpoint(),
        max_steps = config.orchestrator.max_steps,
        "Assistant configured"
    );

    let orchestrator = ConversationOrchestrator::new(model, tools, config.orchestrator.clone());
    Ok(AssistantState::new(orchestrator, synthesis)
        .with_request_timeout(config.server.request_timeout))
}

/// Create all API routes (nested under `/api` by the app router)
pub fn routes(state: &AppState) -> eyre::Result<Router> {
    Ok(domain_assistant::router(assistant_state(state)?))
}
