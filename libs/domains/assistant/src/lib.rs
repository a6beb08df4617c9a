//! Assistant Domain
//!
//! Conversational product search: the chat loop, query synthesis and the
//! product search tool.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │ ConversationOrchestrator │  ← model/tool loop, SSE events
//! └────────────┬─────────────┘
//!              │ getHybridQuery
//! ┌────────────▼─────────────┐
//! │     HybridQueryTool      │  ← planner → embeddings → executor
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │  QuerySynthesisService   │  ← intent extraction, SQL synthesis
//! └────────────┬─────────────┘
//!              │
//! ┌────────────▼─────────────┐
//! │        ChatModel         │  ← OpenAI-compatible chat completions
//! └──────────────────────────┘
//! ```

pub mod agent;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod models;
pub mod planner;
pub mod synthesis;

pub use agent::{
    AssistantTool, ChatStream, ConversationOrchestrator, HybridQueryTool, OrchestratorConfig,
    ToolRegistry,
};
pub use error::{AssistantError, AssistantResult, SynthesisError, SynthesisResult, ToolError};
pub use handlers::{ApiDoc, AssistantState, router};
pub use llm::{ChatModel, LlmConfig, OpenAiChatModel};
pub use models::{ChatEvent, ChatRequest, FinishReason, Message, Role, ToolInvocation};
pub use planner::{HttpQueryPlanner, PlannerConfig, QueryPlanner};
pub use synthesis::QuerySynthesisService;
