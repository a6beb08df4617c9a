//! Shopping assistant agent
//!
//! The orchestrator runs the model/tool loop; tools bridge into the product
//! search pipeline.

mod orchestrator;
pub mod prompts;
mod tools;

pub use orchestrator::{
    ChatStream, ConversationOrchestrator, MAX_TOOL_STEPS, OrchestratorConfig,
    REQUEST_TIMEOUT_SECS, ensure_system_message, to_chat_messages,
};
pub use tools::{AssistantTool, HYBRID_QUERY_TOOL, HybridQueryTool, ToolRegistry};
