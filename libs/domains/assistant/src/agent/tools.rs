//! Tools the assistant model may call
//!
//! Tool failures never end the conversation: they come back to the model as
//! a plain-text result.

use async_trait::async_trait;
use domain_products::{HybridQueryExecutor, ProductRow};
use domain_vector::EmbeddingProvider;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::ToolError;
use crate::llm::ToolSpec;
use crate::planner::QueryPlanner;

pub const HYBRID_QUERY_TOOL: &str = "getHybridQuery";

/// Trait for tools that can be executed by the assistant
#[async_trait]
pub trait AssistantTool: Send + Sync {
    fn name(&self) -> &str;

    /// Description for the model to understand when to use this tool
    fn description(&self) -> &str;

    /// JSON schema for the tool's input parameters
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Failures are returned as a JSON string value.
    async fn execute(&self, arguments: Value) -> Value;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HybridQueryInput {
    product_request: String,
}

/// Product search: synthesis, then embedding when needed, then execution.
pub struct HybridQueryTool {
    planner: Arc<dyn QueryPlanner>,
    embeddings: Arc<dyn EmbeddingProvider>,
    executor: HybridQueryExecutor,
}

impl HybridQueryTool {
    pub fn new(
        planner: Arc<dyn QueryPlanner>,
        embeddings: Arc<dyn EmbeddingProvider>,
        executor: HybridQueryExecutor,
    ) -> Self {
        Self {
            planner,
            embeddings,
            executor,
        }
    }

    #[instrument(skip(self), fields(request_len = product_request.len()))]
    pub async fn search(&self, product_request: &str) -> Result<Vec<ProductRow>, ToolError> {
        let plan = self.planner.plan(product_request).await?;

        let embedding = if plan.is_semantic() {
            Some(self.embeddings.embed(&plan.embedding_text).await?)
        } else {
            None
        };

        let rows = self.executor.execute(&plan, embedding.as_ref()).await?;
        info!(
            rows = rows.len(),
            semantic = plan.is_semantic(),
            "Product search completed"
        );
        Ok(rows)
    }

    fn parse_arguments(arguments: Value) -> Result<String, ToolError> {
        let input: HybridQueryInput = match arguments {
            Value::String(raw) => serde_json::from_str(&raw),
            other => serde_json::from_value(other),
        }
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let request = input.product_request.trim();
        if request.is_empty() {
            return Err(ToolError::InvalidArguments(
                "productRequest must not be empty".to_string(),
            ));
        }
        Ok(request.to_string())
    }
}

#[async_trait]
impl AssistantTool for HybridQueryTool {
    fn name(&self) -> &str {
        HYBRID_QUERY_TOOL
    }

    fn description(&self) -> &str {
        "Get a hybrid SQL query from a user's product request."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "productRequest": {
                    "type": "string",
                    "description": "The user's request for a product query."
                }
            },
            "required": ["productRequest"]
        })
    }

    async fn execute(&self, arguments: Value) -> Value {
        let result = match Self::parse_arguments(arguments) {
            Ok(request) => self.search(&request).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(rows) => Value::Array(rows.into_iter().map(|row| Value::Object(row.0)).collect()),
            Err(err) => {
                warn!(error = %err, "Product search failed");
                Value::String(err.to_string())
            }
        }
    }
}

/// Tools offered to the model, looked up by name
pub struct ToolRegistry {
    tools: Vec<Box<dyn AssistantTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register<T: AssistantTool + 'static>(&mut self, tool: T) {
        self.tools.push(Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn AssistantTool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|t| ToolSpec {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> Value {
        match self.get(name) {
            Some(tool) => tool.execute(arguments).await,
            None => Value::String(format!("Unknown tool: {}", name)),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthesisError;
    use crate::planner::MockQueryPlanner;
    use domain_products::{ProductError, ProductResult, ProductStore, QueryPlan, SqlParam};
    use domain_vector::{EmbeddingVector, VectorError, VectorResult};
    use serde_json::Map;

    mockall::mock! {
        Embeddings {}
        #[async_trait]
        impl EmbeddingProvider for Embeddings {
            async fn embed(&self, text: &str) -> VectorResult<EmbeddingVector>;
        }
    }

    mockall::mock! {
        Store {}
        #[async_trait]
        impl ProductStore for Store {
            async fn query(&self, sql: &str, params: Vec<SqlParam>) -> ProductResult<Vec<ProductRow>>;
        }
    }

    const SHOES_SQL: &str = "SELECT * FROM vector_top_k('product_idx', 'embeddings') \
        JOIN products ON products.rowid = id WHERE root_category_name = 'Shoes' LIMIT 3";

    fn row(id: i64) -> ProductRow {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(id));
        ProductRow(map)
    }

    fn planner_returning(plan: QueryPlan) -> MockQueryPlanner {
        let mut planner = MockQueryPlanner::new();
        planner
            .expect_plan()
            .returning(move |_| Ok(plan.clone()));
        planner
    }

    fn tool(planner: MockQueryPlanner, embeddings: MockEmbeddings, store: MockStore) -> HybridQueryTool {
        HybridQueryTool::new(
            Arc::new(planner),
            Arc::new(embeddings),
            HybridQueryExecutor::new(Arc::new(store)),
        )
    }

    #[tokio::test]
    async fn test_plain_plan_skips_embedding() {
        let planner = planner_returning(QueryPlan::new("SELECT * FROM products LIMIT 2", "", 2));
        let mut embeddings = MockEmbeddings::new();
        embeddings.expect_embed().never();
        let mut store = MockStore::new();
        store
            .expect_query()
            .returning(|_, _| Ok(vec![row(1), row(3)]));

        let result = tool(planner, embeddings, store)
            .execute(json!({"productRequest": "discounted beauty"}))
            .await;

        assert_eq!(result, json!([{"id": 1}, {"id": 3}]));
    }

    #[tokio::test]
    async fn test_semantic_plan_embeds_phrase() {
        let planner = planner_returning(QueryPlan::new(SHOES_SQL, "cushioned comfort", 3));
        let mut embeddings = MockEmbeddings::new();
        embeddings
            .expect_embed()
            .withf(|text| text == "cushioned comfort")
            .times(1)
            .returning(|_| Ok(EmbeddingVector::new(vec![1.0, 0.0, 0.0, 0.0]).unwrap()));
        let mut store = MockStore::new();
        store
            .expect_query()
            .withf(|sql, params| sql.contains("vector32(?1)") && params.len() == 2)
            .returning(|_, _| Ok(vec![row(4)]));

        let result = tool(planner, embeddings, store)
            .execute(json!({"productRequest": "comfortable footwear"}))
            .await;

        assert_eq!(result, json!([{"id": 4}]));
    }

    #[tokio::test]
    async fn test_embedding_failure_becomes_text() {
        let planner = planner_returning(QueryPlan::new(SHOES_SQL, "cozy", 3));
        let mut embeddings = MockEmbeddings::new();
        embeddings.expect_embed().returning(|_| {
            Err(VectorError::Embedding(
                "embedding service returned 500 Internal Server Error: boom".to_string(),
            ))
        });
        let mut store = MockStore::new();
        store.expect_query().never();

        let result = tool(planner, embeddings, store)
            .execute(json!({"productRequest": "cozy slippers"}))
            .await;

        let text = result.as_str().unwrap();
        assert!(text.starts_with("Embedding service error:"));
        assert!(text.contains("500"));
    }

    #[tokio::test]
    async fn test_store_failure_becomes_text() {
        let planner = planner_returning(QueryPlan::new("SELECT * FROM products WHERE discount > 1", "", 5));
        let mut store = MockStore::new();
        store.expect_query().returning(|_, _| {
            Err(ProductError::StoreExecution("no such column: discount".to_string()))
        });

        let result = tool(planner, MockEmbeddings::new(), store)
            .execute(json!({"productRequest": "big discounts"}))
            .await;

        assert_eq!(result, json!("Database query error: no such column: discount"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_becomes_text() {
        let mut planner = MockQueryPlanner::new();
        planner.expect_plan().returning(|_| {
            Err(SynthesisError::Endpoint {
                status: 500,
                body: "{\"error\":\"Internal Server Error\"}".to_string(),
            })
        });

        let result = tool(planner, MockEmbeddings::new(), MockStore::new())
            .execute(json!({"productRequest": "anything"}))
            .await;

        assert!(result.as_str().unwrap().starts_with("Query synthesis error:"));
    }

    #[tokio::test]
    async fn test_invalid_arguments_become_text() {
        let mut planner = MockQueryPlanner::new();
        planner.expect_plan().never();
        let tool = tool(planner, MockEmbeddings::new(), MockStore::new());

        for args in [json!({"query": "shoes"}), json!(""), json!({"productRequest": "  "})] {
            let result = tool.execute(args).await;
            assert!(result.as_str().unwrap().starts_with("Invalid tool arguments"));
        }
    }

    #[tokio::test]
    async fn test_stringified_arguments_are_accepted() {
        let mut planner = MockQueryPlanner::new();
        planner
            .expect_plan()
            .withf(|request| request == "gold pendant")
            .returning(|_| Ok(QueryPlan::new("SELECT * FROM products LIMIT 1", "", 1)));
        let mut store = MockStore::new();
        store.expect_query().returning(|_, _| Ok(vec![row(7)]));

        let result = tool(planner, MockEmbeddings::new(), store)
            .execute(Value::String(r#"{"productRequest": "gold pendant"}"#.to_string()))
            .await;
        assert_eq!(result, json!([{"id": 7}]));
    }

    #[tokio::test]
    async fn test_registry_lists_specs_and_rejects_unknown_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(tool(MockQueryPlanner::new(), MockEmbeddings::new(), MockStore::new()));

        let specs = registry.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, HYBRID_QUERY_TOOL);
        assert_eq!(specs[0].parameters["required"], json!(["productRequest"]));

        let result = registry.execute("checkout", json!({})).await;
        assert_eq!(result, json!("Unknown tool: checkout"));
    }
}
