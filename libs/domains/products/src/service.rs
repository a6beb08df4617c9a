//! Hybrid Query Executor - turns a validated plan into catalog rows

use domain_vector::EmbeddingVector;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::{ProductError, ProductResult};
use crate::models::{PRODUCT_COLUMNS, ProductRow, QueryPlan, SqlParam};
use crate::repository::ProductStore;
use crate::statement::{self, StatementKind};

/// Name of the libSQL vector index over `products.embeddings`.
pub const VECTOR_INDEX: &str = "product_idx";

/// Statement and parameters ready for the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

/// Executes query plans against a [`ProductStore`].
///
/// Attribute-only plans run as written once they pass the read-only guard.
/// Semantic plans are rebuilt around a parameterized `vector_top_k` call so
/// the model never supplies the vector itself; only the extra `ON` conjuncts
/// and the filter tail of its statement are kept, with bare `id` references
/// pinned to `products`.
pub struct HybridQueryExecutor {
    store: Arc<dyn ProductStore>,
    index_dimension: Option<usize>,
}

impl Clone for HybridQueryExecutor {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            index_dimension: self.index_dimension,
        }
    }
}

impl HybridQueryExecutor {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self {
            store,
            index_dimension: None,
        }
    }

    /// Reject embeddings whose length differs from the index.
    pub fn with_index_dimension(mut self, dimension: usize) -> Self {
        self.index_dimension = Some(dimension);
        self
    }

    /// Run `plan`, returning at most `plan.limit` rows in store order.
    #[instrument(
        skip(self, plan, embedding),
        fields(semantic = plan.is_semantic(), limit = plan.limit)
    )]
    pub async fn execute(
        &self,
        plan: &QueryPlan,
        embedding: Option<&EmbeddingVector>,
    ) -> ProductResult<Vec<ProductRow>> {
        let prepared = self.prepare(plan, embedding)?;
        debug!(sql = %prepared.sql, "Executing product query");

        let mut rows = self.store.query(&prepared.sql, prepared.params).await?;
        rows.truncate(plan.limit as usize);
        Ok(rows)
    }

    /// Validate `plan` and build the statement that [`execute`](Self::execute) runs.
    pub fn prepare(
        &self,
        plan: &QueryPlan,
        embedding: Option<&EmbeddingVector>,
    ) -> ProductResult<PreparedQuery> {
        if !plan.is_semantic() {
            statement::guard(&plan.query, StatementKind::Plain)?;
            return Ok(PreparedQuery {
                sql: plan.query.trim().to_string(),
                params: Vec::new(),
            });
        }

        let embedding = embedding.ok_or(ProductError::MissingEmbedding)?;
        if let Some(expected) = self.index_dimension {
            embedding
                .ensure_dimension(expected)
                .map_err(|e| ProductError::InvalidEmbedding(e.to_string()))?;
        }
        if embedding.as_slice().iter().any(|v| !v.is_finite()) {
            return Err(ProductError::InvalidEmbedding(
                "vector has non-finite components".to_string(),
            ));
        }

        statement::guard(&plan.query, StatementKind::VectorSearch)?;
        let tail = statement::join_tail(&plan.query)?;
        let table = tail.alias.unwrap_or("products");

        let columns = PRODUCT_COLUMNS
            .iter()
            .map(|column| format!("{}.{}", table, column))
            .collect::<Vec<_>>()
            .join(", ");
        let join = match tail.alias {
            Some(alias) => format!("JOIN products AS {}", alias),
            None => "JOIN products".to_string(),
        };

        let mut sql = format!(
            "SELECT {columns} FROM vector_top_k('{VECTOR_INDEX}', vector32(?1), ?2) AS top \
             {join} ON {table}.rowid = top.id"
        );
        for condition in &tail.conditions {
            let condition = statement::qualify_bare_ids(condition, table)?;
            sql.push_str(&format!(" AND ({condition})"));
        }
        let filters = statement::qualify_bare_ids(tail.filters, table)?;
        if !filters.is_empty() {
            sql.push(' ');
            sql.push_str(&filters);
        }
        if !statement::has_limit(&filters) {
            sql.push_str(&format!(" LIMIT {}", plan.limit));
        }

        Ok(PreparedQuery {
            sql,
            params: vec![
                SqlParam::Text(embedding.to_literal()),
                SqlParam::Integer(i64::from(plan.limit)),
            ],
        })
    }
}
