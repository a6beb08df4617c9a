use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{ProductRow, SqlParam};

/// Read-only access to the product catalog.
///
/// Implementations run an already-validated statement and shape each row.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn query(&self, sql: &str, params: Vec<SqlParam>) -> ProductResult<Vec<ProductRow>>;
}
