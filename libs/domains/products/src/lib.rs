//! Products Domain
//!
//! Read-only access to the product catalog and the hybrid query executor.
//!
//! ```text
//! ┌────────────────────┐
//! │ HybridQueryExecutor│  ← plan validation, vector statement rebuild
//! └─────────┬──────────┘
//!           │
//! ┌─────────▼──────────┐
//! │   ProductStore     │  ← trait + libSQL implementation
//! └─────────┬──────────┘
//!           │
//! ┌─────────▼──────────┐
//! │      Models        │  ← QueryPlan, ProductRow
//! └────────────────────┘
//! ```
//!
//! ```rust,no_run
//! use domain_products::{HybridQueryExecutor, LibsqlProductStore, QueryPlan};
//! use std::sync::Arc;
//!
//! # async fn example(db: Arc<libsql::Database>) -> Result<(), Box<dyn std::error::Error>> {
//! let executor = HybridQueryExecutor::new(Arc::new(LibsqlProductStore::new(db)));
//! let plan = QueryPlan::new("SELECT * FROM products WHERE rating > 4 LIMIT 5", "", 5);
//! let rows = executor.execute(&plan, None).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod statement;
pub mod store;

pub use error::{ProductError, ProductResult};
pub use models::{
    CellValue, DEFAULT_LIMIT, JSON_COLUMNS, MAX_LIMIT, PRODUCT_COLUMNS, ProductRow, QueryPlan,
    SqlParam,
};
pub use repository::ProductStore;
pub use service::{HybridQueryExecutor, PreparedQuery, VECTOR_INDEX};
pub use statement::{StatementError, StatementKind};
pub use store::LibsqlProductStore;
