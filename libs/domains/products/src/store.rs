//! libSQL-backed [`ProductStore`].

use async_trait::async_trait;
use libsql::{Database, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::error::ProductResult;
use crate::models::{CellValue, ProductRow, SqlParam};
use crate::repository::ProductStore;

pub struct LibsqlProductStore {
    db: Arc<Database>,
}

impl LibsqlProductStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl From<SqlParam> for Value {
    fn from(param: SqlParam) -> Self {
        match param {
            SqlParam::Integer(i) => Value::Integer(i),
            SqlParam::Text(s) => Value::Text(s),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Integer(i) => CellValue::Integer(i),
            Value::Real(f) => CellValue::Real(f),
            Value::Text(s) => CellValue::Text(s),
            Value::Blob(b) => CellValue::Blob(b),
        }
    }
}

#[async_trait]
impl ProductStore for LibsqlProductStore {
    #[instrument(skip(self, sql, params), fields(params = params.len()))]
    async fn query(&self, sql: &str, params: Vec<SqlParam>) -> ProductResult<Vec<ProductRow>> {
        let conn = self.db.connect()?;
        let values: Vec<Value> = params.into_iter().map(Value::from).collect();
        let mut rows = conn.query(sql, libsql::params_from_iter(values)).await?;

        let columns: Vec<String> = (0..rows.column_count())
            .map(|i| rows.column_name(i).unwrap_or_default().to_string())
            .collect();

        let mut products = Vec::new();
        while let Some(row) = rows.next().await? {
            let mut cells = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                cells.push((column.as_str(), CellValue::from(row.get_value(i as i32)?)));
            }
            products.push(ProductRow::from_cells(cells));
        }

        debug!(rows = products.len(), "Product query finished");
        Ok(products)
    }
}
