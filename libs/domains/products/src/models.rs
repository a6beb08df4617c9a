use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Result limit used when the plan omits one or gives a non-positive value.
pub const DEFAULT_LIMIT: u32 = 10;

/// Upper bound on rows returned for a single plan.
pub const MAX_LIMIT: u32 = 100;

/// Columns of `products` returned to callers, in output order.
pub const PRODUCT_COLUMNS: [&str; 18] = [
    "id",
    "brand",
    "review_count",
    "description",
    "product_name",
    "category_name",
    "root_category_name",
    "main_image",
    "rating",
    "initial_price",
    "discounted_price",
    "specifications",
    "image_urls",
    "rating_stars",
    "sizes",
    "colors",
    "other_attributes",
    "categories",
];

/// Columns stored as JSON-encoded text.
pub const JSON_COLUMNS: [&str; 7] = [
    "specifications",
    "image_urls",
    "rating_stars",
    "sizes",
    "colors",
    "other_attributes",
    "categories",
];

/// A retrieval plan produced by query synthesis.
///
/// `embedding_text` empty means attribute filters only; otherwise the query
/// is a vector search and needs an embedding of that text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(from = "RawQueryPlan")]
pub struct QueryPlan {
    /// SQL statement written by the model
    pub query: String,
    /// Qualitative phrase to embed, `""` for attribute-only requests
    pub embedding_text: String,
    /// Maximum number of rows, always at least 1
    #[schema(minimum = 1, maximum = 100, default = 10)]
    pub limit: u32,
}

impl QueryPlan {
    pub fn new(query: impl Into<String>, embedding_text: impl Into<String>, limit: u32) -> Self {
        Self {
            query: query.into(),
            embedding_text: embedding_text.into(),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Whether this plan needs a vector search.
    pub fn is_semantic(&self) -> bool {
        !self.embedding_text.trim().is_empty()
    }
}

#[derive(Deserialize)]
struct RawQueryPlan {
    query: String,
    #[serde(default)]
    embedding_text: Option<String>,
    #[serde(default)]
    limit: Option<Value>,
}

impl From<RawQueryPlan> for QueryPlan {
    fn from(raw: RawQueryPlan) -> Self {
        Self {
            query: raw.query,
            embedding_text: raw.embedding_text.unwrap_or_default(),
            limit: normalize_limit(raw.limit.as_ref()),
        }
    }
}

/// Positive integers (or integral strings) pass through, capped at [`MAX_LIMIT`];
/// anything else falls back to [`DEFAULT_LIMIT`].
pub fn normalize_limit(raw: Option<&Value>) -> u32 {
    let parsed = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() && n >= 1.0 => (n.floor().min(MAX_LIMIT as f64)) as u32,
        _ => DEFAULT_LIMIT,
    }
}

/// Bound parameter for a product query.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Integer(i64),
    Text(String),
}

/// Store-native cell value before JSON shaping.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// One result row as a column-name → JSON mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductRow(pub Map<String, Value>);

impl ProductRow {
    /// Build a row from store cells.
    ///
    /// JSON-typed columns are decoded when their text parses; blob cells
    /// (the embedding column) are skipped.
    pub fn from_cells<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = (S, CellValue)>,
        S: Into<String>,
    {
        let mut map = Map::new();
        for (column, cell) in cells {
            let column = column.into();
            let value = match cell {
                CellValue::Blob(_) => continue,
                CellValue::Null => Value::Null,
                CellValue::Integer(i) => Value::from(i),
                CellValue::Real(f) => serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                CellValue::Text(text) if JSON_COLUMNS.contains(&column.as_str()) => {
                    serde_json::from_str(&text).unwrap_or(Value::String(text))
                }
                CellValue::Text(text) => Value::String(text),
            };
            map.insert(column, value);
        }
        Self(map)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plan_defaults_limit_when_absent_or_non_positive() {
        let plan: QueryPlan = serde_json::from_value(json!({"query": "SELECT 1"})).unwrap();
        assert_eq!(plan.limit, DEFAULT_LIMIT);
        assert_eq!(plan.embedding_text, "");

        for bad in [json!(0), json!(-3), json!(null), json!("many"), json!(0.5)] {
            let plan: QueryPlan =
                serde_json::from_value(json!({"query": "SELECT 1", "limit": bad})).unwrap();
            assert_eq!(plan.limit, DEFAULT_LIMIT);
        }
    }

    #[test]
    fn test_plan_keeps_positive_limit_and_caps_it() {
        let plan: QueryPlan =
            serde_json::from_value(json!({"query": "q", "embedding_text": "cozy", "limit": 5}))
                .unwrap();
        assert_eq!(plan.limit, 5);
        assert!(plan.is_semantic());

        let plan: QueryPlan =
            serde_json::from_value(json!({"query": "q", "limit": "7"})).unwrap();
        assert_eq!(plan.limit, 7);

        let plan: QueryPlan =
            serde_json::from_value(json!({"query": "q", "limit": 5000})).unwrap();
        assert_eq!(plan.limit, MAX_LIMIT);
    }

    #[test]
    fn test_plan_whitespace_embedding_text_is_not_semantic() {
        assert!(!QueryPlan::new("SELECT 1", "  ", 3).is_semantic());
        assert_eq!(QueryPlan::new("SELECT 1", "", 0).limit, 1);
    }

    #[test]
    fn test_plan_serializes_wire_shape() {
        let plan = QueryPlan::new("SELECT * FROM products LIMIT 3", "", 3);
        assert_eq!(
            serde_json::to_value(&plan).unwrap(),
            json!({"query": "SELECT * FROM products LIMIT 3", "embedding_text": "", "limit": 3})
        );
    }

    #[test]
    fn test_row_decodes_json_columns_and_drops_blobs() {
        let row = ProductRow::from_cells([
            ("id", CellValue::Integer(4)),
            ("rating", CellValue::Real(4.7)),
            ("sizes", CellValue::Text(r#"["8","9"]"#.to_string())),
            ("other_attributes", CellValue::Text("not json".to_string())),
            ("description", CellValue::Text("[not decoded]".to_string())),
            ("brand", CellValue::Null),
            ("embeddings", CellValue::Blob(vec![0, 0, 128, 63])),
        ]);

        assert_eq!(row.get("id"), Some(&json!(4)));
        assert_eq!(row.get("sizes"), Some(&json!(["8", "9"])));
        assert_eq!(row.get("other_attributes"), Some(&json!("not json")));
        assert_eq!(row.get("description"), Some(&json!("[not decoded]")));
        assert_eq!(row.get("brand"), Some(&Value::Null));
        assert!(row.get("embeddings").is_none());
    }
}
