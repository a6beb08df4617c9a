use domain_products::{HybridQueryExecutor, LibsqlProductStore, ProductError, QueryPlan};
use domain_vector::EmbeddingVector;
use serde_json::json;
use std::sync::Arc;
use test_utils::{CATALOG_DIMENSION, TestCatalog, TestDataBuilder};

async fn executor() -> (TestCatalog, HybridQueryExecutor) {
    let catalog = TestCatalog::seeded().await;
    let store = LibsqlProductStore::new(catalog.database());
    let executor =
        HybridQueryExecutor::new(Arc::new(store)).with_index_dimension(CATALOG_DIMENSION);
    (catalog, executor)
}

#[tokio::test]
async fn test_beauty_discount_ratio_filter() {
    let (_catalog, executor) = executor().await;
    let plan = QueryPlan::new(
        "SELECT * FROM products WHERE root_category_name = 'Beauty' \
         AND (initial_price - discounted_price) > 0.1 * initial_price \
         ORDER BY id LIMIT 10",
        "",
        10,
    );

    let rows = executor.execute(&plan, None).await.unwrap();

    let ids: Vec<_> = rows.iter().map(|r| r.get("id").cloned()).collect();
    assert_eq!(ids, vec![Some(json!(1)), Some(json!(3))]);
    for row in &rows {
        assert_eq!(row.get("root_category_name"), Some(&json!("Beauty")));
        assert!(row.get("sizes").is_some_and(|v| v.is_array()));
        assert_eq!(row.get("other_attributes"), Some(&json!("not json")));
        assert!(row.get("embeddings").is_none());
    }
}

#[tokio::test]
async fn test_comfortable_footwear_vector_search() {
    let (_catalog, executor) = executor().await;
    let plan = QueryPlan::new(
        "SELECT * FROM vector_top_k('product_idx', 'embeddings') \
         JOIN products ON products.rowid = id WHERE root_category_name = 'Shoes'",
        "comfortable cushioned footwear",
        5,
    );
    let comfort = EmbeddingVector::new(vec![1.0, 0.0, 0.0, 0.0]).unwrap();

    let rows = executor.execute(&plan, Some(&comfort)).await.unwrap();

    assert!(!rows.is_empty());
    assert_eq!(rows[0].get("id"), Some(&json!(4)));
    assert!(
        rows.iter()
            .all(|r| r.get("root_category_name") == Some(&json!("Shoes")))
    );
    assert!(rows.len() <= 5);
}

fn query_vector(test_name: &str) -> EmbeddingVector {
    EmbeddingVector::new(TestDataBuilder::from_test_name(test_name).embedding(CATALOG_DIMENSION))
        .unwrap()
}

#[tokio::test]
async fn test_filter_in_join_condition_still_applies() {
    let (_catalog, executor) = executor().await;
    let plan = QueryPlan::new(
        "SELECT * FROM vector_top_k('product_idx', 'embeddings') \
         JOIN products ON products.rowid = id AND root_category_name = 'Beauty' LIMIT 10",
        "gentle hydrating",
        10,
    );

    let rows = executor
        .execute(&plan, Some(&query_vector("join_condition_filter")))
        .await
        .unwrap();

    let mut ids: Vec<_> = rows.iter().filter_map(|r| r.get("id")?.as_i64()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(
        rows.iter()
            .all(|r| r.get("root_category_name") == Some(&json!("Beauty")))
    );
}

#[tokio::test]
async fn test_unqualified_id_in_vector_filters() {
    let (_catalog, executor) = executor().await;
    let plan = QueryPlan::new(
        "SELECT * FROM vector_top_k('product_idx', 'embeddings') \
         JOIN products ON products.rowid = id WHERE id > 2 ORDER BY id",
        "anything at all",
        10,
    );

    let rows = executor
        .execute(&plan, Some(&query_vector("unqualified_id")))
        .await
        .unwrap();

    let ids: Vec<_> = rows.iter().filter_map(|r| r.get("id")?.as_i64()).collect();
    assert_eq!(ids, vec![3, 4, 5, 6, 7, 8]);
}

#[tokio::test]
async fn test_unknown_column_is_store_execution_error() {
    let (_catalog, executor) = executor().await;
    let plan = QueryPlan::new("SELECT * FROM products WHERE discount > 5", "", 5);

    let err = executor.execute(&plan, None).await.unwrap_err();

    match err {
        ProductError::StoreExecution(msg) => assert!(msg.contains("discount")),
        other => panic!("unexpected error: {other:?}"),
    }
}
