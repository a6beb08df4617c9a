//! Shared test utilities for domain testing
//!
//! - `TestCatalog`: temporary libSQL product catalog with schema, vector index and seed rows
//! - `TestDataBuilder`: deterministic query vectors for the catalog index
//!
//! ```rust,no_run
//! use test_utils::TestCatalog;
//!
//! #[tokio::test]
//! async fn my_store_test() {
//!     let catalog = TestCatalog::seeded().await;
//!     let store = domain_products::LibsqlProductStore::new(catalog.database());
//! }
//! ```

mod catalog;

pub use catalog::{CATALOG_DIMENSION, SeedProduct, TestCatalog, seed_products};

/// Builder for test data with deterministic randomization
///
/// Tests stay reproducible because every value derives from the seed.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_vector_search");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic unit-length embedding of `dimension` components
    pub fn embedding(&self, dimension: usize) -> Vec<f32> {
        let mut state = self.seed | 1;
        let raw: Vec<f32> = (0..dimension)
            .map(|_| {
                // xorshift64
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state % 1000) as f32 / 1000.0 + 0.001
            })
            .collect();
        let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
        raw.into_iter().map(|v| v / norm).collect()
    }
}
