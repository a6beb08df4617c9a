//! Temporary libSQL product catalog
//!
//! Each `TestCatalog` owns a fresh database file in a temp directory, so
//! every connection opened from its handle sees the same data. The directory
//! is removed on drop.

use libsql::{Builder, Database, params};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

/// Dimension of the `embeddings` column in the test schema
pub const CATALOG_DIMENSION: usize = 4;

const SCHEMA: &str = "
CREATE TABLE products (
    id INTEGER PRIMARY KEY,
    brand TEXT,
    review_count INTEGER,
    description TEXT,
    product_name TEXT NOT NULL,
    category_name TEXT,
    root_category_name TEXT,
    main_image TEXT,
    rating REAL,
    initial_price REAL,
    discounted_price REAL,
    specifications TEXT,
    image_urls TEXT,
    rating_stars TEXT,
    sizes TEXT,
    colors TEXT,
    other_attributes TEXT,
    categories TEXT,
    embeddings F32_BLOB(4)
);
CREATE INDEX product_idx ON products (libsql_vector_idx(embeddings));
";

/// One catalog row; JSON-typed columns are stored as encoded text.
#[derive(Debug, Clone)]
pub struct SeedProduct {
    pub id: i64,
    pub brand: &'static str,
    pub product_name: &'static str,
    pub description: &'static str,
    pub category_name: &'static str,
    pub root_category_name: &'static str,
    pub rating: f64,
    pub review_count: i64,
    pub initial_price: f64,
    pub discounted_price: f64,
    pub sizes: serde_json::Value,
    pub colors: serde_json::Value,
    pub embedding: [f32; CATALOG_DIMENSION],
}

impl SeedProduct {
    fn embedding_literal(&self) -> String {
        let parts: Vec<String> = self.embedding.iter().map(|v| v.to_string()).collect();
        format!("[{}]", parts.join(","))
    }
}

/// Realistic seed rows.
///
/// The first embedding axis encodes "comfort/cushioning", the second
/// "formal/structured"; beauty rows carry differing discount ratios.
pub fn seed_products() -> Vec<SeedProduct> {
    vec![
        SeedProduct {
            id: 1,
            brand: "Glowlab",
            product_name: "Hydrating Face Serum",
            description: "Lightweight hyaluronic serum for all-day moisture",
            category_name: "Skin Care",
            root_category_name: "Beauty",
            rating: 4.6,
            review_count: 812,
            initial_price: 40.0,
            discounted_price: 30.0,
            sizes: json!(["30ml", "50ml"]),
            colors: json!([]),
            embedding: [0.2, 0.1, 0.9, 0.1],
        },
        SeedProduct {
            id: 2,
            brand: "Velvet & Co",
            product_name: "Matte Lipstick",
            description: "Long-wear matte finish lipstick",
            category_name: "Makeup",
            root_category_name: "Beauty",
            rating: 4.1,
            review_count: 230,
            initial_price: 20.0,
            discounted_price: 19.0,
            sizes: json!([]),
            colors: json!(["Ruby", "Nude"]),
            embedding: [0.1, 0.3, 0.8, 0.2],
        },
        SeedProduct {
            id: 3,
            brand: "Glowlab",
            product_name: "Vitamin C Night Cream",
            description: "Brightening overnight cream",
            category_name: "Skin Care",
            root_category_name: "Beauty",
            rating: 4.4,
            review_count: 145,
            initial_price: 50.0,
            discounted_price: 42.0,
            sizes: json!(["50ml"]),
            colors: json!([]),
            embedding: [0.2, 0.2, 0.9, 0.0],
        },
        SeedProduct {
            id: 4,
            brand: "CloudStep",
            product_name: "CloudStep Cushioned Running Shoes",
            description: "Plush foam midsole and breathable knit upper for all-day comfort",
            category_name: "Running Shoes",
            root_category_name: "Shoes",
            rating: 4.7,
            review_count: 1920,
            initial_price: 120.0,
            discounted_price: 95.0,
            sizes: json!(["8", "9", "10", "11"]),
            colors: json!(["Black", "Sky"]),
            embedding: [0.95, 0.05, 0.1, 0.2],
        },
        SeedProduct {
            id: 5,
            brand: "Hartwell",
            product_name: "Leather Oxford Dress Shoes",
            description: "Structured calfskin oxford with a stiff leather sole",
            category_name: "Dress Shoes",
            root_category_name: "Shoes",
            rating: 4.2,
            review_count: 310,
            initial_price: 180.0,
            discounted_price: 160.0,
            sizes: json!(["9", "10"]),
            colors: json!(["Brown"]),
            embedding: [0.1, 0.95, 0.05, 0.1],
        },
        SeedProduct {
            id: 6,
            brand: "Nestwise",
            product_name: "Stackable Storage Bins (Set of 4)",
            description: "Space saving fabric bins for small apartments",
            category_name: "Storage",
            root_category_name: "Home",
            rating: 4.5,
            review_count: 640,
            initial_price: 35.0,
            discounted_price: 21.0,
            sizes: json!([]),
            colors: json!(["Grey", "Oat"]),
            embedding: [0.3, 0.2, 0.1, 0.9],
        },
        SeedProduct {
            id: 7,
            brand: "Aurelia",
            product_name: "18k Gold Pendant Necklace",
            description: "Hand-finished solid gold pendant",
            category_name: "Necklaces",
            root_category_name: "Jewelry",
            rating: 4.8,
            review_count: 88,
            initial_price: 900.0,
            discounted_price: 850.0,
            sizes: json!([]),
            colors: json!(["Gold"]),
            embedding: [0.05, 0.6, 0.3, 0.1],
        },
        SeedProduct {
            id: 8,
            brand: "Nestwise",
            product_name: "Ceramic Table Lamp",
            description: "Glazed ceramic base with linen shade",
            category_name: "Home Decor",
            root_category_name: "Home",
            rating: 4.4,
            review_count: 97,
            initial_price: 60.0,
            discounted_price: 45.0,
            sizes: json!([]),
            colors: json!(["White"]),
            embedding: [0.4, 0.3, 0.1, 0.8],
        },
    ]
}

/// Temporary libSQL database with the `products` schema.
pub struct TestCatalog {
    db: Arc<Database>,
    _dir: TempDir,
}

impl TestCatalog {
    /// Empty catalog with schema and vector index.
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir for test catalog");
        let db = Builder::new_local(dir.path().join("catalog.db"))
            .build()
            .await
            .expect("Failed to open test catalog");

        let conn = db.connect().expect("Failed to connect to test catalog");
        conn.execute_batch(SCHEMA)
            .await
            .expect("Failed to create products schema");

        Self {
            db: Arc::new(db),
            _dir: dir,
        }
    }

    /// Catalog populated with [`seed_products`].
    pub async fn seeded() -> Self {
        let catalog = Self::new().await;
        for product in seed_products() {
            catalog.insert(&product).await;
        }
        tracing::debug!("Test catalog seeded");
        catalog
    }

    pub async fn insert(&self, product: &SeedProduct) {
        let conn = self.db.connect().expect("Failed to connect to test catalog");
        let specifications = json!({"brand": product.brand}).to_string();
        let image_urls = json!([format!("https://img.example.com/{}.jpg", product.id)]).to_string();
        let rating_stars = json!({"five_stars": product.review_count / 2}).to_string();
        let categories = json!([product.root_category_name, product.category_name]).to_string();

        conn.execute(
            "INSERT INTO products (
                id, brand, review_count, description, product_name, category_name,
                root_category_name, main_image, rating, initial_price, discounted_price,
                specifications, image_urls, rating_stars, sizes, colors, other_attributes,
                categories, embeddings
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, vector32(?19))",
            params![
                product.id,
                product.brand,
                product.review_count,
                product.description,
                product.product_name,
                product.category_name,
                product.root_category_name,
                format!("https://img.example.com/{}-main.jpg", product.id),
                product.rating,
                product.initial_price,
                product.discounted_price,
                specifications,
                image_urls,
                rating_stars,
                product.sizes.to_string(),
                product.colors.to_string(),
                "not json",
                categories,
                product.embedding_literal(),
            ],
        )
        .await
        .expect("Failed to insert seed product");
    }

    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}
