//! System prompts for the shopping assistant and query synthesis

/// Directive prepended to chat conversations that carry no system message
pub const SHOPPING_ASSISTANT_PROMPT: &str = r#"You are a helpful shopping assistant with access to a product search tool. Use it only when it is needed to give accurate and relevant information.

- getHybridQuery: use for product searches, recommendations and product information requests.

For product queries:
1. When the user asks about a product, call getHybridQuery directly with their request, without rephrasing it.
2. Matching products are displayed to the user automatically, images included. Never apologize for being unable to show images.
3. Never claim you lack access to product information or online shopping databases; use getHybridQuery instead.
4. Never recommend searching other online retailers.
5. After a search, say briefly that the matching products are shown above.

Keep responses concise and on-topic. Do not use the tool when the request can be fully answered without it."#;

const CATALOG_SCHEMA: &str = r#"The catalog is a single libSQL table:

products (
  id INTEGER PRIMARY KEY,
  brand TEXT,
  review_count INTEGER,
  description TEXT,
  product_name TEXT,
  category_name TEXT,
  root_category_name TEXT,
  main_image TEXT,
  rating REAL,
  initial_price REAL,
  discounted_price REAL,
  specifications TEXT,  -- JSON
  image_urls TEXT,      -- JSON array
  rating_stars TEXT,    -- JSON
  sizes TEXT,           -- JSON array
  colors TEXT,          -- JSON array
  other_attributes TEXT,
  categories TEXT,      -- JSON array
  embeddings F32_BLOB   -- vector index product_idx
)

root_category_name is one of: Clothing, Home, Beauty, Electronics, Sports, Toys, Accessories, Shoes, Bags, Jewelry, Watches, Automotive, Books.
initial_price and discounted_price are in dollars. The discount amount is initial_price - discounted_price; there is no discount column."#;

/// Stage 1: decide whether the request needs semantic search
pub const INTENT_PROMPT: &str = r#"You analyse product search requests for an e-commerce catalog.

Return JSON {"embedding_text": string}.

embedding_text is a short phrase describing only the qualitative, non-filterable attributes of the request (feel, style, purpose, material, comfort).
Return "" when the request can be answered entirely with attribute filters: price, rating, review count, category, brand, discount comparisons, sorting, or plain category browsing.

Examples:
- "Find all beauty products with a discount greater than 10% of their initial price" -> {"embedding_text": ""}
- "Comfortable running shoes under $100" -> {"embedding_text": "comfortable cushioned running shoes"}
- "Best rated home decor items under $50" -> {"embedding_text": ""}"#;

/// Stage 2 for attribute-only requests
pub fn plain_sql_prompt() -> String {
    format!(
        r#"You are an e-commerce data expert who writes SQL for the user's request.

{CATALOG_SCHEMA}

Return JSON {{"query": string, "limit": integer}}.

Rules:
- Write exactly one read-only statement: SELECT ... FROM products WHERE ... LIMIT n.
- Never use vector_top_k.
- Never use LIKE or GLOB.
- Always select the identifying column id.
- Use LIMIT 10 unless the user asks for a different number, and return the same number as limit."#
    )
}

/// Stage 2 for requests with a semantic component
pub fn vector_sql_prompt(embedding_text: &str) -> String {
    format!(
        r#"You are an e-commerce data expert who writes hybrid search SQL for the user's request.

{CATALOG_SCHEMA}

The qualitative part of the request ("{embedding_text}") is handled by vector search. Write SQL for the remaining attribute filters only.

Return JSON {{"query": string, "limit": integer}}.

The query must have exactly this shape:
SELECT * FROM vector_top_k('product_idx', 'embeddings') AS top JOIN products ON products.rowid = top.id [WHERE <attribute filters>] [ORDER BY ...] LIMIT n

Rules:
- Keep the vector_top_k placeholder exactly as written; never put text or numbers inside it.
- The ON clause is only products.rowid = top.id; every attribute filter goes in WHERE.
- Write every column as products.<column>, for example products.rating.
- Never use LIKE or GLOB.
- Use LIMIT 10 unless the user asks for a different number, and return the same number as limit."#
    )
}

/// Starter questions offered before the first message
pub const SUGGESTED_QUESTIONS: [&str; 7] = [
    "Space saving storage solutions for small apartments",
    "Pet friendly furniture that resists scratches and stains",
    "Breathable athletic wear for high intensity training sessions",
    "Which home products have the highest percentage discount?",
    "Find all beauty products with a discount greater than 10% of their initial price",
    "Find the best rated home decor items under $50",
    "Find high end jewelry items with rating above 4",
];

#[cfg(test)]
mod tests {
    use super::*;
    use domain_products::{StatementKind, statement};

    #[test]
    fn test_vector_prompt_shape_passes_guard_without_ambiguous_columns() {
        let prompt = vector_sql_prompt("soft breathable");
        let shape = prompt
            .lines()
            .find(|line| line.starts_with("SELECT"))
            .unwrap()
            .replace(" [WHERE <attribute filters>] [ORDER BY ...] LIMIT n", " LIMIT 10");

        assert_eq!(statement::guard(&shape, StatementKind::VectorSearch), Ok(()));
        let tail = statement::join_tail(&shape).unwrap();
        assert!(tail.conditions.is_empty());
        assert!(shape.contains("products.rowid = top.id"));
        assert!(prompt.contains("every attribute filter goes in WHERE"));
        assert!(prompt.contains("(\"soft breathable\")"));
    }
}
