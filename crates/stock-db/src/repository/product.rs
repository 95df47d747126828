//! # Product Repository
//!
//! Products, their available quantity, and product search by available
//! quantity.
//!
//! ## Available Quantity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quants of product P in internal locations                             │
//! │                                                                         │
//! │   Q1  500  owner: -      ──┐                                            │
//! │   Q2  500  owner: O      ──┼──► AvailabilityMode decides which count    │
//! │                            │                                            │
//! │   Default          ──► unowned only          = 500                     │
//! │   ForceOwner(O)    ──► owned by O only        = 500                     │
//! │   SkipRestriction  ──► everything             = 1000                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both the single-product figure and the search predicate are computed in
//! SQL (see [`crate::filters`]).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::filters::{AvailabilityQuery, ProductSearch, PRODUCT_COLUMNS};
use crate::repository::generate_id;
use stock_core::validation::validate_name;
use stock_core::{Product, Quantity};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let qty = repo
///     .qty_available(&product.id, &AvailabilityQuery::new(AvailabilityMode::SkipRestriction))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn create(&self, name: &str, default_code: Option<&str>) -> DbResult<Product> {
        validate_name("name", name)?;

        let product = Product {
            id: generate_id(),
            name: name.trim().to_string(),
            default_code: default_code.map(|c| c.trim().to_string()),
            created_at: Utc::now(),
        };
        debug!(id = %product.id, name = %product.name, "Creating product");

        sqlx::query(
            "INSERT INTO products (id, name, default_code, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.default_code)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products p WHERE p.id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Available quantity of a product under the query's mode.
    ///
    /// ## Arguments
    /// * `product_id` - Product to measure
    /// * `query` - Availability mode and optional location scope
    pub async fn qty_available(
        &self,
        product_id: &str,
        query: &AvailabilityQuery,
    ) -> DbResult<Quantity> {
        let mut qb = query.sum_for_product(product_id);
        let milli = qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;
        let qty = Quantity::from_milli(milli);

        debug!(product_id, mode = ?query.mode, %qty, "Computed available quantity");
        Ok(qty)
    }

    /// Products matching the search, ordered by name.
    ///
    /// Products without any counted stock have an available quantity of 0,
    /// so `< 1` finds out-of-stock products.
    pub async fn search(&self, search: &ProductSearch) -> DbResult<Vec<Product>> {
        let mut qb = search.to_query();
        let products = qb.build_query_as::<Product>().fetch_all(&self.pool).await?;

        debug!(
            predicate = ?search.qty_available,
            mode = ?search.availability.mode,
            found = products.len(),
            "Searched products"
        );
        Ok(products)
    }
}
