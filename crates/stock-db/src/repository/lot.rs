//! # Lot Repository
//!
//! Lots and serial numbers. Archiving hides a lot from default listings
//! without deleting it, so quants and move lines keep pointing at it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use stock_core::validation::validate_name;
use stock_core::Lot;

const LOT_COLUMNS: &str = "id, name, product_id, active, created_at";

#[derive(Debug, Clone)]
pub struct LotRepository {
    pool: SqlitePool,
}

impl LotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LotRepository { pool }
    }

    /// Creates an active lot. Names are unique per product.
    pub async fn create(&self, product_id: &str, name: &str) -> DbResult<Lot> {
        validate_name("name", name)?;

        let lot = Lot {
            id: generate_id(),
            name: name.trim().to_string(),
            product_id: product_id.to_string(),
            active: true,
            created_at: Utc::now(),
        };
        debug!(id = %lot.id, product_id, name = %lot.name, "Creating lot");

        sqlx::query(
            "INSERT INTO lots (id, name, product_id, active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&lot.id)
        .bind(&lot.name)
        .bind(&lot.product_id)
        .bind(lot.active)
        .bind(lot.created_at)
        .execute(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Gets a lot by id, archived or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Lot>> {
        let lot = sqlx::query_as::<_, Lot>(&format!(
            "SELECT {} FROM lots WHERE id = ?1",
            LOT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// Lots of a product by name; archived ones only if asked for.
    pub async fn list_for_product(
        &self,
        product_id: &str,
        include_archived: bool,
    ) -> DbResult<Vec<Lot>> {
        let sql = if include_archived {
            format!(
                "SELECT {} FROM lots WHERE product_id = ?1 ORDER BY name",
                LOT_COLUMNS
            )
        } else {
            format!(
                "SELECT {} FROM lots WHERE product_id = ?1 AND active = 1 ORDER BY name",
                LOT_COLUMNS
            )
        };

        let lots = sqlx::query_as::<_, Lot>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lots)
    }

    pub async fn archive(&self, id: &str) -> DbResult<Lot> {
        self.set_active(id, false).await
    }

    pub async fn unarchive(&self, id: &str) -> DbResult<Lot> {
        self.set_active(id, true).await
    }

    async fn set_active(&self, id: &str, active: bool) -> DbResult<Lot> {
        let result = sqlx::query("UPDATE lots SET active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Lot", id));
        }
        info!(id, active, "Lot active flag changed");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Lot", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_archive_hides_from_default_listing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().create("Serial product", None).await.unwrap();
        let lot_a = db.lots().create(&product.id, "LOT-A").await.unwrap();
        db.lots().create(&product.id, "LOT-B").await.unwrap();

        let archived = db.lots().archive(&lot_a.id).await.unwrap();
        assert!(!archived.active);

        let visible = db.lots().list_for_product(&product.id, false).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "LOT-B");

        let all = db.lots().list_for_product(&product.id, true).await.unwrap();
        assert_eq!(all.len(), 2);

        // still reachable by id
        assert!(db.lots().get_by_id(&lot_a.id).await.unwrap().is_some());

        db.lots().unarchive(&lot_a.id).await.unwrap();
        let visible = db.lots().list_for_product(&product.id, false).await.unwrap();
        assert_eq!(visible.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_lot_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db.products().create("Serial product", None).await.unwrap();
        db.lots().create(&product.id, "LOT-A").await.unwrap();

        let err = db.lots().create(&product.id, "LOT-A").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_archive_unknown_lot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.lots().archive("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
