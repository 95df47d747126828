//! # Partner Repository
//!
//! Customers, suppliers and owners of consigned stock.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use stock_core::validation::validate_name;
use stock_core::Partner;

#[derive(Debug, Clone)]
pub struct PartnerRepository {
    pool: SqlitePool,
}

impl PartnerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PartnerRepository { pool }
    }

    pub async fn create(&self, name: &str) -> DbResult<Partner> {
        validate_name("name", name)?;

        let partner = Partner {
            id: generate_id(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        debug!(id = %partner.id, name = %partner.name, "Creating partner");

        sqlx::query("INSERT INTO partners (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&partner.id)
            .bind(&partner.name)
            .bind(partner.created_at)
            .execute(&self.pool)
            .await?;

        Ok(partner)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Partner>> {
        let partner = sqlx::query_as::<_, Partner>(
            "SELECT id, name, created_at FROM partners WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(partner)
    }

    /// Like [`get_by_id`](Self::get_by_id) but missing is an error.
    pub async fn get(&self, id: &str) -> DbResult<Partner> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Partner", id))
    }
}
