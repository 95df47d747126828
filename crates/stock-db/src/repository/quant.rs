//! # Quant Repository
//!
//! On-hand stock. Quants are only created here; their `reserved_quantity`
//! is maintained by the reservation workflow in
//! [`crate::repository::stock_move`].
//!
//! ## Gathering
//! Quants are gathered for a product at a location *and its children*,
//! oldest first (`in_date`, then insertion order). That order is the order
//! in which reservation consumes them.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::filters::{push_location_scope, push_owner_filter, QUANT_COLUMNS};
use crate::repository::generate_id;
use stock_core::{OwnerFilter, Quant, Quantity};

/// Input for [`QuantRepository::create`].
#[derive(Debug, Clone)]
pub struct NewQuant {
    pub product_id: String,
    pub location_id: String,
    pub quantity: Quantity,
    pub owner_id: Option<String>,
    pub lot_id: Option<String>,
    /// Defaults to now.
    pub in_date: Option<DateTime<Utc>>,
}

impl NewQuant {
    pub fn new(product_id: &str, location_id: &str, quantity: Quantity) -> Self {
        NewQuant {
            product_id: product_id.to_string(),
            location_id: location_id.to_string(),
            quantity,
            owner_id: None,
            lot_id: None,
            in_date: None,
        }
    }

    pub fn owner(mut self, owner_id: &str) -> Self {
        self.owner_id = Some(owner_id.to_string());
        self
    }

    pub fn lot(mut self, lot_id: &str) -> Self {
        self.lot_id = Some(lot_id.to_string());
        self
    }

    pub fn in_date(mut self, in_date: DateTime<Utc>) -> Self {
        self.in_date = Some(in_date);
        self
    }
}

#[derive(Debug, Clone)]
pub struct QuantRepository {
    pool: SqlitePool,
}

impl QuantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        QuantRepository { pool }
    }

    pub async fn create(&self, new: &NewQuant) -> DbResult<Quant> {
        let quant = Quant {
            id: generate_id(),
            product_id: new.product_id.clone(),
            location_id: new.location_id.clone(),
            lot_id: new.lot_id.clone(),
            owner_id: new.owner_id.clone(),
            quantity: new.quantity,
            reserved_quantity: Quantity::zero(),
            in_date: new.in_date.unwrap_or_else(Utc::now),
        };
        debug!(
            id = %quant.id,
            product_id = %quant.product_id,
            owner_id = ?quant.owner_id,
            quantity = %quant.quantity,
            "Creating quant"
        );

        sqlx::query(
            "INSERT INTO quants (id, product_id, location_id, lot_id, owner_id, quantity, \
             reserved_quantity, in_date) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&quant.id)
        .bind(&quant.product_id)
        .bind(&quant.location_id)
        .bind(&quant.lot_id)
        .bind(&quant.owner_id)
        .bind(quant.quantity)
        .bind(quant.reserved_quantity)
        .bind(quant.in_date)
        .execute(&self.pool)
        .await?;

        Ok(quant)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Quant>> {
        let quant = sqlx::query_as::<_, Quant>(&format!(
            "SELECT {} FROM quants q WHERE q.id = ?1",
            QUANT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quant)
    }

    pub async fn get(&self, id: &str) -> DbResult<Quant> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Quant", id))
    }

    /// All quants of a product at `location_id` and its children, oldest first.
    pub async fn gather(&self, product_id: &str, location_id: &str) -> DbResult<Vec<Quant>> {
        let mut conn = self.pool.acquire().await?;
        gather(&mut conn, product_id, location_id, &OwnerFilter::Any).await
    }

    /// Like [`gather`](Self::gather), with the owner filter applied in SQL.
    pub async fn gather_filtered(
        &self,
        product_id: &str,
        location_id: &str,
        filter: &OwnerFilter,
    ) -> DbResult<Vec<Quant>> {
        let mut conn = self.pool.acquire().await?;
        gather(&mut conn, product_id, location_id, filter).await
    }

    /// Quants of a product in internal locations, oldest first.
    pub async fn internal_for_product(&self, product_id: &str) -> DbResult<Vec<Quant>> {
        let quants = sqlx::query_as::<_, Quant>(&format!(
            "SELECT {} FROM quants q JOIN locations l ON l.id = q.location_id \
             WHERE q.product_id = ?1 AND l.usage = 'internal' \
             ORDER BY q.in_date, q.rowid",
            QUANT_COLUMNS
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quants)
    }
}

// =============================================================================
// Connection-level helpers (used inside workflow transactions)
// =============================================================================

pub(crate) async fn gather(
    conn: &mut SqliteConnection,
    product_id: &str,
    location_id: &str,
    filter: &OwnerFilter,
) -> DbResult<Vec<Quant>> {
    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT ");
    qb.push(QUANT_COLUMNS)
        .push(" FROM quants q JOIN locations l ON l.id = q.location_id WHERE q.product_id = ")
        .push_bind(product_id.to_string())
        .push(" AND ");
    push_location_scope(&mut qb, location_id);
    qb.push(" AND ");
    push_owner_filter(&mut qb, "q.owner_id", filter);
    qb.push(" ORDER BY q.in_date, q.rowid");

    let quants = qb.build_query_as::<Quant>().fetch_all(&mut *conn).await?;
    Ok(quants)
}

/// Adds `delta` (possibly negative) to a quant's reserved quantity.
pub(crate) async fn add_reserved(
    conn: &mut SqliteConnection,
    quant_id: &str,
    delta: Quantity,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE quants SET reserved_quantity = MAX(reserved_quantity + ?1, 0) WHERE id = ?2",
    )
    .bind(delta)
    .bind(quant_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Quant", quant_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::scenario;
    use chrono::Duration;
    use stock_core::LocationUsage;

    #[tokio::test]
    async fn test_gather_orders_by_in_date() {
        let s = scenario().await;
        let older = s
            .db
            .quants()
            .create(
                &NewQuant::new(&s.product.id, &s.stock.id, Quantity::from_units(1))
                    .in_date(Utc::now() - Duration::days(30)),
            )
            .await
            .unwrap();

        let quants = s.db.quants().gather(&s.product.id, &s.stock.id).await.unwrap();
        assert_eq!(quants.len(), 3);
        assert_eq!(quants[0].id, older.id);
    }

    #[tokio::test]
    async fn test_gather_includes_child_locations() {
        let s = scenario().await;
        let shelf = s
            .db
            .locations()
            .create("Shelf", LocationUsage::Internal, Some(s.stock.id.as_str()))
            .await
            .unwrap();
        s.db.quants()
            .create(&NewQuant::new(&s.product.id, &shelf.id, Quantity::from_units(3)))
            .await
            .unwrap();

        let at_stock = s.db.quants().gather(&s.product.id, &s.stock.id).await.unwrap();
        let at_shelf = s.db.quants().gather(&s.product.id, &shelf.id).await.unwrap();
        assert_eq!(at_stock.len(), 3);
        assert_eq!(at_shelf.len(), 1);
    }

    #[tokio::test]
    async fn test_sql_filter_matches_in_memory_filter() {
        let s = scenario().await;
        let all = s.db.quants().gather(&s.product.id, &s.stock.id).await.unwrap();

        for filter in [
            OwnerFilter::Any,
            OwnerFilter::Unowned,
            OwnerFilter::Owner(s.owner.id.clone()),
            OwnerFilter::OwnerOrUnowned(s.owner.id.clone()),
            OwnerFilter::Nothing,
        ] {
            let in_sql = s
                .db
                .quants()
                .gather_filtered(&s.product.id, &s.stock.id, &filter)
                .await
                .unwrap();
            let in_memory: Vec<Quant> = filter.clone().filter(&all).cloned().collect();
            assert_eq!(in_sql, in_memory, "filter {:?}", filter);
        }
    }

    #[tokio::test]
    async fn test_add_reserved_never_goes_negative() {
        let s = scenario().await;
        let quants = s.db.quants().internal_for_product(&s.product.id).await.unwrap();
        let mut conn = s.db.pool().acquire().await.unwrap();

        add_reserved(&mut conn, &quants[0].id, Quantity::from_units(-5))
            .await
            .unwrap();
        drop(conn);

        let quant = s.db.quants().get(&quants[0].id).await.unwrap();
        assert_eq!(quant.reserved_quantity, Quantity::zero());
    }
}
