//! # Picking Type Repository
//!
//! Transfer types carry the two per-type switches: the owner restriction
//! policy and whether printed transfers may still be cancelled.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use stock_core::validation::validate_name;
use stock_core::{OwnerRestriction, PickingType, PickingTypeCode};

const PICKING_TYPE_COLUMNS: &str = "id, name, code, default_location_src_id, \
     default_location_dest_id, owner_restriction, restrict_cancel_if_printed";

/// Input for [`PickingTypeRepository::create`].
#[derive(Debug, Clone)]
pub struct NewPickingType {
    pub name: String,
    pub code: PickingTypeCode,
    pub default_location_src_id: Option<String>,
    pub default_location_dest_id: Option<String>,
    pub owner_restriction: OwnerRestriction,
    pub restrict_cancel_if_printed: bool,
}

impl NewPickingType {
    /// A type with the standard policy that restricts printed cancels.
    pub fn new(name: &str, code: PickingTypeCode) -> Self {
        NewPickingType {
            name: name.to_string(),
            code,
            default_location_src_id: None,
            default_location_dest_id: None,
            owner_restriction: OwnerRestriction::default(),
            restrict_cancel_if_printed: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PickingTypeRepository {
    pool: SqlitePool,
}

impl PickingTypeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PickingTypeRepository { pool }
    }

    pub async fn create(&self, new: &NewPickingType) -> DbResult<PickingType> {
        validate_name("name", &new.name)?;

        let picking_type = PickingType {
            id: generate_id(),
            name: new.name.trim().to_string(),
            code: new.code,
            default_location_src_id: new.default_location_src_id.clone(),
            default_location_dest_id: new.default_location_dest_id.clone(),
            owner_restriction: new.owner_restriction,
            restrict_cancel_if_printed: new.restrict_cancel_if_printed,
        };
        debug!(
            id = %picking_type.id,
            name = %picking_type.name,
            policy = %picking_type.owner_restriction,
            "Creating picking type"
        );

        sqlx::query(
            "INSERT INTO picking_types (id, name, code, default_location_src_id, \
             default_location_dest_id, owner_restriction, restrict_cancel_if_printed) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&picking_type.id)
        .bind(&picking_type.name)
        .bind(picking_type.code)
        .bind(&picking_type.default_location_src_id)
        .bind(&picking_type.default_location_dest_id)
        .bind(picking_type.owner_restriction)
        .bind(picking_type.restrict_cancel_if_printed)
        .execute(&self.pool)
        .await?;

        Ok(picking_type)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PickingType>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn get(&self, id: &str) -> DbResult<PickingType> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("PickingType", id))
    }

    /// Changes the owner policy. Existing move lines are left alone; the new
    /// policy applies from the next reservation.
    pub async fn set_owner_restriction(
        &self,
        id: &str,
        policy: OwnerRestriction,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE picking_types SET owner_restriction = ?1 WHERE id = ?2")
            .bind(policy)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PickingType", id));
        }
        info!(id, %policy, "Owner restriction changed");
        Ok(())
    }

    pub async fn set_restrict_cancel_if_printed(&self, id: &str, restrict: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE picking_types SET restrict_cancel_if_printed = ?1 WHERE id = ?2",
        )
        .bind(restrict)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PickingType", id));
        }
        info!(id, restrict, "Printed cancel restriction changed");
        Ok(())
    }
}

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PickingType>> {
    let picking_type = sqlx::query_as::<_, PickingType>(&format!(
        "SELECT {} FROM picking_types WHERE id = ?1",
        PICKING_TYPE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(picking_type)
}
