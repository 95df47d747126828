//! # Location Repository
//!
//! The location tree. Each location stores its materialized `parent_path`
//! so that "this location and its children" is a prefix match:
//!
//! ```text
//! WH            parent_path = "wh-id/"
//! └── Stock     parent_path = "wh-id/stock-id/"
//!     └── Shelf parent_path = "wh-id/stock-id/shelf-id/"
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use stock_core::validation::validate_name;
use stock_core::{Location, LocationUsage};

const LOCATION_COLUMNS: &str = "id, name, usage, parent_id, parent_path";

#[derive(Debug, Clone)]
pub struct LocationRepository {
    pool: SqlitePool,
}

impl LocationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LocationRepository { pool }
    }

    /// Creates a location, optionally under `parent_id`.
    pub async fn create(
        &self,
        name: &str,
        usage: LocationUsage,
        parent_id: Option<&str>,
    ) -> DbResult<Location> {
        validate_name("name", name)?;

        let id = generate_id();
        let parent_path = match parent_id {
            Some(parent_id) => {
                let parent = self.get(parent_id).await?;
                format!("{}{}/", parent.parent_path, id)
            }
            None => format!("{}/", id),
        };

        let location = Location {
            id,
            name: name.trim().to_string(),
            usage,
            parent_id: parent_id.map(str::to_string),
            parent_path,
        };
        debug!(id = %location.id, path = %location.parent_path, "Creating location");

        sqlx::query(
            "INSERT INTO locations (id, name, usage, parent_id, parent_path) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&location.id)
        .bind(&location.name)
        .bind(location.usage)
        .bind(&location.parent_id)
        .bind(&location.parent_path)
        .execute(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Location>> {
        let location = sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations WHERE id = ?1",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(location)
    }

    pub async fn get(&self, id: &str) -> DbResult<Location> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Location", id))
    }

    /// The location itself followed by all its descendants.
    pub async fn children_of(&self, id: &str) -> DbResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(&format!(
            "SELECT {} FROM locations \
             WHERE instr(parent_path, (SELECT parent_path FROM locations WHERE id = ?1)) = 1 \
             ORDER BY parent_path",
            LOCATION_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(locations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_parent_path_is_materialized() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let wh = db.locations().create("WH", LocationUsage::View, None).await.unwrap();
        let stock = db
            .locations()
            .create("Stock", LocationUsage::Internal, Some(wh.id.as_str()))
            .await
            .unwrap();

        assert_eq!(wh.parent_path, format!("{}/", wh.id));
        assert_eq!(stock.parent_path, format!("{}/{}/", wh.id, stock.id));
        assert!(wh.contains(&stock));

        let loaded = db.locations().get(&stock.id).await.unwrap();
        assert_eq!(loaded, stock);
    }

    #[tokio::test]
    async fn test_children_of() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let wh = db.locations().create("WH", LocationUsage::View, None).await.unwrap();
        let stock = db
            .locations()
            .create("Stock", LocationUsage::Internal, Some(wh.id.as_str()))
            .await
            .unwrap();
        db.locations()
            .create("Shelf 1", LocationUsage::Internal, Some(stock.id.as_str()))
            .await
            .unwrap();
        db.locations()
            .create("Customers", LocationUsage::Customer, None)
            .await
            .unwrap();

        let children = db.locations().children_of(&stock.id).await.unwrap();
        let names: Vec<&str> = children.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Stock", "Shelf 1"]);
    }

    #[tokio::test]
    async fn test_unknown_parent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db
            .locations()
            .create("Orphan", LocationUsage::Internal, Some("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
