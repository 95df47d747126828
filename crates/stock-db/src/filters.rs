//! # SQL Filters
//!
//! Translates the pure predicates of `stock-core` into SQL fragments on a
//! `sqlx::QueryBuilder`, so that filtering and aggregation run inside
//! SQLite instead of on rows pulled into memory.
//!
//! ## Translation Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OwnerFilter              SQL on q.owner_id                             │
//! │  ───────────────────────  ────────────────────────────────────────────  │
//! │  Any                      1 = 1                                         │
//! │  Unowned                  q.owner_id IS NULL                            │
//! │  Owner(p)                 q.owner_id = ?p                               │
//! │  OwnerOrUnowned(p)        (q.owner_id IS NULL OR q.owner_id = ?p)       │
//! │  Nothing                  0 = 1                                         │
//! │                                                                         │
//! │  QtyComparison(op, v)     COALESCE(avail.qty, 0) <op> ?v                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Search Query Shape
//! ```sql
//! SELECT p.* FROM products p
//! LEFT JOIN (
//!     SELECT q.product_id, SUM(q.quantity) AS qty
//!     FROM quants q JOIN locations l ON l.id = q.location_id
//!     WHERE l.usage = 'internal' AND <owner filter> [AND <location scope>]
//!     GROUP BY q.product_id
//! ) avail ON avail.product_id = p.id
//! WHERE [p.id IN (...)] AND COALESCE(avail.qty, 0) > ?
//! ```
//! The `LEFT JOIN` + `COALESCE` make products without stock count as 0,
//! exactly like summing an empty quant list in memory.

use sqlx::{QueryBuilder, Sqlite};
use stock_core::{AvailabilityMode, OwnerFilter, QtyComparison};

/// Columns of `quants` in [`stock_core::Quant`] field order, aliased `q`.
pub const QUANT_COLUMNS: &str = "q.id, q.product_id, q.location_id, q.lot_id, q.owner_id, \
     q.quantity, q.reserved_quantity, q.in_date";

/// Columns of `products` in [`stock_core::Product`] field order, aliased `p`.
pub const PRODUCT_COLUMNS: &str = "p.id, p.name, p.default_code, p.created_at";

// =============================================================================
// Owner Filter
// =============================================================================

/// Appends the SQL form of `filter` applied to `column`.
pub fn push_owner_filter(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, filter: &OwnerFilter) {
    match filter {
        OwnerFilter::Any => {
            qb.push("1 = 1");
        }
        OwnerFilter::Unowned => {
            qb.push(column).push(" IS NULL");
        }
        OwnerFilter::Owner(partner) => {
            qb.push(column).push(" = ").push_bind(partner.clone());
        }
        OwnerFilter::OwnerOrUnowned(partner) => {
            qb.push("(")
                .push(column)
                .push(" IS NULL OR ")
                .push(column)
                .push(" = ")
                .push_bind(partner.clone())
                .push(")");
        }
        OwnerFilter::Nothing => {
            qb.push("0 = 1");
        }
    }
}

/// Appends "location `l` is `location_id` or one of its children".
pub fn push_location_scope(qb: &mut QueryBuilder<'_, Sqlite>, location_id: &str) {
    qb.push("instr(l.parent_path, (SELECT parent_path FROM locations WHERE id = ")
        .push_bind(location_id.to_string())
        .push(")) = 1");
}

// =============================================================================
// Availability
// =============================================================================

/// Parameters of an available-quantity computation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub mode: AvailabilityMode,
    /// Restrict to this location and its children; all internal stock if unset.
    pub location_id: Option<String>,
}

impl AvailabilityQuery {
    pub fn new(mode: AvailabilityMode) -> Self {
        AvailabilityQuery {
            mode,
            location_id: None,
        }
    }

    pub fn at_location(mut self, location_id: impl Into<String>) -> Self {
        self.location_id = Some(location_id.into());
        self
    }

    /// Appends the `WHERE` conditions selecting counted quants (`q`/`l`).
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE l.usage = 'internal' AND ");
        push_owner_filter(qb, "q.owner_id", &self.mode.owner_filter());
        if let Some(location_id) = &self.location_id {
            qb.push(" AND ");
            push_location_scope(qb, location_id);
        }
    }

    /// `SELECT COALESCE(SUM(q.quantity), 0)` for one product.
    pub fn sum_for_product(&self, product_id: &str) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new(
            "SELECT COALESCE(SUM(q.quantity), 0) FROM quants q \
             JOIN locations l ON l.id = q.location_id",
        );
        self.push_conditions(&mut qb);
        qb.push(" AND q.product_id = ").push_bind(product_id.to_string());
        qb
    }

    /// Appends the per-product aggregate sub-select (`product_id`, `qty`).
    fn push_aggregate(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(
            "SELECT q.product_id AS product_id, SUM(q.quantity) AS qty FROM quants q \
             JOIN locations l ON l.id = q.location_id",
        );
        self.push_conditions(qb);
        qb.push(" GROUP BY q.product_id");
    }
}

// =============================================================================
// Product Search
// =============================================================================

/// Product search with an optional available-quantity predicate.
///
/// ## Example
/// ```rust,ignore
/// let search = ProductSearch::new()
///     .ids(vec![product.id.clone()])
///     .qty_available(QtyComparison::new(QtyOperator::Gt, Quantity::from_units(499)));
/// let products = db.products().search(&search).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductSearch {
    pub ids: Option<Vec<String>>,
    pub qty_available: Option<QtyComparison>,
    pub availability: AvailabilityQuery,
}

impl ProductSearch {
    pub fn new() -> Self {
        ProductSearch::default()
    }

    pub fn ids(mut self, ids: Vec<String>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn qty_available(mut self, comparison: QtyComparison) -> Self {
        self.qty_available = Some(comparison);
        self
    }

    pub fn mode(mut self, mode: AvailabilityMode) -> Self {
        self.availability.mode = mode;
        self
    }

    pub fn location(mut self, location_id: impl Into<String>) -> Self {
        self.availability.location_id = Some(location_id.into());
        self
    }

    /// Builds the full `SELECT` returning [`stock_core::Product`] rows.
    pub fn to_query(&self) -> QueryBuilder<'static, Sqlite> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(PRODUCT_COLUMNS).push(" FROM products p");

        if self.qty_available.is_some() {
            qb.push(" LEFT JOIN (");
            self.availability.push_aggregate(&mut qb);
            qb.push(") avail ON avail.product_id = p.id");
        }

        qb.push(" WHERE 1 = 1");

        if let Some(ids) = &self.ids {
            if ids.is_empty() {
                qb.push(" AND 0 = 1");
            } else {
                qb.push(" AND p.id IN (");
                let mut separated = qb.separated(", ");
                for id in ids {
                    separated.push_bind(id.clone());
                }
                separated.push_unseparated(")");
            }
        }

        if let Some(comparison) = &self.qty_available {
            qb.push(" AND COALESCE(avail.qty, 0) ")
                .push(comparison.op.as_sql())
                .push(" ")
                .push_bind(comparison.value);
        }

        qb.push(" ORDER BY p.name, p.id");
        qb
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
