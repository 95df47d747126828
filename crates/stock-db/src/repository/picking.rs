//! # Picking Repository
//!
//! Transfers and their workflows. Each workflow runs inside one database
//! transaction: either every move of the transfer is processed or none is.
//!
//! ## Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create ──► action_confirm ──► action_assign ──► (done elsewhere)      │
//! │   draft       confirmed          assigned / confirmed                  │
//! │                   ▲                  │                                  │
//! │                   └── do_unreserve ──┘                                  │
//! │                                                                         │
//! │  action_cancel(ctx) ── printed + restricted type ──► rejected          │
//! │  merge_moves        ── cancels absorbed moves with the check disabled  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The transfer's state is never set directly: it is recomputed from its
//! moves after every workflow step.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::stock_move::{self, state_label};
use crate::repository::{generate_id, picking_type};
use stock_core::reservation::{move_state_for, picking_state_for};
use stock_core::validation::{validate_id, validate_name};
use stock_core::{
    CancelContext, CoreError, MoveLine, MoveState, MoveType, Picking, PickingState, Quantity,
    StockMove, ValidationError,
};

const PICKING_COLUMNS: &str = "id, name, picking_type_id, partner_id, location_id, \
     location_dest_id, state, move_type, printed, created_at, updated_at";

/// Input for [`PickingRepository::create`].
///
/// Unset locations are taken from the picking type's defaults.
#[derive(Debug, Clone)]
pub struct NewPicking {
    pub name: String,
    pub picking_type_id: String,
    pub partner_id: Option<String>,
    pub location_id: Option<String>,
    pub location_dest_id: Option<String>,
    pub move_type: MoveType,
}

impl NewPicking {
    pub fn new(name: &str, picking_type_id: &str) -> Self {
        NewPicking {
            name: name.to_string(),
            picking_type_id: picking_type_id.to_string(),
            partner_id: None,
            location_id: None,
            location_dest_id: None,
            move_type: MoveType::default(),
        }
    }

    pub fn partner(mut self, partner_id: &str) -> Self {
        self.partner_id = Some(partner_id.to_string());
        self
    }

    pub fn locations(mut self, location_id: &str, location_dest_id: &str) -> Self {
        self.location_id = Some(location_id.to_string());
        self.location_dest_id = Some(location_dest_id.to_string());
        self
    }

    pub fn move_type(mut self, move_type: MoveType) -> Self {
        self.move_type = move_type;
        self
    }
}

/// Repository for transfers.
///
/// ## Usage
/// ```rust,ignore
/// let picking = db.pickings().create(&NewPicking::new("WH/OUT/00001", &type_id)).await?;
/// db.moves().create(&NewMove::new("Move", &product_id, qty).picking(&picking.id)).await?;
///
/// let picking = db.pickings().action_assign(&picking.id).await?;
/// db.pickings().action_cancel(&picking.id, CancelContext::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PickingRepository {
    pool: SqlitePool,
}

impl PickingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PickingRepository { pool }
    }

    pub async fn create(&self, new: &NewPicking) -> DbResult<Picking> {
        validate_name("name", &new.name)?;

        let mut conn = self.pool.acquire().await?;
        let picking_type = picking_type::fetch(&mut conn, &new.picking_type_id)
            .await?
            .ok_or_else(|| DbError::not_found("PickingType", new.picking_type_id.as_str()))?;

        let location_id = new
            .location_id
            .clone()
            .or(picking_type.default_location_src_id)
            .ok_or_else(|| required("location_id"))?;
        let location_dest_id = new
            .location_dest_id
            .clone()
            .or(picking_type.default_location_dest_id)
            .ok_or_else(|| required("location_dest_id"))?;

        let now = Utc::now();
        let picking = Picking {
            id: generate_id(),
            name: new.name.trim().to_string(),
            picking_type_id: new.picking_type_id.clone(),
            partner_id: new.partner_id.clone(),
            location_id,
            location_dest_id,
            state: PickingState::Draft,
            move_type: new.move_type,
            printed: false,
            created_at: now,
            updated_at: now,
        };
        debug!(id = %picking.id, name = %picking.name, partner_id = ?picking.partner_id, "Creating picking");

        sqlx::query(
            "INSERT INTO pickings (id, name, picking_type_id, partner_id, location_id, \
             location_dest_id, state, move_type, printed, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&picking.id)
        .bind(&picking.name)
        .bind(&picking.picking_type_id)
        .bind(&picking.partner_id)
        .bind(&picking.location_id)
        .bind(&picking.location_dest_id)
        .bind(picking.state)
        .bind(picking.move_type)
        .bind(picking.printed)
        .bind(picking.created_at)
        .bind(picking.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(picking)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Picking>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Picking> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Picking", id))
    }

    /// Sets or clears the transfer's partner. Takes effect on the next
    /// reservation; existing move lines stay as they are.
    pub async fn set_partner(&self, id: &str, partner_id: Option<&str>) -> DbResult<Picking> {
        if let Some(partner_id) = partner_id {
            validate_id(partner_id)?;
        }

        let result = sqlx::query("UPDATE pickings SET partner_id = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(partner_id)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Picking", id));
        }
        debug!(id, partner_id = ?partner_id, "Picking partner changed");
        self.get(id).await
    }

    /// Flags the transfer as printed (delivery slip / picking list issued).
    pub async fn mark_printed(&self, id: &str) -> DbResult<Picking> {
        let result = sqlx::query("UPDATE pickings SET printed = 1, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Picking", id));
        }
        info!(id, "Picking printed");
        self.get(id).await
    }

    pub async fn moves(&self, id: &str) -> DbResult<Vec<StockMove>> {
        let mut conn = self.pool.acquire().await?;
        stock_move::for_picking(&mut conn, id).await
    }

    /// Move lines of all moves of the transfer.
    pub async fn move_lines(&self, id: &str) -> DbResult<Vec<MoveLine>> {
        let mut conn = self.pool.acquire().await?;
        stock_move::lines_for_picking(&mut conn, id).await
    }

    /// Total reserved over the transfer's move lines.
    pub async fn reserved_quantity(&self, id: &str) -> DbResult<Quantity> {
        Ok(self.move_lines(id).await?.iter().map(|l| l.reserved_qty).sum())
    }

    // =========================================================================
    // Workflows
    // =========================================================================

    /// Confirms the transfer's draft moves.
    pub async fn action_confirm(&self, id: &str) -> DbResult<Picking> {
        let mut tx = self.pool.begin().await?;
        let picking = fetch_open(&mut *tx, id).await?;

        for mv in stock_move::for_picking(&mut *tx, &picking.id).await? {
            stock_move::confirm_move(&mut *tx, &mv).await?;
        }
        let state = refresh_state(&mut *tx, &picking.id).await?;

        tx.commit().await?;
        info!(id, state = %state_label(state), "Picking confirmed");
        self.get(id).await
    }

    /// Confirms draft moves, then reserves every move that still needs
    /// stock, following the transfer type's owner restriction.
    ///
    /// A move that finds nothing eligible stays `confirmed`; that is not an
    /// error.
    pub async fn action_assign(&self, id: &str) -> DbResult<Picking> {
        let mut tx = self.pool.begin().await?;
        let picking = fetch_open(&mut *tx, id).await?;

        let mut reserved = Quantity::zero();
        for mv in stock_move::for_picking(&mut *tx, &picking.id).await? {
            stock_move::confirm_move(&mut *tx, &mv).await?;
            let mv = match stock_move::fetch(&mut *tx, &mv.id).await? {
                Some(mv) => mv,
                None => continue,
            };
            if mv.state.can_reserve() {
                reserved += stock_move::reserve_move(&mut *tx, &mv).await?;
            }
        }
        let state = refresh_state(&mut *tx, &picking.id).await?;

        tx.commit().await?;
        info!(id, %reserved, state = %state_label(state), "Picking reservation done");
        self.get(id).await
    }

    /// Drops every reservation of the transfer.
    pub async fn do_unreserve(&self, id: &str) -> DbResult<Picking> {
        let mut tx = self.pool.begin().await?;
        let picking = fetch_existing(&mut *tx, id).await?;

        for mv in stock_move::for_picking(&mut *tx, &picking.id).await? {
            if mv.state.is_open() {
                stock_move::unreserve_move(&mut *tx, &mv).await?;
            }
        }
        let state = refresh_state(&mut *tx, &picking.id).await?;

        tx.commit().await?;
        info!(id, state = %state_label(state), "Picking unreserved");
        self.get(id).await
    }

    /// Cancels all moves of the transfer.
    ///
    /// ## Errors
    /// `CoreError::PrintedTransferCancel` ("You cannot cancel a transfer
    /// that is already printed.") when the transfer is printed, its type has
    /// `restrict_cancel_if_printed`, and `ctx` sets neither flag.
    pub async fn action_cancel(&self, id: &str, ctx: CancelContext) -> DbResult<Picking> {
        let mut tx = self.pool.begin().await?;
        let picking = fetch_existing(&mut *tx, id).await?;

        let moves = stock_move::for_picking(&mut *tx, &picking.id).await?;
        stock_move::cancel_moves(&mut *tx, &moves, ctx).await?;
        let state = refresh_state(&mut *tx, &picking.id).await?;

        tx.commit().await?;
        info!(id, state = %state_label(state), "Picking cancel processed");
        self.get(id).await
    }

    /// Merges open moves of the transfer that share product, source and
    /// destination into the first of them.
    ///
    /// Absorbed moves are cancelled with the printed check disabled, so
    /// merging also works on printed transfers. Returns the remaining moves.
    pub async fn merge_moves(&self, id: &str) -> DbResult<Vec<StockMove>> {
        let mut tx = self.pool.begin().await?;
        let picking = fetch_open(&mut *tx, id).await?;

        let moves = stock_move::for_picking(&mut *tx, &picking.id).await?;
        let mut groups: Vec<Vec<StockMove>> = Vec::new();
        for mv in moves.into_iter().filter(|m| m.state.is_open()) {
            match groups.iter_mut().find(|g| same_key(&g[0], &mv)) {
                Some(group) => group.push(mv),
                None => groups.push(vec![mv]),
            }
        }

        let mut merged = 0;
        for group in groups.into_iter().filter(|g| g.len() > 1) {
            let (keeper, absorbed) = group.split_at(1);
            let keeper = &keeper[0];
            let demand: Quantity = group.iter().map(|m| m.product_uom_qty).sum();

            stock_move::cancel_moves(&mut *tx, absorbed, CancelContext::merging()).await?;
            stock_move::set_demand(&mut *tx, &keeper.id, demand).await?;

            if keeper.state != MoveState::Draft && keeper.state != MoveState::Waiting {
                let reserved = stock_move::reserved_for(&mut *tx, &keeper.id).await?;
                stock_move::set_state(&mut *tx, &keeper.id, move_state_for(demand, reserved)).await?;
            }
            merged += absorbed.len();
            debug!(keeper = %keeper.id, absorbed = absorbed.len(), %demand, "Merged moves");
        }
        refresh_state(&mut *tx, &picking.id).await?;

        let remaining: Vec<StockMove> = stock_move::for_picking(&mut *tx, &picking.id)
            .await?
            .into_iter()
            .filter(|m| m.state != MoveState::Cancel)
            .collect();

        tx.commit().await?;
        info!(id, merged, "Picking moves merged");
        Ok(remaining)
    }
}

fn required(field: &str) -> DbError {
    ValidationError::Required {
        field: field.to_string(),
    }
    .into()
}

fn same_key(a: &StockMove, b: &StockMove) -> bool {
    a.product_id == b.product_id
        && a.location_id == b.location_id
        && a.location_dest_id == b.location_dest_id
}

// =============================================================================
// Connection-level helpers
// =============================================================================

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Picking>> {
    let picking = sqlx::query_as::<_, Picking>(&format!(
        "SELECT {} FROM pickings WHERE id = ?1",
        PICKING_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(picking)
}

async fn fetch_existing(conn: &mut SqliteConnection, id: &str) -> DbResult<Picking> {
    fetch(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("Picking", id))
}

/// Like `fetch_existing`, but done and cancelled transfers are refused.
async fn fetch_open(conn: &mut SqliteConnection, id: &str) -> DbResult<Picking> {
    let picking = fetch_existing(conn, id).await?;
    if matches!(picking.state, PickingState::Done | PickingState::Cancel) {
        return Err(CoreError::invalid_state("Picking", id, state_label(picking.state)).into());
    }
    Ok(picking)
}

/// Recomputes and stores the transfer state from its moves.
pub(crate) async fn refresh_state(
    conn: &mut SqliteConnection,
    picking_id: &str,
) -> DbResult<PickingState> {
    let picking = fetch_existing(conn, picking_id).await?;
    let states: Vec<MoveState> = stock_move::for_picking(conn, picking_id)
        .await?
        .into_iter()
        .map(|m| m.state)
        .collect();

    let state = picking_state_for(picking.move_type, &states);
    if state != picking.state {
        sqlx::query("UPDATE pickings SET state = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(state)
            .bind(Utc::now())
            .bind(picking_id)
            .execute(&mut *conn)
            .await?;
        debug!(
            picking_id,
            from = %state_label(picking.state),
            to = %state_label(state),
            "Picking state changed"
        );
    }
    Ok(state)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::stock_move::NewMove;
    use crate::repository::test_support::{scenario, Scenario};

    async fn with_move(s: &Scenario, units: i64) -> StockMove {
        s.db.moves()
            .create(
                &NewMove::new("Test move", &s.product.id, Quantity::from_units(units))
                    .picking(&s.picking.id),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_uses_type_defaults() {
        let s = scenario().await;
        assert_eq!(s.picking.location_id, s.stock.id);
        assert_eq!(s.picking.location_dest_id, s.customers.id);
        assert_eq!(s.picking.state, PickingState::Draft);
        assert!(!s.picking.printed);
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let s = scenario().await;
        let err = s
            .db
            .pickings()
            .create(&NewPicking::new("WH/OUT/00001", &s.picking_type.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_confirm_then_assign() {
        let s = scenario().await;
        with_move(&s, 1000).await;

        let picking = s.db.pickings().action_confirm(&s.picking.id).await.unwrap();
        assert_eq!(picking.state, PickingState::Confirmed);

        let picking = s.db.pickings().action_assign(&s.picking.id).await.unwrap();
        assert_eq!(picking.state, PickingState::Assigned);
        assert_eq!(
            s.db.pickings().reserved_quantity(&s.picking.id).await.unwrap(),
            Quantity::from_units(1000)
        );
    }

    #[tokio::test]
    async fn test_one_shot_transfer_waits_for_everything() {
        let s = scenario().await;
        let picking = s
            .db
            .pickings()
            .create(
                &NewPicking::new("WH/OUT/00002", &s.picking_type.id)
                    .partner(&s.customer.id)
                    .move_type(MoveType::One),
            )
            .await
            .unwrap();
        s.db.moves()
            .create(
                &NewMove::new("Too much", &s.product.id, Quantity::from_units(1500))
                    .picking(&picking.id),
            )
            .await
            .unwrap();

        let picking = s.db.pickings().action_assign(&picking.id).await.unwrap();
        assert_eq!(picking.state, PickingState::Confirmed);
        assert_eq!(
            s.db.pickings().reserved_quantity(&picking.id).await.unwrap(),
            Quantity::from_units(1000)
        );
    }

    #[tokio::test]
    async fn test_unreserve_returns_to_confirmed() {
        let s = scenario().await;
        with_move(&s, 1000).await;
        s.db.pickings().action_assign(&s.picking.id).await.unwrap();

        let picking = s.db.pickings().do_unreserve(&s.picking.id).await.unwrap();
        assert_eq!(picking.state, PickingState::Confirmed);
        assert!(s.db.pickings().move_lines(&s.picking.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_printed_transfer_is_rejected() {
        let s = scenario().await;
        with_move(&s, 10).await;
        s.db.pickings().action_assign(&s.picking.id).await.unwrap();
        s.db.pickings().mark_printed(&s.picking.id).await.unwrap();

        let err = s
            .db
            .pickings()
            .action_cancel(&s.picking.id, CancelContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You cannot cancel a transfer that is already printed.");

        // nothing changed
        let picking = s.db.pickings().get(&s.picking.id).await.unwrap();
        assert_eq!(picking.state, PickingState::Assigned);
        assert_eq!(s.db.pickings().move_lines(&s.picking.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_with_backorder_context() {
        let s = scenario().await;
        with_move(&s, 10).await;
        s.db.pickings().action_assign(&s.picking.id).await.unwrap();
        s.db.pickings().mark_printed(&s.picking.id).await.unwrap();

        let picking = s
            .db
            .pickings()
            .action_cancel(&s.picking.id, CancelContext::backorder())
            .await
            .unwrap();
        assert_eq!(picking.state, PickingState::Cancel);

        for quant in s.db.quants().internal_for_product(&s.product.id).await.unwrap() {
            assert_eq!(quant.reserved_quantity, Quantity::zero());
        }
    }

    #[tokio::test]
    async fn test_assign_on_cancelled_transfer() {
        let s = scenario().await;
        with_move(&s, 10).await;
        s.db.pickings()
            .action_cancel(&s.picking.id, CancelContext::default())
            .await
            .unwrap();

        let err = s.db.pickings().action_assign(&s.picking.id).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_merge_moves_on_printed_transfer() {
        let s = scenario().await;
        with_move(&s, 300).await;
        with_move(&s, 200).await;
        s.db.pickings().action_assign(&s.picking.id).await.unwrap();
        s.db.pickings().mark_printed(&s.picking.id).await.unwrap();

        let remaining = s.db.pickings().merge_moves(&s.picking.id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].product_uom_qty, Quantity::from_units(500));
        assert_eq!(remaining[0].state, MoveState::PartiallyAvailable);

        let picking = s.db.pickings().action_assign(&s.picking.id).await.unwrap();
        assert_eq!(picking.state, PickingState::Assigned);
        assert_eq!(
            s.db.moves().reserved_availability(&remaining[0].id).await.unwrap(),
            Quantity::from_units(500)
        );
    }

    #[tokio::test]
    async fn test_set_partner_validates_id() {
        let s = scenario().await;
        assert!(s.db.pickings().set_partner(&s.picking.id, Some("nope")).await.is_err());

        let picking = s.db.pickings().set_partner(&s.picking.id, None).await.unwrap();
        assert!(picking.partner_id.is_none());
    }
}
