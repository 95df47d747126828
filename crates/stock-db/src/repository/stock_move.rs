//! # Stock Move Repository
//!
//! Moves, their move lines, and the per-move reservation steps that the
//! transfer workflows in [`crate::repository::picking`] are built from.
//!
//! ## Reserving One Move
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve_move(conn, move)                                              │
//! │       │                                                                 │
//! │       ├── need = demand - already reserved                             │
//! │       ├── policy  ← picking type (move's, else its transfer's)         │
//! │       ├── partner ← transfer's partner                                 │
//! │       ├── quants  ← gather(product, source location + children)        │
//! │       ├── eligible_quants(policy, partner, quants)                     │
//! │       ├── plan_reservation(need, eligible)                             │
//! │       │                                                                 │
//! │       ├── per chunk: INSERT move_line (owner = quant owner)            │
//! │       │              quant.reserved_quantity += chunk                  │
//! │       └── state ← move_state_for(demand, reserved)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step takes a `&mut SqliteConnection` so that a whole transfer can
//! be processed inside one transaction.

use chrono::Utc;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{generate_id, picking, picking_type, quant};
use stock_core::cancel::{ensure_cancellable, CancelTarget};
use stock_core::reservation::{move_state_for, plan_reservation};
use stock_core::validation::{validate_demand, validate_name};
use stock_core::{
    eligible_quants, CancelContext, CoreError, MoveLine, MoveState, OwnerFilter,
    OwnerRestriction, PickingState, Quantity, StockMove,
};

const MOVE_COLUMNS: &str = "id, name, product_id, picking_id, picking_type_id, location_id, \
     location_dest_id, product_uom_qty, state, created_at";

const MOVE_LINE_COLUMNS: &str = "id, move_id, picking_id, product_id, quant_id, location_id, \
     location_dest_id, lot_id, owner_id, reserved_qty, created_at";

// =============================================================================
// New Move
// =============================================================================

/// Input for [`StockMoveRepository::create`].
///
/// Unset type and locations are taken from the transfer.
#[derive(Debug, Clone)]
pub struct NewMove {
    pub name: String,
    pub product_id: String,
    pub product_uom_qty: Quantity,
    pub picking_id: Option<String>,
    pub picking_type_id: Option<String>,
    pub location_id: Option<String>,
    pub location_dest_id: Option<String>,
}

impl NewMove {
    pub fn new(name: &str, product_id: &str, product_uom_qty: Quantity) -> Self {
        NewMove {
            name: name.to_string(),
            product_id: product_id.to_string(),
            product_uom_qty,
            picking_id: None,
            picking_type_id: None,
            location_id: None,
            location_dest_id: None,
        }
    }

    pub fn picking(mut self, picking_id: &str) -> Self {
        self.picking_id = Some(picking_id.to_string());
        self
    }

    pub fn picking_type(mut self, picking_type_id: &str) -> Self {
        self.picking_type_id = Some(picking_type_id.to_string());
        self
    }

    pub fn locations(mut self, location_id: &str, location_dest_id: &str) -> Self {
        self.location_id = Some(location_id.to_string());
        self.location_dest_id = Some(location_dest_id.to_string());
        self
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for moves and move lines.
///
/// Moves usually belong to a transfer and are driven through
/// [`PickingRepository`](crate::repository::picking::PickingRepository);
/// the move-level actions here serve moves without one, or callers that
/// need to act on a subset of a transfer.
#[derive(Debug, Clone)]
pub struct StockMoveRepository {
    pool: SqlitePool,
}

impl StockMoveRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockMoveRepository { pool }
    }

    /// Creates a draft move.
    ///
    /// ## Errors
    /// - `Validation` for an empty name or a non-positive demand
    /// - `Validation(Required)` when locations are neither given nor
    ///   available from the transfer
    /// - `InvalidState` when the transfer is done or cancelled
    pub async fn create(&self, new: &NewMove) -> DbResult<StockMove> {
        validate_name("name", &new.name)?;
        validate_demand(new.product_uom_qty)?;

        let mut tx = self.pool.begin().await?;

        let parent = match &new.picking_id {
            Some(picking_id) => Some(
                picking::fetch(&mut *tx, picking_id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Picking", picking_id.as_str()))?,
            ),
            None => None,
        };
        if let Some(parent) = &parent {
            if matches!(parent.state, PickingState::Done | PickingState::Cancel) {
                return Err(
                    CoreError::invalid_state("Picking", parent.id.as_str(), state_label(parent.state))
                        .into(),
                );
            }
        }

        let location_id = new
            .location_id
            .clone()
            .or_else(|| parent.as_ref().map(|p| p.location_id.clone()))
            .ok_or_else(|| required("location_id"))?;
        let location_dest_id = new
            .location_dest_id
            .clone()
            .or_else(|| parent.as_ref().map(|p| p.location_dest_id.clone()))
            .ok_or_else(|| required("location_dest_id"))?;

        let mv = StockMove {
            id: generate_id(),
            name: new.name.trim().to_string(),
            product_id: new.product_id.clone(),
            picking_id: new.picking_id.clone(),
            picking_type_id: new
                .picking_type_id
                .clone()
                .or_else(|| parent.as_ref().map(|p| p.picking_type_id.clone())),
            location_id,
            location_dest_id,
            product_uom_qty: new.product_uom_qty,
            state: MoveState::Draft,
            created_at: Utc::now(),
        };
        debug!(
            id = %mv.id,
            product_id = %mv.product_id,
            picking_id = ?mv.picking_id,
            demand = %mv.product_uom_qty,
            "Creating move"
        );

        sqlx::query(
            "INSERT INTO stock_moves (id, name, product_id, picking_id, picking_type_id, \
             location_id, location_dest_id, product_uom_qty, state, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&mv.id)
        .bind(&mv.name)
        .bind(&mv.product_id)
        .bind(&mv.picking_id)
        .bind(&mv.picking_type_id)
        .bind(&mv.location_id)
        .bind(&mv.location_dest_id)
        .bind(mv.product_uom_qty)
        .bind(mv.state)
        .bind(mv.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(picking_id) = &mv.picking_id {
            picking::refresh_state(&mut *tx, picking_id).await?;
        }

        tx.commit().await?;
        Ok(mv)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockMove>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    pub async fn get(&self, id: &str) -> DbResult<StockMove> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("StockMove", id))
    }

    pub async fn move_lines(&self, move_id: &str) -> DbResult<Vec<MoveLine>> {
        let mut conn = self.pool.acquire().await?;
        lines_for_move(&mut conn, move_id).await
    }

    /// Quantity currently reserved for the move (sum of its move lines).
    pub async fn reserved_availability(&self, move_id: &str) -> DbResult<Quantity> {
        let mut conn = self.pool.acquire().await?;
        reserved_for(&mut conn, move_id).await
    }

    /// Confirms a draft move.
    pub async fn action_confirm(&self, move_id: &str) -> DbResult<StockMove> {
        let mut tx = self.pool.begin().await?;
        let mv = fetch_existing(&mut *tx, move_id).await?;
        confirm_move(&mut *tx, &mv).await?;
        refresh_parent(&mut *tx, &mv).await?;
        let mv = fetch_existing(&mut *tx, move_id).await?;
        tx.commit().await?;
        Ok(mv)
    }

    /// Confirms the move if needed, then reserves what its policy allows.
    pub async fn action_assign(&self, move_id: &str) -> DbResult<StockMove> {
        let mut tx = self.pool.begin().await?;
        let mv = fetch_existing(&mut *tx, move_id).await?;
        if !mv.state.is_open() {
            return Err(CoreError::invalid_state("StockMove", move_id, state_label(mv.state)).into());
        }

        confirm_move(&mut *tx, &mv).await?;
        let mv = fetch_existing(&mut *tx, move_id).await?;
        if mv.state.can_reserve() {
            reserve_move(&mut *tx, &mv).await?;
        }
        refresh_parent(&mut *tx, &mv).await?;

        let mv = fetch_existing(&mut *tx, move_id).await?;
        tx.commit().await?;
        Ok(mv)
    }

    /// Drops all reservations of the move.
    pub async fn do_unreserve(&self, move_id: &str) -> DbResult<StockMove> {
        let mut tx = self.pool.begin().await?;
        let mv = fetch_existing(&mut *tx, move_id).await?;
        unreserve_move(&mut *tx, &mv).await?;
        refresh_parent(&mut *tx, &mv).await?;
        let mv = fetch_existing(&mut *tx, move_id).await?;
        tx.commit().await?;
        Ok(mv)
    }

    /// Cancels the given moves, all or nothing.
    ///
    /// ## Errors
    /// `CoreError::PrintedTransferCancel` if any move belongs to a printed
    /// transfer whose type restricts cancelling, unless `ctx` bypasses the
    /// check. Nothing is cancelled in that case.
    pub async fn action_cancel(&self, move_ids: &[&str], ctx: CancelContext) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let mut moves = Vec::with_capacity(move_ids.len());
        for move_id in move_ids {
            moves.push(fetch_existing(&mut *tx, move_id).await?);
        }
        cancel_moves(&mut *tx, &moves, ctx).await?;

        let mut parents: Vec<&str> = moves.iter().filter_map(|m| m.picking_id.as_deref()).collect();
        parents.sort_unstable();
        parents.dedup();
        for picking_id in parents {
            picking::refresh_state(&mut *tx, picking_id).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

// =============================================================================
// Connection-level steps
// =============================================================================

fn required(field: &str) -> DbError {
    stock_core::ValidationError::Required {
        field: field.to_string(),
    }
    .into()
}

/// Persisted text of a state enum, for messages.
pub(crate) fn state_label<S: Serialize + std::fmt::Debug>(state: S) -> String {
    serde_json::to_value(&state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", state))
}

pub(crate) async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<StockMove>> {
    let mv = sqlx::query_as::<_, StockMove>(&format!(
        "SELECT {} FROM stock_moves WHERE id = ?1",
        MOVE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(mv)
}

async fn fetch_existing(conn: &mut SqliteConnection, id: &str) -> DbResult<StockMove> {
    fetch(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found("StockMove", id))
}

async fn refresh_parent(conn: &mut SqliteConnection, mv: &StockMove) -> DbResult<()> {
    if let Some(picking_id) = &mv.picking_id {
        picking::refresh_state(conn, picking_id).await?;
    }
    Ok(())
}

/// Moves of a transfer in creation order.
pub(crate) async fn for_picking(
    conn: &mut SqliteConnection,
    picking_id: &str,
) -> DbResult<Vec<StockMove>> {
    let moves = sqlx::query_as::<_, StockMove>(&format!(
        "SELECT {} FROM stock_moves WHERE picking_id = ?1 ORDER BY created_at, rowid",
        MOVE_COLUMNS
    ))
    .bind(picking_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(moves)
}

pub(crate) async fn lines_for_move(
    conn: &mut SqliteConnection,
    move_id: &str,
) -> DbResult<Vec<MoveLine>> {
    let lines = sqlx::query_as::<_, MoveLine>(&format!(
        "SELECT {} FROM move_lines WHERE move_id = ?1 ORDER BY created_at, rowid",
        MOVE_LINE_COLUMNS
    ))
    .bind(move_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

pub(crate) async fn lines_for_picking(
    conn: &mut SqliteConnection,
    picking_id: &str,
) -> DbResult<Vec<MoveLine>> {
    let lines = sqlx::query_as::<_, MoveLine>(&format!(
        "SELECT {} FROM move_lines WHERE picking_id = ?1 ORDER BY created_at, rowid",
        MOVE_LINE_COLUMNS
    ))
    .bind(picking_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

pub(crate) async fn reserved_for(conn: &mut SqliteConnection, move_id: &str) -> DbResult<Quantity> {
    let milli: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(reserved_qty), 0) FROM move_lines WHERE move_id = ?1")
            .bind(move_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(Quantity::from_milli(milli))
}

pub(crate) async fn set_state(
    conn: &mut SqliteConnection,
    move_id: &str,
    state: MoveState,
) -> DbResult<()> {
    sqlx::query("UPDATE stock_moves SET state = ?1 WHERE id = ?2")
        .bind(state)
        .bind(move_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub(crate) async fn set_demand(
    conn: &mut SqliteConnection,
    move_id: &str,
    demand: Quantity,
) -> DbResult<()> {
    sqlx::query("UPDATE stock_moves SET product_uom_qty = ?1 WHERE id = ?2")
        .bind(demand)
        .bind(move_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Draft moves become confirmed; other states are left alone.
pub(crate) async fn confirm_move(conn: &mut SqliteConnection, mv: &StockMove) -> DbResult<()> {
    if mv.state == MoveState::Draft {
        set_state(conn, &mv.id, MoveState::Confirmed).await?;
        debug!(move_id = %mv.id, "Move confirmed");
    }
    Ok(())
}

/// Policy and partner that apply to a move.
async fn restriction_for(
    conn: &mut SqliteConnection,
    mv: &StockMove,
) -> DbResult<(OwnerRestriction, Option<String>)> {
    let parent = match &mv.picking_id {
        Some(picking_id) => picking::fetch(conn, picking_id).await?,
        None => None,
    };

    let type_id = mv
        .picking_type_id
        .clone()
        .or_else(|| parent.as_ref().map(|p| p.picking_type_id.clone()));
    let policy = match type_id {
        Some(type_id) => picking_type::fetch(conn, &type_id)
            .await?
            .map(|t| t.owner_restriction)
            .unwrap_or_default(),
        None => OwnerRestriction::default(),
    };

    Ok((policy, parent.and_then(|p| p.partner_id)))
}

/// Reserves as much of the move's open demand as its policy allows.
///
/// Returns the quantity reserved by this call.
pub(crate) async fn reserve_move(conn: &mut SqliteConnection, mv: &StockMove) -> DbResult<Quantity> {
    let already = reserved_for(conn, &mv.id).await?;
    let need = mv.product_uom_qty.saturating_sub_to_zero(already);

    let (policy, partner_id) = restriction_for(conn, mv).await?;
    let quants = quant::gather(conn, &mv.product_id, &mv.location_id, &OwnerFilter::Any).await?;
    let plan = plan_reservation(need, eligible_quants(policy, partner_id.as_deref(), &quants));

    let now = Utc::now();
    for chunk in &plan.chunks {
        sqlx::query(
            "INSERT INTO move_lines (id, move_id, picking_id, product_id, quant_id, location_id, \
             location_dest_id, lot_id, owner_id, reserved_qty, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(generate_id())
        .bind(&mv.id)
        .bind(&mv.picking_id)
        .bind(&mv.product_id)
        .bind(&chunk.quant_id)
        .bind(&mv.location_id)
        .bind(&mv.location_dest_id)
        .bind(&chunk.lot_id)
        .bind(&chunk.owner_id)
        .bind(chunk.quantity)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        quant::add_reserved(conn, &chunk.quant_id, chunk.quantity).await?;
    }

    let reserved = already + plan.total();
    let state = move_state_for(mv.product_uom_qty, reserved);
    set_state(conn, &mv.id, state).await?;

    debug!(
        move_id = %mv.id,
        product_id = %mv.product_id,
        %policy,
        partner_id = ?partner_id,
        candidates = quants.len(),
        lines = plan.chunks.len(),
        reserved = %plan.total(),
        state = %state_label(state),
        "Reserved move"
    );
    Ok(plan.total())
}

/// Deletes the move's lines and gives their quantity back to the quants.
pub(crate) async fn unreserve_move(conn: &mut SqliteConnection, mv: &StockMove) -> DbResult<()> {
    let lines = lines_for_move(conn, &mv.id).await?;
    if lines.is_empty() {
        return Ok(());
    }

    for line in &lines {
        quant::add_reserved(conn, &line.quant_id, Quantity::zero() - line.reserved_qty).await?;
    }
    sqlx::query("DELETE FROM move_lines WHERE move_id = ?1")
        .bind(&mv.id)
        .execute(&mut *conn)
        .await?;

    if matches!(mv.state, MoveState::PartiallyAvailable | MoveState::Assigned) {
        set_state(conn, &mv.id, MoveState::Confirmed).await?;
    }

    debug!(move_id = %mv.id, lines = lines.len(), "Unreserved move");
    Ok(())
}

/// Checks the printed-transfer guard for all moves, then cancels them.
pub(crate) async fn cancel_moves(
    conn: &mut SqliteConnection,
    moves: &[StockMove],
    ctx: CancelContext,
) -> DbResult<()> {
    // `printed` belongs to the transfer, the restriction to the move's own type.
    let mut flags: Vec<(String, bool, bool)> = Vec::new();
    for mv in moves {
        let row: Option<(String, bool, bool)> = sqlx::query_as(
            "SELECT p.id, p.printed, COALESCE(pt.restrict_cancel_if_printed, 0) \
             FROM stock_moves m \
             JOIN pickings p ON p.id = m.picking_id \
             LEFT JOIN picking_types pt ON pt.id = m.picking_type_id \
             WHERE m.id = ?1",
        )
        .bind(&mv.id)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(flag) = row {
            flags.push(flag);
        }
    }

    let targets = flags.iter().map(|(picking_id, printed, restrict)| CancelTarget {
        picking_id: picking_id.as_str(),
        printed: *printed,
        restrict_cancel_if_printed: *restrict,
    });
    if let Err(err) = ensure_cancellable(targets, ctx) {
        warn!(error = %err, ?ctx, moves = moves.len(), "Cancel rejected");
        return Err(err.into());
    }

    for mv in moves.iter().filter(|m| m.state.is_open()) {
        unreserve_move(conn, mv).await?;
        set_state(conn, &mv.id, MoveState::Cancel).await?;
    }

    info!(moves = moves.len(), ?ctx, "Moves cancelled");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::picking_type::NewPickingType;
    use crate::repository::test_support::scenario;
    use stock_core::PickingTypeCode;

    #[tokio::test]
    async fn test_create_takes_defaults_from_transfer() {
        let s = scenario().await;
        let mv = s
            .db
            .moves()
            .create(&NewMove::new("Test move", &s.product.id, Quantity::from_units(1000)).picking(&s.picking.id))
            .await
            .unwrap();

        assert_eq!(mv.location_id, s.stock.id);
        assert_eq!(mv.location_dest_id, s.customers.id);
        assert_eq!(mv.picking_type_id.as_deref(), Some(s.picking_type.id.as_str()));
        assert_eq!(mv.state, MoveState::Draft);
    }

    #[tokio::test]
    async fn test_create_validates_demand() {
        let s = scenario().await;
        let err = s
            .db
            .moves()
            .create(&NewMove::new("Zero", &s.product.id, Quantity::zero()).picking(&s.picking.id))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_without_locations() {
        let s = scenario().await;
        let err = s
            .db
            .moves()
            .create(&NewMove::new("Loose", &s.product.id, Quantity::from_units(1)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation error: location_id is required");
    }

    #[tokio::test]
    async fn test_move_without_transfer_uses_standard_policy() {
        let s = scenario().await;
        let mv = s
            .db
            .moves()
            .create(
                &NewMove::new("Loose", &s.product.id, Quantity::from_units(600))
                    .locations(&s.stock.id, &s.customers.id),
            )
            .await
            .unwrap();

        let mv = s.db.moves().action_assign(&mv.id).await.unwrap();
        assert_eq!(mv.state, MoveState::Assigned);
        assert_eq!(
            s.db.moves().reserved_availability(&mv.id).await.unwrap(),
            Quantity::from_units(600)
        );

        let lines = s.db.moves().move_lines(&mv.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].reserved_qty, Quantity::from_units(100));
    }

    #[tokio::test]
    async fn test_reserve_is_incremental() {
        let s = scenario().await;
        s.db.picking_types()
            .set_owner_restriction(&s.picking_type.id, OwnerRestriction::UnassignedOwner)
            .await
            .unwrap();
        let mv = s
            .db
            .moves()
            .create(&NewMove::new("Test move", &s.product.id, Quantity::from_units(1000)).picking(&s.picking.id))
            .await
            .unwrap();

        let mv = s.db.moves().action_assign(&mv.id).await.unwrap();
        assert_eq!(mv.state, MoveState::PartiallyAvailable);

        // widen the policy: only the missing 500 is added
        s.db.picking_types()
            .set_owner_restriction(&s.picking_type.id, OwnerRestriction::StandardBehavior)
            .await
            .unwrap();
        let mv = s.db.moves().action_assign(&mv.id).await.unwrap();
        assert_eq!(mv.state, MoveState::Assigned);
        assert_eq!(s.db.moves().move_lines(&mv.id).await.unwrap().len(), 2);
        assert_eq!(
            s.db.moves().reserved_availability(&mv.id).await.unwrap(),
            Quantity::from_units(1000)
        );
    }

    #[tokio::test]
    async fn test_unreserve_releases_quants() {
        let s = scenario().await;
        let mv = s
            .db
            .moves()
            .create(&NewMove::new("Test move", &s.product.id, Quantity::from_units(700)).picking(&s.picking.id))
            .await
            .unwrap();
        s.db.moves().action_assign(&mv.id).await.unwrap();

        let mv = s.db.moves().do_unreserve(&mv.id).await.unwrap();
        assert_eq!(mv.state, MoveState::Confirmed);
        assert!(s.db.moves().move_lines(&mv.id).await.unwrap().is_empty());

        for quant in s.db.quants().internal_for_product(&s.product.id).await.unwrap() {
            assert_eq!(quant.reserved_quantity, Quantity::zero());
        }
    }

    #[tokio::test]
    async fn test_assign_cancelled_move_fails() {
        let s = scenario().await;
        let mv = s
            .db
            .moves()
            .create(&NewMove::new("Test move", &s.product.id, Quantity::from_units(1)).picking(&s.picking.id))
            .await
            .unwrap();
        s.db.moves()
            .action_cancel(&[mv.id.as_str()], CancelContext::default())
            .await
            .unwrap();

        let err = s.db.moves().action_assign(&mv.id).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("StockMove {} is cancel, cannot perform operation", mv.id)
        );
    }

    #[tokio::test]
    async fn test_cancel_guard_reads_the_move_type() {
        let s = scenario().await;
        s.db.picking_types()
            .set_restrict_cancel_if_printed(&s.picking_type.id, false)
            .await
            .unwrap();
        let strict = s
            .db
            .picking_types()
            .create(&NewPickingType::new("Strict Delivery", PickingTypeCode::Outgoing))
            .await
            .unwrap();
        let mv = s
            .db
            .moves()
            .create(
                &NewMove::new("Test move", &s.product.id, Quantity::from_units(1))
                    .picking(&s.picking.id)
                    .picking_type(&strict.id),
            )
            .await
            .unwrap();
        s.db.pickings().mark_printed(&s.picking.id).await.unwrap();

        let err = s
            .db
            .moves()
            .action_cancel(&[mv.id.as_str()], CancelContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You cannot cancel a transfer that is already printed.");
        assert_eq!(s.db.moves().get(&mv.id).await.unwrap().state, MoveState::Draft);
    }

    #[tokio::test]
    async fn test_cancel_allowed_when_move_type_does_not_restrict() {
        let s = scenario().await;
        let lenient = s
            .db
            .picking_types()
            .create(&NewPickingType {
                restrict_cancel_if_printed: false,
                ..NewPickingType::new("Lenient Delivery", PickingTypeCode::Outgoing)
            })
            .await
            .unwrap();
        let mv = s
            .db
            .moves()
            .create(
                &NewMove::new("Test move", &s.product.id, Quantity::from_units(1))
                    .picking(&s.picking.id)
                    .picking_type(&lenient.id),
            )
            .await
            .unwrap();
        s.db.pickings().mark_printed(&s.picking.id).await.unwrap();

        s.db.moves()
            .action_cancel(&[mv.id.as_str()], CancelContext::default())
            .await
            .unwrap();
        assert_eq!(s.db.moves().get(&mv.id).await.unwrap().state, MoveState::Cancel);
    }

    #[test]
    fn test_state_label() {
        assert_eq!(state_label(MoveState::PartiallyAvailable), "partially_available");
        assert_eq!(state_label(MoveState::Cancel), "cancel");
    }
}
