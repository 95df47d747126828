//! # Reservation
//!
//! Greedy reservation of quants for a move, plus the move/transfer state
//! rules that follow from it.
//!
//! ## Reservation Walkthrough
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Move: 1000 units, policy = partner_or_unassigned, partner = O         │
//! │                                                                         │
//! │  quants (in_date order)          eligible?   take                      │
//! │  ───────────────────────────     ─────────   ────                      │
//! │  Q1  500  owner: -               yes         500   → MoveLine(-)       │
//! │  Q2  500  owner: O               yes         500   → MoveLine(O)       │
//! │  Q3  200  owner: X               no            -                       │
//! │                                                                         │
//! │  reserved 1000 / 1000 → move Assigned                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Filtering happens before this module sees the quants (see
//! [`crate::policy::eligible_quants`]); reserving never reorders them.

use serde::{Deserialize, Serialize};

use crate::quantity::Quantity;
use crate::types::{MoveState, MoveType, PickingState, Quant};

// =============================================================================
// Greedy Reservation
// =============================================================================

/// One chunk taken from one quant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedChunk {
    pub quant_id: String,
    pub lot_id: Option<String>,
    /// Copied from the quant; becomes the move line's owner.
    pub owner_id: Option<String>,
    pub quantity: Quantity,
}

/// Result of reserving for one move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationPlan {
    pub chunks: Vec<ReservedChunk>,
}

impl ReservationPlan {
    pub fn total(&self) -> Quantity {
        self.chunks.iter().map(|c| c.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Takes free quantity from `quants`, in the given order, until `need` is
/// covered or the quants run out.
///
/// Quants with no free quantity are skipped. The total never exceeds
/// `need` nor the free quantity of the input.
pub fn plan_reservation<'q, I>(need: Quantity, quants: I) -> ReservationPlan
where
    I: IntoIterator<Item = &'q Quant>,
{
    let mut remaining = need;
    let mut chunks = Vec::new();

    for quant in quants {
        if !remaining.is_positive() {
            break;
        }
        let free = quant.free_quantity();
        if !free.is_positive() {
            continue;
        }
        let take = remaining.min(free);
        remaining -= take;
        chunks.push(ReservedChunk {
            quant_id: quant.id.clone(),
            lot_id: quant.lot_id.clone(),
            owner_id: quant.owner_id.clone(),
            quantity: take,
        });
    }

    ReservationPlan { chunks }
}

// =============================================================================
// State Rules
// =============================================================================

/// State of an open move given what is reserved against its demand.
pub fn move_state_for(demand: Quantity, reserved: Quantity) -> MoveState {
    if !reserved.is_positive() {
        MoveState::Confirmed
    } else if reserved >= demand {
        MoveState::Assigned
    } else {
        MoveState::PartiallyAvailable
    }
}

/// Transfer state computed from its moves.
///
/// ## Rules
/// ```text
/// no moves / all draft           → draft
/// all cancel                     → cancel
/// all done or cancel             → done
/// open moves, direct transfer    → assigned if any assigned/partial
/// open moves, one-shot transfer  → assigned if all assigned
/// otherwise                      → waiting if any waiting, else confirmed
/// ```
pub fn picking_state_for(move_type: MoveType, moves: &[MoveState]) -> PickingState {
    if moves.is_empty() || moves.iter().all(|s| *s == MoveState::Draft) {
        return PickingState::Draft;
    }
    if moves.iter().all(|s| *s == MoveState::Cancel) {
        return PickingState::Cancel;
    }
    if moves.iter().all(|s| !s.is_open()) {
        return PickingState::Done;
    }

    let open: Vec<MoveState> = moves.iter().copied().filter(MoveState::is_open).collect();

    let ready = match move_type {
        MoveType::Direct => open
            .iter()
            .any(|s| matches!(s, MoveState::Assigned | MoveState::PartiallyAvailable)),
        MoveType::One => open.iter().all(|s| *s == MoveState::Assigned),
    };
    if ready {
        return PickingState::Assigned;
    }

    if open.iter().any(|s| *s == MoveState::Waiting) {
        PickingState::Waiting
    } else if open.iter().all(|s| *s == MoveState::Draft) {
        PickingState::Draft
    } else {
        PickingState::Confirmed
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
