//! # Domain Types
//!
//! Records of the warehouse model, shared by the rules in this crate and the
//! repositories in `stock-db`.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐ 1   * ┌─────────────────┐ 1   * ┌──────────────┐  │
//! │  │  PickingType    │──────►│   StockMove     │──────►│  MoveLine    │  │
//! │  │  ─────────────  │       │  ─────────────  │       │ ──────────── │  │
//! │  │  owner_restr.   │       │  product_id     │       │ quant_id     │  │
//! │  │  restrict_cancel│       │  product_uom_qty│       │ owner_id     │  │
//! │  └─────────────────┘       │  state          │       │ reserved_qty │  │
//! │                            └────────┬────────┘       └──────┬───────┘  │
//! │  ┌─────────────────┐                │ *                     │ 1        │
//! │  │    Picking      │◄───────────────┘                       ▼          │
//! │  │  ─────────────  │ 1                             ┌──────────────┐    │
//! │  │  partner_id     │                               │    Quant     │    │
//! │  │  state, printed │                               │ owner_id?    │    │
//! │  └─────────────────┘                               │ quantity     │    │
//! │                                                    └──────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! Every record is keyed by a UUID v4 string. Optional references
//! (`owner_id`, `partner_id`, `lot_id`) are `Option<String>`; there is no
//! sentinel "no owner" value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::policy::OwnerRestriction;
use crate::quantity::Quantity;

// =============================================================================
// Partner
// =============================================================================

/// A party: customer, supplier, or owner of consigned stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Location
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum LocationUsage {
    /// Physical stock owned by the company. Only these count as available.
    Internal,
    Customer,
    Supplier,
    /// Grouping node; holds no stock itself.
    View,
    /// Inventory adjustments / scrap counterpart.
    Inventory,
}

/// A stock location.
///
/// `parent_path` is the materialized chain of ids from the root, each
/// followed by `/` (e.g. `"wh/stock/shelf-1/"`). "Location and children"
/// lookups are a prefix match on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Location {
    pub id: String,
    pub name: String,
    pub usage: LocationUsage,
    pub parent_id: Option<String>,
    pub parent_path: String,
}

impl Location {
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.usage == LocationUsage::Internal
    }

    /// True if `other` is this location or one of its descendants.
    pub fn contains(&self, other: &Location) -> bool {
        other.parent_path.starts_with(&self.parent_path)
    }
}

// =============================================================================
// Product & Lot
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Internal reference shown next to the name.
    pub default_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A lot / serial number of a product.
///
/// Archived lots (`active == false`) are hidden from default listings but
/// keep their history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Lot {
    pub id: String,
    pub name: String,
    pub product_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Quant
// =============================================================================

/// On-hand quantity of a product at a location, optionally owned by a
/// third party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Quant {
    pub id: String,
    pub product_id: String,
    pub location_id: String,
    pub lot_id: Option<String>,
    /// Owner of consigned stock; `None` means company-owned.
    pub owner_id: Option<String>,
    pub quantity: Quantity,
    pub reserved_quantity: Quantity,
    /// Incoming date; oldest quants are reserved first.
    #[ts(as = "String")]
    pub in_date: DateTime<Utc>,
}

impl Quant {
    /// Quantity not yet reserved by any move line (never negative).
    #[inline]
    pub fn free_quantity(&self) -> Quantity {
        self.quantity.saturating_sub_to_zero(self.reserved_quantity)
    }

    #[inline]
    pub fn is_owned(&self) -> bool {
        self.owner_id.is_some()
    }
}

// =============================================================================
// Picking Type
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PickingTypeCode {
    Incoming,
    Outgoing,
    Internal,
}

/// Configuration shared by a class of transfers (e.g. "Delivery Orders").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PickingType {
    pub id: String,
    pub name: String,
    pub code: PickingTypeCode,
    pub default_location_src_id: Option<String>,
    pub default_location_dest_id: Option<String>,
    /// Which quants moves of this type may reserve, by owner.
    pub owner_restriction: OwnerRestriction,
    /// Refuse to cancel transfers of this type once printed.
    pub restrict_cancel_if_printed: bool,
}

// =============================================================================
// Picking
// =============================================================================

/// Transfer state.
///
/// ```text
/// draft ──► waiting ──► confirmed ──► assigned ──► done
///   │          │            │            │
///   └──────────┴────────────┴────────────┴──────► cancel
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PickingState {
    Draft,
    Waiting,
    Confirmed,
    Assigned,
    Done,
    Cancel,
}

impl Default for PickingState {
    fn default() -> Self {
        PickingState::Draft
    }
}

/// Shipping policy of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum MoveType {
    /// Ready as soon as anything is reserved.
    Direct,
    /// Ready only when everything is reserved.
    One,
}

impl Default for MoveType {
    fn default() -> Self {
        MoveType::Direct
    }
}

/// A transfer grouping moves (e.g. one delivery).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Picking {
    pub id: String,
    pub name: String,
    pub picking_type_id: String,
    /// Customer / counterpart. Drives the `picking_partner` policies.
    pub partner_id: Option<String>,
    pub location_id: String,
    pub location_dest_id: String,
    pub state: PickingState,
    pub move_type: MoveType,
    pub printed: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Move
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum MoveState {
    Draft,
    Waiting,
    Confirmed,
    PartiallyAvailable,
    Assigned,
    Done,
    Cancel,
}

impl MoveState {
    /// Done and cancelled moves are closed; everything else can still change.
    #[inline]
    pub fn is_open(&self) -> bool {
        !matches!(self, MoveState::Done | MoveState::Cancel)
    }

    /// States in which `action_assign` tries to reserve more.
    #[inline]
    pub fn can_reserve(&self) -> bool {
        matches!(
            self,
            MoveState::Waiting | MoveState::Confirmed | MoveState::PartiallyAvailable
        )
    }
}

impl Default for MoveState {
    fn default() -> Self {
        MoveState::Draft
    }
}

/// A requested movement of a product quantity between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMove {
    pub id: String,
    pub name: String,
    pub product_id: String,
    pub picking_id: Option<String>,
    pub picking_type_id: Option<String>,
    pub location_id: String,
    pub location_dest_id: String,
    /// Demand.
    pub product_uom_qty: Quantity,
    pub state: MoveState,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Reservation of one quant for one move.
///
/// `owner_id` is always the owner of `quant_id` at reservation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MoveLine {
    pub id: String,
    pub move_id: String,
    pub picking_id: Option<String>,
    pub product_id: String,
    pub quant_id: String,
    pub location_id: String,
    pub location_dest_id: String,
    pub lot_id: Option<String>,
    pub owner_id: Option<String>,
    pub reserved_qty: Quantity,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn location(id: &str, path: &str) -> Location {
        Location {
            id: id.to_string(),
            name: id.to_string(),
            usage: LocationUsage::Internal,
            parent_id: None,
            parent_path: path.to_string(),
        }
    }

    #[test]
    fn test_location_contains_children() {
        let stock = location("stock", "wh/stock/");
        let shelf = location("shelf", "wh/stock/shelf/");
        let other = location("other", "wh/other/");

        assert!(stock.contains(&stock));
        assert!(stock.contains(&shelf));
        assert!(!shelf.contains(&stock));
        assert!(!stock.contains(&other));
    }

    #[test]
    fn test_quant_free_quantity() {
        let quant = Quant {
            id: "q".to_string(),
            product_id: "p".to_string(),
            location_id: "l".to_string(),
            lot_id: None,
            owner_id: None,
            quantity: Quantity::from_units(10),
            reserved_quantity: Quantity::from_units(12),
            in_date: Utc::now(),
        };
        assert_eq!(quant.free_quantity(), Quantity::zero());
        assert!(!quant.is_owned());
    }

    #[test]
    fn test_move_state_flags() {
        assert!(MoveState::Confirmed.can_reserve());
        assert!(MoveState::PartiallyAvailable.can_reserve());
        assert!(!MoveState::Assigned.can_reserve());
        assert!(!MoveState::Draft.can_reserve());
        assert!(!MoveState::Done.is_open());
        assert!(MoveState::Assigned.is_open());
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&MoveState::PartiallyAvailable).unwrap(),
            "\"partially_available\""
        );
        assert_eq!(serde_json::to_string(&PickingState::Cancel).unwrap(), "\"cancel\"");
    }
}
