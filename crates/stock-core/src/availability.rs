//! # Availability
//!
//! Owner-aware "quantity available" of a product and comparisons on it.
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AvailabilityMode        counted quants          500 free + 500 of O    │
//! │  ──────────────────────  ─────────────────────   ────────────────────   │
//! │  Default                 owner IS NULL           500                    │
//! │  ForceOwner(O)           owner = O               500                    │
//! │  SkipRestriction         all                     1000                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers hand in the quants of internal locations only; where those come
//! from (memory or SQL) is not this module's business. `stock-db` evaluates
//! the same [`OwnerFilter`] and [`QtyComparison`] inside SQLite.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::policy::OwnerFilter;
use crate::quantity::Quantity;
use crate::types::Quant;

// =============================================================================
// Availability Mode
// =============================================================================

/// How owned stock is treated when computing available quantity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(tag = "mode", content = "owner_id", rename_all = "snake_case")]
#[ts(export)]
pub enum AvailabilityMode {
    /// Owned stock is earmarked and does not count.
    Default,
    /// Count the stock of this owner only.
    ForceOwner(String),
    /// Count everything, owned or not.
    SkipRestriction,
}

impl Default for AvailabilityMode {
    fn default() -> Self {
        AvailabilityMode::Default
    }
}

impl AvailabilityMode {
    /// The quant filter this mode stands for.
    pub fn owner_filter(&self) -> OwnerFilter {
        match self {
            AvailabilityMode::Default => OwnerFilter::Unowned,
            AvailabilityMode::ForceOwner(owner) => OwnerFilter::Owner(owner.clone()),
            AvailabilityMode::SkipRestriction => OwnerFilter::Any,
        }
    }
}

/// Sums the quantity of the quants counted under `mode`.
///
/// ## Example
/// ```rust,ignore
/// let qty = qty_available(&internal_quants, &AvailabilityMode::SkipRestriction);
/// ```
pub fn qty_available<'q, I>(quants: I, mode: &AvailabilityMode) -> Quantity
where
    I: IntoIterator<Item = &'q Quant>,
{
    mode.owner_filter().filter(quants).map(|q| q.quantity).sum()
}

// =============================================================================
// Comparisons
// =============================================================================

/// Comparison operator of a quantity search predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum QtyOperator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl QtyOperator {
    pub const ALL: [QtyOperator; 6] = [
        QtyOperator::Gt,
        QtyOperator::Ge,
        QtyOperator::Lt,
        QtyOperator::Le,
        QtyOperator::Eq,
        QtyOperator::Ne,
    ];

    /// SQL spelling; also the accepted input spelling.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            QtyOperator::Gt => ">",
            QtyOperator::Ge => ">=",
            QtyOperator::Lt => "<",
            QtyOperator::Le => "<=",
            QtyOperator::Eq => "=",
            QtyOperator::Ne => "!=",
        }
    }

    pub fn apply(&self, lhs: Quantity, rhs: Quantity) -> bool {
        match self {
            QtyOperator::Gt => lhs > rhs,
            QtyOperator::Ge => lhs >= rhs,
            QtyOperator::Lt => lhs < rhs,
            QtyOperator::Le => lhs <= rhs,
            QtyOperator::Eq => lhs == rhs,
            QtyOperator::Ne => lhs != rhs,
        }
    }
}

impl fmt::Display for QtyOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for QtyOperator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = match s.trim() {
            "==" => "=",
            "<>" => "!=",
            other => other,
        };
        QtyOperator::ALL
            .into_iter()
            .find(|op| op.as_sql() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "operator".to_string(),
                allowed: QtyOperator::ALL
                    .iter()
                    .map(|op| op.as_sql().to_string())
                    .collect(),
            })
    }
}

/// `qty_available <op> value`.
///
/// `=` is exact: quantities are fixed-point, so no tolerance is involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QtyComparison {
    pub op: QtyOperator,
    pub value: Quantity,
}

impl QtyComparison {
    pub fn new(op: QtyOperator, value: Quantity) -> Self {
        QtyComparison { op, value }
    }

    #[inline]
    pub fn matches(&self, qty: Quantity) -> bool {
        self.op.apply(qty, self.value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn quant(owner: Option<&str>, units: i64) -> Quant {
        Quant {
            id: format!("q-{units}-{owner:?}"),
            product_id: "product".to_string(),
            location_id: "stock".to_string(),
            lot_id: None,
            owner_id: owner.map(str::to_string),
            quantity: Quantity::from_units(units),
            reserved_quantity: Quantity::zero(),
            in_date: Utc::now(),
        }
    }

    fn scenario() -> Vec<Quant> {
        vec![quant(None, 500), quant(Some("owner"), 500)]
    }

    #[test]
    fn test_default_excludes_owned_stock() {
        assert_eq!(
            qty_available(&scenario(), &AvailabilityMode::Default),
            Quantity::from_units(500)
        );
    }

    #[test]
    fn test_force_owner() {
        let quants = scenario();
        assert_eq!(
            qty_available(&quants, &AvailabilityMode::ForceOwner("owner".to_string())),
            "500.00".parse().unwrap()
        );
        assert_eq!(
            qty_available(&quants, &AvailabilityMode::ForceOwner("stranger".to_string())),
            Quantity::zero()
        );
    }

    #[test]
    fn test_skip_restriction_counts_everything() {
        assert_eq!(
            qty_available(&scenario(), &AvailabilityMode::SkipRestriction),
            Quantity::from_units(1000)
        );
    }

    #[test]
    fn test_comparisons_against_reference_figure() {
        let qty = qty_available(&scenario(), &AvailabilityMode::Default);
        assert!(!QtyComparison::new(QtyOperator::Gt, Quantity::from_units(500)).matches(qty));
        assert!(QtyComparison::new(QtyOperator::Gt, Quantity::from_units(499)).matches(qty));
        assert!(QtyComparison::new(QtyOperator::Ge, Quantity::from_units(500)).matches(qty));
        assert!(QtyComparison::new(QtyOperator::Eq, Quantity::from_units(500)).matches(qty));
        assert!(!QtyComparison::new(QtyOperator::Lt, Quantity::from_units(500)).matches(qty));
        assert!(QtyComparison::new(QtyOperator::Le, Quantity::from_units(500)).matches(qty));
        assert!(QtyComparison::new(QtyOperator::Ne, Quantity::from_units(1)).matches(qty));
    }

    #[test]
    fn test_operator_parsing() {
        for op in QtyOperator::ALL {
            assert_eq!(op.as_sql().parse::<QtyOperator>().unwrap(), op);
        }
        assert_eq!("==".parse::<QtyOperator>().unwrap(), QtyOperator::Eq);
        assert!("like".parse::<QtyOperator>().is_err());
    }

    #[test]
    fn test_mode_serialization() {
        let json = serde_json::to_string(&AvailabilityMode::ForceOwner("o".to_string())).unwrap();
        assert_eq!(json, r#"{"mode":"force_owner","owner_id":"o"}"#);
        let json = serde_json::to_string(&AvailabilityMode::SkipRestriction).unwrap();
        assert_eq!(json, r#"{"mode":"skip_restriction"}"#);
    }
}
