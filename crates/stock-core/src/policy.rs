//! # Owner Restriction Policy
//!
//! Decides which quants a move may reserve, based on who owns the stock.
//!
//! ## Policy Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  owner_restriction        │  eligible quants                            │
//! │  ─────────────────────────┼──────────────────────────────────────────── │
//! │  standard_behavior        │  all quants                                 │
//! │  unassigned_owner         │  owner IS NULL                              │
//! │  picking_partner          │  owner = partner   (nothing if no partner)  │
//! │  partner_or_unassigned    │  owner IS NULL OR owner = partner           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flow
//! ```text
//! PickingType.owner_restriction ─┐
//!                                ├─► owner_filter() ─► OwnerFilter
//! Picking.partner_id ────────────┘                          │
//!                                                          ▼
//! quants at source location ───────────────► eligible_quants() ─► reserve()
//! ```
//!
//! The same [`OwnerFilter`] drives the available-quantity computation and is
//! translated to SQL by `stock-db`, so in-memory and database results agree.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::Quant;

// =============================================================================
// Owner Restriction
// =============================================================================

/// Owner-restriction policy configured on a picking type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum OwnerRestriction {
    /// No filtering on owner.
    StandardBehavior,
    /// Only company-owned stock (no owner).
    UnassignedOwner,
    /// Only stock owned by the transfer's partner.
    PickingPartner,
    /// Company-owned stock or stock owned by the transfer's partner.
    PartnerOrUnassigned,
}

impl OwnerRestriction {
    pub const ALL: [OwnerRestriction; 4] = [
        OwnerRestriction::StandardBehavior,
        OwnerRestriction::UnassignedOwner,
        OwnerRestriction::PickingPartner,
        OwnerRestriction::PartnerOrUnassigned,
    ];

    /// Persisted value of the policy.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OwnerRestriction::StandardBehavior => "standard_behavior",
            OwnerRestriction::UnassignedOwner => "unassigned_owner",
            OwnerRestriction::PickingPartner => "picking_partner",
            OwnerRestriction::PartnerOrUnassigned => "partner_or_unassigned",
        }
    }

    /// Resolves the policy against a transfer's partner.
    ///
    /// ## Example
    /// ```rust
    /// use stock_core::policy::{OwnerFilter, OwnerRestriction};
    ///
    /// let filter = OwnerRestriction::PickingPartner.owner_filter(None);
    /// assert_eq!(filter, OwnerFilter::Nothing);
    /// ```
    pub fn owner_filter(&self, partner_id: Option<&str>) -> OwnerFilter {
        match (self, partner_id) {
            (OwnerRestriction::StandardBehavior, _) => OwnerFilter::Any,
            (OwnerRestriction::UnassignedOwner, _) => OwnerFilter::Unowned,
            (OwnerRestriction::PickingPartner, Some(partner)) => {
                OwnerFilter::Owner(partner.to_string())
            }
            (OwnerRestriction::PickingPartner, None) => OwnerFilter::Nothing,
            (OwnerRestriction::PartnerOrUnassigned, Some(partner)) => {
                OwnerFilter::OwnerOrUnowned(partner.to_string())
            }
            // owner = NULL OR owner IS NULL collapses to the unowned set
            (OwnerRestriction::PartnerOrUnassigned, None) => OwnerFilter::Unowned,
        }
    }
}

/// Unset policies behave as `standard_behavior`.
impl Default for OwnerRestriction {
    fn default() -> Self {
        OwnerRestriction::StandardBehavior
    }
}

impl fmt::Display for OwnerRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OwnerRestriction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OwnerRestriction::ALL
            .into_iter()
            .find(|policy| policy.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "owner_restriction".to_string(),
                allowed: OwnerRestriction::ALL
                    .iter()
                    .map(|p| p.as_str().to_string())
                    .collect(),
            })
    }
}

// =============================================================================
// Owner Filter
// =============================================================================

/// A resolved predicate over a quant's owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerFilter {
    /// Every quant.
    Any,
    /// Quants without owner.
    Unowned,
    /// Quants owned by exactly this partner.
    Owner(String),
    /// Quants without owner or owned by this partner.
    OwnerOrUnowned(String),
    /// No quant at all.
    Nothing,
}

impl OwnerFilter {
    /// True if a quant with this owner passes the filter.
    pub fn admits(&self, owner_id: Option<&str>) -> bool {
        match self {
            OwnerFilter::Any => true,
            OwnerFilter::Unowned => owner_id.is_none(),
            OwnerFilter::Owner(partner) => owner_id == Some(partner.as_str()),
            OwnerFilter::OwnerOrUnowned(partner) => {
                owner_id.is_none() || owner_id == Some(partner.as_str())
            }
            OwnerFilter::Nothing => false,
        }
    }

    /// Keeps the quants the filter admits, in their original order.
    pub fn filter<'q, I>(self, quants: I) -> impl Iterator<Item = &'q Quant>
    where
        I: IntoIterator<Item = &'q Quant>,
    {
        quants
            .into_iter()
            .filter(move |quant| self.admits(quant.owner_id.as_deref()))
    }
}

/// Quants a move may reserve under `policy` for a transfer of `partner_id`.
///
/// Pure: the input is neither reordered nor mutated, and the output is a
/// subset of it.
///
/// ## Example
/// ```rust,ignore
/// let eligible: Vec<&Quant> =
///     eligible_quants(picking_type.owner_restriction, picking.partner_id.as_deref(), &quants)
///         .collect();
/// ```
pub fn eligible_quants<'q, I>(
    policy: OwnerRestriction,
    partner_id: Option<&str>,
    quants: I,
) -> impl Iterator<Item = &'q Quant>
where
    I: IntoIterator<Item = &'q Quant>,
{
    policy.owner_filter(partner_id).filter(quants)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use chrono::Utc;

    fn quant(id: &str, owner: Option<&str>, units: i64) -> Quant {
        Quant {
            id: id.to_string(),
            product_id: "product".to_string(),
            location_id: "stock".to_string(),
            lot_id: None,
            owner_id: owner.map(str::to_string),
            quantity: Quantity::from_units(units),
            reserved_quantity: Quantity::zero(),
            in_date: Utc::now(),
        }
    }

    fn fixture() -> Vec<Quant> {
        vec![
            quant("free", None, 500),
            quant("owner", Some("owner"), 500),
            quant("other", Some("other"), 200),
            quant("free-2", None, 50),
        ]
    }

    fn ids(policy: OwnerRestriction, partner: Option<&str>, quants: &[Quant]) -> Vec<String> {
        eligible_quants(policy, partner, quants)
            .map(|q| q.id.clone())
            .collect()
    }

    #[test]
    fn test_standard_behavior_returns_everything_in_order() {
        let quants = fixture();
        for partner in [None, Some("owner"), Some("nobody")] {
            assert_eq!(
                ids(OwnerRestriction::StandardBehavior, partner, &quants),
                vec!["free", "owner", "other", "free-2"]
            );
        }
    }

    #[test]
    fn test_unassigned_owner_only_unowned() {
        let quants = fixture();
        let eligible: Vec<&Quant> =
            eligible_quants(OwnerRestriction::UnassignedOwner, Some("owner"), &quants).collect();
        assert_eq!(eligible.len(), 2);
        assert!(eligible.iter().all(|q| q.owner_id.is_none()));
    }

    #[test]
    fn test_picking_partner() {
        let quants = fixture();
        assert_eq!(
            ids(OwnerRestriction::PickingPartner, Some("owner"), &quants),
            vec!["owner"]
        );
        assert!(ids(OwnerRestriction::PickingPartner, Some("customer"), &quants).is_empty());
        assert!(ids(OwnerRestriction::PickingPartner, None, &quants).is_empty());
    }

    #[test]
    fn test_partner_or_unassigned() {
        let quants = fixture();
        assert_eq!(
            ids(OwnerRestriction::PartnerOrUnassigned, Some("owner"), &quants),
            vec!["free", "owner", "free-2"]
        );
        assert_eq!(
            ids(OwnerRestriction::PartnerOrUnassigned, None, &quants),
            vec!["free", "free-2"]
        );
    }

    #[test]
    fn test_eligible_is_subset_for_every_policy() {
        let quants = fixture();
        for policy in OwnerRestriction::ALL {
            for partner in [None, Some("owner"), Some("other"), Some("customer")] {
                for q in eligible_quants(policy, partner, &quants) {
                    assert!(quants.iter().any(|orig| orig == q));
                }
            }
        }
    }

    #[test]
    fn test_default_is_standard_behavior() {
        assert_eq!(OwnerRestriction::default(), OwnerRestriction::StandardBehavior);
        assert_eq!(OwnerRestriction::default().owner_filter(Some("x")), OwnerFilter::Any);
    }

    #[test]
    fn test_parse_and_display() {
        for policy in OwnerRestriction::ALL {
            assert_eq!(policy.as_str().parse::<OwnerRestriction>().unwrap(), policy);
            assert_eq!(
                serde_json::to_string(&policy).unwrap(),
                format!("\"{}\"", policy)
            );
        }
        assert!(matches!(
            "owner_first".parse::<OwnerRestriction>(),
            Err(ValidationError::NotAllowed { .. })
        ));
    }
}
