//! # stock-core: Pure Warehouse Rules
//!
//! Owner-restricted reservation and owner-aware availability for a
//! warehouse, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Stock Owner Restriction                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ stock-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌─────────────┐  ┌─────────┐  │   │
//! │  │   │  policy   │  │availability│  │ reservation │  │ cancel  │  │   │
//! │  │   │  Owner-   │  │ Availab.-  │  │  greedy     │  │ printed │  │   │
//! │  │   │Restriction│  │ Mode, Qty- │  │  plan,      │  │ guard   │  │   │
//! │  │   │OwnerFilter│  │ Comparison │  │  states     │  │         │  │   │
//! │  │   └───────────┘  └────────────┘  └─────────────┘  └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    stock-db (Database Layer)                    │   │
//! │  │     SQLite store, SQL owner filters, reserve/unreserve/cancel   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Quant, Picking, PickingType, StockMove, MoveLine, ...)
//! - [`quantity`] - Fixed-point quantities (no floating point)
//! - [`policy`] - Owner-restriction policy and quant filtering
//! - [`availability`] - Owner-aware available quantity and comparisons
//! - [`reservation`] - Greedy reservation and state rules
//! - [`cancel`] - Printed-transfer cancel guard
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use stock_core::availability::{qty_available, AvailabilityMode};
//! use stock_core::policy::{eligible_quants, OwnerRestriction};
//! use stock_core::reservation::plan_reservation;
//! use stock_core::Quantity;
//!
//! let quants: Vec<stock_core::Quant> = Vec::new();
//!
//! let eligible = eligible_quants(OwnerRestriction::UnassignedOwner, None, &quants);
//! let plan = plan_reservation(Quantity::from_units(10), eligible);
//! assert!(plan.is_empty());
//!
//! assert!(qty_available(&quants, &AvailabilityMode::Default).is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod availability;
pub mod cancel;
pub mod error;
pub mod policy;
pub mod quantity;
pub mod reservation;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use availability::{qty_available, AvailabilityMode, QtyComparison, QtyOperator};
pub use cancel::CancelContext;
pub use error::{CoreError, CoreResult, ValidationError};
pub use policy::{eligible_quants, OwnerFilter, OwnerRestriction};
pub use quantity::Quantity;
pub use types::*;
