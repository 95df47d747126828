//! # stock-db: Database Layer for the Warehouse
//!
//! This crate persists the warehouse model of `stock-core` in SQLite with
//! sqlx, and runs the reservation and cancel workflows inside database
//! transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Warehouse Data Flow                              │
//! │                                                                         │
//! │  Host application / seed binary                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     stock-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ pickings      │    │  (embedded)  │  │   │
//! │  │   │               │    │ moves, quants │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ products ...  │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │  filters.rs (SQL predicates)  │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │                 stock-core (policy, reservation, cancel guard)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`config`] - Environment configuration
//! - [`migrations`] - Embedded database migrations
//! - [`filters`] - Owner / availability predicates as SQL
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stock_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stock.db")).await?;
//!
//! let picking = db.pickings().action_assign(&picking_id).await?;
//! let lines = db.pickings().move_lines(&picking.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod filters;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, StockConfig};
pub use error::{DbError, DbResult};
pub use filters::{AvailabilityQuery, ProductSearch};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::location::LocationRepository;
pub use repository::lot::LotRepository;
pub use repository::partner::PartnerRepository;
pub use repository::picking::{NewPicking, PickingRepository};
pub use repository::picking_type::{NewPickingType, PickingTypeRepository};
pub use repository::product::ProductRepository;
pub use repository::quant::{NewQuant, QuantRepository};
pub use repository::stock_move::{NewMove, StockMoveRepository};
