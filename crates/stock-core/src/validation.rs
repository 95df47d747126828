//! # Validation Module
//!
//! Input checks run by the repositories before records are written.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: THIS MODULE                                                  │
//! │  ├── names, ids, quantities                                            │
//! │  └── enum values arrive already typed (OwnerRestriction, QtyOperator)  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: SQLite                                                       │
//! │  ├── NOT NULL / CHECK constraints (owner_restriction values)           │
//! │  └── FOREIGN KEY constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::quantity::Quantity;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted record name.
pub const MAX_NAME_LEN: usize = 200;

/// Validates a record name (partner, product, location, lot, transfer).
///
/// ## Example
/// ```rust
/// use stock_core::validation::validate_name;
///
/// assert!(validate_name("name", "WH/Stock").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a move demand: must be strictly positive.
pub fn validate_demand(qty: Quantity) -> ValidationResult<()> {
    if !qty.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "product_uom_qty".to_string(),
        });
    }
    Ok(())
}

/// Validates a record id (UUID format).
///
/// ## Example
/// ```rust
/// use stock_core::validation::validate_id;
///
/// assert!(validate_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_id("not-a-uuid").is_err());
/// ```
pub fn validate_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}
