//! # Error Types
//!
//! Domain errors for the warehouse rules.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  CoreError (top-level)                                                 │
//! │  ├── PrintedTransferCancel  ← cancel guard rejected the cancel         │
//! │  ├── InvalidState           ← action not allowed in current state      │
//! │  └── Validation(ValidationError)                                       │
//! │                                                                         │
//! │  ValidationError (input validation)                                    │
//! │  ├── Required / MustBePositive / TooLong                               │
//! │  ├── InvalidFormat                                                      │
//! │  └── NotAllowed                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An owner restriction that leaves a move unreserved is NOT an error: the
//! move simply stays `confirmed` or `partially_available`.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

#[derive(Debug, Error)]
pub enum CoreError {
    /// Cancelling a printed transfer whose type forbids it.
    ///
    /// ## When This Occurs
    /// - `action_cancel` on a move of a printed transfer
    /// - the transfer type has `restrict_cancel_if_printed`
    /// - and neither merge nor backorder context is active
    #[error("You cannot cancel a transfer that is already printed.")]
    PrintedTransferCancel { picking_id: String },

    /// A record is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Reserving a move that is already done or cancelled
    /// - Confirming a cancelled transfer
    #[error("{entity} {id} is {state}, cannot perform operation")]
    InvalidState {
        entity: String,
        id: String,
        state: String,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn invalid_state(
        entity: impl Into<String>,
        id: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        CoreError::InvalidState {
            entity: entity.into(),
            id: id.into(),
            state: state.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any rule runs, mostly by the repositories when creating
/// records.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, bad decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
