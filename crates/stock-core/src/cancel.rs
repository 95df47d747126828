//! # Cancel Guard
//!
//! Transfers that were already printed may not be cancelled when their
//! transfer type says so. Paperwork is out on the floor by then.
//!
//! ## Decision Flow
//! ```text
//! action_cancel(moves, ctx)
//!      │
//!      ├── ctx.disable_printed_check? ──► allowed   (moves being merged)
//!      ├── ctx.cancel_backorder?      ──► allowed   (backorder dropped)
//!      │
//!      ▼
//! for each move:
//!      picking.printed && picking_type.restrict_cancel_if_printed
//!           │
//!           ├── yes ──► CoreError::PrintedTransferCancel (nothing cancelled)
//!           └── no  ──► next move
//! ```

use crate::error::{CoreError, CoreResult};

/// Explicit replacement for the ambient flags callers used to set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CancelContext {
    /// Skip the printed check entirely. Set while merging moves.
    pub disable_printed_check: bool,
    /// The cancel drops an unwanted backorder during validation.
    pub cancel_backorder: bool,
}

impl CancelContext {
    /// Context used for cancels that come from merging moves.
    pub fn merging() -> Self {
        CancelContext {
            disable_printed_check: true,
            ..Default::default()
        }
    }

    /// Context used when a backorder is dropped.
    pub fn backorder() -> Self {
        CancelContext {
            cancel_backorder: true,
            ..Default::default()
        }
    }

    #[inline]
    pub fn bypasses_printed_check(&self) -> bool {
        self.disable_printed_check || self.cancel_backorder
    }
}

/// What the guard needs to know about one move: its transfer's printed flag
/// and the restriction of the move's own operation type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelTarget<'a> {
    pub picking_id: &'a str,
    pub printed: bool,
    pub restrict_cancel_if_printed: bool,
}

/// Fails on the first target whose transfer is printed and restricted.
pub fn ensure_cancellable<'a, I>(targets: I, ctx: CancelContext) -> CoreResult<()>
where
    I: IntoIterator<Item = CancelTarget<'a>>,
{
    if ctx.bypasses_printed_check() {
        return Ok(());
    }
    for target in targets {
        if target.printed && target.restrict_cancel_if_printed {
            return Err(CoreError::PrintedTransferCancel {
                picking_id: target.picking_id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(printed: bool, restrict: bool) -> CancelTarget<'static> {
        CancelTarget {
            picking_id: "WH/OUT/0001",
            printed,
            restrict_cancel_if_printed: restrict,
        }
    }

    #[test]
    fn test_printed_and_restricted_is_rejected() {
        let err = ensure_cancellable([target(true, true)], CancelContext::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "You cannot cancel a transfer that is already printed."
        );
    }

    #[test]
    fn test_any_restricted_target_rejects_the_batch() {
        let targets = [target(false, true), target(true, true), target(true, false)];
        assert!(ensure_cancellable(targets, CancelContext::default()).is_err());
    }

    #[test]
    fn test_not_printed_or_not_restricted_is_allowed() {
        assert!(ensure_cancellable([target(false, true)], CancelContext::default()).is_ok());
        assert!(ensure_cancellable([target(true, false)], CancelContext::default()).is_ok());
    }

    #[test]
    fn test_context_flags_bypass() {
        assert!(ensure_cancellable([target(true, true)], CancelContext::merging()).is_ok());
        assert!(ensure_cancellable([target(true, true)], CancelContext::backorder()).is_ok());
    }
}
