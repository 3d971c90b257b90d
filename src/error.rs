//! Error types for registration and inventory operations.

use crate::types::TicketTypeId;
use thiserror::Error;

/// Result type alias for registration operations.
pub type Result<T> = std::result::Result<T, RegistrationError>;

/// Error taxonomy for registration-status transitions and ticket inventory.
///
/// Every variant is returned synchronously and aborts the enclosing store
/// transaction before anything is committed; nothing is retried internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    // ═══════════════════════════════════════════════════════════
    // Missing References
    // ═══════════════════════════════════════════════════════════

    /// Referenced registration does not exist.
    #[error("registration not found")]
    RegistrationNotFound,

    /// Referenced ticket type does not exist.
    #[error("ticket type not found")]
    TicketTypeNotFound,

    // ═══════════════════════════════════════════════════════════
    // Transition Errors
    // ═══════════════════════════════════════════════════════════

    /// Cancelling a registration that already reached the terminal
    /// `Cancelled` state.
    #[error("registration is already cancelled")]
    AlreadyCancelled,

    /// A promotion to an occupying status found no remaining capacity, or
    /// lost the conditional update to a concurrent writer.
    #[error("ticket type is sold out")]
    SoldOut,

    /// A registration for this `(event, user)` pair already exists.
    #[error("registration already exists")]
    AlreadyRegistered,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// A release found `current_quantity == 0` while an occupying
    /// registration implied it could not be. Surfaced, never auto-corrected.
    #[error("inventory for ticket type {ticket_type_id} is inconsistent: release found no held slots")]
    InventoryInconsistency {
        /// Ticket type whose counters disagree with its registrations
        ticket_type_id: TicketTypeId,
    },

    /// Database operation failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl RegistrationError {
    /// Returns `true` if this error is an expected caller-facing outcome
    /// rather than an internal fault.
    ///
    /// # Examples
    ///
    /// ```
    /// # use event_registrations::RegistrationError;
    /// assert!(RegistrationError::SoldOut.is_user_error());
    /// assert!(!RegistrationError::Storage("connection reset".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::RegistrationNotFound
                | Self::TicketTypeNotFound
                | Self::AlreadyCancelled
                | Self::SoldOut
                | Self::AlreadyRegistered
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_exclude_internal_faults() {
        assert!(RegistrationError::AlreadyCancelled.is_user_error());
        assert!(RegistrationError::AlreadyRegistered.is_user_error());
        assert!(!RegistrationError::Storage("boom".into()).is_user_error());
        assert!(
            !RegistrationError::InventoryInconsistency {
                ticket_type_id: TicketTypeId::new(),
            }
            .is_user_error()
        );
    }

    #[test]
    fn messages_name_the_condition() {
        assert!(RegistrationError::AlreadyCancelled.to_string().contains("already cancelled"));
        assert!(RegistrationError::SoldOut.to_string().contains("sold out"));
    }
}
