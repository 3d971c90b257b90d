//! Store boundary for the registration engine.
//!
//! [`RegistrationStore`] is the entire contract the engine requires from its
//! storage collaborator: point lookups, point writes of a registration row,
//! and the two conditional counter updates. A handle represents one open
//! transaction; every coordinator operation runs against exactly one handle.

use crate::error::Result;
use crate::types::{
    EventId, Registration, TicketSnapshot, TicketType, TicketTypeId, UserId,
};

pub mod postgres;

#[cfg(feature = "test-utils")]
pub mod memory;

/// Transactional store handle for registrations and ticket-type counters.
///
/// The two counter methods are the engine's concurrency primitives: each must
/// execute as a *single atomic conditional statement* at the storage layer
/// (affected-row-counted), never as separate read and write steps. That makes
/// the storage engine the serialization point; the engine itself takes no
/// locks.
pub trait RegistrationStore: Send {
    /// Look up a registration by its unique `(event, user)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistrationError::Storage`] if the query fails.
    async fn find_registration(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Registration>>;

    /// Look up a ticket type's current counters.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistrationError::Storage`] if the query fails.
    async fn find_ticket_type(&mut self, id: TicketTypeId) -> Result<Option<TicketType>>;

    /// Insert a freshly created registration row.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistrationError::AlreadyRegistered`] if a row for
    /// the same `(event, user)` pair exists, or
    /// [`crate::RegistrationError::Storage`] if the insert fails.
    async fn insert_registration(&mut self, registration: &Registration) -> Result<()>;

    /// Write back a registration's status, reviewer and timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistrationError::RegistrationNotFound`] if the row
    /// vanished, or [`crate::RegistrationError::Storage`] if the update fails.
    async fn update_registration(&mut self, registration: &Registration) -> Result<()>;

    /// Conditionally increment `current_quantity` by exactly 1.
    ///
    /// The increment only happens if the row still matches `expected` *and*
    /// capacity remains (`max_quantity` unset, or `current_quantity <
    /// max_quantity` at the moment of the write). Returns `false` with no
    /// mutation when either condition fails; that is how a sold-out ticket,
    /// or a lost race against a concurrent writer, is detected without a
    /// lock.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistrationError::Storage`] if the statement fails.
    async fn try_reserve(
        &mut self,
        id: TicketTypeId,
        expected: TicketSnapshot,
    ) -> Result<bool>;

    /// Conditionally decrement `current_quantity` by exactly 1.
    ///
    /// The decrement only happens if `current_quantity > 0` at the moment of
    /// the write, so a doubled release can never drive the counter negative.
    /// Returns whether the decrement happened.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RegistrationError::Storage`] if the statement fails.
    async fn try_release(&mut self, id: TicketTypeId) -> Result<bool>;
}
