//! Transition engine: maps a `(from, to)` status pair to the inventory delta
//! it requires, and decides whether the transition is legal at all.
//!
//! The mapping is a pure decision table. Keeping it total over
//! [`RegistrationStatus`] means a newly added status cannot silently skip an
//! inventory delta: it has to pick a side in
//! [`RegistrationStatus::occupies_slot`] first, and every arm here follows
//! from that classification.

use crate::error::{RegistrationError, Result};
use crate::types::RegistrationStatus;

/// Inventory delta a status transition requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InventoryAction {
    /// Capacity-checked increment of `current_quantity`
    Reserve,
    /// Floor-guarded decrement of `current_quantity`
    Release,
    /// The transition does not move a slot
    NoChange,
}

/// Plans the inventory delta for a status transition.
///
/// Decision table:
///
/// - `Cancelled → Cancelled` is the one illegal transition (re-cancelling a
///   terminal registration) and fails with
///   [`RegistrationError::AlreadyCancelled`].
/// - `from == to` is a legal no-op.
/// - non-occupying → occupying takes a slot ([`InventoryAction::Reserve`]).
/// - occupying → non-occupying returns a slot ([`InventoryAction::Release`]).
/// - occupying → occupying (e.g. `Pending → Approved`) already holds its slot;
///   no second reservation.
/// - non-occupying → non-occupying never held one.
///
/// # Errors
///
/// Returns [`RegistrationError::AlreadyCancelled`] for `Cancelled → Cancelled`.
pub fn plan_transition(
    from: RegistrationStatus,
    to: RegistrationStatus,
) -> Result<InventoryAction> {
    match (from, to) {
        (RegistrationStatus::Cancelled, RegistrationStatus::Cancelled) => {
            Err(RegistrationError::AlreadyCancelled)
        }
        (from, to) if from == to => Ok(InventoryAction::NoChange),
        (from, to) => Ok(match (from.occupies_slot(), to.occupies_slot()) {
            (false, true) => InventoryAction::Reserve,
            (true, false) => InventoryAction::Release,
            (true, true) | (false, false) => InventoryAction::NoChange,
        }),
    }
}
