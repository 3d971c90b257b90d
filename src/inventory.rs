//! Inventory tracker: the only code path that moves a ticket type's
//! `current_quantity`, one slot at a time, through the store's conditional
//! counter primitives.

use crate::error::{RegistrationError, Result};
use crate::stores::RegistrationStore;
use crate::types::TicketType;

/// Takes one slot of `ticket`, guarded by the snapshot read in this
/// transaction.
///
/// A `false` from the store means either the capacity check failed or another
/// writer moved the counter after our read; both surface as
/// [`RegistrationError::SoldOut`] and the caller aborts without having
/// written anything.
pub(crate) async fn reserve<S: RegistrationStore>(
    store: &mut S,
    ticket: &TicketType,
) -> Result<()> {
    if store.try_reserve(ticket.id, ticket.snapshot()).await? {
        tracing::debug!(
            ticket_type_id = %ticket.id,
            current_quantity = ticket.current_quantity + 1,
            "reserved slot"
        );
        Ok(())
    } else {
        tracing::debug!(
            ticket_type_id = %ticket.id,
            current_quantity = ticket.current_quantity,
            max_quantity = ?ticket.max_quantity,
            "reserve rejected"
        );
        Err(RegistrationError::SoldOut)
    }
}

/// Returns one slot of `ticket`.
///
/// The decrement is floor-guarded; a `false` here means the counter was
/// already 0 while an occupying registration implied it could not be. That is
/// corrupted state, surfaced as
/// [`RegistrationError::InventoryInconsistency`] and never auto-corrected.
pub(crate) async fn release<S: RegistrationStore>(
    store: &mut S,
    ticket: &TicketType,
) -> Result<()> {
    if store.try_release(ticket.id).await? {
        tracing::debug!(ticket_type_id = %ticket.id, "released slot");
        Ok(())
    } else {
        tracing::warn!(
            ticket_type_id = %ticket.id,
            "release found current_quantity at 0 with an occupying registration"
        );
        Err(RegistrationError::InventoryInconsistency {
            ticket_type_id: ticket.id,
        })
    }
}
