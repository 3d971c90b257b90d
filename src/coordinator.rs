//! Transaction coordinator: the only externally callable surface of the
//! engine.
//!
//! Every operation runs the same shape against one transactional store
//! handle: read current state, ask the transition engine for a plan, apply
//! the inventory delta through the tracker, then write the new status. All
//! errors propagate with `?` before the caller commits, so either every write
//! lands or none does; there is no path that leaves the registration updated
//! but the inventory stale, or vice versa.
//!
//! Invocations are synchronous and request-scoped. Concurrent invocations
//! from other requests are expected; correctness under that concurrency
//! rests on the store's conditional counter statements, not on anything
//! here.

use chrono::Utc;

use crate::error::{RegistrationError, Result};
use crate::inventory;
use crate::stores::RegistrationStore;
use crate::transition::{plan_transition, InventoryAction};
use crate::types::{
    EventId, NewRegistration, Registration, RegistrationId, RegistrationStatus,
    StatusChange, TicketType, TicketTypeId, UserId,
};

/// Creates a registration in its initial lifecycle status.
///
/// The initial status is `PendingPayment`, `Pending` or directly `Approved`
/// depending on whether the event requires payment or review, or
/// `Waitlisted` when the caller already knows capacity is gone. If the
/// initial status occupies a slot and a ticket type is referenced, the slot
/// is reserved first; a failed reservation aborts before any row is written.
///
/// # Errors
///
/// - [`RegistrationError::AlreadyRegistered`] if the `(event, user)` pair
///   already has a registration.
/// - [`RegistrationError::TicketTypeNotFound`] if the referenced ticket type
///   does not exist.
/// - [`RegistrationError::SoldOut`] if the initial status needs a slot and
///   none is available.
/// - [`RegistrationError::Storage`] on database failure.
#[tracing::instrument(skip(store, new), fields(event_id = %new.event_id, user_id = %new.user_id))]
pub async fn create_event_registration<S: RegistrationStore>(
    store: &mut S,
    new: NewRegistration,
) -> Result<Registration> {
    if store
        .find_registration(new.event_id, new.user_id)
        .await?
        .is_some()
    {
        return Err(RegistrationError::AlreadyRegistered);
    }

    let ticket = load_ticket(store, new.ticket_type_id).await?;

    let now = Utc::now();
    let registration = Registration {
        id: RegistrationId::new(),
        event_id: new.event_id,
        user_id: new.user_id,
        ticket_type_id: new.ticket_type_id,
        status: new.status,
        order_id: new.order_id,
        reviewed_by: None,
        created_at: now,
        updated_at: now,
    };

    if new.status.occupies_slot() {
        if let Some(ticket) = &ticket {
            inventory::reserve(store, ticket).await?;
        }
    }

    store.insert_registration(&registration).await?;
    Ok(registration)
}

/// Transitions a registration to the requested status, recording the
/// reviewer.
///
/// Reserves or releases inventory as the transition plan requires; a
/// transition between two occupying statuses (or two non-occupying ones)
/// leaves the counters untouched.
///
/// # Errors
///
/// - [`RegistrationError::RegistrationNotFound`] /
///   [`RegistrationError::TicketTypeNotFound`] if a referenced row does not
///   exist.
/// - [`RegistrationError::AlreadyCancelled`] when asked to move a cancelled
///   registration to `Cancelled` again.
/// - [`RegistrationError::SoldOut`] if a required reservation is unavailable
///   (the status is **not** written).
/// - [`RegistrationError::InventoryInconsistency`] if a required release
///   found the counter already at 0.
/// - [`RegistrationError::Storage`] on database failure.
#[tracing::instrument(skip(store, change), fields(status = %change.status))]
pub async fn update_event_registration<S: RegistrationStore>(
    store: &mut S,
    event_id: EventId,
    user_id: UserId,
    change: StatusChange,
) -> Result<Registration> {
    let mut registration = store
        .find_registration(event_id, user_id)
        .await?
        .ok_or(RegistrationError::RegistrationNotFound)?;
    let ticket = load_ticket(store, registration.ticket_type_id).await?;

    transition(store, &mut registration, ticket.as_ref(), change.status).await?;

    if change.reviewed_by.is_some() {
        registration.reviewed_by = change.reviewed_by;
    }
    registration.updated_at = Utc::now();
    store.update_registration(&registration).await?;
    Ok(registration)
}

/// Cancels a registration, releasing its slot if the prior status held one.
///
/// Cancellation is terminal: a second call for the same registration fails
/// before any inventory is touched.
///
/// # Errors
///
/// - [`RegistrationError::RegistrationNotFound`] /
///   [`RegistrationError::TicketTypeNotFound`] if a referenced row does not
///   exist.
/// - [`RegistrationError::AlreadyCancelled`] if the registration is already
///   cancelled.
/// - [`RegistrationError::InventoryInconsistency`] if the release found the
///   counter already at 0.
/// - [`RegistrationError::Storage`] on database failure.
#[tracing::instrument(skip(store))]
pub async fn delete_event_registration<S: RegistrationStore>(
    store: &mut S,
    event_id: EventId,
    user_id: UserId,
) -> Result<Registration> {
    let mut registration = store
        .find_registration(event_id, user_id)
        .await?
        .ok_or(RegistrationError::RegistrationNotFound)?;

    // Terminal-state guard, checked before inventory is loaded or touched.
    if registration.status == RegistrationStatus::Cancelled {
        return Err(RegistrationError::AlreadyCancelled);
    }

    let ticket = load_ticket(store, registration.ticket_type_id).await?;

    transition(
        store,
        &mut registration,
        ticket.as_ref(),
        RegistrationStatus::Cancelled,
    )
    .await?;

    registration.updated_at = Utc::now();
    store.update_registration(&registration).await?;
    Ok(registration)
}

/// Resolves the registration's ticket type, if it references one.
async fn load_ticket<S: RegistrationStore>(
    store: &mut S,
    id: Option<TicketTypeId>,
) -> Result<Option<TicketType>> {
    match id {
        Some(id) => Ok(Some(
            store
                .find_ticket_type(id)
                .await?
                .ok_or(RegistrationError::TicketTypeNotFound)?,
        )),
        None => Ok(None),
    }
}

/// Plans and applies one transition: inventory delta first, then the status
/// mutation on the in-memory record. The caller persists the record, so a
/// failed delta leaves the stored status untouched.
async fn transition<S: RegistrationStore>(
    store: &mut S,
    registration: &mut Registration,
    ticket: Option<&TicketType>,
    to: RegistrationStatus,
) -> Result<()> {
    let action = plan_transition(registration.status, to)?;
    tracing::debug!(
        registration_id = %registration.id,
        from = %registration.status,
        to = %to,
        ?action,
        "planned transition"
    );

    if let Some(ticket) = ticket {
        match action {
            InventoryAction::Reserve => inventory::reserve(store, ticket).await?,
            InventoryAction::Release => inventory::release(store, ticket).await?,
            InventoryAction::NoChange => {}
        }
    }

    registration.status = to;
    Ok(())
}
