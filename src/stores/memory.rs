//! In-memory store for fast, deterministic tests.
//!
//! Every trait method executes as one mutex-guarded step, which mirrors the
//! statement-level atomicity the engine requires from real storage: the two
//! counter primitives are single compare-and-mutate operations, exactly like
//! their conditional-`UPDATE` counterparts. Cloned handles share state, so
//! concurrent tasks contend on the same counters the way concurrent requests
//! contend on the same rows.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use crate::error::{RegistrationError, Result};
use crate::stores::RegistrationStore;
use crate::types::{
    EventId, Registration, RegistrationId, TicketSnapshot, TicketType, TicketTypeId, UserId,
};

#[derive(Debug, Default)]
struct State {
    registrations: HashMap<RegistrationId, Registration>,
    ticket_types: HashMap<TicketTypeId, TicketType>,
}

/// Shared in-memory store.
///
/// `Clone` hands out another handle onto the same state; give each concurrent
/// task its own clone.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<State>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed a ticket type.
    pub fn put_ticket_type(&self, ticket: TicketType) {
        self.lock().ticket_types.insert(ticket.id, ticket);
    }

    /// Seed a registration without going through the coordinator.
    pub fn put_registration(&self, registration: Registration) {
        self.lock()
            .registrations
            .insert(registration.id, registration);
    }

    /// Current state of a ticket type, for assertions.
    #[must_use]
    pub fn ticket_type(&self, id: TicketTypeId) -> Option<TicketType> {
        self.lock().ticket_types.get(&id).cloned()
    }

    /// Current state of a registration, for assertions.
    #[must_use]
    pub fn registration(&self, event_id: EventId, user_id: UserId) -> Option<Registration> {
        self.lock()
            .registrations
            .values()
            .find(|r| r.event_id == event_id && r.user_id == user_id)
            .cloned()
    }

    /// Number of registrations holding a slot of this ticket type. Compares
    /// against `current_quantity` in conservation assertions.
    #[must_use]
    pub fn occupying_count(&self, id: TicketTypeId) -> u32 {
        let count = self
            .lock()
            .registrations
            .values()
            .filter(|r| r.ticket_type_id == Some(id) && r.status.occupies_slot())
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

impl RegistrationStore for MemoryStore {
    async fn find_registration(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Registration>> {
        Ok(self.registration(event_id, user_id))
    }

    async fn find_ticket_type(&mut self, id: TicketTypeId) -> Result<Option<TicketType>> {
        Ok(self.ticket_type(id))
    }

    async fn insert_registration(&mut self, registration: &Registration) -> Result<()> {
        let mut state = self.lock();
        if state
            .registrations
            .values()
            .any(|r| r.event_id == registration.event_id && r.user_id == registration.user_id)
        {
            return Err(RegistrationError::AlreadyRegistered);
        }
        state
            .registrations
            .insert(registration.id, registration.clone());
        Ok(())
    }

    async fn update_registration(&mut self, registration: &Registration) -> Result<()> {
        let mut state = self.lock();
        let Some(stored) = state.registrations.get_mut(&registration.id) else {
            return Err(RegistrationError::RegistrationNotFound);
        };
        *stored = registration.clone();
        Ok(())
    }

    async fn try_reserve(&mut self, id: TicketTypeId, expected: TicketSnapshot) -> Result<bool> {
        let mut state = self.lock();
        let Some(ticket) = state.ticket_types.get_mut(&id) else {
            return Ok(false);
        };
        if ticket.snapshot() == expected && expected.has_capacity() {
            ticket.current_quantity += 1;
            ticket.updated_at = Utc::now();
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn try_release(&mut self, id: TicketTypeId) -> Result<bool> {
        let mut state = self.lock();
        let Some(ticket) = state.ticket_types.get_mut(&id) else {
            return Ok(false);
        };
        if ticket.current_quantity > 0 {
            ticket.current_quantity -= 1;
            ticket.updated_at = Utc::now();
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ticket(current: u32, max: Option<u32>) -> TicketType {
        let now = Utc::now();
        TicketType {
            id: TicketTypeId::new(),
            event_id: EventId::new(),
            current_quantity: current,
            max_quantity: max,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn reserve_increments_when_snapshot_matches() {
        let store = MemoryStore::new();
        let t = ticket(3, Some(10));
        let (id, snapshot) = (t.id, t.snapshot());
        store.put_ticket_type(t);

        let mut handle = store.clone();
        assert!(handle.try_reserve(id, snapshot).await.unwrap());
        assert_eq!(store.ticket_type(id).unwrap().current_quantity, 4);
    }

    #[tokio::test]
    async fn reserve_rejects_stale_snapshot() {
        let store = MemoryStore::new();
        let t = ticket(3, Some(10));
        let id = t.id;
        store.put_ticket_type(t);

        let stale = TicketSnapshot {
            current_quantity: 2,
            max_quantity: Some(10),
        };
        let mut handle = store.clone();
        assert!(!handle.try_reserve(id, stale).await.unwrap());
        assert_eq!(store.ticket_type(id).unwrap().current_quantity, 3);
    }

    #[tokio::test]
    async fn reserve_rejects_at_capacity() {
        let store = MemoryStore::new();
        let t = ticket(10, Some(10));
        let (id, snapshot) = (t.id, t.snapshot());
        store.put_ticket_type(t);

        let mut handle = store.clone();
        assert!(!handle.try_reserve(id, snapshot).await.unwrap());
        assert_eq!(store.ticket_type(id).unwrap().current_quantity, 10);
    }

    #[tokio::test]
    async fn reserve_ignores_capacity_when_unlimited() {
        let store = MemoryStore::new();
        let t = ticket(10_000, None);
        let (id, snapshot) = (t.id, t.snapshot());
        store.put_ticket_type(t);

        let mut handle = store.clone();
        assert!(handle.try_reserve(id, snapshot).await.unwrap());
        assert_eq!(store.ticket_type(id).unwrap().current_quantity, 10_001);
    }

    #[tokio::test]
    async fn release_stops_at_the_floor() {
        let store = MemoryStore::new();
        let t = ticket(1, Some(10));
        let id = t.id;
        store.put_ticket_type(t);

        let mut handle = store.clone();
        assert!(handle.try_release(id).await.unwrap());
        assert!(!handle.try_release(id).await.unwrap());
        assert_eq!(store.ticket_type(id).unwrap().current_quantity, 0);
    }
}
