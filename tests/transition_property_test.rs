//! Property tests for the transition table and for counter conservation
//! under arbitrary operation sequences.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::Utc;
use event_registrations::stores::memory::MemoryStore;
use event_registrations::{
    delete_event_registration, plan_transition, update_event_registration, EventId,
    InventoryAction, Registration, RegistrationError, RegistrationId, RegistrationStatus,
    StatusChange, TicketType, TicketTypeId, UserId,
};
use proptest::prelude::*;

fn status_strategy() -> impl Strategy<Value = RegistrationStatus> {
    proptest::sample::select(RegistrationStatus::ALL.to_vec())
}

proptest! {
    /// The planned delta is fully determined by the occupying classification.
    #[test]
    fn plan_agrees_with_classifier(from in status_strategy(), to in status_strategy()) {
        match plan_transition(from, to) {
            Ok(InventoryAction::Reserve) => {
                prop_assert!(!from.occupies_slot());
                prop_assert!(to.occupies_slot());
            }
            Ok(InventoryAction::Release) => {
                prop_assert!(from.occupies_slot());
                prop_assert!(!to.occupies_slot());
            }
            Ok(InventoryAction::NoChange) => {
                prop_assert_eq!(from.occupies_slot(), to.occupies_slot());
            }
            Err(err) => {
                // Planning is total except for re-cancelling.
                prop_assert_eq!(err, RegistrationError::AlreadyCancelled);
                prop_assert_eq!(from, RegistrationStatus::Cancelled);
                prop_assert_eq!(to, RegistrationStatus::Cancelled);
            }
        }
    }

    /// A no-op target never moves inventory, whatever the status.
    #[test]
    fn same_status_never_moves_inventory(status in status_strategy()) {
        if status == RegistrationStatus::Cancelled {
            prop_assert_eq!(
                plan_transition(status, status),
                Err(RegistrationError::AlreadyCancelled)
            );
        } else {
            prop_assert_eq!(plan_transition(status, status), Ok(InventoryAction::NoChange));
        }
    }
}

// ============================================================================
// Conservation under arbitrary operation sequences
// ============================================================================

#[derive(Clone, Debug)]
enum Op {
    Update(RegistrationStatus),
    Cancel,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => status_strategy().prop_map(Op::Update),
        1 => Just(Op::Cancel),
    ]
}

fn seed_registration(
    event_id: EventId,
    user_id: UserId,
    ticket_type_id: TicketTypeId,
) -> Registration {
    let now = Utc::now();
    Registration {
        id: RegistrationId::new(),
        event_id,
        user_id,
        ticket_type_id: Some(ticket_type_id),
        status: RegistrationStatus::Waitlisted,
        order_id: None,
        reviewed_by: None,
        created_at: now,
        updated_at: now,
    }
}

proptest! {
    /// Whatever sequence of transitions is thrown at a small pool of
    /// registrations, the counter always equals the number of occupying
    /// registrations and never exceeds the ceiling. Expected caller-facing
    /// failures (sold out, re-cancel) are fine; anything else is not.
    #[test]
    fn counter_is_conserved_under_arbitrary_sequences(
        ops in proptest::collection::vec((0usize..4, op_strategy()), 1..40)
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let store = MemoryStore::new();
            let now = Utc::now();
            let ticket_type_id = TicketTypeId::new();
            let event_id = EventId::new();
            store.put_ticket_type(TicketType {
                id: ticket_type_id,
                event_id,
                current_quantity: 0,
                max_quantity: Some(2),
                is_active: true,
                created_at: now,
                updated_at: now,
            });

            let users: Vec<UserId> = (0..4).map(|_| UserId::new()).collect();
            for &user_id in &users {
                store.put_registration(seed_registration(event_id, user_id, ticket_type_id));
            }

            let mut handle = store.clone();
            for (user_index, op) in ops {
                let user_id = users[user_index];
                let result = match op {
                    Op::Update(status) => {
                        update_event_registration(
                            &mut handle,
                            event_id,
                            user_id,
                            StatusChange { status, reviewed_by: None },
                        )
                        .await
                    }
                    Op::Cancel => {
                        delete_event_registration(&mut handle, event_id, user_id).await
                    }
                };

                match result {
                    Ok(_)
                    | Err(RegistrationError::SoldOut)
                    | Err(RegistrationError::AlreadyCancelled) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }

                let ticket = store.ticket_type(ticket_type_id).unwrap();
                assert_eq!(
                    ticket.current_quantity,
                    store.occupying_count(ticket_type_id),
                    "counter drifted from its registrations"
                );
                assert!(ticket.current_quantity <= 2, "counter exceeded the ceiling");
            }
        });
    }
}
