//! # Event Registrations
//!
//! Event-ticket inventory and registration-status transition engine: keeps a
//! finite ticket inventory (`current_quantity` / `max_quantity`) consistent
//! with the set of registrations currently holding a slot, under concurrent
//! status changes (approve, reject, cancel, re-apply) issued by different
//! users and admins at the same time.
//!
//! The surrounding platform (forms, pages, notifications, sessions, payment
//! channels, admin UIs) stays outside; it calls in through the coordinator
//! operations and owns everything user-facing.
//!
//! ## Architecture
//!
//! ```text
//! handler → coordinator → {status classifier, transition engine}
//!                       → inventory tracker → store      (one transaction)
//! ```
//!
//! No in-process locks anywhere: the store's two conditional counter updates
//! are single atomic statements, making the storage engine the serialization
//! point. Two concurrent reservations of the last slot both issue the
//! conditional increment; exactly one matches, the other is told "sold out"
//! and decides for itself whether to retry or waitlist.
//!
//! ## Example: approving a registration
//!
//! ```rust,ignore
//! use event_registrations::*;
//! use event_registrations::stores::postgres::PostgresStore;
//!
//! let mut store = PostgresStore::begin(&pool).await?;
//! let registration = update_event_registration(
//!     &mut store,
//!     event_id,
//!     user_id,
//!     StatusChange { status: RegistrationStatus::Approved, reviewed_by: Some(admin_id) },
//! )
//! .await?;
//! store.commit().await?;
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod config;
pub mod coordinator;
pub mod error;
pub mod stores;
pub mod transition;
pub mod types;

// Counter mutation stays crate-private; the coordinator is its only caller.
pub(crate) mod inventory;

// Re-export main types for convenience
pub use config::PostgresConfig;
pub use coordinator::{
    create_event_registration, delete_event_registration, update_event_registration,
};
pub use error::{RegistrationError, Result};
pub use stores::RegistrationStore;
pub use transition::{plan_transition, InventoryAction};
pub use types::{
    EventId, NewRegistration, OrderId, Registration, RegistrationId, RegistrationStatus,
    StatusChange, TicketSnapshot, TicketType, TicketTypeId, UserId,
};
