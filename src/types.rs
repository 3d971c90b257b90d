//! Domain types for event registrations and ticket inventory.
//!
//! Contains the identifier newtypes, the registration status enum with its
//! occupying/non-occupying classification, and the registration and ticket-type
//! records the coordinator operates on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for an event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random `EventId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `EventId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a user
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random `UserId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `UserId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketTypeId(Uuid);

impl TicketTypeId {
    /// Creates a new random `TicketTypeId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `TicketTypeId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketTypeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a registration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(Uuid);

impl RegistrationId {
    /// Creates a new random `RegistrationId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `RegistrationId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RegistrationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a payment order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random `OrderId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an `OrderId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Registration Status
// ============================================================================

/// Lifecycle status of an event registration.
///
/// The status space partitions into two disjoint sets: statuses that occupy a
/// ticket-type slot (`PendingPayment`, `Pending`, `Approved`) and statuses
/// that hold none (`Waitlisted`, `Rejected`, `Cancelled`). `Cancelled` is
/// terminal: it can only be left through an explicit re-application, never by
/// a second cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Slot held while an order awaits payment
    PendingPayment,
    /// Slot held while an organizer review is outstanding
    Pending,
    /// Confirmed attendee
    Approved,
    /// Parked behind capacity; holds no slot
    Waitlisted,
    /// Turned down by a reviewer
    Rejected,
    /// Withdrawn; terminal
    Cancelled,
}

impl RegistrationStatus {
    /// Every status, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::PendingPayment,
        Self::Pending,
        Self::Approved,
        Self::Waitlisted,
        Self::Rejected,
        Self::Cancelled,
    ];

    /// Returns `true` if a registration in this status counts against its
    /// ticket type's capacity.
    ///
    /// Pure classification with no side effects; the transition engine derives
    /// every inventory delta from it. The match is exhaustive on purpose: a new
    /// variant must pick a side here before anything compiles.
    #[must_use]
    pub const fn occupies_slot(self) -> bool {
        match self {
            Self::PendingPayment | Self::Pending | Self::Approved => true,
            Self::Waitlisted | Self::Rejected | Self::Cancelled => false,
        }
    }

    /// Column encoding used by the `registrations.status` TEXT column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingPayment => "PENDING_PAYMENT",
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Waitlisted => "WAITLISTED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses the column encoding. Returns `None` for unknown strings; the
    /// store layer treats that as corrupt data, not as a default.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING_PAYMENT" => Some(Self::PendingPayment),
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "WAITLISTED" => Some(Self::Waitlisted),
            "REJECTED" => Some(Self::Rejected),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A user's registration for one event.
///
/// Unique per `(event_id, user_id)`. Only the transaction coordinator mutates
/// `status`, and always in the same atomic unit as the matching inventory
/// delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Row identifier
    pub id: RegistrationId,
    /// Event being registered for
    pub event_id: EventId,
    /// Registering user
    pub user_id: UserId,
    /// Ticket type whose inventory this registration draws from, if any
    pub ticket_type_id: Option<TicketTypeId>,
    /// Current lifecycle status
    pub status: RegistrationStatus,
    /// Payment order backing the registration, if one exists
    pub order_id: Option<OrderId>,
    /// Admin who last reviewed the registration
    pub reviewed_by: Option<UserId>,
    /// When the registration was created
    pub created_at: DateTime<Utc>,
    /// When the registration was last modified
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a registration in its initial lifecycle status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRegistration {
    /// Event being registered for
    pub event_id: EventId,
    /// Registering user
    pub user_id: UserId,
    /// Ticket type to draw inventory from, if the event sells tickets
    pub ticket_type_id: Option<TicketTypeId>,
    /// Initial status (`PendingPayment`, `Pending`, `Approved` or `Waitlisted`,
    /// depending on what the event requires)
    pub status: RegistrationStatus,
    /// Payment order backing the registration, if one exists
    pub order_id: Option<OrderId>,
}

/// Requested status change for an existing registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    /// Target status
    pub status: RegistrationStatus,
    /// Admin performing the review, recorded on the registration when set
    pub reviewed_by: Option<UserId>,
}

/// Inventory counters for one ticket type of an event.
///
/// `current_quantity` equals the number of registrations referencing this
/// ticket type whose status occupies a slot. The equality is emergent: every
/// status write is paired with exactly one counter delta inside one
/// transaction, and the counter is never recomputed by scanning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketType {
    /// Row identifier
    pub id: TicketTypeId,
    /// Owning event
    pub event_id: EventId,
    /// Slots currently held by occupying registrations
    pub current_quantity: u32,
    /// Capacity ceiling; `None` means unlimited
    pub max_quantity: Option<u32>,
    /// Whether new sign-ups are being accepted (consulted by the form layer,
    /// not by status transitions)
    pub is_active: bool,
    /// When the ticket type was created
    pub created_at: DateTime<Utc>,
    /// When the counters were last modified
    pub updated_at: DateTime<Utc>,
}

impl TicketType {
    /// The counter state observed right before a conditional reserve; the
    /// store only applies the increment if the row still matches it.
    #[must_use]
    pub const fn snapshot(&self) -> TicketSnapshot {
        TicketSnapshot {
            current_quantity: self.current_quantity,
            max_quantity: self.max_quantity,
        }
    }
}

/// Counter snapshot guarding a conditional reserve against concurrent writers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSnapshot {
    /// Observed `current_quantity`
    pub current_quantity: u32,
    /// Observed `max_quantity`
    pub max_quantity: Option<u32>,
}

impl TicketSnapshot {
    /// Whether a reserve against this snapshot could succeed capacity-wise.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.max_quantity.is_none_or(|max| self.current_quantity < max)
    }
}
