//! `PostgreSQL` store implementation.
//!
//! One SQL statement per trait method. The two counter primitives are single
//! conditional `UPDATE`s checked via `rows_affected()`, so the database
//! serializes concurrent attempts at the statement level: no application
//! locks, no read-then-write window.
//!
//! A [`PostgresStore`] owns one transaction. Dropping it without calling
//! [`PostgresStore::commit`] rolls everything back, which is what makes every
//! error path abort cleanly.
//!
//! # Example
//!
//! ```no_run
//! use event_registrations::stores::postgres::{connect, PostgresStore};
//! use event_registrations::{PostgresConfig, StatusChange, RegistrationStatus};
//!
//! # async fn example(event_id: event_registrations::EventId, user_id: event_registrations::UserId) -> event_registrations::Result<()> {
//! let pool = connect(&PostgresConfig::from_env()).await?;
//! let mut store = PostgresStore::begin(&pool).await?;
//! let registration = event_registrations::update_event_registration(
//!     &mut store,
//!     event_id,
//!     user_id,
//!     StatusChange { status: RegistrationStatus::Approved, reviewed_by: None },
//! )
//! .await?;
//! store.commit().await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

use crate::config::PostgresConfig;
use crate::error::{RegistrationError, Result};
use crate::stores::RegistrationStore;
use crate::types::{
    EventId, OrderId, Registration, RegistrationId, RegistrationStatus, TicketSnapshot,
    TicketType, TicketTypeId, UserId,
};

/// Open a connection pool from configuration.
///
/// # Errors
///
/// Returns [`RegistrationError::Storage`] if the pool cannot be created.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout))
        .idle_timeout(Duration::from_secs(config.idle_timeout))
        .connect(&config.url)
        .await
        .map_err(|e| RegistrationError::Storage(format!("failed to connect: {e}")))
}

/// Run database migrations.
///
/// # Errors
///
/// Returns [`RegistrationError::Storage`] if migrations fail.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RegistrationError::Storage(format!("migration failed: {e}")))?;
    Ok(())
}

/// PostgreSQL store handle wrapping one open transaction.
pub struct PostgresStore<'c> {
    tx: Transaction<'c, Postgres>,
}

impl PostgresStore<'static> {
    /// Begin a transaction on the pool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Storage`] if the transaction cannot be
    /// started.
    pub async fn begin(pool: &PgPool) -> Result<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| RegistrationError::Storage(format!("failed to begin transaction: {e}")))?;
        Ok(Self { tx })
    }
}

impl PostgresStore<'_> {
    /// Commit the transaction, making every write visible at once.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Storage`] if the commit fails.
    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| RegistrationError::Storage(format!("failed to commit: {e}")))
    }
}

type RegistrationRow = (
    Uuid,
    Uuid,
    Uuid,
    Option<Uuid>,
    String,
    Option<Uuid>,
    Option<Uuid>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn decode_registration(row: RegistrationRow) -> Result<Registration> {
    let (id, event_id, user_id, ticket_type_id, status, order_id, reviewed_by, created_at, updated_at) =
        row;
    let status = RegistrationStatus::parse(&status).ok_or_else(|| {
        RegistrationError::Storage(format!("unknown registration status '{status}'"))
    })?;
    Ok(Registration {
        id: RegistrationId::from_uuid(id),
        event_id: EventId::from_uuid(event_id),
        user_id: UserId::from_uuid(user_id),
        ticket_type_id: ticket_type_id.map(TicketTypeId::from_uuid),
        status,
        order_id: order_id.map(OrderId::from_uuid),
        reviewed_by: reviewed_by.map(UserId::from_uuid),
        created_at,
        updated_at,
    })
}

fn quantity_to_db(quantity: u32) -> Result<i32> {
    i32::try_from(quantity)
        .map_err(|e| RegistrationError::Storage(format!("quantity out of range: {e}")))
}

fn quantity_from_db(quantity: i32) -> Result<u32> {
    u32::try_from(quantity)
        .map_err(|e| RegistrationError::Storage(format!("negative quantity in storage: {e}")))
}

impl RegistrationStore for PostgresStore<'_> {
    async fn find_registration(
        &mut self,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<Option<Registration>> {
        let row: Option<RegistrationRow> = sqlx::query_as(
            "SELECT id, event_id, user_id, ticket_type_id, status, order_id, reviewed_by,
                    created_at, updated_at
             FROM registrations
             WHERE event_id = $1 AND user_id = $2",
        )
        .bind(event_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| RegistrationError::Storage(format!("failed to load registration: {e}")))?;

        row.map(decode_registration).transpose()
    }

    async fn find_ticket_type(&mut self, id: TicketTypeId) -> Result<Option<TicketType>> {
        let row: Option<(Uuid, Uuid, i32, Option<i32>, bool, DateTime<Utc>, DateTime<Utc>)> =
            sqlx::query_as(
                "SELECT id, event_id, current_quantity, max_quantity, is_active,
                        created_at, updated_at
                 FROM ticket_types
                 WHERE id = $1",
            )
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| RegistrationError::Storage(format!("failed to load ticket type: {e}")))?;

        row.map(
            |(id, event_id, current_quantity, max_quantity, is_active, created_at, updated_at)| {
                Ok(TicketType {
                    id: TicketTypeId::from_uuid(id),
                    event_id: EventId::from_uuid(event_id),
                    current_quantity: quantity_from_db(current_quantity)?,
                    max_quantity: max_quantity.map(quantity_from_db).transpose()?,
                    is_active,
                    created_at,
                    updated_at,
                })
            },
        )
        .transpose()
    }

    async fn insert_registration(&mut self, registration: &Registration) -> Result<()> {
        sqlx::query(
            "INSERT INTO registrations
                 (id, event_id, user_id, ticket_type_id, status, order_id, reviewed_by,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(registration.id.as_uuid())
        .bind(registration.event_id.as_uuid())
        .bind(registration.user_id.as_uuid())
        .bind(registration.ticket_type_id.map(|id| *id.as_uuid()))
        .bind(registration.status.as_str())
        .bind(registration.order_id.map(|id| *id.as_uuid()))
        .bind(registration.reviewed_by.map(|id| *id.as_uuid()))
        .bind(registration.created_at)
        .bind(registration.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            // Concurrent create of the same (event, user) pair surfaces here.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return RegistrationError::AlreadyRegistered;
                }
            }
            RegistrationError::Storage(format!("failed to insert registration: {e}"))
        })?;

        Ok(())
    }

    async fn update_registration(&mut self, registration: &Registration) -> Result<()> {
        let result = sqlx::query(
            "UPDATE registrations
             SET status = $2,
                 order_id = $3,
                 reviewed_by = $4,
                 updated_at = $5
             WHERE id = $1",
        )
        .bind(registration.id.as_uuid())
        .bind(registration.status.as_str())
        .bind(registration.order_id.map(|id| *id.as_uuid()))
        .bind(registration.reviewed_by.map(|id| *id.as_uuid()))
        .bind(registration.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RegistrationError::Storage(format!("failed to update registration: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(RegistrationError::RegistrationNotFound);
        }

        Ok(())
    }

    async fn try_reserve(&mut self, id: TicketTypeId, expected: TicketSnapshot) -> Result<bool> {
        let current = quantity_to_db(expected.current_quantity)?;
        let max = expected.max_quantity.map(quantity_to_db).transpose()?;

        let result = sqlx::query(
            "UPDATE ticket_types
             SET current_quantity = current_quantity + 1,
                 updated_at = NOW()
             WHERE id = $1
               AND current_quantity = $2
               AND max_quantity IS NOT DISTINCT FROM $3
               AND (max_quantity IS NULL OR current_quantity < max_quantity)",
        )
        .bind(id.as_uuid())
        .bind(current)
        .bind(max)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RegistrationError::Storage(format!("failed to reserve slot: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    async fn try_release(&mut self, id: TicketTypeId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE ticket_types
             SET current_quantity = current_quantity - 1,
                 updated_at = NOW()
             WHERE id = $1
               AND current_quantity > 0",
        )
        .bind(id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| RegistrationError::Storage(format!("failed to release slot: {e}")))?;

        Ok(result.rows_affected() == 1)
    }
}
