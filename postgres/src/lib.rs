//! PostgreSQL reservation store for Railbook.
//!
//! Implements [`ReservationStore`] on top of sqlx. Every mutating operation
//! is one transaction, and the confirm/waitlist decision is serialized per
//! (train, class) by taking `SELECT ... FOR UPDATE` on the seat-configuration
//! row before reading the occupancy counts. Two concurrent bookings against
//! the same class therefore queue behind each other and can never both
//! confirm into the last seat; cancellations take the same lock so waitlist
//! promotion stays FIFO under concurrency.
//!
//! Queries use runtime binding rather than the compile-time checked macros so
//! the workspace builds without a live database.
//!
//! # Example
//!
//! ```ignore
//! use railbook_postgres::PostgresReservationStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresReservationStore::connect("postgres://localhost/railbook").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod booking;
mod cancellation;
mod queries;
mod sql;

use async_trait::async_trait;
use railbook_core::error::{ReservationError, Result};
use railbook_core::types::{
    BookingRequest, CancellationResult, ClassId, JourneyId, Pnr, SeatAvailability, TicketSummary,
    TicketView,
};
use railbook_core::ReservationStore;
use sqlx::PgPool;

/// PostgreSQL-backed reservation store.
#[derive(Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
}

impl PostgresReservationStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the given database URL with default pool settings.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Store`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| ReservationError::Store(format!("failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Runs the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Store`] if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ReservationError::Store(format!("migration failed: {e}")))?;
        Ok(())
    }

    /// Returns the underlying pool, for callers that need ad hoc queries
    /// (seeding fixtures, health checks).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Wraps an sqlx error with context as a store error.
pub(crate) fn store_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> ReservationError {
    move |e| ReservationError::Store(format!("{context}: {e}"))
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    #[tracing::instrument(
        skip(self, request),
        fields(journey = %request.journey_id, passengers = request.passengers.len())
    )]
    async fn book(&self, request: &BookingRequest) -> Result<TicketSummary> {
        booking::book(&self.pool, request).await
    }

    #[tracing::instrument(skip(self), fields(pnr = %pnr))]
    async fn cancel(&self, pnr: &Pnr, reason: Option<&str>) -> Result<CancellationResult> {
        cancellation::cancel(&self.pool, pnr, reason).await
    }

    #[tracing::instrument(skip(self), fields(journey = %journey_id))]
    async fn availability(
        &self,
        journey_id: JourneyId,
        class_id: ClassId,
    ) -> Result<SeatAvailability> {
        queries::availability(&self.pool, journey_id, class_id).await
    }

    #[tracing::instrument(skip(self), fields(pnr = %pnr))]
    async fn lookup(&self, pnr: &Pnr) -> Result<TicketView> {
        queries::lookup(&self.pool, pnr).await
    }
}
