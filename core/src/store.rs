//! The transactional seam between the domain core and storage backends.

use crate::error::Result;
use crate::types::{
    BookingRequest, CancellationResult, ClassId, JourneyId, Pnr, SeatAvailability, TicketSummary,
    TicketView,
};
use async_trait::async_trait;

/// A reservation store executes each operation as one atomic unit of work.
///
/// Implementations must guarantee:
///
/// - `book` decides the confirm/waitlist split and inserts the ticket within
///   a single transaction, serialized per (journey, class) so concurrent
///   bookings cannot both confirm into the last seat.
/// - `cancel` marks the ticket cancelled, records the refund, and promotes
///   waitlisted passengers in ascending waitlist-number order, all in one
///   transaction; any failure rolls everything back.
/// - `availability` and `lookup` are read-only and return a consistent
///   snapshot, never a torn read across the joined tables.
///
/// Retries on transient store errors are the caller's responsibility.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Books a journey for a list of passengers.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::Validation`](crate::ReservationError::Validation)
    ///   for an empty or malformed passenger list, or a class that does not
    ///   match the journey.
    /// - [`ReservationError::NotFound`](crate::ReservationError::NotFound)
    ///   for a missing journey or seat configuration.
    /// - [`ReservationError::SourceEqualsDestination`](crate::ReservationError::SourceEqualsDestination)
    ///   for a degenerate journey.
    /// - [`ReservationError::Store`](crate::ReservationError::Store) when the
    ///   transaction fails; nothing is persisted in that case.
    async fn book(&self, request: &BookingRequest) -> Result<TicketSummary>;

    /// Cancels the ticket with this PNR and promotes waitlisted passengers
    /// into the freed seats.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::NotFound`](crate::ReservationError::NotFound)
    ///   when no ticket has this PNR.
    /// - [`ReservationError::AlreadyCancelled`](crate::ReservationError::AlreadyCancelled)
    ///   when the ticket was cancelled before.
    /// - [`ReservationError::JourneyDeparted`](crate::ReservationError::JourneyDeparted)
    ///   when the journey has already left.
    /// - [`ReservationError::Store`](crate::ReservationError::Store) when the
    ///   transaction fails; no partial promotion is ever visible.
    async fn cancel(&self, pnr: &Pnr, reason: Option<&str>) -> Result<CancellationResult>;

    /// Returns the current seat inventory snapshot for a (journey, class).
    ///
    /// # Errors
    ///
    /// [`ReservationError::NotFound`](crate::ReservationError::NotFound) for
    /// a missing journey or seat configuration.
    async fn availability(
        &self,
        journey_id: JourneyId,
        class_id: ClassId,
    ) -> Result<SeatAvailability>;

    /// Read-only projection of a ticket and its passengers.
    ///
    /// # Errors
    ///
    /// [`ReservationError::NotFound`](crate::ReservationError::NotFound) when
    /// no ticket has this PNR.
    async fn lookup(&self, pnr: &Pnr) -> Result<TicketView>;
}
