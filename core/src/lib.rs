//! Core domain logic for the Railbook reservation system.
//!
//! This crate contains everything that can be decided without touching a
//! database: identifiers, status enumerations, fare calculation, the
//! confirm/waitlist allocation planner, the refund policy, and the error
//! taxonomy. The [`store::ReservationStore`] trait is the transactional seam
//! between this pure core and the storage backends (`railbook-postgres` for
//! production, `railbook-testing` for tests).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Imperative Shell (stores)        │  ← transactions, row locks
//! │  - Read counts under lock               │
//! │  - Persist planned allocations          │
//! ├─────────────────────────────────────────┤
//! │        Functional Core (this crate)     │
//! │  - Fare & refund arithmetic             │  ← testable at memory speed
//! │  - Seat/berth/waitlist planning         │  ← no I/O, no side effects
//! │  - Status roll-up rules                 │
//! └─────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod allocation;
pub mod error;
pub mod fare;
pub mod store;
pub mod types;

pub use error::{ReservationError, Result};
pub use store::ReservationStore;
pub use types::{
    BerthType, BookingRequest, BookingStatus, CancellationResult, PassengerStatus, Pnr,
    SeatAvailability, TicketSummary, TicketView,
};
