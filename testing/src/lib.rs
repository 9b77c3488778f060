//! Testing utilities for Railbook.
//!
//! Provides [`MemoryReservationStore`], an in-memory implementation of
//! [`ReservationStore`](railbook_core::ReservationStore) with the same
//! atomicity and ordering semantics as the PostgreSQL backend. Each operation
//! runs under one mutex acquisition, which plays the role the row locks and
//! transactions play in production: no torn reads, no oversell races, FIFO
//! promotion.
//!
//! Behavior tests run against this store at memory speed; the HTTP layer
//! tests mount it behind the real router.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_panics_doc)] // Test-support crate

pub mod fixtures;
mod memory;

pub use fixtures::JourneyFixture;
pub use memory::MemoryReservationStore;
