//! Application state for Axum handlers.

use railbook_core::ReservationStore;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Holds the reservation store behind a trait object so the same router
/// serves the PostgreSQL store in production and the in-memory store in
/// tests.
#[derive(Clone)]
pub struct AppState {
    /// The reservation store backing every endpoint.
    pub store: Arc<dyn ReservationStore>,
}

impl AppState {
    /// Create a new application state around a reservation store.
    #[must_use]
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }
}
