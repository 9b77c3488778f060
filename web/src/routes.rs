//! Router assembly.

use crate::handlers::{bookings, health, seats, tickets};
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Builds the application router over the given state.
///
/// All `/api` routes share the same [`AppState`]; the trace layer logs one
/// span per request.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/cancel", post(bookings::cancel_booking))
        .route("/api/tickets", get(tickets::get_ticket))
        .route("/api/seats", get(seats::get_availability))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
