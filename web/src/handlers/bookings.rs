//! Booking and cancellation handlers.

use crate::{AppError, AppState};
use axum::{extract::State, http::StatusCode, Json};
use railbook_core::types::{BookingRequest, CancellationResult, Pnr, TicketSummary};
use serde::Deserialize;

/// Request body for `POST /api/bookings/cancel`.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// PNR of the ticket to cancel.
    pub pnr: String,
    /// Optional free-text reason, stored with the cancellation record.
    pub reason: Option<String>,
}

/// Books a ticket for one or more passengers.
///
/// Confirms as many passengers as seats remain and waitlists the rest,
/// atomically.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings
/// ```
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<TicketSummary>), AppError> {
    let summary = state.store.book(&request).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Cancels a ticket by PNR and promotes waitlisted passengers into the
/// freed seats.
///
/// # Endpoint
///
/// ```text
/// POST /api/bookings/cancel
/// ```
pub async fn cancel_booking(
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<CancellationResult>, AppError> {
    let pnr = Pnr::parse(&request.pnr)?;
    let result = state.store.cancel(&pnr, request.reason.as_deref()).await?;
    Ok(Json(result))
}
