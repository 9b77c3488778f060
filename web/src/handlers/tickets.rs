//! Ticket lookup handler.

use crate::{AppError, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use railbook_core::types::{Pnr, TicketView};
use serde::Deserialize;

/// Query parameters for `GET /api/tickets`.
#[derive(Debug, Deserialize)]
pub struct TicketQuery {
    /// PNR to look up.
    pub pnr: String,
}

/// Looks up a ticket by PNR.
///
/// # Endpoint
///
/// ```text
/// GET /api/tickets?pnr=1234567890
/// ```
pub async fn get_ticket(
    State(state): State<AppState>,
    Query(query): Query<TicketQuery>,
) -> Result<Json<TicketView>, AppError> {
    let pnr = Pnr::parse(&query.pnr)?;
    let view = state.store.lookup(&pnr).await?;
    Ok(Json(view))
}
