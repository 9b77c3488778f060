//! Seat availability handler.

use crate::{AppError, AppState};
use axum::{
    extract::{Query, State},
    Json,
};
use railbook_core::types::{ClassId, JourneyId, SeatAvailability};
use serde::Deserialize;
use uuid::Uuid;

/// Query parameters for `GET /api/seats`.
#[derive(Debug, Deserialize)]
pub struct SeatsQuery {
    /// Journey to inspect.
    pub journey_id: Uuid,
    /// Travel class within the journey.
    pub class_id: Uuid,
}

/// Returns the current availability snapshot for a (journey, class).
///
/// # Endpoint
///
/// ```text
/// GET /api/seats?journey_id=...&class_id=...
/// ```
pub async fn get_availability(
    State(state): State<AppState>,
    Query(query): Query<SeatsQuery>,
) -> Result<Json<SeatAvailability>, AppError> {
    let availability = state
        .store
        .availability(
            JourneyId::from_uuid(query.journey_id),
            ClassId::from_uuid(query.class_id),
        )
        .await?;
    Ok(Json(availability))
}
