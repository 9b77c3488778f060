//! Shared row types and loaders used by the booking, cancellation, and
//! read-side modules. All loaders take a `PgConnection` so they compose the
//! same way inside and outside transactions.

use crate::store_err;
use railbook_core::allocation::JourneyCounts;
use railbook_core::error::{ReservationError, Result};
use railbook_core::types::{ClassId, JourneyId};
use sqlx::postgres::PgConnection;
use sqlx::FromRow;
use uuid::Uuid;

/// A journey joined with its schedule's train.
#[derive(Debug, FromRow)]
pub(crate) struct JourneyRow {
    pub class_id: Uuid,
    pub source_station_id: Uuid,
    pub destination_station_id: Uuid,
    pub departure_at: chrono::DateTime<chrono::Utc>,
    pub train_id: Uuid,
}

/// Capacity and rate for a (train, class).
#[derive(Debug, FromRow)]
pub(crate) struct SeatConfigRow {
    pub total_seats: i32,
    pub fare_per_km: f64,
}

#[derive(Debug, FromRow)]
struct CountsRow {
    confirmed: i32,
    rac: i32,
    waitlisted: i32,
    max_seat_number: i32,
    max_waitlist_number: i32,
}

pub(crate) async fn load_journey(
    conn: &mut PgConnection,
    journey_id: JourneyId,
) -> Result<JourneyRow> {
    sqlx::query_as::<_, JourneyRow>(
        "SELECT j.class_id, j.source_station_id, j.destination_station_id,
                j.departure_at, s.train_id
         FROM journey j
         JOIN schedule s ON s.id = j.schedule_id
         WHERE j.id = $1",
    )
    .bind(journey_id.as_uuid())
    .fetch_optional(conn)
    .await
    .map_err(store_err("failed to load journey"))?
    .ok_or_else(|| ReservationError::not_found("journey", journey_id))
}

/// Loads the seat configuration, optionally locking the row for the rest of
/// the transaction. The lock is what serializes concurrent bookings and
/// promotions for a (train, class).
pub(crate) async fn load_seat_configuration(
    conn: &mut PgConnection,
    train_id: Uuid,
    class_id: ClassId,
    lock: bool,
) -> Result<SeatConfigRow> {
    let base = "SELECT total_seats, fare_per_km
         FROM seat_configuration
         WHERE train_id = $1 AND class_id = $2";
    let query = if lock {
        format!("{base} FOR UPDATE")
    } else {
        base.to_string()
    };
    sqlx::query_as::<_, SeatConfigRow>(&query)
        .bind(train_id)
        .bind(class_id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(store_err("failed to load seat configuration"))?
        .ok_or_else(|| ReservationError::not_found("seat configuration", class_id))
}

/// Journey distance from the route segments of source and destination.
pub(crate) async fn journey_distance_km(
    conn: &mut PgConnection,
    train_id: Uuid,
    source_station_id: Uuid,
    destination_station_id: Uuid,
) -> Result<f64> {
    let row: Option<(f64,)> = sqlx::query_as(
        "SELECT ABS(dst.distance_from_source_km - src.distance_from_source_km)
         FROM route_segment src, route_segment dst
         WHERE src.train_id = $1 AND src.station_id = $2
           AND dst.train_id = $1 AND dst.station_id = $3",
    )
    .bind(train_id)
    .bind(source_station_id)
    .bind(destination_station_id)
    .fetch_optional(conn)
    .await
    .map_err(store_err("failed to compute journey distance"))?;
    row.map(|(d,)| d)
        .ok_or_else(|| ReservationError::not_found("route segment", train_id))
}

/// Current occupancy of a journey, grouped over the passenger-ticket rows.
/// Seat numbers count only while confirmed and waitlist numbers only while
/// waitlisted, so freed seats are reusable and promotions do not inflate the
/// next waitlist number.
pub(crate) async fn journey_counts(
    conn: &mut PgConnection,
    journey_id: JourneyId,
) -> Result<JourneyCounts> {
    let row = sqlx::query_as::<_, CountsRow>(
        "SELECT
            COUNT(*) FILTER (WHERE pt.status = 'CONFIRMED')::INT AS confirmed,
            COUNT(*) FILTER (WHERE pt.status = 'RAC')::INT AS rac,
            COUNT(*) FILTER (WHERE pt.status = 'WAITLISTED')::INT AS waitlisted,
            COALESCE(MAX(pt.seat_number) FILTER (WHERE pt.status = 'CONFIRMED'), 0)::INT
                AS max_seat_number,
            COALESCE(MAX(pt.waitlist_number) FILTER (WHERE pt.status = 'WAITLISTED'), 0)::INT
                AS max_waitlist_number
         FROM passenger_ticket pt
         JOIN ticket t ON t.id = pt.ticket_id
         WHERE t.journey_id = $1",
    )
    .bind(journey_id.as_uuid())
    .fetch_one(conn)
    .await
    .map_err(store_err("failed to count journey occupancy"))?;
    Ok(JourneyCounts {
        confirmed: row.confirmed,
        rac: row.rac,
        waitlisted: row.waitlisted,
        max_seat_number: row.max_seat_number,
        max_waitlist_number: row.max_waitlist_number,
    })
}

/// Discount percentage for a concession category; unknown categories are 0%.
pub(crate) async fn concession_percent(
    conn: &mut PgConnection,
    category: Option<&str>,
) -> Result<f64> {
    let Some(category) = category else {
        return Ok(0.0);
    };
    let row: Option<(f64,)> =
        sqlx::query_as("SELECT discount_percent FROM concession WHERE category = $1")
            .bind(category)
            .fetch_optional(conn)
            .await
            .map_err(store_err("failed to load concession"))?;
    Ok(row.map_or(0.0, |(p,)| p))
}
