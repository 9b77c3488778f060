//! Read-side queries: seat availability and PNR lookup.

use crate::{sql, store_err};
use railbook_core::error::{ReservationError, Result};
use railbook_core::types::{
    BerthType, BookingStatus, ClassId, JourneyId, JourneyView, PassengerId, PassengerStatus,
    PassengerTicketView, Pnr, SeatAvailability, TicketId, TicketView,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

pub(crate) async fn availability(
    pool: &PgPool,
    journey_id: JourneyId,
    class_id: ClassId,
) -> Result<SeatAvailability> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(store_err("failed to acquire connection"))?;

    let journey = sql::load_journey(&mut conn, journey_id).await?;
    if journey.class_id != *class_id.as_uuid() {
        return Err(ReservationError::not_found("seat configuration", class_id));
    }
    let config =
        sql::load_seat_configuration(&mut conn, journey.train_id, class_id, false).await?;
    let counts = sql::journey_counts(&mut conn, journey_id).await?;

    let available_seats = counts.available_seats(config.total_seats);
    Ok(SeatAvailability {
        journey_id,
        class_id,
        total_seats: config.total_seats,
        confirmed: counts.confirmed,
        rac: counts.rac,
        waitlisted: counts.waitlisted,
        last_waitlist_number: counts.max_waitlist_number,
        available_seats,
        status: SeatAvailability::derive_status(available_seats, counts.waitlisted),
    })
}

#[derive(Debug, FromRow)]
struct TicketHeadRow {
    id: Uuid,
    pnr: String,
    booking_status: String,
    total_fare: f64,
    booked_at: chrono::DateTime<chrono::Utc>,
    journey_id: Uuid,
    departure_at: chrono::DateTime<chrono::Utc>,
    train_number: String,
    train_name: String,
    class_name: String,
    source_station: String,
    destination_station: String,
    distance_km: f64,
}

#[derive(Debug, FromRow)]
struct PassengerRow {
    passenger_id: Uuid,
    name: String,
    age: i32,
    status: String,
    seat_number: Option<i32>,
    berth_type: Option<String>,
    waitlist_number: Option<i32>,
    fare: f64,
}

pub(crate) async fn lookup(pool: &PgPool, pnr: &Pnr) -> Result<TicketView> {
    // Under READ COMMITTED each statement would take its own snapshot, so a
    // cancellation committing between the two queries could pair a stale
    // ticket head with already-promoted passenger rows. REPEATABLE READ pins
    // one snapshot for the whole transaction.
    let mut tx = pool
        .begin()
        .await
        .map_err(store_err("failed to begin transaction"))?;
    sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
        .execute(&mut *tx)
        .await
        .map_err(store_err("failed to set isolation level"))?;

    let head = sqlx::query_as::<_, TicketHeadRow>(
        "SELECT t.id, t.pnr, t.booking_status, t.total_fare, t.booked_at,
                j.id AS journey_id, j.departure_at,
                tr.number AS train_number, tr.name AS train_name,
                c.name AS class_name,
                src.name AS source_station, dst.name AS destination_station,
                ABS(rd.distance_from_source_km - rs.distance_from_source_km) AS distance_km
         FROM ticket t
         JOIN journey j ON j.id = t.journey_id
         JOIN schedule sc ON sc.id = j.schedule_id
         JOIN train tr ON tr.id = sc.train_id
         JOIN travel_class c ON c.id = j.class_id
         JOIN station src ON src.id = j.source_station_id
         JOIN station dst ON dst.id = j.destination_station_id
         JOIN route_segment rs ON rs.train_id = tr.id AND rs.station_id = j.source_station_id
         JOIN route_segment rd ON rd.train_id = tr.id AND rd.station_id = j.destination_station_id
         WHERE t.pnr = $1",
    )
    .bind(pnr.as_str())
    .fetch_optional(&mut *tx)
    .await
    .map_err(store_err("failed to load ticket"))?
    .ok_or_else(|| ReservationError::not_found("ticket", pnr))?;

    let rows = sqlx::query_as::<_, PassengerRow>(
        "SELECT pt.passenger_id, p.name, p.age, pt.status, pt.seat_number, pt.berth_type,
                pt.waitlist_number, pt.fare
         FROM passenger_ticket pt
         JOIN passenger p ON p.id = pt.passenger_id
         WHERE pt.ticket_id = $1
         ORDER BY pt.pos",
    )
    .bind(head.id)
    .fetch_all(&mut *tx)
    .await
    .map_err(store_err("failed to load passengers"))?;

    tx.commit()
        .await
        .map_err(store_err("failed to commit lookup"))?;

    let mut passengers = Vec::with_capacity(rows.len());
    for row in rows {
        passengers.push(PassengerTicketView {
            passenger_id: PassengerId::from_uuid(row.passenger_id),
            name: row.name,
            age: row.age,
            status: PassengerStatus::parse(&row.status)?,
            seat_number: row.seat_number,
            berth_type: row.berth_type.as_deref().map(BerthType::parse).transpose()?,
            waitlist_number: row.waitlist_number,
            fare: row.fare,
        });
    }

    Ok(TicketView {
        ticket_id: TicketId::from_uuid(head.id),
        pnr: Pnr::parse(&head.pnr)?,
        booking_status: BookingStatus::parse(&head.booking_status)?,
        total_fare: head.total_fare,
        booked_at: head.booked_at,
        journey: JourneyView {
            journey_id: JourneyId::from_uuid(head.journey_id),
            train_number: head.train_number,
            train_name: head.train_name,
            class_name: head.class_name,
            source_station: head.source_station,
            destination_station: head.destination_station,
            departure_at: head.departure_at,
            distance_km: head.distance_km,
        },
        passengers,
    })
}
