//! The booking engine: one transaction from availability read to ticket
//! insert.

use crate::{sql, store_err};
use railbook_core::allocation;
use railbook_core::error::{ReservationError, Result};
use railbook_core::fare;
use railbook_core::types::{
    BookingRequest, BookingStatus, PassengerId, PassengerStatus, PassengerTicketView, Pnr,
    TicketId, TicketSummary,
};
use sqlx::PgPool;

/// Attempts at drawing an unused PNR before giving up. The UNIQUE constraint
/// on `ticket.pnr` backstops the in-transaction existence check.
const PNR_ATTEMPTS: u32 = 5;

pub(crate) async fn book(pool: &PgPool, request: &BookingRequest) -> Result<TicketSummary> {
    request.validate()?;

    let mut tx = pool
        .begin()
        .await
        .map_err(store_err("failed to begin transaction"))?;

    let journey = sql::load_journey(&mut tx, request.journey_id).await?;
    if journey.class_id != *request.class_id.as_uuid() {
        // The journey is not bookable in this class.
        return Err(ReservationError::not_found(
            "seat configuration",
            request.class_id,
        ));
    }
    if journey.source_station_id == journey.destination_station_id {
        return Err(ReservationError::SourceEqualsDestination);
    }

    // Row lock: from here to commit, no other booking or cancellation can
    // read or change this (train, class)'s occupancy.
    let config =
        sql::load_seat_configuration(&mut tx, journey.train_id, request.class_id, true).await?;
    let distance_km = sql::journey_distance_km(
        &mut tx,
        journey.train_id,
        journey.source_station_id,
        journey.destination_station_id,
    )
    .await?;

    let counts = sql::journey_counts(&mut tx, request.journey_id).await?;
    let plan = allocation::plan_allocations(&counts, config.total_seats, request.passengers.len());

    // Price each passenger and resolve or create their passenger row.
    let mut views = Vec::with_capacity(request.passengers.len());
    let mut total_fare = 0.0;
    for (details, slot) in request.passengers.iter().zip(&plan) {
        let concession = sql::concession_percent(&mut tx, details.concession.as_deref()).await?;
        let passenger_fare =
            fare::fare_for_passenger(config.fare_per_km, distance_km, details.age, concession);
        total_fare += passenger_fare;

        let passenger_id = match details.passenger_id {
            Some(id) => {
                let (exists,): (bool,) =
                    sqlx::query_as("SELECT EXISTS(SELECT 1 FROM passenger WHERE id = $1)")
                        .bind(id.as_uuid())
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(store_err("failed to check passenger"))?;
                if !exists {
                    return Err(ReservationError::not_found("passenger", id));
                }
                id
            }
            None => {
                let id = PassengerId::new();
                sqlx::query(
                    "INSERT INTO passenger (id, name, age, gender, contact)
                     VALUES ($1, $2, $3, $4, $5)",
                )
                .bind(id.as_uuid())
                .bind(&details.name)
                .bind(details.age)
                .bind(details.gender.as_deref())
                .bind(details.contact.as_deref())
                .execute(&mut *tx)
                .await
                .map_err(store_err("failed to create passenger"))?;
                id
            }
        };

        views.push(PassengerTicketView {
            passenger_id,
            name: details.name.clone(),
            age: details.age,
            status: slot.status,
            seat_number: slot.seat_number,
            berth_type: slot.berth_type,
            waitlist_number: slot.waitlist_number,
            fare: passenger_fare,
        });
    }

    let booking_status =
        BookingStatus::roll_up(&plan.iter().map(|s| s.status).collect::<Vec<_>>());
    let pnr = next_free_pnr(&mut tx).await?;
    let ticket_id = TicketId::new();

    sqlx::query(
        "INSERT INTO ticket (id, pnr, journey_id, booking_status, total_fare)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(ticket_id.as_uuid())
    .bind(pnr.as_str())
    .bind(request.journey_id.as_uuid())
    .bind(booking_status.as_str())
    .bind(total_fare)
    .execute(&mut *tx)
    .await
    .map_err(store_err("failed to insert ticket"))?;

    for (pos, view) in views.iter().enumerate() {
        sqlx::query(
            "INSERT INTO passenger_ticket
                (id, ticket_id, passenger_id, pos, status, seat_number, berth_type,
                 waitlist_number, fare)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(ticket_id.as_uuid())
        .bind(view.passenger_id.as_uuid())
        .bind(i32::try_from(pos).unwrap_or(i32::MAX))
        .bind(view.status.as_str())
        .bind(view.seat_number)
        .bind(view.berth_type.map(railbook_core::types::BerthType::as_str))
        .bind(view.waitlist_number)
        .bind(view.fare)
        .execute(&mut *tx)
        .await
        .map_err(store_err("failed to insert passenger ticket"))?;
    }

    tx.commit()
        .await
        .map_err(store_err("failed to commit booking"))?;

    let confirmed = views
        .iter()
        .filter(|v| v.status == PassengerStatus::Confirmed)
        .count();
    tracing::info!(
        pnr = %pnr,
        confirmed,
        waitlisted = views.len() - confirmed,
        total_fare,
        "booking committed"
    );

    Ok(TicketSummary {
        ticket_id,
        pnr,
        journey_id: request.journey_id,
        booking_status,
        total_fare,
        passengers: views,
    })
}

/// Draws random ten-digit PNRs until one is unused.
async fn next_free_pnr(tx: &mut sqlx::PgConnection) -> Result<Pnr> {
    for _ in 0..PNR_ATTEMPTS {
        let pnr = {
            let mut rng = rand::thread_rng();
            Pnr::generate(&mut rng)
        };
        let (taken,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM ticket WHERE pnr = $1)")
            .bind(pnr.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err("failed to check PNR"))?;
        if !taken {
            return Ok(pnr);
        }
        tracing::warn!(pnr = %pnr, "PNR collision, redrawing");
    }
    Err(ReservationError::Store(
        "could not allocate a unique PNR".to_string(),
    ))
}
