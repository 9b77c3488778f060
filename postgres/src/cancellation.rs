//! Cancellation and waitlist promotion: one transaction from the departed
//! check to the last status roll-up.

use crate::{sql, store_err};
use chrono::Utc;
use railbook_core::allocation::{self, FreedSeat};
use railbook_core::error::{ReservationError, Result};
use railbook_core::fare;
use railbook_core::types::{
    BerthType, BookingStatus, CancellationResult, CancelledPassenger, ClassId, PassengerStatus,
    Pnr, TicketId,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct TicketHead {
    id: Uuid,
    journey_id: Uuid,
    total_fare: f64,
    departure_at: chrono::DateTime<chrono::Utc>,
    class_id: Uuid,
    train_id: Uuid,
}

#[derive(Debug, FromRow)]
struct PassengerTicketRow {
    name: String,
    status: String,
    seat_number: Option<i32>,
    berth_type: Option<String>,
    waitlist_number: Option<i32>,
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    ticket_id: Uuid,
}

pub(crate) async fn cancel(
    pool: &PgPool,
    pnr: &Pnr,
    reason: Option<&str>,
) -> Result<CancellationResult> {
    let mut tx = pool
        .begin()
        .await
        .map_err(store_err("failed to begin transaction"))?;

    let head = sqlx::query_as::<_, TicketHead>(
        "SELECT t.id, t.journey_id, t.total_fare, j.departure_at, j.class_id, s.train_id
         FROM ticket t
         JOIN journey j ON j.id = t.journey_id
         JOIN schedule s ON s.id = j.schedule_id
         WHERE t.pnr = $1
         FOR UPDATE OF t",
    )
    .bind(pnr.as_str())
    .fetch_optional(&mut *tx)
    .await
    .map_err(store_err("failed to load ticket"))?
    .ok_or_else(|| ReservationError::not_found("ticket", pnr))?;

    // A ticket is cancellable exactly once. The booking status is not a
    // reliable guard: promotion can confirm a cancelled ticket's own
    // waitlisted passenger, flipping its status back, so the append-only
    // cancellation record is the source of truth.
    let (already,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM cancellation WHERE ticket_id = $1)")
            .bind(head.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(store_err("failed to check cancellation"))?;
    if already {
        return Err(ReservationError::AlreadyCancelled {
            pnr: pnr.as_str().to_string(),
        });
    }

    let now = Utc::now();
    if head.departure_at <= now {
        return Err(ReservationError::JourneyDeparted {
            pnr: pnr.as_str().to_string(),
        });
    }

    // Same lock the booking path takes, so promotion is serialized against
    // concurrent bookings and cancellations for this (train, class).
    let _config = sql::load_seat_configuration(
        &mut tx,
        head.train_id,
        ClassId::from_uuid(head.class_id),
        true,
    )
    .await?;

    let prior = sqlx::query_as::<_, PassengerTicketRow>(
        "SELECT p.name, pt.status, pt.seat_number, pt.berth_type, pt.waitlist_number
         FROM passenger_ticket pt
         JOIN passenger p ON p.id = pt.passenger_id
         WHERE pt.ticket_id = $1
         ORDER BY pt.pos",
    )
    .bind(head.id)
    .fetch_all(&mut *tx)
    .await
    .map_err(store_err("failed to load passenger tickets"))?;

    // Seats freed by this ticket's confirmed passengers, in seat order: the
    // i-th promoted passenger inherits the i-th freed seat.
    let mut freed: Vec<FreedSeat> = Vec::new();
    for row in &prior {
        if row.status == PassengerStatus::Confirmed.as_str() {
            if let (Some(seat_number), Some(berth)) = (row.seat_number, row.berth_type.as_deref()) {
                freed.push(FreedSeat {
                    seat_number,
                    berth_type: BerthType::parse(berth)?,
                });
            }
        }
    }
    freed.sort_by_key(|f| f.seat_number);

    // Candidates are captured against the pre-cancellation waitlist, ordered
    // FIFO; the cancelled ticket's own waitlisted passengers keep their
    // place in the queue. Row locks hold the ordering stable.
    let candidates: Vec<CandidateRow> = if freed.is_empty() {
        Vec::new()
    } else {
        sqlx::query_as::<_, CandidateRow>(
            "SELECT pt.id, pt.ticket_id
             FROM passenger_ticket pt
             JOIN ticket t ON t.id = pt.ticket_id
             WHERE t.journey_id = $1 AND pt.status = 'WAITLISTED'
             ORDER BY pt.waitlist_number ASC
             LIMIT $2
             FOR UPDATE OF pt",
        )
        .bind(head.journey_id)
        .bind(i64::try_from(freed.len()).unwrap_or(i64::MAX))
        .fetch_all(&mut *tx)
        .await
        .map_err(store_err("failed to load waitlist"))?
    };

    // Mark the ticket and all its passenger-tickets cancelled. Seat and
    // waitlist fields are kept for history.
    sqlx::query("UPDATE ticket SET booking_status = 'CANCELLED' WHERE id = $1")
        .bind(head.id)
        .execute(&mut *tx)
        .await
        .map_err(store_err("failed to cancel ticket"))?;
    sqlx::query(
        "UPDATE passenger_ticket SET status = 'CANCELLED'
         WHERE ticket_id = $1 AND status <> 'CANCELLED'",
    )
    .bind(head.id)
    .execute(&mut *tx)
    .await
    .map_err(store_err("failed to cancel passenger tickets"))?;

    let hours_left = fare::hours_before_departure(now, head.departure_at);
    let refund_percent = fare::refund_percent(hours_left);
    let refund_amount = fare::refund_amount(head.total_fare, refund_percent);

    sqlx::query(
        "INSERT INTO cancellation (id, ticket_id, cancelled_at, refund_amount, refund_percent, reason)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::new_v4())
    .bind(head.id)
    .bind(now)
    .bind(refund_amount)
    .bind(refund_percent)
    .bind(reason)
    .execute(&mut *tx)
    .await
    .map_err(store_err("failed to record cancellation"))?;

    // Promote, pairing freed seats with candidates by position.
    let used = allocation::plan_promotions(&freed, candidates.len());
    let mut touched: Vec<Uuid> = Vec::new();
    for (seat, candidate) in used.iter().zip(&candidates) {
        sqlx::query(
            "UPDATE passenger_ticket
             SET status = 'CONFIRMED', seat_number = $2, berth_type = $3, waitlist_number = NULL
             WHERE id = $1",
        )
        .bind(candidate.id)
        .bind(seat.seat_number)
        .bind(seat.berth_type.as_str())
        .execute(&mut *tx)
        .await
        .map_err(store_err("failed to promote passenger"))?;
        if !touched.contains(&candidate.ticket_id) {
            touched.push(candidate.ticket_id);
        }
    }

    // Recompute the roll-up for every ticket that had a promotion.
    for ticket_id in &touched {
        let statuses: Vec<(String,)> =
            sqlx::query_as("SELECT status FROM passenger_ticket WHERE ticket_id = $1")
                .bind(ticket_id)
                .fetch_all(&mut *tx)
                .await
                .map_err(store_err("failed to reload statuses"))?;
        let parsed = statuses
            .iter()
            .map(|(s,)| PassengerStatus::parse(s))
            .collect::<Result<Vec<_>>>()?;
        let rolled = BookingStatus::roll_up(&parsed);
        sqlx::query("UPDATE ticket SET booking_status = $2 WHERE id = $1")
            .bind(ticket_id)
            .bind(rolled.as_str())
            .execute(&mut *tx)
            .await
            .map_err(store_err("failed to update booking status"))?;
    }

    tx.commit()
        .await
        .map_err(store_err("failed to commit cancellation"))?;

    tracing::info!(
        pnr = %pnr,
        refund_amount,
        refund_percent,
        promoted = used.len(),
        "cancellation committed"
    );

    let mut passengers = Vec::with_capacity(prior.len());
    for row in &prior {
        passengers.push(CancelledPassenger {
            name: row.name.clone(),
            previous_status: PassengerStatus::parse(&row.status)?,
            seat_number: row.seat_number,
            berth_type: row.berth_type.as_deref().map(BerthType::parse).transpose()?,
            waitlist_number: row.waitlist_number,
        });
    }

    Ok(CancellationResult {
        pnr: pnr.clone(),
        ticket_id: TicketId::from_uuid(head.id),
        refund_amount,
        refund_percent,
        cancelled_at: now,
        reason: reason.map(ToString::to_string),
        passengers,
    })
}
