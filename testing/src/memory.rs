//! In-memory `ReservationStore` with production semantics.

use crate::fixtures::JourneyFixture;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use railbook_core::allocation::{self, FreedSeat, JourneyCounts};
use railbook_core::error::{ReservationError, Result};
use railbook_core::fare;
use railbook_core::types::{
    BerthType, BookingRequest, BookingStatus, CancellationResult, CancelledPassenger, ClassId,
    JourneyId, JourneyView, PassengerId, PassengerStatus, PassengerTicketView, Pnr,
    SeatAvailability, TicketId, TicketSummary, TicketView,
};
use railbook_core::ReservationStore;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Attempts at drawing an unused PNR before giving up.
const PNR_ATTEMPTS: u32 = 5;

#[derive(Clone, Debug)]
struct PassengerTicketRow {
    passenger_id: PassengerId,
    name: String,
    age: i32,
    status: PassengerStatus,
    seat_number: Option<i32>,
    berth_type: Option<BerthType>,
    waitlist_number: Option<i32>,
    fare: f64,
}

#[derive(Clone, Debug)]
struct TicketRow {
    ticket_id: TicketId,
    pnr: Pnr,
    journey_id: JourneyId,
    booking_status: BookingStatus,
    total_fare: f64,
    booked_at: DateTime<Utc>,
    passengers: Vec<PassengerTicketRow>,
}

struct Inner {
    journeys: HashMap<JourneyId, JourneyFixture>,
    concessions: HashMap<String, f64>,
    tickets: HashMap<TicketId, TicketRow>,
    pnr_index: HashMap<String, TicketId>,
    // Append-only cancellation records, one per cancelled ticket.
    cancellations: HashSet<TicketId>,
    rng: StdRng,
}

/// In-memory reservation store.
///
/// Every operation takes the single mutex for its whole duration, which is
/// the in-memory equivalent of the per-(train, class) row lock the
/// PostgreSQL store takes: bookings and cancellations against the same
/// journey are serialized, reads see consistent snapshots.
pub struct MemoryReservationStore {
    inner: Mutex<Inner>,
}

impl MemoryReservationStore {
    /// Creates an empty store with a fixed RNG seed, so generated PNRs are
    /// deterministic within a test.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(0x5eed)
    }

    /// Creates an empty store seeding the PNR generator with `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            inner: Mutex::new(Inner {
                journeys: HashMap::new(),
                concessions: HashMap::new(),
                tickets: HashMap::new(),
                pnr_index: HashMap::new(),
                cancellations: HashSet::new(),
                rng: StdRng::seed_from_u64(seed),
            }),
        }
    }

    /// Seeds a journey (with its seat configuration) and returns its id.
    pub fn insert_journey(&self, fixture: JourneyFixture) -> (JourneyId, ClassId) {
        let ids = (fixture.journey_id, fixture.class_id);
        self.lock().journeys.insert(fixture.journey_id, fixture);
        ids
    }

    /// Seeds a concession category with its discount percentage.
    pub fn insert_concession(&self, category: &str, discount_percent: f64) {
        self.lock()
            .concessions
            .insert(category.to_string(), discount_percent);
    }

    #[allow(clippy::unwrap_used)] // Mutex poisoning only follows a prior test panic
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }
}

impl Default for MemoryReservationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn journey(&self, journey_id: JourneyId) -> Result<&JourneyFixture> {
        self.journeys
            .get(&journey_id)
            .ok_or_else(|| ReservationError::not_found("journey", journey_id))
    }

    /// Counts passenger-ticket rows for a journey, as the SQL store does by
    /// grouping over the joined tables.
    fn counts(&self, journey_id: JourneyId) -> JourneyCounts {
        let mut counts = JourneyCounts::default();
        for ticket in self.tickets.values() {
            if ticket.journey_id != journey_id {
                continue;
            }
            for pt in &ticket.passengers {
                match pt.status {
                    PassengerStatus::Confirmed => {
                        counts.confirmed += 1;
                        if let Some(seat) = pt.seat_number {
                            counts.max_seat_number = counts.max_seat_number.max(seat);
                        }
                    }
                    PassengerStatus::Rac => counts.rac += 1,
                    PassengerStatus::Waitlisted => {
                        counts.waitlisted += 1;
                        if let Some(wl) = pt.waitlist_number {
                            counts.max_waitlist_number = counts.max_waitlist_number.max(wl);
                        }
                    }
                    // Cancelled rows keep their historical seat/waitlist
                    // fields but no longer occupy anything.
                    PassengerStatus::Cancelled => {}
                }
            }
        }
        counts
    }

    fn next_pnr(&mut self) -> Result<Pnr> {
        for _ in 0..PNR_ATTEMPTS {
            let pnr = Pnr::generate(&mut self.rng);
            if !self.pnr_index.contains_key(pnr.as_str()) {
                return Ok(pnr);
            }
        }
        Err(ReservationError::Store(
            "could not allocate a unique PNR".to_string(),
        ))
    }

    fn ticket_view(&self, ticket: &TicketRow) -> Result<TicketView> {
        let journey = self.journey(ticket.journey_id)?;
        Ok(TicketView {
            ticket_id: ticket.ticket_id,
            pnr: ticket.pnr.clone(),
            booking_status: ticket.booking_status,
            total_fare: ticket.total_fare,
            booked_at: ticket.booked_at,
            journey: JourneyView {
                journey_id: journey.journey_id,
                train_number: journey.train_number.clone(),
                train_name: journey.train_name.clone(),
                class_name: journey.class_name.clone(),
                source_station: journey.source_station.clone(),
                destination_station: journey.destination_station.clone(),
                departure_at: journey.departure_at,
                distance_km: journey.distance_km,
            },
            passengers: ticket
                .passengers
                .iter()
                .map(|pt| PassengerTicketView {
                    passenger_id: pt.passenger_id,
                    name: pt.name.clone(),
                    age: pt.age,
                    status: pt.status,
                    seat_number: pt.seat_number,
                    berth_type: pt.berth_type,
                    waitlist_number: pt.waitlist_number,
                    fare: pt.fare,
                })
                .collect(),
        })
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn book(&self, request: &BookingRequest) -> Result<TicketSummary> {
        request.validate()?;

        let mut inner = self.lock();
        let journey = inner.journey(request.journey_id)?.clone();
        if journey.class_id != request.class_id {
            return Err(ReservationError::not_found(
                "seat configuration",
                request.class_id,
            ));
        }
        if journey.source_station == journey.destination_station {
            return Err(ReservationError::SourceEqualsDestination);
        }

        let counts = inner.counts(request.journey_id);
        let plan =
            allocation::plan_allocations(&counts, journey.total_seats, request.passengers.len());

        let mut passengers = Vec::with_capacity(request.passengers.len());
        let mut total_fare = 0.0;
        for (details, slot) in request.passengers.iter().zip(&plan) {
            let concession_percent = details
                .concession
                .as_deref()
                .and_then(|c| inner.concessions.get(c).copied())
                .unwrap_or(0.0);
            let fare = fare::fare_for_passenger(
                journey.fare_per_km,
                journey.distance_km,
                details.age,
                concession_percent,
            );
            total_fare += fare;
            passengers.push(PassengerTicketRow {
                passenger_id: details.passenger_id.unwrap_or_default(),
                name: details.name.clone(),
                age: details.age,
                status: slot.status,
                seat_number: slot.seat_number,
                berth_type: slot.berth_type,
                waitlist_number: slot.waitlist_number,
                fare,
            });
        }

        let booking_status =
            BookingStatus::roll_up(&plan.iter().map(|s| s.status).collect::<Vec<_>>());
        let pnr = inner.next_pnr()?;
        let ticket = TicketRow {
            ticket_id: TicketId::new(),
            pnr: pnr.clone(),
            journey_id: request.journey_id,
            booking_status,
            total_fare,
            booked_at: Utc::now(),
            passengers,
        };

        let summary = TicketSummary {
            ticket_id: ticket.ticket_id,
            pnr: ticket.pnr.clone(),
            journey_id: ticket.journey_id,
            booking_status: ticket.booking_status,
            total_fare: ticket.total_fare,
            passengers: ticket
                .passengers
                .iter()
                .map(|pt| PassengerTicketView {
                    passenger_id: pt.passenger_id,
                    name: pt.name.clone(),
                    age: pt.age,
                    status: pt.status,
                    seat_number: pt.seat_number,
                    berth_type: pt.berth_type,
                    waitlist_number: pt.waitlist_number,
                    fare: pt.fare,
                })
                .collect(),
        };

        inner.pnr_index.insert(pnr.as_str().to_string(), ticket.ticket_id);
        inner.tickets.insert(ticket.ticket_id, ticket);
        Ok(summary)
    }

    async fn cancel(&self, pnr: &Pnr, reason: Option<&str>) -> Result<CancellationResult> {
        let mut inner = self.lock();
        let ticket_id = *inner
            .pnr_index
            .get(pnr.as_str())
            .ok_or_else(|| ReservationError::not_found("ticket", pnr))?;

        let (journey_id, total_fare, prior): (JourneyId, f64, Vec<PassengerTicketRow>) = {
            let ticket = inner
                .tickets
                .get(&ticket_id)
                .ok_or_else(|| ReservationError::not_found("ticket", pnr))?;
            (
                ticket.journey_id,
                ticket.total_fare,
                ticket.passengers.clone(),
            )
        };

        // One cancellation record per ticket, ever. The status alone is not a
        // reliable guard: promotion can confirm a cancelled ticket's own
        // waitlisted passenger, flipping its status back to CONFIRMED.
        if inner.cancellations.contains(&ticket_id) {
            return Err(ReservationError::AlreadyCancelled {
                pnr: pnr.as_str().to_string(),
            });
        }
        let departure_at = inner.journey(journey_id)?.departure_at;
        let now = Utc::now();
        if departure_at <= now {
            return Err(ReservationError::JourneyDeparted {
                pnr: pnr.as_str().to_string(),
            });
        }

        // Refund by the time-based policy.
        let hours_left = fare::hours_before_departure(now, departure_at);
        let refund_percent = fare::refund_percent(hours_left);
        let refund_amount = fare::refund_amount(total_fare, refund_percent);

        // Seats freed by this ticket's previously confirmed passengers, in
        // seat order so the i-th promoted passenger takes the i-th seat.
        let mut freed: Vec<FreedSeat> = prior
            .iter()
            .filter(|pt| pt.status == PassengerStatus::Confirmed)
            .filter_map(|pt| {
                Some(FreedSeat {
                    seat_number: pt.seat_number?,
                    berth_type: pt.berth_type?,
                })
            })
            .collect();
        freed.sort_by_key(|f| f.seat_number);

        // Promotion candidates are captured against the pre-cancellation
        // waitlist, so the cancelled ticket's own waitlisted passengers keep
        // their place in the FIFO queue.
        let mut candidates: Vec<(TicketId, usize, i32)> = inner
            .tickets
            .values()
            .filter(|t| t.journey_id == journey_id)
            .flat_map(|t| {
                t.passengers.iter().enumerate().filter_map(move |(i, pt)| {
                    (pt.status == PassengerStatus::Waitlisted)
                        .then_some((t.ticket_id, i, pt.waitlist_number.unwrap_or(i32::MAX)))
                })
            })
            .collect();
        candidates.sort_by_key(|(_, _, wl)| *wl);

        // Mark the ticket and all its passenger-tickets cancelled.
        if let Some(ticket) = inner.tickets.get_mut(&ticket_id) {
            ticket.booking_status = BookingStatus::Cancelled;
            for pt in &mut ticket.passengers {
                pt.status = PassengerStatus::Cancelled;
            }
        }
        inner.cancellations.insert(ticket_id);

        let used = allocation::plan_promotions(&freed, candidates.len());
        let mut touched: Vec<TicketId> = Vec::new();
        for (seat, (tid, index, _)) in used.iter().zip(&candidates) {
            if let Some(ticket) = inner.tickets.get_mut(tid) {
                let pt = &mut ticket.passengers[*index];
                pt.status = PassengerStatus::Confirmed;
                pt.seat_number = Some(seat.seat_number);
                pt.berth_type = Some(seat.berth_type);
                pt.waitlist_number = None;
                if !touched.contains(tid) {
                    touched.push(*tid);
                }
            }
        }

        // Recompute the roll-up for every ticket that had a promotion.
        for tid in touched {
            if let Some(ticket) = inner.tickets.get_mut(&tid) {
                let statuses: Vec<PassengerStatus> =
                    ticket.passengers.iter().map(|pt| pt.status).collect();
                ticket.booking_status = BookingStatus::roll_up(&statuses);
            }
        }

        Ok(CancellationResult {
            pnr: pnr.clone(),
            ticket_id,
            refund_amount,
            refund_percent,
            cancelled_at: now,
            reason: reason.map(ToString::to_string),
            passengers: prior
                .iter()
                .map(|pt| CancelledPassenger {
                    name: pt.name.clone(),
                    previous_status: pt.status,
                    seat_number: pt.seat_number,
                    berth_type: pt.berth_type,
                    waitlist_number: pt.waitlist_number,
                })
                .collect(),
        })
    }

    async fn availability(
        &self,
        journey_id: JourneyId,
        class_id: ClassId,
    ) -> Result<SeatAvailability> {
        let inner = self.lock();
        let journey = inner.journey(journey_id)?;
        if journey.class_id != class_id {
            return Err(ReservationError::not_found("seat configuration", class_id));
        }
        let counts = inner.counts(journey_id);
        let available_seats = counts.available_seats(journey.total_seats);
        Ok(SeatAvailability {
            journey_id,
            class_id,
            total_seats: journey.total_seats,
            confirmed: counts.confirmed,
            rac: counts.rac,
            waitlisted: counts.waitlisted,
            last_waitlist_number: counts.max_waitlist_number,
            available_seats,
            status: SeatAvailability::derive_status(available_seats, counts.waitlisted),
        })
    }

    async fn lookup(&self, pnr: &Pnr) -> Result<TicketView> {
        let inner = self.lock();
        let ticket_id = inner
            .pnr_index
            .get(pnr.as_str())
            .ok_or_else(|| ReservationError::not_found("ticket", pnr))?;
        let ticket = inner
            .tickets
            .get(ticket_id)
            .ok_or_else(|| ReservationError::not_found("ticket", pnr))?;
        inner.ticket_view(ticket)
    }
}
