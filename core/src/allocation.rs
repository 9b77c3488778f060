//! Seat allocation planning for bookings and promotions.
//!
//! These functions are pure: the store reads the journey's counts under its
//! transaction lock, asks this module for a plan, and persists the plan
//! inside the same transaction. That keeps the oversell invariant
//! (`confirmed + rac <= total_seats`) in exactly one place.

use crate::types::{BerthType, PassengerStatus};

/// Current occupancy of a (journey, class), as read inside a transaction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JourneyCounts {
    /// Passengers currently confirmed.
    pub confirmed: i32,
    /// Passengers currently in RAC.
    pub rac: i32,
    /// Passengers currently waitlisted.
    pub waitlisted: i32,
    /// Highest seat number assigned so far, 0 when none.
    pub max_seat_number: i32,
    /// Highest waitlist number assigned so far, 0 when none.
    pub max_waitlist_number: i32,
}

impl JourneyCounts {
    /// Seats still open for confirmation against the given capacity.
    #[must_use]
    pub fn available_seats(&self, total_seats: i32) -> i32 {
        (total_seats - self.confirmed - self.rac).max(0)
    }
}

/// One passenger's planned slot within a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeatAssignment {
    /// CONFIRMED or WAITLISTED; booking never plans RAC.
    pub status: PassengerStatus,
    /// Sequential seat number, confirmed passengers only.
    pub seat_number: Option<i32>,
    /// Berth from the five-way rotation, confirmed passengers only.
    pub berth_type: Option<BerthType>,
    /// Sequential waitlist number, waitlisted passengers only.
    pub waitlist_number: Option<i32>,
}

/// Plans the confirm/waitlist split for a booking.
///
/// The first `min(passenger_count, available)` passengers, in input order,
/// are confirmed with seat numbers continuing from the journey's current
/// maximum; everyone else is waitlisted with strictly increasing waitlist
/// numbers continuing from the journey's current maximum.
#[must_use]
pub fn plan_allocations(
    counts: &JourneyCounts,
    total_seats: i32,
    passenger_count: usize,
) -> Vec<SeatAssignment> {
    let available = counts.available_seats(total_seats);
    let confirm_count = usize::try_from(available).unwrap_or(0).min(passenger_count);

    let mut plan = Vec::with_capacity(passenger_count);
    for i in 0..passenger_count {
        if i < confirm_count {
            let seat = counts.max_seat_number + 1 + i as i32;
            plan.push(SeatAssignment {
                status: PassengerStatus::Confirmed,
                seat_number: Some(seat),
                berth_type: Some(BerthType::for_seat(seat)),
                waitlist_number: None,
            });
        } else {
            let wl = counts.max_waitlist_number + 1 + (i - confirm_count) as i32;
            plan.push(SeatAssignment {
                status: PassengerStatus::Waitlisted,
                seat_number: None,
                berth_type: None,
                waitlist_number: Some(wl),
            });
        }
    }
    plan
}

/// A seat/berth pair freed by a cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FreedSeat {
    /// Seat number the cancelled passenger held.
    pub seat_number: i32,
    /// Berth the cancelled passenger held.
    pub berth_type: BerthType,
}

/// Pairs freed seats with waitlisted candidates for promotion.
///
/// Candidates must already be ordered by ascending waitlist number; the i-th
/// candidate inherits the i-th freed seat. Returns the seats actually used,
/// which is the shorter of the two lists.
#[must_use]
pub fn plan_promotions(freed: &[FreedSeat], candidate_count: usize) -> Vec<FreedSeat> {
    freed.iter().copied().take(candidate_count).collect()
}
