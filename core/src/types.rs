//! Domain types for the Railbook reservation system.
//!
//! Value objects, identifiers, and the view types returned by store
//! operations. Statuses are closed enumerations; the string forms exist only
//! at the storage and JSON boundaries.

use crate::error::{ReservationError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for a bookable journey (schedule + segment + class).
    JourneyId
);
uuid_id!(
    /// Unique identifier for a travel class.
    ClassId
);
uuid_id!(
    /// Unique identifier for a ticket.
    TicketId
);
uuid_id!(
    /// Unique identifier for a passenger.
    PassengerId
);

/// Passenger Name Record: the globally unique, immutable booking identifier.
///
/// Always exactly ten ASCII digits. Uniqueness is enforced by the store; the
/// random draw alone is not trusted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pnr(String);

impl Pnr {
    /// Number of digits in a PNR.
    pub const LEN: usize = 10;

    /// Draws a random ten-digit PNR from the given RNG.
    ///
    /// The first digit is never zero, so the textual and numeric forms agree.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let n: u64 = rng.gen_range(1_000_000_000..10_000_000_000);
        Self(n.to_string())
    }

    /// Parses a PNR from its textual form.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Validation`] unless the input is exactly
    /// ten ASCII digits.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() == Self::LEN && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(ReservationError::Validation(format!(
                "PNR must be exactly {} digits, got {s:?}",
                Self::LEN
            )))
        }
    }

    /// Returns the PNR as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Pnr {
    type Error = ReservationError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Pnr> for String {
    fn from(pnr: Pnr) -> Self {
        pnr.0
    }
}

impl fmt::Display for Pnr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Statuses
// ============================================================================

/// Per-passenger reservation status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassengerStatus {
    /// Holds a seat and a berth.
    Confirmed,
    /// Reservation against cancellation. Tracked and displayed, but the
    /// booking algorithm never places passengers here (see `SeatAvailability`).
    Rac,
    /// In the FIFO queue, carries a waitlist number.
    Waitlisted,
    /// Released by a cancellation.
    Cancelled,
}

impl PassengerStatus {
    /// Storage/string form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Rac => "RAC",
            Self::Waitlisted => "WAITLISTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses the storage form back into the enum.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Store`] for an unrecognized status string,
    /// which can only come from a corrupted row.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "CONFIRMED" => Ok(Self::Confirmed),
            "RAC" => Ok(Self::Rac),
            "WAITLISTED" => Ok(Self::Waitlisted),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ReservationError::Store(format!(
                "unknown passenger status {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PassengerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate ticket status, always derived from the passenger statuses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Every passenger is confirmed.
    Confirmed,
    /// Some passengers confirmed, some not.
    PartiallyConfirmed,
    /// No passenger is confirmed.
    Waitlisted,
    /// The ticket was cancelled.
    Cancelled,
}

impl BookingStatus {
    /// Derives the ticket status from its passengers' statuses.
    ///
    /// Cancelled passengers are ignored; a ticket whose passengers are all
    /// cancelled is itself cancelled. A ticket with confirmed passengers and
    /// no waitlisted ones is confirmed, which is exactly the post-promotion
    /// recomputation rule.
    #[must_use]
    pub fn roll_up(statuses: &[PassengerStatus]) -> Self {
        let live: Vec<PassengerStatus> = statuses
            .iter()
            .copied()
            .filter(|s| *s != PassengerStatus::Cancelled)
            .collect();
        if live.is_empty() {
            return Self::Cancelled;
        }
        let confirmed = live
            .iter()
            .filter(|s| **s == PassengerStatus::Confirmed)
            .count();
        let waitlisted = live
            .iter()
            .filter(|s| **s == PassengerStatus::Waitlisted)
            .count();
        if confirmed == live.len() || (confirmed > 0 && waitlisted == 0) {
            Self::Confirmed
        } else if confirmed == 0 {
            Self::Waitlisted
        } else {
            Self::PartiallyConfirmed
        }
    }

    /// Storage/string form of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::PartiallyConfirmed => "PARTIALLY_CONFIRMED",
            Self::Waitlisted => "WAITLISTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Parses the storage form back into the enum.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Store`] for an unrecognized status string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "CONFIRMED" => Ok(Self::Confirmed),
            "PARTIALLY_CONFIRMED" => Ok(Self::PartiallyConfirmed),
            "WAITLISTED" => Ok(Self::Waitlisted),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ReservationError::Store(format!(
                "unknown booking status {other:?}"
            ))),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Berth assigned to a confirmed passenger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BerthType {
    /// Lower berth.
    Lower,
    /// Middle berth.
    Middle,
    /// Upper berth.
    Upper,
    /// Side lower berth.
    SideLower,
    /// Side upper berth.
    SideUpper,
}

impl BerthType {
    /// The fixed five-berth rotation, indexed by `seat_number % 5`.
    pub const ROTATION: [Self; 5] = [
        Self::Lower,
        Self::Middle,
        Self::Upper,
        Self::SideLower,
        Self::SideUpper,
    ];

    /// Berth for a given seat number.
    #[must_use]
    pub fn for_seat(seat_number: i32) -> Self {
        Self::ROTATION[seat_number.rem_euclid(5) as usize]
    }

    /// Storage/string form of the berth.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "LOWER",
            Self::Middle => "MIDDLE",
            Self::Upper => "UPPER",
            Self::SideLower => "SIDE_LOWER",
            Self::SideUpper => "SIDE_UPPER",
        }
    }

    /// Parses the storage form back into the enum.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Store`] for an unrecognized berth string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "LOWER" => Ok(Self::Lower),
            "MIDDLE" => Ok(Self::Middle),
            "UPPER" => Ok(Self::Upper),
            "SIDE_LOWER" => Ok(Self::SideLower),
            "SIDE_UPPER" => Ok(Self::SideUpper),
            other => Err(ReservationError::Store(format!(
                "unknown berth type {other:?}"
            ))),
        }
    }
}

impl fmt::Display for BerthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability tier for a (journey, class), derived from the counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// Seats remain.
    Available,
    /// Full, and nobody is waitlisted yet.
    Rac,
    /// Full with an active waitlist.
    Waitlist,
}

// ============================================================================
// Booking input
// ============================================================================

/// A passenger as submitted with a booking request.
///
/// Passengers may pre-exist (identified by `passenger_id`) or be created
/// inline from the identity fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PassengerDetails {
    /// Existing passenger record, if any.
    #[serde(default)]
    pub passenger_id: Option<PassengerId>,
    /// Full name.
    pub name: String,
    /// Age in years.
    pub age: i32,
    /// Self-reported gender.
    #[serde(default)]
    pub gender: Option<String>,
    /// Contact detail (phone or email).
    #[serde(default)]
    pub contact: Option<String>,
    /// Concession category name, matched against the concession table.
    /// Unknown or absent categories mean no category discount.
    #[serde(default)]
    pub concession: Option<String>,
}

/// A booking request: one journey, one class, one or more passengers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingRequest {
    /// The journey to book.
    pub journey_id: JourneyId,
    /// The travel class to book in.
    pub class_id: ClassId,
    /// Passengers in booking order; order decides who confirms first.
    pub passengers: Vec<PassengerDetails>,
}

impl BookingRequest {
    /// Checks the request before any store access.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Validation`] when there are no passengers,
    /// a passenger has an empty name, or an age is out of the 0..=120 range.
    pub fn validate(&self) -> Result<()> {
        if self.passengers.is_empty() {
            return Err(ReservationError::Validation(
                "at least one passenger is required".to_string(),
            ));
        }
        for (i, p) in self.passengers.iter().enumerate() {
            if p.name.trim().is_empty() {
                return Err(ReservationError::Validation(format!(
                    "passenger {} has an empty name",
                    i + 1
                )));
            }
            if !(0..=120).contains(&p.age) {
                return Err(ReservationError::Validation(format!(
                    "passenger {} has an invalid age {}",
                    i + 1,
                    p.age
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Views returned by the store
// ============================================================================

/// Seat inventory snapshot for a (journey, class).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeatAvailability {
    /// Journey this snapshot is for.
    pub journey_id: JourneyId,
    /// Class this snapshot is for.
    pub class_id: ClassId,
    /// Fixed capacity from the seat configuration.
    pub total_seats: i32,
    /// Passengers currently confirmed.
    pub confirmed: i32,
    /// Passengers currently in RAC.
    pub rac: i32,
    /// Passengers currently waitlisted.
    pub waitlisted: i32,
    /// Highest waitlist number handed out so far, 0 when none.
    pub last_waitlist_number: i32,
    /// `max(0, total_seats - confirmed - rac)`.
    pub available_seats: i32,
    /// Derived availability tier.
    pub status: SeatStatus,
}

impl SeatAvailability {
    /// Derives the availability tier from the counts.
    #[must_use]
    pub const fn derive_status(available_seats: i32, waitlisted: i32) -> SeatStatus {
        if available_seats > 0 {
            SeatStatus::Available
        } else if waitlisted > 0 {
            SeatStatus::Waitlist
        } else {
            SeatStatus::Rac
        }
    }
}

/// Per-passenger outcome within a ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassengerTicketView {
    /// The passenger record.
    pub passenger_id: PassengerId,
    /// Passenger name at booking time.
    pub name: String,
    /// Passenger age at booking time.
    pub age: i32,
    /// Current reservation status.
    pub status: PassengerStatus,
    /// Assigned seat, present only while confirmed (or kept for history
    /// after cancellation).
    pub seat_number: Option<i32>,
    /// Assigned berth, paired with the seat.
    pub berth_type: Option<BerthType>,
    /// Position in the journey's waitlist, present only while waitlisted.
    pub waitlist_number: Option<i32>,
    /// Fare charged for this passenger.
    pub fare: f64,
}

/// Summary returned by a successful booking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketSummary {
    /// The new ticket.
    pub ticket_id: TicketId,
    /// The unique booking identifier.
    pub pnr: Pnr,
    /// Journey that was booked.
    pub journey_id: JourneyId,
    /// Roll-up of the per-passenger statuses.
    pub booking_status: BookingStatus,
    /// Sum of the per-passenger fares.
    pub total_fare: f64,
    /// Per-passenger breakdown, in booking order.
    pub passengers: Vec<PassengerTicketView>,
}

/// Journey context shown in a PNR lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JourneyView {
    /// The journey.
    pub journey_id: JourneyId,
    /// Train number.
    pub train_number: String,
    /// Train name.
    pub train_name: String,
    /// Travel class name.
    pub class_name: String,
    /// Boarding station name.
    pub source_station: String,
    /// Destination station name.
    pub destination_station: String,
    /// Scheduled departure from the boarding station.
    pub departure_at: DateTime<Utc>,
    /// Booked distance in kilometres.
    pub distance_km: f64,
}

/// Full read-only projection of a ticket, returned by PNR lookup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketView {
    /// The ticket.
    pub ticket_id: TicketId,
    /// The booking identifier.
    pub pnr: Pnr,
    /// Current aggregate status.
    pub booking_status: BookingStatus,
    /// Total fare charged.
    pub total_fare: f64,
    /// When the booking was made.
    pub booked_at: DateTime<Utc>,
    /// Journey, train, and station context.
    pub journey: JourneyView,
    /// All passengers on the ticket with their current state.
    pub passengers: Vec<PassengerTicketView>,
}

/// A passenger's state at the moment their ticket was cancelled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CancelledPassenger {
    /// Passenger name.
    pub name: String,
    /// Status immediately before the cancellation.
    pub previous_status: PassengerStatus,
    /// Seat held before the cancellation, if confirmed.
    pub seat_number: Option<i32>,
    /// Berth held before the cancellation, if confirmed.
    pub berth_type: Option<BerthType>,
    /// Waitlist position before the cancellation, if waitlisted.
    pub waitlist_number: Option<i32>,
}

/// Outcome of a cancellation, including the refund and prior passenger state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CancellationResult {
    /// PNR of the cancelled ticket.
    pub pnr: Pnr,
    /// The cancelled ticket.
    pub ticket_id: TicketId,
    /// Amount refunded, floored to a whole unit.
    pub refund_amount: f64,
    /// Refund percentage applied (100 or 50).
    pub refund_percent: f64,
    /// When the cancellation was recorded.
    pub cancelled_at: DateTime<Utc>,
    /// Caller-supplied reason, if any.
    pub reason: Option<String>,
    /// Each passenger's state before the cancellation.
    pub passengers: Vec<CancelledPassenger>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn pnr_is_ten_digits() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let pnr = Pnr::generate(&mut rng);
            assert_eq!(pnr.as_str().len(), Pnr::LEN);
            assert!(pnr.as_str().bytes().all(|b| b.is_ascii_digit()));
            assert_ne!(pnr.as_str().as_bytes()[0], b'0');
        }
    }

    #[test]
    fn pnr_parse_rejects_bad_input() {
        assert!(Pnr::parse("123456789").is_err());
        assert!(Pnr::parse("12345678901").is_err());
        assert!(Pnr::parse("12345abcde").is_err());
        assert!(Pnr::parse("1234567890").is_ok());
    }

    #[test]
    fn berth_rotation_cycles_by_seat_number() {
        assert_eq!(BerthType::for_seat(5), BerthType::Lower);
        assert_eq!(BerthType::for_seat(1), BerthType::Middle);
        assert_eq!(BerthType::for_seat(2), BerthType::Upper);
        assert_eq!(BerthType::for_seat(3), BerthType::SideLower);
        assert_eq!(BerthType::for_seat(4), BerthType::SideUpper);
        assert_eq!(BerthType::for_seat(6), BerthType::Middle);
    }

    #[test]
    fn roll_up_covers_all_status_mixes() {
        use PassengerStatus as P;
        assert_eq!(
            BookingStatus::roll_up(&[P::Confirmed, P::Confirmed]),
            BookingStatus::Confirmed
        );
        assert_eq!(
            BookingStatus::roll_up(&[P::Confirmed, P::Waitlisted]),
            BookingStatus::PartiallyConfirmed
        );
        assert_eq!(
            BookingStatus::roll_up(&[P::Waitlisted]),
            BookingStatus::Waitlisted
        );
        assert_eq!(
            BookingStatus::roll_up(&[P::Cancelled, P::Cancelled]),
            BookingStatus::Cancelled
        );
        // Cancelled passengers are excluded from the roll-up.
        assert_eq!(
            BookingStatus::roll_up(&[P::Confirmed, P::Cancelled]),
            BookingStatus::Confirmed
        );
    }

    #[test]
    fn validation_rejects_bad_requests() {
        let mut req = BookingRequest {
            journey_id: JourneyId::new(),
            class_id: ClassId::new(),
            passengers: vec![],
        };
        assert!(req.validate().is_err());

        req.passengers.push(PassengerDetails {
            passenger_id: None,
            name: "  ".to_string(),
            age: 30,
            gender: None,
            contact: None,
            concession: None,
        });
        assert!(req.validate().is_err());

        req.passengers[0].name = "Asha Verma".to_string();
        req.passengers[0].age = 130;
        assert!(req.validate().is_err());

        req.passengers[0].age = 30;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn seat_status_derivation() {
        assert_eq!(
            SeatAvailability::derive_status(3, 0),
            SeatStatus::Available
        );
        assert_eq!(SeatAvailability::derive_status(0, 2), SeatStatus::Waitlist);
        assert_eq!(SeatAvailability::derive_status(0, 0), SeatStatus::Rac);
    }
}
