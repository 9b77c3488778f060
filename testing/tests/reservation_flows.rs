//! End-to-end reservation behavior against the in-memory store.
//!
//! These tests exercise the same engine semantics the PostgreSQL store
//! implements: confirm/waitlist splits, fare rules, FIFO promotion on
//! cancellation, refund windows, and lookup consistency.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code

use railbook_core::types::{
    BerthType, BookingRequest, BookingStatus, PassengerDetails, PassengerStatus, Pnr,
    SeatStatus,
};
use railbook_core::{ReservationError, ReservationStore};
use railbook_testing::{JourneyFixture, MemoryReservationStore};

fn passenger(name: &str, age: i32) -> PassengerDetails {
    PassengerDetails {
        passenger_id: None,
        name: name.to_string(),
        age,
        gender: None,
        contact: None,
        concession: None,
    }
}

fn adults(n: usize) -> Vec<PassengerDetails> {
    (0..n).map(|i| passenger(&format!("Passenger {}", i + 1), 30)).collect()
}

#[tokio::test]
async fn booking_within_capacity_confirms_everyone() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(6, 48));

    let summary = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(4),
        })
        .await
        .unwrap();

    assert_eq!(summary.booking_status, BookingStatus::Confirmed);
    let seats: Vec<i32> = summary
        .passengers
        .iter()
        .map(|p| p.seat_number.unwrap())
        .collect();
    assert_eq!(seats, vec![1, 2, 3, 4]);
    for p in &summary.passengers {
        assert_eq!(p.status, PassengerStatus::Confirmed);
        assert_eq!(p.berth_type, Some(BerthType::for_seat(p.seat_number.unwrap())));
        assert_eq!(p.waitlist_number, None);
    }
}

#[tokio::test]
async fn overflow_waitlists_the_remainder_in_order() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(2, 48));

    let summary = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(5),
        })
        .await
        .unwrap();

    assert_eq!(summary.booking_status, BookingStatus::PartiallyConfirmed);
    assert_eq!(summary.passengers[0].seat_number, Some(1));
    assert_eq!(summary.passengers[1].seat_number, Some(2));
    for (i, p) in summary.passengers[2..].iter().enumerate() {
        assert_eq!(p.status, PassengerStatus::Waitlisted);
        assert_eq!(p.waitlist_number, Some(i as i32 + 1));
    }

    // A second booking's waitlist numbers continue from the journey maximum.
    let second = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(2),
        })
        .await
        .unwrap();
    assert_eq!(second.booking_status, BookingStatus::Waitlisted);
    assert_eq!(second.passengers[0].waitlist_number, Some(4));
    assert_eq!(second.passengers[1].waitlist_number, Some(5));
}

#[tokio::test]
async fn capacity_is_never_oversold_across_bookings() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(5, 48));

    for n in [2usize, 2, 2, 2] {
        let _ = store
            .book(&BookingRequest {
                journey_id,
                class_id,
                passengers: adults(n),
            })
            .await
            .unwrap();
        let availability = store.availability(journey_id, class_id).await.unwrap();
        assert!(availability.confirmed + availability.rac <= availability.total_seats);
    }

    let availability = store.availability(journey_id, class_id).await.unwrap();
    assert_eq!(availability.confirmed, 5);
    assert_eq!(availability.waitlisted, 3);
    assert_eq!(availability.available_seats, 0);
    assert_eq!(availability.status, SeatStatus::Waitlist);
    assert_eq!(availability.last_waitlist_number, 3);
}

#[tokio::test]
async fn concession_and_age_discounts_never_stack() {
    let store = MemoryReservationStore::new();
    let fixture = JourneyFixture::express(10, 48)
        .with_distance_km(100.0)
        .with_fare_per_km(2.0);
    let (journey_id, class_id) = store.insert_journey(fixture);
    store.insert_concession("Senior Citizen", 40.0);
    store.insert_concession("Student", 25.0);

    let mut child = passenger("Child", 8);
    child.concession = Some("Student".to_string());
    let mut senior = passenger("Senior", 70);
    senior.concession = Some("Senior Citizen".to_string());

    let summary = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: vec![passenger("Adult", 35), child, senior],
        })
        .await
        .unwrap();

    // base = ceil(100 * 2.0) = 200
    assert_eq!(summary.passengers[0].fare, 200.0); // no discount
    assert_eq!(summary.passengers[1].fare, 100.0); // max(50 age, 25 category) = 50%
    assert_eq!(summary.passengers[2].fare, 120.0); // max(30 age, 40 category) = 40%
    assert_eq!(summary.total_fare, 420.0);
}

#[tokio::test]
async fn unknown_concession_category_means_no_discount() {
    let store = MemoryReservationStore::new();
    let fixture = JourneyFixture::express(10, 48)
        .with_distance_km(100.0)
        .with_fare_per_km(1.0);
    let (journey_id, class_id) = store.insert_journey(fixture);

    let mut p = passenger("Adult", 35);
    p.concession = Some("No Such Category".to_string());
    let summary = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: vec![p],
        })
        .await
        .unwrap();
    assert_eq!(summary.total_fare, 100.0);
}

#[tokio::test]
async fn worked_example_capacity_two_book_three_then_cancel() {
    // Capacity 2, book 3 -> seats 1,2 + WL 1; cancel the ticket -> the
    // waitlisted passenger is promoted into a freed seat.
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(2, 48));

    let first = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(3),
        })
        .await
        .unwrap();
    assert_eq!(first.passengers[0].seat_number, Some(1));
    assert_eq!(first.passengers[1].seat_number, Some(2));
    assert_eq!(first.passengers[2].waitlist_number, Some(1));

    // A second party books one passenger, joining the waitlist at #2.
    let second = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(1),
        })
        .await
        .unwrap();
    assert_eq!(second.passengers[0].waitlist_number, Some(2));

    let result = store.cancel(&first.pnr, Some("change of plans")).await.unwrap();
    assert_eq!(result.ticket_id, first.ticket_id);
    assert_eq!(result.passengers.len(), 3);
    assert_eq!(result.passengers[0].previous_status, PassengerStatus::Confirmed);
    assert_eq!(result.passengers[2].previous_status, PassengerStatus::Waitlisted);

    // WL 1 sat on the cancelled ticket itself and keeps its place in the
    // queue: it inherits freed seat 1, and the ticket's roll-up becomes
    // CONFIRMED again (cancelled passengers are excluded from the roll-up).
    let first_view = store.lookup(&first.pnr).await.unwrap();
    assert_eq!(first_view.booking_status, BookingStatus::Confirmed);
    assert_eq!(first_view.passengers[0].status, PassengerStatus::Cancelled);
    assert_eq!(first_view.passengers[1].status, PassengerStatus::Cancelled);
    let promoted = &first_view.passengers[2];
    assert_eq!(promoted.status, PassengerStatus::Confirmed);
    assert_eq!(promoted.seat_number, Some(1));
    assert_eq!(promoted.berth_type, Some(BerthType::for_seat(1)));
    assert_eq!(promoted.waitlist_number, None);

    // WL 2, the second party, takes the other freed seat.
    let second_view = store.lookup(&second.pnr).await.unwrap();
    assert_eq!(second_view.booking_status, BookingStatus::Confirmed);
    assert_eq!(second_view.passengers[0].seat_number, Some(2));
    assert_eq!(second_view.passengers[0].status, PassengerStatus::Confirmed);

    // The cancellation stands even though the ticket reads CONFIRMED again.
    let err = store.cancel(&first.pnr, None).await.unwrap_err();
    assert!(matches!(err, ReservationError::AlreadyCancelled { .. }));
}

#[tokio::test]
async fn promotion_is_fifo_and_bounded_by_freed_seats() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(3, 48));

    // Fill the three seats with one ticket.
    let full = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(3),
        })
        .await
        .unwrap();

    // Four separate waitlisted parties, WL 1..=4.
    let mut waitlisted = Vec::new();
    for _ in 0..4 {
        let t = store
            .book(&BookingRequest {
                journey_id,
                class_id,
                passengers: adults(1),
            })
            .await
            .unwrap();
        waitlisted.push(t);
    }

    // Cancelling the full ticket frees 3 seats: WL 1..=3 promote, WL 4 stays.
    let _ = store.cancel(&full.pnr, None).await.unwrap();

    for (i, t) in waitlisted.iter().enumerate().take(3) {
        let view = store.lookup(&t.pnr).await.unwrap();
        let p = &view.passengers[0];
        assert_eq!(p.status, PassengerStatus::Confirmed, "WL {} must promote", i + 1);
        assert_eq!(p.seat_number, Some(i as i32 + 1));
        assert_eq!(p.waitlist_number, None);
        assert_eq!(view.booking_status, BookingStatus::Confirmed);
    }
    let last = store.lookup(&waitlisted[3].pnr).await.unwrap();
    assert_eq!(last.passengers[0].status, PassengerStatus::Waitlisted);
    assert_eq!(last.passengers[0].waitlist_number, Some(4));

    let availability = store.availability(journey_id, class_id).await.unwrap();
    assert_eq!(availability.confirmed, 3);
    assert_eq!(availability.waitlisted, 1);
    assert!(availability.confirmed + availability.rac <= availability.total_seats);
}

#[tokio::test]
async fn partially_confirmed_ticket_promotes_into_partial_then_confirmed() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(2, 48));

    // Two seats to party A.
    let a = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(2),
        })
        .await
        .unwrap();

    // Party B books three: all waitlisted.
    let b = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(3),
        })
        .await
        .unwrap();
    assert_eq!(b.booking_status, BookingStatus::Waitlisted);

    // Cancelling A frees 2 seats; B's first two passengers promote, the
    // third stays waitlisted, so B is now partially confirmed.
    let _ = store.cancel(&a.pnr, None).await.unwrap();
    let view = store.lookup(&b.pnr).await.unwrap();
    assert_eq!(view.booking_status, BookingStatus::PartiallyConfirmed);
    let statuses: Vec<PassengerStatus> = view.passengers.iter().map(|p| p.status).collect();
    assert_eq!(
        statuses,
        vec![
            PassengerStatus::Confirmed,
            PassengerStatus::Confirmed,
            PassengerStatus::Waitlisted
        ]
    );
}

#[tokio::test]
async fn refund_window_full_then_half() {
    let store = MemoryReservationStore::new();
    let fixture = JourneyFixture::express(4, 48)
        .with_distance_km(100.0)
        .with_fare_per_km(1.0);
    let (journey_id, class_id) = store.insert_journey(fixture);
    let early = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(2),
        })
        .await
        .unwrap();
    let result = store.cancel(&early.pnr, None).await.unwrap();
    assert_eq!(result.refund_percent, 100.0);
    assert_eq!(result.refund_amount, 200.0);

    let fixture = JourneyFixture::express(4, 12)
        .with_distance_km(100.0)
        .with_fare_per_km(1.0);
    let (journey_id, class_id) = store.insert_journey(fixture);
    let late = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(2),
        })
        .await
        .unwrap();
    let result = store.cancel(&late.pnr, None).await.unwrap();
    assert_eq!(result.refund_percent, 50.0);
    assert_eq!(result.refund_amount, 100.0);
}

#[tokio::test]
async fn departed_journeys_cannot_be_cancelled() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(4, -2));
    let ticket = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(1),
        })
        .await
        .unwrap();
    let err = store.cancel(&ticket.pnr, None).await.unwrap_err();
    assert!(matches!(err, ReservationError::JourneyDeparted { .. }));
}

#[tokio::test]
async fn double_cancellation_is_rejected() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(4, 48));
    let ticket = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(1),
        })
        .await
        .unwrap();
    let _ = store.cancel(&ticket.pnr, None).await.unwrap();
    let err = store.cancel(&ticket.pnr, None).await.unwrap_err();
    assert!(matches!(err, ReservationError::AlreadyCancelled { .. }));
}

#[tokio::test]
async fn unknown_pnr_is_not_found() {
    let store = MemoryReservationStore::new();
    let pnr = Pnr::parse("9999999999").unwrap();
    assert!(matches!(
        store.lookup(&pnr).await.unwrap_err(),
        ReservationError::NotFound { .. }
    ));
    assert!(matches!(
        store.cancel(&pnr, None).await.unwrap_err(),
        ReservationError::NotFound { .. }
    ));
}

#[tokio::test]
async fn degenerate_journey_is_rejected() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(4, 48).degenerate());
    let err = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(1),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ReservationError::SourceEqualsDestination);
}

#[tokio::test]
async fn lookup_is_idempotent() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(4, 48));
    let ticket = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(2),
        })
        .await
        .unwrap();

    let first = store.lookup(&ticket.pnr).await.unwrap();
    let second = store.lookup(&ticket.pnr).await.unwrap();
    assert_eq!(first.ticket_id, second.ticket_id);
    assert_eq!(first.booking_status, second.booking_status);
    assert_eq!(first.total_fare, second.total_fare);
    assert_eq!(first.passengers, second.passengers);
    assert_eq!(first.journey, second.journey);
}

#[tokio::test]
async fn pnrs_are_unique_across_bookings() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(100, 48));
    let mut seen = std::collections::HashSet::new();
    for _ in 0..50 {
        let t = store
            .book(&BookingRequest {
                journey_id,
                class_id,
                passengers: adults(1),
            })
            .await
            .unwrap();
        assert!(seen.insert(t.pnr.as_str().to_string()), "duplicate PNR issued");
    }
}

#[tokio::test]
async fn empty_availability_reads_rac_when_full_without_waitlist() {
    let store = MemoryReservationStore::new();
    let (journey_id, class_id) = store.insert_journey(JourneyFixture::express(2, 48));
    let _ = store
        .book(&BookingRequest {
            journey_id,
            class_id,
            passengers: adults(2),
        })
        .await
        .unwrap();
    let availability = store.availability(journey_id, class_id).await.unwrap();
    assert_eq!(availability.available_seats, 0);
    assert_eq!(availability.waitlisted, 0);
    assert_eq!(availability.status, SeatStatus::Rac);
}
