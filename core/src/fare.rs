//! Fare calculation and the refund policy.
//!
//! The rounding rule is deliberately asymmetric and mirrors the billing
//! behavior the rest of the system expects: the base fare is rounded *up* to
//! a whole unit, the discount amount is subtracted *unrounded*, and refunds
//! are floored. Keep it that way.

use chrono::{DateTime, Utc};

/// Passengers this age or younger get at least a 50% discount.
pub const CHILD_AGE_LIMIT: i32 = 12;
/// Discount for child passengers, in percent.
pub const CHILD_DISCOUNT_PERCENT: f64 = 50.0;
/// Passengers this age or older get at least a 30% discount.
pub const SENIOR_AGE_LIMIT: i32 = 60;
/// Discount for senior passengers, in percent.
pub const SENIOR_DISCOUNT_PERCENT: f64 = 30.0;

/// Hours before departure at which a cancellation still refunds in full.
pub const FULL_REFUND_WINDOW_HOURS: f64 = 24.0;

/// Base fare for a journey leg: per-km class rate times distance, rounded up.
#[must_use]
pub fn base_fare(fare_per_km: f64, distance_km: f64) -> f64 {
    (fare_per_km * distance_km).ceil()
}

/// Effective discount for a passenger, in percent.
///
/// The age-based discount and the concession-category discount are never
/// stacked; the larger of the two applies. A missing or unknown concession
/// category is passed in as `0.0`.
#[must_use]
pub fn discount_percent(age: i32, concession_percent: f64) -> f64 {
    let age_discount = if age <= CHILD_AGE_LIMIT {
        CHILD_DISCOUNT_PERCENT
    } else if age >= SENIOR_AGE_LIMIT {
        SENIOR_DISCOUNT_PERCENT
    } else {
        0.0
    };
    concession_percent.clamp(0.0, 100.0).max(age_discount)
}

/// Fare for a single passenger.
///
/// `ceil(distance * rate)` minus the unrounded discount amount.
#[must_use]
pub fn fare_for_passenger(fare_per_km: f64, distance_km: f64, age: i32, concession_percent: f64) -> f64 {
    let base = base_fare(fare_per_km, distance_km);
    let discount = discount_percent(age, concession_percent);
    base - base * discount / 100.0
}

/// Hours remaining until departure, clamped at zero once departed.
#[must_use]
pub fn hours_before_departure(now: DateTime<Utc>, departure_at: DateTime<Utc>) -> f64 {
    let seconds = (departure_at - now).num_seconds();
    if seconds <= 0 {
        0.0
    } else {
        seconds as f64 / 3600.0
    }
}

/// Refund percentage: 100 when cancelling at least 24 hours out, 50 inside
/// the window.
#[must_use]
pub fn refund_percent(hours_before: f64) -> f64 {
    if hours_before >= FULL_REFUND_WINDOW_HOURS {
        100.0
    } else {
        50.0
    }
}

/// Refund amount: the percentage of the total fare, floored to a whole unit.
#[must_use]
pub fn refund_amount(total_fare: f64, percent: f64) -> f64 {
    (total_fare * percent / 100.0).floor()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    #[test]
    fn base_fare_rounds_up() {
        assert_eq!(base_fare(1.25, 100.0), 125.0);
        assert_eq!(base_fare(1.25, 101.0), 127.0); // 126.25 -> 127
        assert_eq!(base_fare(0.0, 500.0), 0.0);
    }

    #[test]
    fn age_and_category_discounts_take_the_max() {
        // Child with a 20% category: 50 wins.
        assert_eq!(discount_percent(10, 20.0), 50.0);
        // Child with a 75% category: the category wins.
        assert_eq!(discount_percent(10, 75.0), 75.0);
        // Senior with no category.
        assert_eq!(discount_percent(65, 0.0), 30.0);
        // Adult with a 25% category.
        assert_eq!(discount_percent(30, 25.0), 25.0);
        // Boundary ages.
        assert_eq!(discount_percent(12, 0.0), 50.0);
        assert_eq!(discount_percent(13, 0.0), 0.0);
        assert_eq!(discount_percent(60, 0.0), 30.0);
        assert_eq!(discount_percent(59, 0.0), 0.0);
    }

    #[test]
    fn discount_amount_is_not_rounded() {
        // base = ceil(1.5 * 67) = 101; 30% senior discount -> 101 - 30.3 = 70.7
        let fare = fare_for_passenger(1.5, 67.0, 65, 0.0);
        assert!((fare - 70.7).abs() < 1e-9);
    }

    #[test]
    fn refund_policy_boundary() {
        assert_eq!(refund_percent(24.0), 100.0);
        assert_eq!(refund_percent(23.999), 50.0);
        assert_eq!(refund_percent(0.0), 50.0);
        assert_eq!(refund_amount(350.5, 50.0), 175.0);
        assert_eq!(refund_amount(350.5, 100.0), 350.0);
    }

    #[test]
    fn departed_journeys_have_zero_hours_left() {
        let now = Utc::now();
        assert_eq!(hours_before_departure(now, now - Duration::hours(3)), 0.0);
        let left = hours_before_departure(now, now + Duration::hours(36));
        assert!((left - 36.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn fare_monotonic_in_distance(
            rate in 0.1f64..10.0,
            d1 in 1.0f64..2000.0,
            extra in 0.0f64..500.0,
            age in 13i32..59,
        ) {
            let near = fare_for_passenger(rate, d1, age, 0.0);
            let far = fare_for_passenger(rate, d1 + extra, age, 0.0);
            prop_assert!(far >= near);
        }

        #[test]
        fn fare_non_increasing_in_discount(
            rate in 0.1f64..10.0,
            distance in 1.0f64..2000.0,
            low in 0.0f64..50.0,
            bump in 0.0f64..50.0,
        ) {
            let little = fare_for_passenger(rate, distance, 30, low);
            let lots = fare_for_passenger(rate, distance, 30, low + bump);
            prop_assert!(lots <= little);
        }

        #[test]
        fn fare_never_negative(
            rate in 0.0f64..10.0,
            distance in 0.0f64..2000.0,
            age in 0i32..120,
            concession in 0.0f64..100.0,
        ) {
            prop_assert!(fare_for_passenger(rate, distance, age, concession) >= 0.0);
        }
    }
}
