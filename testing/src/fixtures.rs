//! Journey fixtures for seeding test stores.

use chrono::{DateTime, Duration, Utc};
use railbook_core::types::{ClassId, JourneyId};

/// Everything the engine needs to know about one bookable (journey, class):
/// the journey row, its denormalized train/station context, and the seat
/// configuration for its class.
#[derive(Clone, Debug)]
pub struct JourneyFixture {
    /// The journey identifier.
    pub journey_id: JourneyId,
    /// The class this journey is bookable in.
    pub class_id: ClassId,
    /// Train number.
    pub train_number: String,
    /// Train name.
    pub train_name: String,
    /// Travel class name.
    pub class_name: String,
    /// Boarding station.
    pub source_station: String,
    /// Destination station.
    pub destination_station: String,
    /// Departure from the boarding station.
    pub departure_at: DateTime<Utc>,
    /// Booked distance in kilometres.
    pub distance_km: f64,
    /// Capacity from the seat configuration.
    pub total_seats: i32,
    /// Per-km class rate from the seat configuration.
    pub fare_per_km: f64,
}

impl JourneyFixture {
    /// A plausible overnight express journey departing `departs_in_hours`
    /// from now, with the given capacity.
    #[must_use]
    pub fn express(total_seats: i32, departs_in_hours: i64) -> Self {
        Self {
            journey_id: JourneyId::new(),
            class_id: ClassId::new(),
            train_number: "12951".to_string(),
            train_name: "Mumbai Rajdhani".to_string(),
            class_name: "AC 3 Tier".to_string(),
            source_station: "Mumbai Central".to_string(),
            destination_station: "New Delhi".to_string(),
            departure_at: Utc::now() + Duration::hours(departs_in_hours),
            distance_km: 1384.0,
            total_seats,
            fare_per_km: 2.5,
        }
    }

    /// Overrides the per-km rate.
    #[must_use]
    pub fn with_fare_per_km(mut self, fare_per_km: f64) -> Self {
        self.fare_per_km = fare_per_km;
        self
    }

    /// Overrides the booked distance.
    #[must_use]
    pub fn with_distance_km(mut self, distance_km: f64) -> Self {
        self.distance_km = distance_km;
        self
    }

    /// Makes source and destination the same station, for exercising the
    /// degenerate-journey rejection.
    #[must_use]
    pub fn degenerate(mut self) -> Self {
        self.destination_station = self.source_station.clone();
        self.distance_km = 0.0;
        self
    }
}
