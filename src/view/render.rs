use std::fmt;

use crate::models::trip::Trip;

/// One displayed line of the trip list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripRow {
    pub key: String,
    pub passenger: String,
    pub driver: String,
    pub status: String,
    pub can_complete: bool,
}

impl From<&Trip> for TripRow {
    fn from(trip: &Trip) -> Self {
        Self {
            key: trip.key(),
            passenger: trip.passenger_id.to_string(),
            driver: trip.driver_text(),
            status: trip.status.clone(),
            can_complete: !trip.is_completed(),
        }
    }
}

impl fmt::Display for TripRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {} ({})", self.passenger, self.driver, self.status)
    }
}

pub fn render(trips: &[Trip]) -> Vec<TripRow> {
    trips.iter().map(TripRow::from).collect()
}
