//! Ride requests derived from historical trip records.
//!
//! Each [`Request`] carries the agent-facing prompt text and the withheld
//! [`GroundTruth`] the evaluator scores against.

use serde::{Deserialize, Serialize};

use crate::location::Location;

mod generator;
mod prompts;
mod records;
mod zones;

pub use generator::{GeneratedRequests, GenerationStats, GeneratorParams, RequestGenerator};
pub use prompts::{PhrasebookPromptWriter, PromptContext, PromptWriter, TemplatePromptWriter};
pub use records::{load_trip_records, parse_timestamp_ms, read_trip_records, TripRecord};
pub use zones::{CentroidGeocoder, CentroidJitterGeocoder, Geocoder, Zone, ZoneTable};

/// Half-width of the pickup/dropoff windows around the recorded timestamps.
pub const TIME_WINDOW_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub earliest_ms: u64,
    pub latest_ms: u64,
}

impl TimeWindow {
    pub fn around(center_ms: u64, half_width_ms: u64) -> Self {
        Self {
            earliest_ms: center_ms.saturating_sub(half_width_ms),
            latest_ms: center_ms.saturating_add(half_width_ms),
        }
    }

    pub fn contains(&self, ms: u64) -> bool {
        (self.earliest_ms..=self.latest_ms).contains(&ms)
    }
}

/// The correct structured reading of a request. Only the evaluator and cheat-mode
/// baselines look at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub pickup_zone_id: Option<u32>,
    pub dropoff_zone_id: Option<u32>,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub passenger_count: u32,
    pub wheelchair_accessible: bool,
    pub shared_ride_ok: bool,
    /// Requested pickup time as `HH:MM` (24h).
    pub pickup_time: String,
    #[serde(default)]
    pub recorded_fare: Option<f64>,
    #[serde(default)]
    pub recorded_distance_miles: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    /// Arrival time on the virtual clock.
    pub request_time_ms: u64,
    pub pickup_window: TimeWindow,
    pub dropoff_window: TimeWindow,
    pub origin: Location,
    pub destination: Location,
    pub passenger_count: u32,
    pub wheelchair_required: bool,
    pub shared_ride_ok: bool,
    pub text: String,
    pub ground_truth: GroundTruth,
}

impl Request {
    /// Pickup and dropoff pair, as consumed by the travel-time matrix.
    pub fn leg(&self) -> (Location, Location) {
        (self.origin.clone(), self.destination.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_inclusive_and_saturates() {
        let w = TimeWindow::around(2 * TIME_WINDOW_MS, TIME_WINDOW_MS);
        assert!(w.contains(TIME_WINDOW_MS));
        assert!(w.contains(3 * TIME_WINDOW_MS));
        assert!(!w.contains(3 * TIME_WINDOW_MS + 1));
        assert_eq!(TimeWindow::around(10, TIME_WINDOW_MS).earliest_ms, 0);
    }
}
