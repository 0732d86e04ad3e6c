use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::telemetry::TripOutcome;

use super::utils::{f64_field, u32_field, u64_field, utf8_field, write_record_batch};

pub fn write_trip_outcomes_parquet<P: AsRef<Path>>(
    path: P,
    outcomes: &[TripOutcome],
) -> Result<(), Box<dyn Error>> {
    let mut trip_ids = Vec::with_capacity(outcomes.len());
    let mut vehicle_ids = Vec::with_capacity(outcomes.len());
    let mut passengers = Vec::with_capacity(outcomes.len());
    let mut deadhead_miles = Vec::with_capacity(outcomes.len());
    let mut loaded_miles = Vec::with_capacity(outcomes.len());
    let mut revenue = Vec::with_capacity(outcomes.len());
    let mut requested_at = Vec::with_capacity(outcomes.len());
    let mut assigned_at = Vec::with_capacity(outcomes.len());
    let mut pickup_at = Vec::with_capacity(outcomes.len());
    let mut dropoff_at = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        trip_ids.push(outcome.trip_id.as_str());
        vehicle_ids.push(outcome.vehicle_id.0);
        passengers.push(outcome.passengers);
        deadhead_miles.push(outcome.deadhead_miles);
        loaded_miles.push(outcome.loaded_miles);
        revenue.push(outcome.revenue);
        requested_at.push(outcome.requested_at);
        assigned_at.push(outcome.assigned_at);
        pickup_at.push(outcome.pickup_at);
        dropoff_at.push(outcome.dropoff_at);
    }

    let schema = Schema::new(vec![
        utf8_field("trip_id"),
        u32_field("vehicle_id"),
        u32_field("passengers"),
        f64_field("deadhead_miles"),
        f64_field("loaded_miles"),
        f64_field("revenue"),
        u64_field("requested_at"),
        u64_field("assigned_at"),
        u64_field("pickup_at"),
        u64_field("dropoff_at"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(trip_ids)),
        Arc::new(UInt32Array::from(vehicle_ids)),
        Arc::new(UInt32Array::from(passengers)),
        Arc::new(Float64Array::from(deadhead_miles)),
        Arc::new(Float64Array::from(loaded_miles)),
        Arc::new(Float64Array::from(revenue)),
        Arc::new(UInt64Array::from(requested_at)),
        Arc::new(UInt64Array::from(assigned_at)),
        Arc::new(UInt64Array::from(pickup_at)),
        Arc::new(UInt64Array::from(dropoff_at)),
    ];

    write_record_batch(path, schema, arrays)
}
