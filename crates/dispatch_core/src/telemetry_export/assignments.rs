use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::{AssignmentOutcome, AssignmentRecord};

use super::utils::{
    nullable_f64_field, nullable_u32_field, nullable_u64_field, nullable_utf8_field, u64_field,
    u8_field, utf8_field, write_record_batch,
};

/// One row per request. `assigned` is 1/0; `reason` is set only for unassigned rows.
pub fn write_assignments_parquet<P: AsRef<Path>>(
    path: P,
    records: &[AssignmentRecord],
) -> Result<(), Box<dyn Error>> {
    let mut request_ids = Vec::with_capacity(records.len());
    let mut decided_at = Vec::with_capacity(records.len());
    let mut assigned = Vec::with_capacity(records.len());
    let mut vehicle_ids = Vec::with_capacity(records.len());
    let mut pickup_eta = Vec::with_capacity(records.len());
    let mut dropoff_eta = Vec::with_capacity(records.len());
    let mut reasons = Vec::with_capacity(records.len());
    let mut est_pickup = Vec::with_capacity(records.len());
    let mut est_trip = Vec::with_capacity(records.len());

    for record in records {
        request_ids.push(record.request_id.as_str());
        decided_at.push(record.decided_at);
        match record.outcome {
            AssignmentOutcome::Assigned {
                vehicle_id,
                pickup_eta: p,
                dropoff_eta: d,
            } => {
                assigned.push(1u8);
                vehicle_ids.push(Some(vehicle_id.0));
                pickup_eta.push(Some(p));
                dropoff_eta.push(Some(d));
                reasons.push(None);
            }
            AssignmentOutcome::Unassigned { reason } => {
                assigned.push(0u8);
                vehicle_ids.push(None);
                pickup_eta.push(None);
                dropoff_eta.push(None);
                reasons.push(Some(reason.as_str()));
            }
        }
        est_pickup.push(record.estimated_pickup_distance_miles);
        est_trip.push(record.estimated_trip_distance_miles);
    }

    let schema = Schema::new(vec![
        utf8_field("request_id"),
        u64_field("decided_at"),
        u8_field("assigned"),
        nullable_u32_field("vehicle_id"),
        nullable_u64_field("pickup_eta"),
        nullable_u64_field("dropoff_eta"),
        nullable_utf8_field("reason"),
        nullable_f64_field("estimated_pickup_distance_miles"),
        nullable_f64_field("estimated_trip_distance_miles"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(request_ids)),
        Arc::new(UInt64Array::from(decided_at)),
        Arc::new(UInt8Array::from(assigned)),
        Arc::new(UInt32Array::from(vehicle_ids)),
        Arc::new(UInt64Array::from(pickup_eta)),
        Arc::new(UInt64Array::from(dropoff_eta)),
        Arc::new(StringArray::from(reasons)),
        Arc::new(Float64Array::from(est_pickup)),
        Arc::new(Float64Array::from(est_trip)),
    ];

    write_record_batch(path, schema, arrays)
}
