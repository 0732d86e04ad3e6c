use std::collections::BTreeMap;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array, UInt64Array, UInt8Array};
use arrow::datatypes::Schema;

use crate::telemetry::TrajectoryPoint;
use crate::vehicle::VehicleId;

use super::utils::{f64_field, status_code, u32_field, u64_field, u8_field, write_record_batch};

/// Flattened trajectories: one row per recorded point, grouped by vehicle id.
pub fn write_trajectories_parquet<P: AsRef<Path>>(
    path: P,
    trajectories: &BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
) -> Result<(), Box<dyn Error>> {
    let rows: usize = trajectories.values().map(Vec::len).sum();
    let mut vehicle_ids = Vec::with_capacity(rows);
    let mut timestamps = Vec::with_capacity(rows);
    let mut latitudes = Vec::with_capacity(rows);
    let mut longitudes = Vec::with_capacity(rows);
    let mut statuses = Vec::with_capacity(rows);

    for (vehicle_id, points) in trajectories {
        for point in points {
            vehicle_ids.push(vehicle_id.0);
            timestamps.push(point.timestamp_ms);
            latitudes.push(point.latitude);
            longitudes.push(point.longitude);
            statuses.push(status_code(point.status));
        }
    }

    let schema = Schema::new(vec![
        u32_field("vehicle_id"),
        u64_field("timestamp_ms"),
        f64_field("latitude"),
        f64_field("longitude"),
        u8_field("status"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt32Array::from(vehicle_ids)),
        Arc::new(UInt64Array::from(timestamps)),
        Arc::new(Float64Array::from(latitudes)),
        Arc::new(Float64Array::from(longitudes)),
        Arc::new(UInt8Array::from(statuses)),
    ];

    write_record_batch(path, schema, arrays)
}
