use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;

use dispatch_core::telemetry::TrajectoryPoint;
use dispatch_core::vehicle::VehicleId;
use serde_json::{json, Value};

use crate::error::EvalError;

/// One LineString feature per vehicle with at least two points; GeoJSON coordinates are
/// `[lng, lat]`.
pub(crate) fn trajectory_collection(
    trajectories: &BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
) -> Value {
    let features: Vec<Value> = trajectories
        .iter()
        .filter(|(_, points)| points.len() >= 2)
        .map(|(vehicle_id, points)| {
            let coordinates: Vec<[f64; 2]> = points
                .iter()
                .map(|point| [point.longitude, point.latitude])
                .collect();
            let timestamps: Vec<u64> = points.iter().map(|point| point.timestamp_ms).collect();
            let statuses: Vec<&str> = points.iter().map(|point| point.status.as_str()).collect();
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": coordinates,
                },
                "properties": {
                    "vehicle_id": vehicle_id.0,
                    "timestamps_ms": timestamps,
                    "statuses": statuses,
                },
            })
        })
        .collect();

    json!({
        "type": "FeatureCollection",
        "features": features,
    })
}

pub(crate) fn trajectory_geojson_impl(
    trajectories: &BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
    file: File,
) -> Result<(), EvalError> {
    serde_json::to_writer(BufWriter::new(file), &trajectory_collection(trajectories))?;
    Ok(())
}
