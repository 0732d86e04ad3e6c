//! Historical trip records (TLC-style CSV).

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::DataError;
use crate::location::Location;

const TIMESTAMP_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];

/// One row of the source trip file. Either zone ids or coordinates may be present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripRecord {
    #[serde(alias = "tpep_pickup_datetime", alias = "lpep_pickup_datetime")]
    pub pickup_datetime: String,
    #[serde(alias = "tpep_dropoff_datetime", alias = "lpep_dropoff_datetime")]
    pub dropoff_datetime: String,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub passenger_count: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub trip_distance: Option<f64>,
    #[serde(default, alias = "PULocationID", deserialize_with = "csv::invalid_option")]
    pub pickup_zone_id: Option<u32>,
    #[serde(default, alias = "DOLocationID", deserialize_with = "csv::invalid_option")]
    pub dropoff_zone_id: Option<u32>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub pickup_latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub pickup_longitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub dropoff_latitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub dropoff_longitude: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub fare_amount: Option<f64>,
}

impl TripRecord {
    pub fn pickup_ms(&self) -> Option<i64> {
        parse_timestamp_ms(&self.pickup_datetime)
    }

    pub fn dropoff_ms(&self) -> Option<i64> {
        parse_timestamp_ms(&self.dropoff_datetime)
    }

    /// Explicit pickup coordinates, when the row has valid ones.
    pub fn pickup_point(&self) -> Option<Location> {
        point(self.pickup_latitude, self.pickup_longitude)
    }

    pub fn dropoff_point(&self) -> Option<Location> {
        point(self.dropoff_latitude, self.dropoff_longitude)
    }
}

fn point(lat: Option<f64>, lng: Option<f64>) -> Option<Location> {
    let loc = Location::new(lat?, lng?);
    // Old TLC exports use 0,0 for "unknown".
    (loc.is_valid() && (loc.latitude != 0.0 || loc.longitude != 0.0)).then_some(loc)
}

/// Parses a naive timestamp (interpreted as UTC) into Unix milliseconds.
pub fn parse_timestamp_ms(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Reads trip rows; malformed rows are skipped and counted.
pub fn read_trip_records<R: Read>(reader: R) -> (Vec<TripRecord>, usize) {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    let mut skipped = 0;
    for row in csv_reader.deserialize::<TripRecord>() {
        match row {
            Ok(record) => records.push(record),
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed trip row");
                skipped += 1;
            }
        }
    }
    (records, skipped)
}

pub fn load_trip_records(path: impl AsRef<Path>) -> Result<Vec<TripRecord>, DataError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let (records, skipped) = read_trip_records(file);
    if skipped > 0 {
        tracing::warn!(skipped, path = %path.display(), "malformed trip rows skipped");
    }
    if records.is_empty() {
        return Err(DataError::NoUsableTrips { skipped });
    }
    tracing::info!(rows = records.len(), path = %path.display(), "loaded trip records");
    Ok(records)
}
