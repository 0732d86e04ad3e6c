#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const ZONES_CSV: &str = "\
LocationID,Borough,Zone,latitude,longitude
132,Queens,JFK Airport,40.6413,-73.7781
161,Manhattan,Midtown Center,40.7580,-73.9855
236,Manhattan,Upper East Side North,40.7766,-73.9527
79,Manhattan,East Village,40.7265,-73.9815
";

pub const TRIPS_CSV: &str = "\
tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,PULocationID,DOLocationID,fare_amount
2024-01-15 08:05:00,2024-01-15 08:20:00,1,2.1,161,236,14.2
2024-01-15 08:10:00,2024-01-15 08:35:00,2,3.4,79,161,19.8
2024-01-15 08:15:00,2024-01-15 08:55:00,1,17.2,161,132,70.0
2024-01-15 08:20:00,2024-01-15 08:31:00,3,1.8,236,161,12.1
2024-01-15 08:30:00,2024-01-15 08:50:00,1,4.0,79,236,21.5
2024-01-15 08:45:00,2024-01-15 09:05:00,2,2.6,161,79,16.0
";

/// Writes the zone and trip fixtures into `dir` and returns their paths.
pub fn write_inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let zones = dir.join("taxi_zones.csv");
    let trips = dir.join("trips.csv");
    std::fs::write(&zones, ZONES_CSV).expect("write zones");
    std::fs::write(&trips, TRIPS_CSV).expect("write trips");
    (zones, trips)
}
