#![allow(dead_code)]

use dispatch_core::requests::{read_trip_records, TripRecord, ZoneTable};

/// Four Manhattan/Queens zones with centroids.
pub const ZONES_CSV: &str = "\
LocationID,Borough,Zone,latitude,longitude
132,Queens,JFK Airport,40.6413,-73.7781
161,Manhattan,Midtown Center,40.7580,-73.9855
236,Manhattan,Upper East Side North,40.7766,-73.9527
79,Manhattan,East Village,40.7265,-73.9815
";

/// A morning of trips between the zones above, one row with a bad timestamp.
pub const TRIPS_CSV: &str = "\
tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,PULocationID,DOLocationID,fare_amount
2024-01-15 08:05:00,2024-01-15 08:20:00,1,2.1,161,236,14.2
2024-01-15 08:10:00,2024-01-15 08:35:00,2,3.4,79,161,19.8
2024-01-15 08:15:00,2024-01-15 08:55:00,1,17.2,161,132,70.0
2024-01-15 08:20:00,2024-01-15 08:31:00,3,1.8,236,161,12.1
2024-01-15 08:30:00,2024-01-15 08:50:00,1,4.0,79,236,21.5
2024-01-15 08:45:00,2024-01-15 09:05:00,2,2.6,161,79,16.0
2024-01-15 09:00:00,2024-01-15 09:12:00,1,2.0,236,161,13.3
2024-01-15 09:10:00,2024-01-15 09:40:00,4,3.9,79,161,22.4
not-a-time,2024-01-15 09:40:00,1,1.0,79,161,9.0
";

pub fn zones() -> ZoneTable {
    ZoneTable::from_reader(ZONES_CSV.as_bytes()).expect("zones should parse")
}

pub fn trip_records() -> Vec<TripRecord> {
    let (records, skipped) = read_trip_records(TRIPS_CSV.as_bytes());
    assert_eq!(skipped, 0, "fixture rows should all deserialize");
    records
}
