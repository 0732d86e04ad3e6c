use dispatch_core::requests::{read_trip_records, ZoneTable};

use crate::inputs::EvaluationInputs;

const ZONES: &str = "\
LocationID,Borough,Zone,latitude,longitude
132,Queens,JFK Airport,40.6413,-73.7781
161,Manhattan,Midtown Center,40.7580,-73.9855
236,Manhattan,Upper East Side North,40.7766,-73.9527
79,Manhattan,East Village,40.7265,-73.9815
";

const TRIPS: &str = "\
tpep_pickup_datetime,tpep_dropoff_datetime,passenger_count,trip_distance,PULocationID,DOLocationID,fare_amount
2024-01-15 08:05:00,2024-01-15 08:20:00,1,2.1,161,236,14.2
2024-01-15 08:10:00,2024-01-15 08:35:00,2,3.4,79,161,19.8
2024-01-15 08:15:00,2024-01-15 08:55:00,1,17.2,161,132,70.0
2024-01-15 08:20:00,2024-01-15 08:31:00,3,1.8,236,161,12.1
2024-01-15 08:30:00,2024-01-15 08:50:00,1,4.0,79,236,21.5
2024-01-15 08:45:00,2024-01-15 09:05:00,2,2.6,161,79,16.0
";

pub(crate) fn inputs() -> EvaluationInputs {
    let zones = ZoneTable::from_reader(ZONES.as_bytes()).expect("zones");
    let (records, _) = read_trip_records(TRIPS.as_bytes());
    EvaluationInputs::new(zones, records)
}
