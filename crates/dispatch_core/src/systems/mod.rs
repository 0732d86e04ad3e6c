pub mod dropoff;
pub mod pickup;
