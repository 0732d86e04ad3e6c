#![allow(dead_code)]

use dispatch_core::environment::SimulationEnvironment;
use dispatch_core::location::Location;
use dispatch_core::pricing::FareConfig;
use dispatch_core::travel_time::TravelTimeOracle;
use dispatch_core::vehicle::{Vehicle, VehicleId};

/// Builder for environments with a hand-placed fleet.
#[derive(Debug, Clone)]
pub struct TestEnvBuilder {
    vehicles: Vec<Vehicle>,
    fares: FareConfig,
    average_speed_mph: f64,
    epoch_ms: i64,
}

impl Default for TestEnvBuilder {
    fn default() -> Self {
        Self {
            vehicles: Vec::new(),
            fares: FareConfig::default(),
            average_speed_mph: 15.0,
            epoch_ms: 0,
        }
    }
}

impl TestEnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an idle four-seat vehicle at `location`.
    pub fn with_vehicle(mut self, id: u32, location: Location) -> Self {
        self.vehicles
            .push(Vehicle::new(VehicleId(id), location, 4, false));
        self
    }

    pub fn with_accessible_vehicle(mut self, id: u32, location: Location) -> Self {
        self.vehicles
            .push(Vehicle::new(VehicleId(id), location, 4, true));
        self
    }

    pub fn with_fares(mut self, fares: FareConfig) -> Self {
        self.fares = fares;
        self
    }

    pub fn with_speed_mph(mut self, mph: f64) -> Self {
        self.average_speed_mph = mph;
        self
    }

    pub fn with_epoch_ms(mut self, epoch_ms: i64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }

    pub fn build(self) -> SimulationEnvironment {
        SimulationEnvironment::new(
            self.vehicles,
            TravelTimeOracle::haversine(self.average_speed_mph),
            self.fares,
            self.epoch_ms,
        )
    }
}

pub fn midtown() -> Location {
    Location::new(40.7580, -73.9855).with_zone(161, "Midtown Center")
}

pub fn upper_east_side() -> Location {
    Location::new(40.7766, -73.9527).with_zone(236, "Upper East Side North")
}

pub fn east_village() -> Location {
    Location::new(40.7265, -73.9815).with_zone(79, "East Village")
}
