//! Trips between assignment and dropoff.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;

use crate::location::Location;
use crate::telemetry::TripOutcome;
use crate::vehicle::VehicleId;

/// Everything fixed at assignment time that the pickup and dropoff handlers need.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTrip {
    pub request_id: String,
    pub request_index: usize,
    pub passengers: u32,
    pub pickup: Location,
    pub dropoff: Location,
    pub deadhead_miles: f64,
    pub loaded_miles: f64,
    pub revenue: f64,
    pub requested_at: u64,
    pub assigned_at: u64,
    /// Scheduled pickup time.
    pub pickup_at: u64,
    /// Scheduled dropoff time (pickup plus the loaded leg).
    pub dropoff_at: u64,
}

impl ActiveTrip {
    pub fn outcome(&self, vehicle_id: VehicleId, dropoff_at: u64) -> TripOutcome {
        TripOutcome {
            trip_id: self.request_id.clone(),
            vehicle_id,
            passengers: self.passengers,
            deadhead_miles: self.deadhead_miles,
            loaded_miles: self.loaded_miles,
            revenue: self.revenue,
            requested_at: self.requested_at,
            assigned_at: self.assigned_at,
            pickup_at: self.pickup_at,
            dropoff_at,
        }
    }
}

/// At most one trip per vehicle.
#[derive(Debug, Default, Resource)]
pub struct ActiveTrips(pub HashMap<VehicleId, ActiveTrip>);

impl ActiveTrips {
    pub fn get(&self, vehicle: VehicleId) -> Option<&ActiveTrip> {
        self.0.get(&vehicle)
    }

    pub fn insert(&mut self, vehicle: VehicleId, trip: ActiveTrip) -> Option<ActiveTrip> {
        self.0.insert(vehicle, trip)
    }

    pub fn remove(&mut self, vehicle: VehicleId) -> Option<ActiveTrip> {
        self.0.remove(&vehicle)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
