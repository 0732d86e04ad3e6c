use serde::{Deserialize, Serialize};

use crate::location::Location;
use crate::requests::{GroundTruth, Request};
use crate::vehicle::{Vehicle, VehicleId, VehicleStatus};

/// One vehicle as the agent sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetVehicle {
    pub vehicle_id: VehicleId,
    pub latitude: f64,
    pub longitude: f64,
    pub status: VehicleStatus,
    pub wheelchair_accessible: bool,
    #[serde(default)]
    pub capacity: u32,
}

impl FleetVehicle {
    pub fn location(&self) -> Location {
        Location::new(self.latitude, self.longitude)
    }

    /// Idle and able to seat the party.
    pub fn is_available_for(&self, passengers: u32, wheelchair_required: bool) -> bool {
        self.status == VehicleStatus::Idle
            && (self.capacity == 0 || passengers <= self.capacity)
            && (!wheelchair_required || self.wheelchair_accessible)
    }
}

impl From<&Vehicle> for FleetVehicle {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            vehicle_id: vehicle.id(),
            latitude: vehicle.location().latitude,
            longitude: vehicle.location().longitude,
            status: vehicle.status(),
            wheelchair_accessible: vehicle.wheelchair_accessible(),
            capacity: vehicle.capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub request_id: String,
    pub text: String,
    pub request_time_ms: u64,
}

impl From<&Request> for AgentRequest {
    fn from(request: &Request) -> Self {
        Self {
            request_id: request.id.clone(),
            text: request.text.clone(),
            request_time_ms: request.request_time_ms,
        }
    }
}

/// Everything handed to the agent for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchPayload {
    pub fleet: Vec<FleetVehicle>,
    pub request: AgentRequest,
    /// Present only for agents that run with ground-truth access.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_truth: Option<GroundTruth>,
}

/// The agent's structured reading of the request text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedRequest {
    pub pickup_zone_id: Option<u32>,
    pub dropoff_zone_id: Option<u32>,
    pub pickup_latitude: Option<f64>,
    pub pickup_longitude: Option<f64>,
    pub dropoff_latitude: Option<f64>,
    pub dropoff_longitude: Option<f64>,
    pub passenger_count: Option<u32>,
    pub wheelchair_accessible: bool,
    pub shared_ride_ok: bool,
    /// `HH:MM`, 24h.
    pub pickup_time: Option<String>,
}

impl ParsedRequest {
    pub fn from_ground_truth(truth: &GroundTruth) -> Self {
        Self {
            pickup_zone_id: truth.pickup_zone_id,
            dropoff_zone_id: truth.dropoff_zone_id,
            pickup_latitude: Some(truth.pickup_latitude),
            pickup_longitude: Some(truth.pickup_longitude),
            dropoff_latitude: Some(truth.dropoff_latitude),
            dropoff_longitude: Some(truth.dropoff_longitude),
            passenger_count: Some(truth.passenger_count),
            wheelchair_accessible: truth.wheelchair_accessible,
            shared_ride_ok: truth.shared_ride_ok,
            pickup_time: Some(truth.pickup_time.clone()),
        }
    }

    pub fn pickup_location(&self) -> Option<Location> {
        Some(Location::new(self.pickup_latitude?, self.pickup_longitude?)).filter(Location::is_valid)
    }

    pub fn dropoff_location(&self) -> Option<Location> {
        Some(Location::new(self.dropoff_latitude?, self.dropoff_longitude?)).filter(Location::is_valid)
    }

    pub fn passengers(&self) -> u32 {
        self.passenger_count.unwrap_or(1).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub vehicle_id: VehicleId,
    pub estimated_pickup_distance_miles: f64,
    pub estimated_trip_distance_miles: f64,
}

/// What comes back from the agent. A missing routing block means the agent declined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub parsed: ParsedRequest,
    #[serde(default)]
    pub routing: Option<RoutingDecision>,
}
