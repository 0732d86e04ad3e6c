//! Fleet vehicles: a state machine stored as an ECS component.
//!
//! Fields are private; the mutators on [`Vehicle`] are the only way state changes,
//! and every mutator either applies fully or returns a [`VehicleError`].
//!
//! ```text
//! Idle --assign_request--> EnRouteToPickup --start_trip--> OnTrip --complete_trip--> Idle
//!   any state --go_offline--> Offline (absorbing)
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::{Component, Entity, Resource};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{UnknownStatus, VehicleError};
use crate::location::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{:03}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Idle,
    EnRouteToPickup,
    OnTrip,
    Offline,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Idle => "idle",
            VehicleStatus::EnRouteToPickup => "en_route_to_pickup",
            VehicleStatus::OnTrip => "on_trip",
            VehicleStatus::Offline => "offline",
        }
    }

    /// En route or on trip: the vehicle has exactly one pending event.
    pub fn is_active(&self) -> bool {
        matches!(self, VehicleStatus::EnRouteToPickup | VehicleStatus::OnTrip)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = UnknownStatus;

    /// Case-insensitive; `-` and spaces are treated as `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "idle" | "available" => Ok(VehicleStatus::Idle),
            "en_route_to_pickup" | "en_route" | "enroute" => Ok(VehicleStatus::EnRouteToPickup),
            "on_trip" | "ontrip" | "busy" => Ok(VehicleStatus::OnTrip),
            "offline" | "off_duty" => Ok(VehicleStatus::Offline),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for VehicleStatus {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(de)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One fleet unit. Persists for the whole run.
#[derive(Debug, Clone, PartialEq, Component, Serialize, Deserialize)]
pub struct Vehicle {
    id: VehicleId,
    location: Location,
    status: VehicleStatus,
    capacity: u32,
    passenger_count: u32,
    wheelchair_accessible: bool,
    assigned_request_id: Option<String>,
    destination: Option<Location>,
    estimated_arrival_ms: Option<u64>,
    total_miles_driven: f64,
    total_deadhead_miles: f64,
    total_revenue: f64,
    #[serde(default)]
    trip_history: Vec<String>,
    last_updated_ms: u64,
}

impl Vehicle {
    pub fn new(id: VehicleId, location: Location, capacity: u32, wheelchair_accessible: bool) -> Self {
        Self {
            id,
            location,
            status: VehicleStatus::Idle,
            capacity: capacity.max(1),
            passenger_count: 0,
            wheelchair_accessible,
            assigned_request_id: None,
            destination: None,
            estimated_arrival_ms: None,
            total_miles_driven: 0.0,
            total_deadhead_miles: 0.0,
            total_revenue: 0.0,
            trip_history: Vec::new(),
            last_updated_ms: 0,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn passenger_count(&self) -> u32 {
        self.passenger_count
    }

    pub fn wheelchair_accessible(&self) -> bool {
        self.wheelchair_accessible
    }

    pub fn assigned_request_id(&self) -> Option<&str> {
        self.assigned_request_id.as_deref()
    }

    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    pub fn estimated_arrival_ms(&self) -> Option<u64> {
        self.estimated_arrival_ms
    }

    pub fn total_miles_driven(&self) -> f64 {
        self.total_miles_driven
    }

    pub fn total_deadhead_miles(&self) -> f64 {
        self.total_deadhead_miles
    }

    pub fn total_revenue(&self) -> f64 {
        self.total_revenue
    }

    pub fn trip_history(&self) -> &[String] {
        &self.trip_history
    }

    pub fn last_updated_ms(&self) -> u64 {
        self.last_updated_ms
    }

    pub fn is_idle(&self) -> bool {
        self.status == VehicleStatus::Idle
    }

    fn invalid(&self, action: &'static str) -> VehicleError {
        VehicleError::InvalidTransition {
            vehicle: self.id,
            status: self.status,
            action,
        }
    }

    fn check_request(&self, request_id: &str) -> Result<(), VehicleError> {
        if self.assigned_request_id.as_deref() == Some(request_id) {
            Ok(())
        } else {
            Err(VehicleError::RequestMismatch {
                vehicle: self.id,
                assigned: self.assigned_request_id.clone(),
                requested: request_id.to_string(),
            })
        }
    }

    fn check_miles(&self, miles: f64) -> Result<(), VehicleError> {
        if miles.is_finite() && miles >= 0.0 {
            Ok(())
        } else {
            Err(VehicleError::InvalidMiles {
                vehicle: self.id,
                miles,
            })
        }
    }

    /// Idle -> EnRouteToPickup, heading for `pickup` with arrival at `eta_ms`.
    pub fn assign_request(
        &mut self,
        request_id: &str,
        pickup: Location,
        eta_ms: u64,
        now_ms: u64,
    ) -> Result<(), VehicleError> {
        if self.status != VehicleStatus::Idle {
            return Err(self.invalid("accept an assignment"));
        }
        self.assigned_request_id = Some(request_id.to_string());
        self.destination = Some(pickup);
        self.estimated_arrival_ms = Some(eta_ms);
        self.status = VehicleStatus::EnRouteToPickup;
        self.last_updated_ms = now_ms;
        Ok(())
    }

    /// EnRouteToPickup -> OnTrip. The vehicle is now at the pickup and heads for `dropoff`.
    pub fn start_trip(
        &mut self,
        request_id: &str,
        passengers: u32,
        dropoff: Location,
        dropoff_eta_ms: u64,
        now_ms: u64,
    ) -> Result<(), VehicleError> {
        if self.status != VehicleStatus::EnRouteToPickup {
            return Err(self.invalid("start a trip"));
        }
        self.check_request(request_id)?;
        let onboard = self.passenger_count + passengers.max(1);
        if onboard > self.capacity {
            return Err(VehicleError::CapacityExceeded {
                vehicle: self.id,
                capacity: self.capacity,
                onboard: self.passenger_count,
                requested: passengers,
            });
        }
        if let Some(pickup) = self.destination.take() {
            self.location = pickup;
        }
        self.passenger_count = onboard;
        self.destination = Some(dropoff);
        self.estimated_arrival_ms = Some(dropoff_eta_ms);
        self.status = VehicleStatus::OnTrip;
        self.last_updated_ms = now_ms;
        Ok(())
    }

    /// Drops the party off. Returns to Idle once nobody is left onboard.
    pub fn complete_trip(
        &mut self,
        request_id: &str,
        passengers: u32,
        miles_driven: f64,
        revenue: f64,
        now_ms: u64,
    ) -> Result<(), VehicleError> {
        if self.status != VehicleStatus::OnTrip {
            return Err(self.invalid("complete a trip"));
        }
        self.check_request(request_id)?;
        self.check_miles(miles_driven)?;

        if let Some(dropoff) = self.destination.clone() {
            self.location = dropoff;
        }
        self.trip_history.push(request_id.to_string());
        self.total_miles_driven += miles_driven;
        if revenue.is_finite() {
            self.total_revenue += revenue;
        }
        self.passenger_count = self.passenger_count.saturating_sub(passengers.max(1));
        if self.passenger_count == 0 {
            self.assigned_request_id = None;
            self.destination = None;
            self.estimated_arrival_ms = None;
            self.status = VehicleStatus::Idle;
        }
        self.last_updated_ms = now_ms;
        Ok(())
    }

    /// Empty miles driven toward a pickup. Counts toward the total as well.
    pub fn add_deadhead_miles(&mut self, miles: f64) -> Result<(), VehicleError> {
        self.check_miles(miles)?;
        self.total_deadhead_miles += miles;
        self.total_miles_driven += miles;
        Ok(())
    }

    /// Withdraws the vehicle for the rest of the run.
    pub fn go_offline(&mut self, now_ms: u64) {
        self.status = VehicleStatus::Offline;
        self.assigned_request_id = None;
        self.destination = None;
        self.estimated_arrival_ms = None;
        self.passenger_count = 0;
        self.last_updated_ms = now_ms;
    }

    /// Dictionary form used by trajectories and the agent boundary.
    pub fn to_record(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Inverse of [`Vehicle::to_record`]. Rejects records that break the fleet invariants.
    pub fn from_record(record: serde_json::Value) -> Result<Self, serde_json::Error> {
        use serde::de::Error as _;

        let vehicle: Vehicle = serde_json::from_value(record)?;
        if vehicle.capacity == 0 || vehicle.passenger_count > vehicle.capacity {
            return Err(serde_json::Error::custom("passenger count exceeds capacity"));
        }
        if vehicle.status == VehicleStatus::Idle && vehicle.passenger_count != 0 {
            return Err(serde_json::Error::custom("idle vehicle carries passengers"));
        }
        if vehicle.total_deadhead_miles < 0.0
            || vehicle.total_miles_driven < vehicle.total_deadhead_miles
        {
            return Err(serde_json::Error::custom("deadhead miles exceed total miles"));
        }
        Ok(vehicle)
    }
}

/// Vehicle id -> entity, ordered by id so fleet snapshots are stable.
#[derive(Debug, Default, Resource)]
pub struct VehicleIndex(pub BTreeMap<VehicleId, Entity>);

impl VehicleIndex {
    pub fn get(&self, id: VehicleId) -> Option<Entity> {
        self.0.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VehicleId, Entity)> + '_ {
        self.0.iter().map(|(id, e)| (*id, *e))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
