//! Test helpers for common test setup and utilities.
//!
//! This module provides shared fixtures (locations, vehicles, requests, a ready-made
//! environment) and [`ScriptedAgent`], an agent whose routing answers are fixed up front.

use std::collections::VecDeque;

use crate::agent::{DispatchAgent, DispatchPayload, ParsedRequest, RoutingDecision};
use crate::clock::{EventKind, VehicleEvent};
use crate::environment::SimulationEnvironment;
use crate::error::AgentError;
use crate::location::Location;
use crate::pricing::FareConfig;
use crate::requests::{GroundTruth, Request, TimeWindow, TIME_WINDOW_MS};
use crate::travel_time::TravelTimeOracle;
use crate::trips::ActiveTrip;
use crate::vehicle::{Vehicle, VehicleId};

/// Midtown Manhattan.
pub fn test_location() -> Location {
    Location::new(40.7580, -73.9855).with_zone(161, "Midtown Center")
}

/// Upper East Side, about two miles from [`test_location`].
pub fn test_destination() -> Location {
    Location::new(40.7766, -73.9527).with_zone(236, "Upper East Side North")
}

/// An idle four-seat vehicle without wheelchair access.
pub fn test_vehicle(id: u32, latitude: f64, longitude: f64) -> Vehicle {
    Vehicle::new(VehicleId(id), Location::new(latitude, longitude), 4, false)
}

/// A request with ground truth that mirrors its own fields.
pub fn test_request(
    id: &str,
    request_time_ms: u64,
    origin: Location,
    destination: Location,
    passengers: u32,
) -> Request {
    let ground_truth = GroundTruth {
        pickup_zone_id: origin.zone_id,
        dropoff_zone_id: destination.zone_id,
        pickup_latitude: origin.latitude,
        pickup_longitude: origin.longitude,
        dropoff_latitude: destination.latitude,
        dropoff_longitude: destination.longitude,
        passenger_count: passengers,
        wheelchair_accessible: false,
        shared_ride_ok: false,
        pickup_time: "08:00".to_string(),
        recorded_fare: None,
        recorded_distance_miles: None,
    };
    Request {
        id: id.to_string(),
        request_time_ms,
        pickup_window: TimeWindow::around(request_time_ms + TIME_WINDOW_MS, TIME_WINDOW_MS),
        dropoff_window: TimeWindow::around(request_time_ms + 4 * TIME_WINDOW_MS, TIME_WINDOW_MS),
        origin,
        destination,
        passenger_count: passengers,
        wheelchair_required: false,
        shared_ride_ok: false,
        text: format!("I need a ride for {passengers} passengers."),
        ground_truth,
    }
}

/// Great-circle oracle at the default speed, default fares, epoch 0.
pub fn test_environment(vehicles: Vec<Vehicle>) -> SimulationEnvironment {
    SimulationEnvironment::new(
        vehicles,
        TravelTimeOracle::haversine(crate::travel_time::DEFAULT_AVERAGE_SPEED_MPH),
        FareConfig::default(),
        0,
    )
}

pub fn event_at(timestamp: u64, vehicle: VehicleId, kind: EventKind) -> VehicleEvent {
    VehicleEvent::new(timestamp, vehicle, kind)
}

/// One passenger, one deadhead mile, three loaded miles.
pub fn active_trip(request_id: &str, pickup_at: u64, dropoff_at: u64) -> ActiveTrip {
    ActiveTrip {
        request_id: request_id.to_string(),
        request_index: 0,
        passengers: 1,
        pickup: test_location(),
        dropoff: test_destination(),
        deadhead_miles: 1.0,
        loaded_miles: 3.0,
        revenue: 18.0,
        requested_at: 0,
        assigned_at: 0,
        pickup_at,
        dropoff_at,
    }
}

/// Parses from ground truth and answers routing from a fixed script. `None` entries decline.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    script: VecDeque<Option<VehicleId>>,
    /// Every payload seen, in call order.
    pub payloads: Vec<DispatchPayload>,
}

impl ScriptedAgent {
    pub fn new(script: Vec<Option<VehicleId>>) -> Self {
        Self {
            script: script.into(),
            payloads: Vec::new(),
        }
    }
}

impl DispatchAgent for ScriptedAgent {
    fn name(&self) -> &str {
        "scripted"
    }

    fn wants_ground_truth(&self) -> bool {
        true
    }

    fn parse_request(&mut self, payload: &DispatchPayload) -> Result<ParsedRequest, AgentError> {
        self.payloads.push(payload.clone());
        Ok(payload
            .ground_truth
            .as_ref()
            .map(ParsedRequest::from_ground_truth)
            .unwrap_or_default())
    }

    fn make_routing_decision(
        &mut self,
        _parsed: &ParsedRequest,
        payload: &DispatchPayload,
    ) -> Result<RoutingDecision, AgentError> {
        match self.script.pop_front().flatten() {
            Some(vehicle_id) => Ok(RoutingDecision {
                vehicle_id,
                estimated_pickup_distance_miles: 1.0,
                estimated_trip_distance_miles: 2.0,
            }),
            None => Err(AgentError::NoVehicle {
                request_id: payload.request.request_id.clone(),
            }),
        }
    }
}
