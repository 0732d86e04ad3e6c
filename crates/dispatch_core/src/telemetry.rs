//! Telemetry / KPIs: per-request decisions, completed trips, and vehicle trajectories.

use std::collections::BTreeMap;
use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::agent::ParsedRequest;
use crate::vehicle::{Vehicle, VehicleId, VehicleStatus};

/// One completed trip, recorded when the vehicle reaches the dropoff.
/// Timestamps are simulation ms; use the helper methods for derived KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripOutcome {
    pub trip_id: String,
    pub vehicle_id: VehicleId,
    pub passengers: u32,
    pub deadhead_miles: f64,
    pub loaded_miles: f64,
    pub revenue: f64,
    pub requested_at: u64,
    pub assigned_at: u64,
    pub pickup_at: u64,
    pub dropoff_at: u64,
}

impl TripOutcome {
    pub fn total_miles(&self) -> f64 {
        self.deadhead_miles + self.loaded_miles
    }

    /// Time from request arrival to pickup.
    pub fn wait_ms(&self) -> u64 {
        self.pickup_at.saturating_sub(self.requested_at)
    }

    /// Time from pickup to dropoff (passengers onboard).
    pub fn trip_duration_ms(&self) -> u64 {
        self.dropoff_at.saturating_sub(self.pickup_at)
    }
}

/// Why a routing decision was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnassignedReason {
    /// The agent failed outright (transport, parse).
    AgentError,
    /// The agent answered without a routing decision.
    NoDecision,
    UnknownVehicle,
    VehicleNotIdle,
    InsufficientCapacity,
    WheelchairMismatch,
    Unreachable,
}

impl UnassignedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnassignedReason::AgentError => "agent_error",
            UnassignedReason::NoDecision => "no_decision",
            UnassignedReason::UnknownVehicle => "unknown_vehicle",
            UnassignedReason::VehicleNotIdle => "vehicle_not_idle",
            UnassignedReason::InsufficientCapacity => "insufficient_capacity",
            UnassignedReason::WheelchairMismatch => "wheelchair_mismatch",
            UnassignedReason::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for UnassignedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    Assigned {
        vehicle_id: VehicleId,
        pickup_eta: u64,
        dropoff_eta: u64,
    },
    Unassigned {
        reason: UnassignedReason,
    },
}

impl AssignmentOutcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, AssignmentOutcome::Assigned { .. })
    }

    pub fn vehicle_id(&self) -> Option<VehicleId> {
        match self {
            AssignmentOutcome::Assigned { vehicle_id, .. } => Some(*vehicle_id),
            AssignmentOutcome::Unassigned { .. } => None,
        }
    }
}

/// What happened to one request: the agent's parse, its estimates, and whether the
/// decision was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub request_id: String,
    pub request_index: usize,
    pub decided_at: u64,
    /// `None` when the agent failed before producing a parse.
    pub parsed: Option<ParsedRequest>,
    pub estimated_pickup_distance_miles: Option<f64>,
    pub estimated_trip_distance_miles: Option<f64>,
    pub outcome: AssignmentOutcome,
}

/// Position and status of a vehicle at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub timestamp_ms: u64,
    pub latitude: f64,
    pub longitude: f64,
    pub status: VehicleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Collects run telemetry. Inserted as a resource by the environment.
#[derive(Debug, Default, Resource)]
pub struct SimTelemetry {
    pub outcomes: Vec<TripOutcome>,
    pub assignments: Vec<AssignmentRecord>,
    pub trajectories: BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
    pub events_processed: usize,
    pub events_discarded: usize,
}

impl SimTelemetry {
    /// Appends the vehicle's current position and status to its trajectory.
    pub fn record_position(&mut self, vehicle: &Vehicle, timestamp_ms: u64) {
        self.trajectories
            .entry(vehicle.id())
            .or_default()
            .push(TrajectoryPoint {
                timestamp_ms,
                latitude: vehicle.location().latitude,
                longitude: vehicle.location().longitude,
                status: vehicle.status(),
                request_id: vehicle.assigned_request_id().map(str::to_string),
            });
    }

    pub fn assigned_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.outcome.is_assigned())
            .count()
    }
}
