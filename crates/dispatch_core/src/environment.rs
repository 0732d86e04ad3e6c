//! The simulation environment: fleet, virtual clock and event schedule for one run.
//!
//! Requests are fed in arrival order. Before each one the clock is advanced to its
//! arrival time, so every pickup and dropoff due by then has already been applied when
//! the agent sees the fleet snapshot. A decision that passes validation fixes the pickup
//! time (now + drive to pickup) and the dropoff time (pickup + loaded leg) and queues the
//! pickup; the pickup system queues the dropoff.

use std::collections::BTreeMap;
use std::time::Duration;

use bevy_ecs::prelude::{Schedule, World};
use serde::Serialize;

use crate::agent::{AgentRequest, DispatchAgent, DispatchPayload, FleetVehicle, RoutingDecision};
use crate::clock::{EventKind, SimulationClock, ONE_SEC_MS};
use crate::pricing::FareConfig;
use crate::requests::Request;
use crate::runner::{run_until, simulation_schedule};
use crate::telemetry::{
    AssignmentOutcome, AssignmentRecord, SimTelemetry, TrajectoryPoint, TripOutcome,
    UnassignedReason,
};
use crate::travel_time::{TravelTimeOracle, TravelTimeOracleResource};
use crate::trips::{ActiveTrip, ActiveTrips};
use crate::vehicle::{Vehicle, VehicleId, VehicleIndex};

/// How [`SimulationEnvironment::run`] paces and ends a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Sim time past the last request arrival at which the run stops.
    pub horizon_ms: u64,
    /// Wall-clock pause between agent calls. Pacing only; never changes results.
    pub inter_request_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            horizon_ms: 4 * 3600 * ONE_SEC_MS,
            inter_request_delay: Duration::ZERO,
        }
    }
}

/// Everything a run produced, for the evaluator and the exporters.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub agent: String,
    pub epoch_ms: i64,
    pub final_time_ms: u64,
    pub assignments: Vec<AssignmentRecord>,
    pub outcomes: Vec<TripOutcome>,
    pub vehicles: Vec<Vehicle>,
    pub trajectories: BTreeMap<VehicleId, Vec<TrajectoryPoint>>,
    /// Trips still in flight when the run stopped.
    pub unfinished_trips: usize,
    pub events_processed: usize,
    pub events_discarded: usize,
}

pub struct SimulationEnvironment {
    world: World,
    schedule: Schedule,
}

impl SimulationEnvironment {
    pub fn new(
        vehicles: Vec<Vehicle>,
        oracle: TravelTimeOracle,
        fares: FareConfig,
        epoch_ms: i64,
    ) -> Self {
        let mut world = World::new();
        let mut index = VehicleIndex::default();
        let mut telemetry = SimTelemetry::default();
        for vehicle in vehicles {
            telemetry.record_position(&vehicle, 0);
            let id = vehicle.id();
            let entity = world.spawn(vehicle).id();
            if index.0.insert(id, entity).is_some() {
                tracing::warn!(vehicle = %id, "duplicate vehicle id, keeping the last one");
            }
        }
        world.insert_resource(index);
        world.insert_resource(telemetry);
        world.insert_resource(SimulationClock::with_epoch(epoch_ms));
        world.insert_resource(ActiveTrips::default());
        world.insert_resource(fares);
        world.insert_resource(TravelTimeOracleResource(oracle));
        Self {
            world,
            schedule: simulation_schedule(),
        }
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    pub fn clock(&self) -> &SimulationClock {
        self.world.resource::<SimulationClock>()
    }

    pub fn telemetry(&self) -> &SimTelemetry {
        self.world.resource::<SimTelemetry>()
    }

    pub fn oracle(&self) -> &TravelTimeOracle {
        &self.world.resource::<TravelTimeOracleResource>().0
    }

    /// Direct access for tests and tools that need to seed state.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        let entity = self.world.resource::<VehicleIndex>().get(id)?;
        self.world.get::<Vehicle>(entity)
    }

    /// All vehicles, ordered by id.
    pub fn vehicles(&self) -> Vec<&Vehicle> {
        self.world
            .resource::<VehicleIndex>()
            .iter()
            .filter_map(|(_, entity)| self.world.get::<Vehicle>(entity))
            .collect()
    }

    /// The read-only fleet view handed to the agent.
    pub fn fleet_snapshot(&self) -> Vec<FleetVehicle> {
        self.vehicles().into_iter().map(FleetVehicle::from).collect()
    }

    /// Applies every vehicle event due at or before `target_ms`, in timestamp order, then
    /// moves the clock to `target_ms`. A target in the past leaves the clock where it is.
    /// Returns the number of events that ran.
    pub fn advance_to(&mut self, target_ms: u64) -> usize {
        let now = self.now();
        if target_ms < now {
            tracing::warn!(target = target_ms, now, "advance_to target is in the past, clock unchanged");
            return 0;
        }
        let ran = run_until(&mut self.world, &mut self.schedule, target_ms);
        self.world
            .resource_mut::<SimulationClock>()
            .advance_now(target_ms);
        ran
    }

    /// Asks the agent about one request and applies its decision. The record is also kept
    /// in telemetry.
    pub fn process_request(
        &mut self,
        request_index: usize,
        request: &Request,
        agent: &mut dyn DispatchAgent,
    ) -> AssignmentRecord {
        let now = self.now();
        let payload = DispatchPayload {
            fleet: self.fleet_snapshot(),
            request: AgentRequest::from(request),
            ground_truth: agent
                .wants_ground_truth()
                .then(|| request.ground_truth.clone()),
        };

        let (parsed, routing, failure) = match agent.dispatch(&payload) {
            Ok(response) => (Some(response.parsed), response.routing, None),
            Err(err) => {
                tracing::warn!(request = %request.id, agent = agent.name(), error = %err, "agent failed");
                (None, None, Some(UnassignedReason::AgentError))
            }
        };

        let outcome = match (routing.as_ref(), failure) {
            (_, Some(reason)) => AssignmentOutcome::Unassigned { reason },
            (None, None) => AssignmentOutcome::Unassigned {
                reason: UnassignedReason::NoDecision,
            },
            (Some(decision), None) => match self.apply_decision(request_index, request, decision) {
                Ok(outcome) => outcome,
                Err(reason) => {
                    tracing::warn!(
                        request = %request.id,
                        vehicle = %decision.vehicle_id,
                        %reason,
                        "routing decision rejected"
                    );
                    AssignmentOutcome::Unassigned { reason }
                }
            },
        };

        let record = AssignmentRecord {
            request_id: request.id.clone(),
            request_index,
            decided_at: now,
            parsed,
            estimated_pickup_distance_miles: routing
                .as_ref()
                .map(|r| r.estimated_pickup_distance_miles),
            estimated_trip_distance_miles: routing.as_ref().map(|r| r.estimated_trip_distance_miles),
            outcome,
        };
        self.world
            .resource_mut::<SimTelemetry>()
            .assignments
            .push(record.clone());
        record
    }

    /// Validates a decision against the current fleet and, if it holds, assigns the vehicle
    /// and queues its pickup.
    pub fn apply_decision(
        &mut self,
        request_index: usize,
        request: &Request,
        decision: &RoutingDecision,
    ) -> Result<AssignmentOutcome, UnassignedReason> {
        let now = self.now();
        let vehicle_id = decision.vehicle_id;
        let entity = self
            .world
            .resource::<VehicleIndex>()
            .get(vehicle_id)
            .ok_or(UnassignedReason::UnknownVehicle)?;
        let start = {
            let vehicle = self
                .world
                .get::<Vehicle>(entity)
                .ok_or(UnassignedReason::UnknownVehicle)?;
            if !vehicle.is_idle() {
                return Err(UnassignedReason::VehicleNotIdle);
            }
            if request.passenger_count.max(1) > vehicle.capacity() {
                return Err(UnassignedReason::InsufficientCapacity);
            }
            if request.wheelchair_required && !vehicle.wheelchair_accessible() {
                return Err(UnassignedReason::WheelchairMismatch);
            }
            vehicle.location().clone()
        };

        let (to_pickup, loaded) = {
            let oracle = self.world.resource::<TravelTimeOracleResource>();
            (
                oracle.estimate(&start, &request.origin),
                oracle.request_leg(request_index, &request.origin, &request.destination),
            )
        };
        if to_pickup.is_unreachable() || loaded.is_unreachable() {
            return Err(UnassignedReason::Unreachable);
        }
        let revenue = self
            .world
            .resource::<FareConfig>()
            .fare(loaded.distance_miles, loaded.duration_secs);
        let pickup_at = now + to_pickup.duration_ms();
        let dropoff_at = pickup_at + loaded.duration_ms();

        {
            let mut vehicle = self
                .world
                .get_mut::<Vehicle>(entity)
                .ok_or(UnassignedReason::UnknownVehicle)?;
            vehicle
                .assign_request(&request.id, request.origin.clone(), pickup_at, now)
                .map_err(|_| UnassignedReason::VehicleNotIdle)?;
        }

        self.world.resource_mut::<ActiveTrips>().insert(
            vehicle_id,
            ActiveTrip {
                request_id: request.id.clone(),
                request_index,
                passengers: request.passenger_count.max(1),
                pickup: request.origin.clone(),
                dropoff: request.destination.clone(),
                deadhead_miles: to_pickup.distance_miles,
                loaded_miles: loaded.distance_miles,
                revenue,
                requested_at: request.request_time_ms,
                assigned_at: now,
                pickup_at,
                dropoff_at,
            },
        );
        self.world
            .resource_mut::<SimulationClock>()
            .schedule_at(pickup_at, vehicle_id, EventKind::Pickup);
        self.record_position(vehicle_id, now);
        tracing::debug!(
            request = %request.id,
            vehicle = %vehicle_id,
            pickup_at,
            dropoff_at,
            "request assigned"
        );
        Ok(AssignmentOutcome::Assigned {
            vehicle_id,
            pickup_eta: pickup_at,
            dropoff_eta: dropoff_at,
        })
    }

    /// Withdraws a vehicle for the rest of the run, dropping its pending events and any
    /// trip in flight. Returns false for an unknown id.
    pub fn take_vehicle_offline(&mut self, id: VehicleId) -> bool {
        let now = self.now();
        let Some(entity) = self.world.resource::<VehicleIndex>().get(id) else {
            return false;
        };
        let Some(mut vehicle) = self.world.get_mut::<Vehicle>(entity) else {
            return false;
        };
        vehicle.go_offline(now);
        let dropped = self.world.resource_mut::<SimulationClock>().cancel_vehicle(id);
        if let Some(trip) = self.world.resource_mut::<ActiveTrips>().remove(id) {
            tracing::warn!(vehicle = %id, request = %trip.request_id, "vehicle went offline mid-trip");
        }
        self.record_position(id, now);
        tracing::info!(vehicle = %id, dropped_events = dropped, "vehicle offline");
        true
    }

    fn record_position(&mut self, id: VehicleId, now: u64) {
        let Some(vehicle) = self.vehicle(id).cloned() else {
            return;
        };
        self.world
            .resource_mut::<SimTelemetry>()
            .record_position(&vehicle, now);
    }

    /// Feeds every request to the agent in arrival order, then runs the clock out to the
    /// horizon past the last arrival.
    pub fn run(
        &mut self,
        requests: &[Request],
        agent: &mut dyn DispatchAgent,
        options: &RunOptions,
    ) -> RunReport {
        let mut order: Vec<usize> = (0..requests.len()).collect();
        order.sort_by_key(|&i| (requests[i].request_time_ms, i));

        let last_arrival = order
            .last()
            .map_or(self.now(), |&i| requests[i].request_time_ms);
        tracing::info!(
            agent = agent.name(),
            requests = requests.len(),
            vehicles = self.world.resource::<VehicleIndex>().len(),
            "simulation started"
        );

        for (n, &i) in order.iter().enumerate() {
            let request = &requests[i];
            self.advance_to(request.request_time_ms);
            self.process_request(i, request, agent);
            if !options.inter_request_delay.is_zero() && n + 1 < order.len() {
                std::thread::sleep(options.inter_request_delay);
            }
        }
        self.advance_to(last_arrival.saturating_add(options.horizon_ms));

        let report = self.report(agent.name());
        tracing::info!(
            assigned = self.telemetry().assigned_count(),
            completed = report.outcomes.len(),
            unfinished = report.unfinished_trips,
            discarded_events = report.events_discarded,
            "simulation finished"
        );
        report
    }

    /// Snapshot of everything recorded so far.
    pub fn report(&self, agent: &str) -> RunReport {
        let telemetry = self.telemetry();
        RunReport {
            agent: agent.to_string(),
            epoch_ms: self.clock().epoch_ms(),
            final_time_ms: self.now(),
            assignments: telemetry.assignments.clone(),
            outcomes: telemetry.outcomes.clone(),
            vehicles: self.vehicles().into_iter().cloned().collect(),
            trajectories: telemetry.trajectories.clone(),
            unfinished_trips: self.world.resource::<ActiveTrips>().len(),
            events_processed: telemetry.events_processed,
            events_discarded: telemetry.events_discarded,
        }
    }
}
