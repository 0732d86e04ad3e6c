mod support;

use bevy_ecs::prelude::World;
use dispatch_core::clock::{EventKind, SimulationClock};
use dispatch_core::runner::{run_next_due_event, run_until, simulation_schedule, Step};
use dispatch_core::telemetry::SimTelemetry;
use dispatch_core::test_helpers::active_trip;
use dispatch_core::trips::ActiveTrips;
use dispatch_core::vehicle::{Vehicle, VehicleId, VehicleIndex, VehicleStatus};

use support::world::{east_village, upper_east_side};

/// One vehicle heading for the pickup of `req_0001` (pickup at 60s, dropoff at 660s).
fn world_with_assigned_vehicle() -> World {
    let mut world = World::new();
    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimTelemetry::default());

    let trip = active_trip("req_0001", 60_000, 660_000);
    let mut vehicle = Vehicle::new(VehicleId(1), east_village(), 4, false);
    vehicle
        .assign_request(&trip.request_id, trip.pickup.clone(), trip.pickup_at, 0)
        .expect("assign");
    let entity = world.spawn(vehicle).id();
    let mut index = VehicleIndex::default();
    index.0.insert(VehicleId(1), entity);
    world.insert_resource(index);

    let mut trips = ActiveTrips::default();
    trips.insert(VehicleId(1), trip);
    world.insert_resource(trips);
    world
        .resource_mut::<SimulationClock>()
        .schedule_at(60_000, VehicleId(1), EventKind::Pickup);
    world
}

fn vehicle(world: &mut World) -> Vehicle {
    world.query::<&Vehicle>().single(world).clone()
}

#[test]
fn pickup_then_dropoff_completes_the_trip() {
    let mut world = world_with_assigned_vehicle();
    let mut schedule = simulation_schedule();

    assert_eq!(run_until(&mut world, &mut schedule, 59_999), 0);
    assert_eq!(vehicle(&mut world).status(), VehicleStatus::EnRouteToPickup);

    assert_eq!(run_until(&mut world, &mut schedule, 60_000), 1);
    let on_trip = vehicle(&mut world);
    assert_eq!(on_trip.status(), VehicleStatus::OnTrip);
    assert_eq!(on_trip.destination().map(|d| d.zone_id), Some(upper_east_side().zone_id));

    assert_eq!(run_until(&mut world, &mut schedule, 1_000_000), 1);
    let done = vehicle(&mut world);
    assert_eq!(done.status(), VehicleStatus::Idle);
    assert_eq!(done.assigned_request_id(), None);
    assert!((done.total_miles_driven() - 4.0).abs() < 1e-12);
    assert!((done.total_deadhead_miles() - 1.0).abs() < 1e-12);
    assert!((done.total_revenue() - 18.0).abs() < 1e-12);

    assert!(world.resource::<ActiveTrips>().is_empty());
    let telemetry = world.resource::<SimTelemetry>();
    assert_eq!(telemetry.outcomes.len(), 1);
    assert_eq!(telemetry.outcomes[0].dropoff_at, 660_000);
    assert_eq!(telemetry.events_processed, 2);
    // Clock sits on the last event; the caller moves it to the target.
    assert_eq!(world.resource::<SimulationClock>().now(), 660_000);
}

#[test]
fn dropoff_before_pickup_is_discarded() {
    let mut world = world_with_assigned_vehicle();
    world
        .resource_mut::<SimulationClock>()
        .schedule_at(30_000, VehicleId(1), EventKind::Dropoff);
    let mut schedule = simulation_schedule();

    let step = run_next_due_event(&mut world, &mut schedule, 60_000);
    assert!(matches!(step, Step::Discarded(e) if e.kind == EventKind::Dropoff));
    assert_eq!(vehicle(&mut world).status(), VehicleStatus::EnRouteToPickup);
    assert_eq!(world.resource::<SimTelemetry>().events_discarded, 1);

    let step = run_next_due_event(&mut world, &mut schedule, 60_000);
    assert!(matches!(step, Step::Ran(e) if e.kind == EventKind::Pickup));
    assert_eq!(vehicle(&mut world).status(), VehicleStatus::OnTrip);
}

#[test]
fn run_until_counts_only_applied_events() {
    let mut world = world_with_assigned_vehicle();
    world
        .resource_mut::<SimulationClock>()
        .schedule_at(30_000, VehicleId(1), EventKind::Dropoff);
    let mut schedule = simulation_schedule();

    // Early dropoff is rejected; the pickup applies.
    assert_eq!(run_until(&mut world, &mut schedule, 60_000), 1);
    let telemetry = world.resource::<SimTelemetry>();
    assert_eq!(telemetry.events_processed, 1);
    assert_eq!(telemetry.events_discarded, 1);
}

#[test]
fn nothing_due_is_idle() {
    let mut world = world_with_assigned_vehicle();
    let mut schedule = simulation_schedule();
    assert_eq!(run_next_due_event(&mut world, &mut schedule, 1_000), Step::Idle);
    assert_eq!(world.resource::<SimulationClock>().pending(), 1);
}
