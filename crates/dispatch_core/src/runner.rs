//! Event runner: pops due vehicle events and routes them into the ECS.
//!
//! Clock progression happens here, outside systems. Each step pops the next due event
//! from [SimulationClock], moves the clock to it, inserts it as [CurrentEvent], then runs
//! the schedule.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, EventKind, SimulationClock, VehicleEvent};
use crate::systems::{dropoff::dropoff_system, pickup::pickup_system};
use crate::telemetry::SimTelemetry;

fn is_pickup(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::Pickup)
        .unwrap_or(false)
}

fn is_dropoff(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::Dropoff)
        .unwrap_or(false)
}

/// Result of one [run_next_due_event] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An event was handed to the schedule and applied.
    Ran(VehicleEvent),
    /// The schedule rejected the event, e.g. a dropoff for a vehicle still en route.
    Discarded(VehicleEvent),
    /// An event timestamped before the clock was dropped.
    Stale(VehicleEvent),
    /// Nothing due at or before the target.
    Idle,
}

/// Runs the earliest event with `timestamp <= target`. Events exactly at the current time
/// still run; earlier ones are discarded with a warning. A system that rejects the event
/// bumps `events_discarded`, which turns the step into [Step::Discarded].
pub fn run_next_due_event(world: &mut World, schedule: &mut Schedule, target: u64) -> Step {
    let (event, now) = {
        let mut clock = world.resource_mut::<SimulationClock>();
        match clock.pop_due(target) {
            Some(event) => (event, clock.now()),
            None => return Step::Idle,
        }
    };
    if event.timestamp < now {
        tracing::warn!(
            vehicle = %event.vehicle,
            kind = ?event.kind,
            event_t = event.timestamp,
            now,
            "stale event discarded"
        );
        if let Some(mut telemetry) = world.get_resource_mut::<SimTelemetry>() {
            telemetry.events_discarded += 1;
        }
        return Step::Stale(event);
    }

    let discarded_before = discarded_count(world);
    world.resource_mut::<SimulationClock>().advance_now(event.timestamp);
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    world.remove_resource::<CurrentEvent>();
    if discarded_count(world) > discarded_before {
        Step::Discarded(event)
    } else {
        Step::Ran(event)
    }
}

fn discarded_count(world: &World) -> usize {
    world
        .get_resource::<SimTelemetry>()
        .map_or(0, |telemetry| telemetry.events_discarded)
}

/// Drains every event due at or before `target`. Returns how many were applied; stale and
/// rejected events are not counted.
pub fn run_until(world: &mut World, schedule: &mut Schedule, target: u64) -> usize {
    let mut ran = 0;
    loop {
        match run_next_due_event(world, schedule, target) {
            Step::Ran(_) => ran += 1,
            Step::Stale(_) | Step::Discarded(_) => {}
            Step::Idle => break,
        }
    }
    ran
}

/// Builds the event schedule: each system runs only for its own event kind.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        pickup_system.run_if(is_pickup),
        dropoff_system.run_if(is_dropoff),
    ));
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::VehicleId;

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SimTelemetry::default());
        world
    }

    #[test]
    fn nothing_due_leaves_clock_alone() {
        let mut world = world();
        world
            .resource_mut::<SimulationClock>()
            .schedule_at(500, VehicleId(1), EventKind::Pickup);
        let mut schedule = Schedule::default();
        assert_eq!(run_next_due_event(&mut world, &mut schedule, 499), Step::Idle);
        assert_eq!(world.resource::<SimulationClock>().now(), 0);
        assert_eq!(world.resource::<SimulationClock>().pending(), 1);
    }

    #[test]
    fn stale_events_are_dropped_and_counted() {
        let mut world = world();
        {
            let mut clock = world.resource_mut::<SimulationClock>();
            clock.advance_now(1_000);
            clock.schedule_at(400, VehicleId(1), EventKind::Pickup);
        }
        let mut schedule = Schedule::default();
        let step = run_next_due_event(&mut world, &mut schedule, 2_000);
        assert!(matches!(step, Step::Stale(e) if e.timestamp == 400));
        assert_eq!(world.resource::<SimulationClock>().now(), 1_000);
        assert_eq!(world.resource::<SimTelemetry>().events_discarded, 1);
    }

    #[test]
    fn run_until_moves_clock_to_each_event() {
        let mut world = world();
        {
            let mut clock = world.resource_mut::<SimulationClock>();
            clock.schedule_at(100, VehicleId(1), EventKind::Pickup);
            clock.schedule_at(300, VehicleId(2), EventKind::Pickup);
            clock.schedule_at(900, VehicleId(3), EventKind::Pickup);
        }
        // Systems are omitted; only clock movement is under test.
        let mut schedule = Schedule::default();
        assert_eq!(run_until(&mut world, &mut schedule, 300), 2);
        assert_eq!(world.resource::<SimulationClock>().now(), 300);
        assert_eq!(world.resource::<SimulationClock>().pending(), 1);
    }

    #[test]
    fn rejected_events_are_not_counted_as_run() {
        use crate::location::Location;
        use crate::trips::ActiveTrips;
        use crate::vehicle::{Vehicle, VehicleIndex};

        let mut world = world();
        let vehicle = Vehicle::new(VehicleId(1), Location::new(40.75, -73.98), 4, false);
        let entity = world.spawn(vehicle).id();
        let mut index = VehicleIndex::default();
        index.0.insert(VehicleId(1), entity);
        world.insert_resource(index);
        world.insert_resource(ActiveTrips::default());
        {
            let mut clock = world.resource_mut::<SimulationClock>();
            clock.schedule_at(100, VehicleId(1), EventKind::Dropoff);
            clock.schedule_at(200, VehicleId(1), EventKind::Pickup);
        }
        let mut schedule = simulation_schedule();

        let step = run_next_due_event(&mut world, &mut schedule, 1_000);
        assert!(matches!(step, Step::Discarded(e) if e.kind == EventKind::Dropoff));
        // The idle vehicle rejects the pickup too.
        assert_eq!(run_until(&mut world, &mut schedule, 1_000), 0);
        assert_eq!(world.resource::<SimTelemetry>().events_discarded, 2);
        assert_eq!(world.resource::<SimTelemetry>().events_processed, 0);
        assert_eq!(world.resource::<SimulationClock>().now(), 200);
    }
}
