use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::telemetry::SimTelemetry;
use crate::trips::ActiveTrips;
use crate::vehicle::{Vehicle, VehicleIndex, VehicleStatus};

/// Passengers alight: loaded miles and fare are booked, the vehicle returns to idle at the
/// dropoff, and the trip outcome is recorded.
pub fn dropoff_system(
    event: Res<CurrentEvent>,
    clock: Res<SimulationClock>,
    index: Res<VehicleIndex>,
    mut trips: ResMut<ActiveTrips>,
    mut telemetry: ResMut<SimTelemetry>,
    mut vehicles: Query<&mut Vehicle>,
) {
    let event = event.0;
    if event.kind != EventKind::Dropoff {
        return;
    }
    let now = clock.now();

    let Some(entity) = index.get(event.vehicle) else {
        tracing::warn!(vehicle = %event.vehicle, t = now, "dropoff for unknown vehicle discarded");
        telemetry.events_discarded += 1;
        return;
    };
    let Ok(mut vehicle) = vehicles.get_mut(entity) else {
        tracing::warn!(vehicle = %event.vehicle, t = now, "dropoff for despawned vehicle discarded");
        telemetry.events_discarded += 1;
        return;
    };
    if vehicle.status() != VehicleStatus::OnTrip {
        tracing::warn!(
            vehicle = %event.vehicle,
            status = %vehicle.status(),
            t = now,
            "dropoff for vehicle not on trip discarded"
        );
        telemetry.events_discarded += 1;
        return;
    }
    let Some(trip) = trips.get(event.vehicle) else {
        tracing::warn!(vehicle = %event.vehicle, t = now, "dropoff without an active trip discarded");
        telemetry.events_discarded += 1;
        return;
    };

    if let Err(err) = vehicle.complete_trip(
        &trip.request_id,
        trip.passengers,
        trip.loaded_miles,
        trip.revenue,
        now,
    ) {
        tracing::warn!(vehicle = %event.vehicle, error = %err, "dropoff rejected");
        telemetry.events_discarded += 1;
        return;
    }
    let outcome = trip.outcome(event.vehicle, now);
    trips.remove(event.vehicle);
    telemetry.record_position(&vehicle, now);
    telemetry.outcomes.push(outcome);
    telemetry.events_processed += 1;
    tracing::debug!(vehicle = %event.vehicle, t = now, "trip completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::location::Location;
    use crate::test_helpers::{active_trip, event_at};
    use crate::vehicle::VehicleId;

    #[test]
    fn dropoff_books_trip_and_frees_vehicle() {
        let mut world = World::new();
        let mut clock = SimulationClock::default();
        clock.advance_now(660_000);
        world.insert_resource(clock);
        world.insert_resource(SimTelemetry::default());

        let trip = active_trip("req_0001", 60_000, 660_000);
        let mut vehicle = Vehicle::new(VehicleId(1), Location::new(40.74, -73.99), 4, false);
        vehicle
            .assign_request(&trip.request_id, trip.pickup.clone(), trip.pickup_at, 0)
            .expect("assign");
        vehicle
            .start_trip(&trip.request_id, 1, trip.dropoff.clone(), trip.dropoff_at, 60_000)
            .expect("start");
        let entity = world.spawn(vehicle).id();
        let mut index = VehicleIndex::default();
        index.0.insert(VehicleId(1), entity);
        world.insert_resource(index);
        let mut trips = ActiveTrips::default();
        trips.insert(VehicleId(1), trip.clone());
        world.insert_resource(trips);
        world.insert_resource(CurrentEvent(event_at(660_000, VehicleId(1), EventKind::Dropoff)));

        let mut schedule = Schedule::default();
        schedule.add_systems(dropoff_system);
        schedule.run(&mut world);

        let vehicle = world.query::<&Vehicle>().single(&world).clone();
        assert_eq!(vehicle.status(), VehicleStatus::Idle);
        assert_eq!(vehicle.location(), &trip.dropoff);
        assert_eq!(vehicle.trip_history(), ["req_0001".to_string()]);
        assert!((vehicle.total_revenue() - trip.revenue).abs() < 1e-12);

        let telemetry = world.resource::<SimTelemetry>();
        assert_eq!(telemetry.outcomes.len(), 1);
        assert_eq!(telemetry.outcomes[0].dropoff_at, 660_000);
        assert!(world.resource::<ActiveTrips>().is_empty());
    }
}
