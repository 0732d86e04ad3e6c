use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::telemetry::SimTelemetry;
use crate::trips::ActiveTrips;
use crate::vehicle::{Vehicle, VehicleIndex, VehicleStatus};

/// The vehicle reached its pickup: passengers board, deadhead miles are booked, and the
/// dropoff is queued at the time fixed when the trip was assigned.
pub fn pickup_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    index: Res<VehicleIndex>,
    trips: Res<ActiveTrips>,
    mut telemetry: ResMut<SimTelemetry>,
    mut vehicles: Query<&mut Vehicle>,
) {
    let event = event.0;
    if event.kind != EventKind::Pickup {
        return;
    }
    let now = clock.now();

    let Some(entity) = index.get(event.vehicle) else {
        tracing::warn!(vehicle = %event.vehicle, t = now, "pickup for unknown vehicle discarded");
        telemetry.events_discarded += 1;
        return;
    };
    let Ok(mut vehicle) = vehicles.get_mut(entity) else {
        tracing::warn!(vehicle = %event.vehicle, t = now, "pickup for despawned vehicle discarded");
        telemetry.events_discarded += 1;
        return;
    };
    let Some(trip) = trips.get(event.vehicle) else {
        tracing::warn!(vehicle = %event.vehicle, t = now, "pickup without an active trip discarded");
        telemetry.events_discarded += 1;
        return;
    };
    if vehicle.status() != VehicleStatus::EnRouteToPickup {
        tracing::warn!(
            vehicle = %event.vehicle,
            status = %vehicle.status(),
            t = now,
            "pickup for vehicle not en route discarded"
        );
        telemetry.events_discarded += 1;
        return;
    }

    if let Err(err) = vehicle.start_trip(
        &trip.request_id,
        trip.passengers,
        trip.dropoff.clone(),
        trip.dropoff_at,
        now,
    ) {
        tracing::warn!(vehicle = %event.vehicle, error = %err, "pickup rejected");
        telemetry.events_discarded += 1;
        return;
    }
    if let Err(err) = vehicle.add_deadhead_miles(trip.deadhead_miles) {
        tracing::warn!(vehicle = %event.vehicle, error = %err, "deadhead miles not booked");
    }
    clock.schedule_at(trip.dropoff_at, event.vehicle, EventKind::Dropoff);
    telemetry.record_position(&vehicle, now);
    telemetry.events_processed += 1;
    tracing::debug!(vehicle = %event.vehicle, request = %trip.request_id, t = now, "passengers picked up");
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::location::Location;
    use crate::test_helpers::active_trip;
    use crate::vehicle::VehicleId;

    fn world_with_en_route_vehicle() -> World {
        let mut world = World::new();
        let mut clock = SimulationClock::default();
        clock.advance_now(60_000);
        world.insert_resource(clock);
        world.insert_resource(SimTelemetry::default());

        let trip = active_trip("req_0001", 60_000, 660_000);
        let mut vehicle = Vehicle::new(VehicleId(1), Location::new(40.74, -73.99), 4, false);
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
    }

    #[test]
    fn pickup_boards_and_schedules_dropoff() {
        let mut world = world_with_en_route_vehicle();
        world.insert_resource(CurrentEvent(crate::test_helpers::event_at(
            60_000,
            VehicleId(1),
            EventKind::Pickup,
        )));

        let mut schedule = Schedule::default();
        schedule.add_systems(pickup_system);
        schedule.run(&mut world);

        let vehicle = world.query::<&Vehicle>().single(&world).clone();
        assert_eq!(vehicle.status(), VehicleStatus::OnTrip);
        assert_eq!(vehicle.passenger_count(), 1);
        assert!((vehicle.total_deadhead_miles() - 1.0).abs() < 1e-12);

        let pending = world.resource::<SimulationClock>().pending_events();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].kind, EventKind::Dropoff);
        assert_eq!(pending[0].timestamp, 660_000);
        assert_eq!(world.resource::<SimTelemetry>().events_processed, 1);
    }

    #[test]
    fn pickup_without_active_trip_is_discarded() {
        let mut world = world_with_en_route_vehicle();
        world.resource_mut::<ActiveTrips>().remove(VehicleId(1));
        world.insert_resource(CurrentEvent(crate::test_helpers::event_at(
            60_000,
            VehicleId(1),
            EventKind::Pickup,
        )));

        let mut schedule = Schedule::default();
        schedule.add_systems(pickup_system);
        schedule.run(&mut world);

        assert_eq!(world.resource::<SimTelemetry>().events_discarded, 1);
        assert!(world.resource::<SimulationClock>().is_empty());
    }
}
