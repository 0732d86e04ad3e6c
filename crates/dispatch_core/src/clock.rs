//! Virtual clock and the pending vehicle-event queue.
//!
//! Time is simulation milliseconds since the run epoch. Pending events sit in a
//! min-heap; equal timestamps are ordered by vehicle id, then pickup before
//! dropoff, then insertion order, so processing order never depends on fleet
//! iteration order.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::vehicle::VehicleId;

pub const ONE_SEC_MS: u64 = 1000;
pub const ONE_MIN_MS: u64 = 60 * ONE_SEC_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Pickup,
    Dropoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleEvent {
    pub timestamp: u64,
    pub vehicle: VehicleId,
    pub kind: EventKind,
    seq: u64,
}

impl VehicleEvent {
    /// An unqueued event; the clock assigns the sequence number when scheduling.
    pub fn new(timestamp: u64, vehicle: VehicleId, kind: EventKind) -> Self {
        Self {
            timestamp,
            vehicle,
            kind,
            seq: 0,
        }
    }
}

impl Ord for VehicleEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on every key so BinaryHeap pops the smallest first.
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.vehicle.cmp(&self.vehicle))
            .then_with(|| other.kind.cmp(&self.kind))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for VehicleEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed by the schedule.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub VehicleEvent);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    /// Real-world Unix ms that sim time 0 corresponds to.
    epoch_ms: i64,
    next_seq: u64,
    events: BinaryHeap<VehicleEvent>,
}

impl SimulationClock {
    pub fn with_epoch(epoch_ms: i64) -> Self {
        Self {
            epoch_ms,
            ..Default::default()
        }
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    pub fn sim_to_real_ms(&self, sim_ms: u64) -> i64 {
        self.epoch_ms.saturating_add(sim_ms as i64)
    }

    pub fn real_to_sim_ms(&self, real_ms: i64) -> Option<u64> {
        real_ms
            .checked_sub(self.epoch_ms)
            .filter(|d| *d >= 0)
            .map(|d| d as u64)
    }

    /// Queues an event. Past timestamps are accepted here and discarded when reached.
    pub fn schedule_at(&mut self, timestamp: u64, vehicle: VehicleId, kind: EventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(VehicleEvent {
            timestamp,
            vehicle,
            kind,
            seq,
        });
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|e| e.timestamp)
    }

    /// Removes and returns the earliest event with `timestamp <= target`, without
    /// touching `now`.
    pub fn pop_due(&mut self, target: u64) -> Option<VehicleEvent> {
        if self.next_event_time()? > target {
            return None;
        }
        self.events.pop()
    }

    /// Moves the clock forward. Never moves it backward.
    pub fn advance_now(&mut self, to: u64) {
        if to > self.now {
            self.now = to;
        }
    }

    /// Drops every pending event for `vehicle`; returns how many were removed.
    pub fn cancel_vehicle(&mut self, vehicle: VehicleId) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.vehicle != vehicle);
        before - self.events.len()
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pending events in processing order.
    pub fn pending_events(&self) -> Vec<VehicleEvent> {
        let mut events = self.events.clone().into_sorted_vec();
        events.reverse();
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(20, VehicleId(1), EventKind::Dropoff);
        clock.schedule_at(5, VehicleId(2), EventKind::Pickup);
        clock.schedule_at(10, VehicleId(3), EventKind::Pickup);

        assert_eq!(clock.pop_due(100).expect("first").timestamp, 5);
        assert_eq!(clock.pop_due(100).expect("second").timestamp, 10);
        assert_eq!(clock.pop_due(100).expect("third").timestamp, 20);
        assert!(clock.pop_due(100).is_none());
        assert!(clock.is_empty());
        assert_eq!(clock.now(), 0, "popping does not move the clock");
    }

    #[test]
    fn equal_timestamps_break_ties_by_vehicle_then_kind() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(30, VehicleId(9), EventKind::Pickup);
        clock.schedule_at(30, VehicleId(2), EventKind::Dropoff);
        clock.schedule_at(30, VehicleId(2), EventKind::Pickup);

        let order: Vec<_> = std::iter::from_fn(|| clock.pop_due(30))
            .map(|e| (e.vehicle, e.kind))
            .collect();
        assert_eq!(
            order,
            vec![
                (VehicleId(2), EventKind::Pickup),
                (VehicleId(2), EventKind::Dropoff),
                (VehicleId(9), EventKind::Pickup),
            ]
        );
    }

    #[test]
    fn pop_due_respects_target() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(50, VehicleId(1), EventKind::Pickup);
        assert!(clock.pop_due(49).is_none());
        assert!(clock.pop_due(50).is_some());
    }

    #[test]
    fn clock_never_moves_backward() {
        let mut clock = SimulationClock::default();
        clock.advance_now(100);
        clock.advance_now(40);
        assert_eq!(clock.now(), 100);
    }

    #[test]
    fn cancel_removes_only_that_vehicle() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(10, VehicleId(1), EventKind::Pickup);
        clock.schedule_at(20, VehicleId(2), EventKind::Pickup);
        assert_eq!(clock.cancel_vehicle(VehicleId(1)), 1);
        assert_eq!(clock.pending(), 1);
        assert_eq!(clock.pending_events()[0].vehicle, VehicleId(2));
    }

    #[test]
    fn epoch_conversion() {
        let clock = SimulationClock::with_epoch(1_700_000_000_000);
        assert_eq!(clock.sim_to_real_ms(ONE_SEC_MS), 1_700_000_001_000);
        assert_eq!(clock.real_to_sim_ms(1_700_000_001_000), Some(1000));
        assert_eq!(clock.real_to_sim_ms(1_699_999_999_000), None);
    }
}
