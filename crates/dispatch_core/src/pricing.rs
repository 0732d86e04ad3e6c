//! Fare model for completed trips.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Metered fare: flag drop plus distance and time components, floored at a minimum.
///
/// Formula: `max(base_fare + miles * per_mile + minutes * per_minute, minimum_fare)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct FareConfig {
    pub base_fare: f64,
    pub per_mile: f64,
    pub per_minute: f64,
    pub minimum_fare: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            base_fare: 3.00,
            per_mile: 2.50,
            per_minute: 0.50,
            minimum_fare: 8.00,
        }
    }
}

impl FareConfig {
    /// Fare for a loaded leg. Non-finite inputs (the unreachable sentinel) price at the minimum.
    pub fn fare(&self, miles: f64, duration_secs: f64) -> f64 {
        if !miles.is_finite() || !duration_secs.is_finite() {
            return self.minimum_fare;
        }
        let metered =
            self.base_fare + miles.max(0.0) * self.per_mile + duration_secs.max(0.0) / 60.0 * self.per_minute;
        metered.max(self.minimum_fare)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fare_includes_base_distance_and_time() {
        let fares = FareConfig::default();
        let fare = fares.fare(4.0, 20.0 * 60.0);
        assert!((fare - (3.0 + 10.0 + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn short_trips_pay_the_minimum() {
        let fares = FareConfig::default();
        assert_eq!(fares.fare(0.2, 60.0), 8.0);
        assert_eq!(fares.fare(f64::NAN, 60.0), 8.0);
    }
}
