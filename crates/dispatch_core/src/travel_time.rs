//! Travel-time oracle: distance/duration estimates between locations.
//!
//! Backends implement [`DistanceService`], selectable via [`DistanceBackend`]:
//!
//! - **`HaversineService`**: great-circle distance times a road circuity factor over an
//!   average speed. Always available, zero external dependencies.
//! - **`OsrmTableService`** (feature `remote`): batched OSRM `table` queries.
//!
//! [`TravelTimeOracle`] owns one backend plus an optional precomputed
//! [`TravelTimeMatrix`] and is stored as an ECS resource owned by the simulation
//! environment, so concurrent runs never share a cache.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use bevy_ecs::prelude::Resource;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::location::Location;

mod matrix;
#[cfg(feature = "remote")]
pub mod osrm;

pub use matrix::TravelTimeMatrix;

/// Sentinel cost for unresolvable pairs (miles and seconds).
pub const UNREACHABLE: f64 = 1_000_000.0;

/// Default average city speed used by the great-circle fallback.
pub const DEFAULT_AVERAGE_SPEED_MPH: f64 = 15.0;

/// Ratio of street distance to straight-line distance in a dense grid.
pub const DEFAULT_CIRCUITY: f64 = 1.3;

const DEFAULT_CACHE_CAPACITY: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelEstimate {
    pub distance_miles: f64,
    pub duration_secs: f64,
}

impl TravelEstimate {
    pub const ZERO: TravelEstimate = TravelEstimate {
        distance_miles: 0.0,
        duration_secs: 0.0,
    };

    pub const UNREACHABLE: TravelEstimate = TravelEstimate {
        distance_miles: UNREACHABLE,
        duration_secs: UNREACHABLE,
    };

    pub fn is_unreachable(&self) -> bool {
        self.distance_miles >= UNREACHABLE || self.duration_secs >= UNREACHABLE
    }

    pub fn duration_ms(&self) -> u64 {
        (self.duration_secs.max(0.0) * 1000.0).round() as u64
    }

    fn is_finite(&self) -> bool {
        self.distance_miles.is_finite() && self.duration_secs.is_finite()
    }
}

/// Pairwise distance backend. Implementations must be `Send + Sync` so an oracle can be
/// moved into a worker thread.
pub trait DistanceService: Send + Sync {
    /// Maximum `origins.len() * destinations.len()` accepted by one call.
    fn max_elements(&self) -> usize {
        usize::MAX
    }

    /// Row-major answers: `result[i][j]` is origin `i` to destination `j`, `None` when
    /// the pair could not be resolved.
    fn estimate_batch(
        &self,
        origins: &[Location],
        destinations: &[Location],
    ) -> Vec<Vec<Option<TravelEstimate>>>;

    fn estimate(&self, from: &Location, to: &Location) -> Option<TravelEstimate> {
        self.estimate_batch(std::slice::from_ref(from), std::slice::from_ref(to))
            .into_iter()
            .next()?
            .into_iter()
            .next()
            .flatten()
    }
}

/// Great-circle estimate over an assumed average speed.
#[derive(Debug, Clone, Copy)]
pub struct HaversineService {
    pub average_speed_mph: f64,
    pub circuity: f64,
}

impl Default for HaversineService {
    fn default() -> Self {
        Self {
            average_speed_mph: DEFAULT_AVERAGE_SPEED_MPH,
            circuity: DEFAULT_CIRCUITY,
        }
    }
}

impl HaversineService {
    pub fn with_speed(average_speed_mph: f64) -> Self {
        Self {
            average_speed_mph,
            ..Default::default()
        }
    }

    fn pair(&self, from: &Location, to: &Location) -> Option<TravelEstimate> {
        if !from.is_valid() || !to.is_valid() || self.average_speed_mph <= 0.0 {
            return None;
        }
        let distance_miles = from.distance_miles(to) * self.circuity;
        let duration_secs = distance_miles / self.average_speed_mph * 3600.0;
        Some(TravelEstimate {
            distance_miles,
            duration_secs,
        })
    }
}

impl DistanceService for HaversineService {
    fn estimate_batch(
        &self,
        origins: &[Location],
        destinations: &[Location],
    ) -> Vec<Vec<Option<TravelEstimate>>> {
        origins
            .iter()
            .map(|o| destinations.iter().map(|d| self.pair(o, d)).collect())
            .collect()
    }
}

type PairKey = (u64, u64, u64, u64);

fn pair_key(from: &Location, to: &Location) -> PairKey {
    (
        from.latitude.to_bits(),
        from.longitude.to_bits(),
        to.latitude.to_bits(),
        to.longitude.to_bits(),
    )
}

/// LRU-cached wrapper around any [`DistanceService`].
///
/// On inner failure the optional great-circle fallback answers before giving up.
pub struct CachedDistanceService {
    inner: Box<dyn DistanceService>,
    cache: Mutex<LruCache<PairKey, TravelEstimate>>,
    fallback: Option<HaversineService>,
}

impl CachedDistanceService {
    pub fn new(
        inner: Box<dyn DistanceService>,
        capacity: usize,
        fallback: Option<HaversineService>,
    ) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            fallback,
        }
    }

    fn cached(&self, origins: &[Location], destinations: &[Location]) -> Option<Vec<Vec<Option<TravelEstimate>>>> {
        let mut cache = self.cache.lock().ok()?;
        origins
            .iter()
            .map(|o| {
                destinations
                    .iter()
                    .map(|d| cache.get(&pair_key(o, d)).copied().map(Some))
                    .collect::<Option<Vec<_>>>()
            })
            .collect()
    }
}

impl DistanceService for CachedDistanceService {
    fn max_elements(&self) -> usize {
        self.inner.max_elements()
    }

    fn estimate_batch(
        &self,
        origins: &[Location],
        destinations: &[Location],
    ) -> Vec<Vec<Option<TravelEstimate>>> {
        if let Some(hit) = self.cached(origins, destinations) {
            return hit;
        }

        let mut result = self.inner.estimate_batch(origins, destinations);
        result.resize_with(origins.len(), Vec::new);
        for (o, row) in origins.iter().zip(result.iter_mut()) {
            row.resize(destinations.len(), None);
            for (d, cell) in destinations.iter().zip(row.iter_mut()) {
                if cell.is_none() {
                    *cell = self.fallback.and_then(|f| f.pair(o, d));
                }
            }
        }

        if let Ok(mut cache) = self.cache.lock() {
            for (o, row) in origins.iter().zip(result.iter()) {
                for (d, cell) in destinations.iter().zip(row.iter()) {
                    if let Some(estimate) = cell {
                        cache.put(pair_key(o, d), *estimate);
                    }
                }
            }
        }
        result
    }
}

/// Which distance backend to use.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistanceBackend {
    #[default]
    Haversine,
    /// OSRM HTTP endpoint (e.g. `"http://localhost:5000"`).
    #[cfg(feature = "remote")]
    Osrm {
        endpoint: String,
        #[serde(default = "osrm::default_max_elements")]
        max_elements: usize,
    },
}

/// Construct a boxed [`DistanceService`] from a [`DistanceBackend`] descriptor.
///
/// Remote backends are wrapped in a [`CachedDistanceService`] that falls back to the
/// great-circle estimate, so callers are agnostic to which backend answered.
pub fn build_distance_service(
    kind: &DistanceBackend,
    average_speed_mph: f64,
) -> Box<dyn DistanceService> {
    match kind {
        DistanceBackend::Haversine => Box::new(HaversineService::with_speed(average_speed_mph)),

        #[cfg(feature = "remote")]
        DistanceBackend::Osrm {
            endpoint,
            max_elements,
        } => match osrm::OsrmTableService::new(endpoint, *max_elements) {
            Ok(service) => Box::new(CachedDistanceService::new(
                Box::new(service),
                DEFAULT_CACHE_CAPACITY,
                Some(HaversineService::with_speed(average_speed_mph)),
            )),
            Err(err) => {
                tracing::warn!(%endpoint, error = %err, "OSRM client unavailable, using great-circle estimates");
                Box::new(HaversineService::with_speed(average_speed_mph))
            }
        },
    }
}

/// Answers point and node queries for one simulation run.
pub struct TravelTimeOracle {
    service: Box<dyn DistanceService>,
    matrix: Option<TravelTimeMatrix>,
}

impl TravelTimeOracle {
    pub fn new(service: Box<dyn DistanceService>) -> Self {
        Self {
            service,
            matrix: None,
        }
    }

    /// Great-circle oracle with an LRU in front of it.
    pub fn haversine(average_speed_mph: f64) -> Self {
        Self::new(Box::new(CachedDistanceService::new(
            Box::new(HaversineService::with_speed(average_speed_mph)),
            DEFAULT_CACHE_CAPACITY,
            None,
        )))
    }

    /// Installs a matrix built elsewhere, e.g. loaded from disk.
    pub fn set_matrix(&mut self, matrix: TravelTimeMatrix) {
        self.matrix = Some(matrix);
    }

    /// Precomputes the depot/pickup/dropoff matrix for `legs` (one per request, in order).
    pub fn build_matrix(&mut self, legs: &[(Location, Location)]) -> &TravelTimeMatrix {
        let matrix = TravelTimeMatrix::build(legs, self.service.as_ref());
        self.matrix.insert(matrix)
    }

    pub fn matrix(&self) -> Option<&TravelTimeMatrix> {
        self.matrix.as_ref()
    }

    /// Point-to-point estimate; the sentinel when the backend cannot answer.
    pub fn estimate(&self, from: &Location, to: &Location) -> TravelEstimate {
        match self.service.estimate(from, to) {
            Some(estimate) if estimate.is_finite() => estimate,
            _ => TravelEstimate::UNREACHABLE,
        }
    }

    /// Matrix cell between two nodes; `None` without a matrix or for an unknown node.
    pub fn between_nodes(&self, from: usize, to: usize) -> Option<TravelEstimate> {
        self.matrix.as_ref()?.get(from, to)
    }

    /// Pickup-to-dropoff leg of the request at `request_index` (0-based), from the matrix
    /// when one was built for it.
    pub fn request_leg(
        &self,
        request_index: usize,
        origin: &Location,
        destination: &Location,
    ) -> TravelEstimate {
        let (pickup, dropoff) = TravelTimeMatrix::request_nodes(request_index);
        match self.matrix.as_ref() {
            Some(m) if m.covers(pickup, origin) && m.covers(dropoff, destination) => self
                .between_nodes(pickup, dropoff)
                .unwrap_or(TravelEstimate::UNREACHABLE),
            _ => self.estimate(origin, destination),
        }
    }
}

/// ECS resource wrapping the run's oracle.
#[derive(Resource)]
pub struct TravelTimeOracleResource(pub TravelTimeOracle);

impl std::ops::Deref for TravelTimeOracleResource {
    type Target = TravelTimeOracle;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingService;

    impl DistanceService for FailingService {
        fn estimate_batch(
            &self,
            origins: &[Location],
            destinations: &[Location],
        ) -> Vec<Vec<Option<TravelEstimate>>> {
            vec![vec![None; destinations.len()]; origins.len()]
        }
    }

    #[test]
    fn haversine_duration_follows_speed() {
        let service = HaversineService {
            average_speed_mph: 30.0,
            circuity: 1.0,
        };
        let a = Location::new(40.0, -74.0);
        let b = Location::new(40.1, -74.0);
        let est = service.estimate(&a, &b).expect("estimate");
        let expected = a.distance_miles(&b);
        assert!((est.distance_miles - expected).abs() < 1e-9);
        assert!((est.duration_secs - expected / 30.0 * 3600.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_location_yields_sentinel() {
        let oracle = TravelTimeOracle::haversine(20.0);
        let est = oracle.estimate(&Location::new(f64::NAN, 0.0), &Location::new(40.0, -74.0));
        assert!(est.is_unreachable());
    }

    #[test]
    fn cache_falls_back_to_great_circle() {
        let service =
            CachedDistanceService::new(Box::new(FailingService), 16, Some(HaversineService::default()));
        let est = service
            .estimate(&Location::new(40.0, -74.0), &Location::new(40.05, -74.0))
            .expect("fallback answer");
        assert!(est.distance_miles > 0.0);

        let no_fallback = CachedDistanceService::new(Box::new(FailingService), 16, None);
        assert!(no_fallback
            .estimate(&Location::new(40.0, -74.0), &Location::new(40.05, -74.0))
            .is_none());
    }

    #[test]
    fn request_leg_prefers_matrix() {
        let legs = vec![(Location::new(40.70, -74.00), Location::new(40.75, -73.98))];
        let mut oracle = TravelTimeOracle::new(Box::new(HaversineService::with_speed(10.0)));
        oracle.build_matrix(&legs);
        let from_matrix = oracle.request_leg(0, &legs[0].0, &legs[0].1);
        let direct = oracle.estimate(&legs[0].0, &legs[0].1);
        assert!((from_matrix.distance_miles - direct.distance_miles).abs() < 1e-9);

        // A different origin than the one the matrix was built for goes point-to-point.
        let moved = Location::new(40.60, -74.00);
        let leg = oracle.request_leg(0, &moved, &legs[0].1);
        assert!((leg.distance_miles - oracle.estimate(&moved, &legs[0].1).distance_miles).abs() < 1e-9);
    }

    #[test]
    fn node_queries_read_the_matrix() {
        let legs = vec![
            (Location::new(40.70, -74.00), Location::new(40.75, -73.98)),
            (Location::new(40.76, -73.97), Location::new(40.72, -73.99)),
        ];
        let mut oracle = TravelTimeOracle::new(Box::new(HaversineService::with_speed(12.0)));
        assert_eq!(oracle.between_nodes(1, 2), None);

        oracle.build_matrix(&legs);
        for (k, (origin, destination)) in legs.iter().enumerate() {
            let (pickup, dropoff) = TravelTimeMatrix::request_nodes(k);
            let cell = oracle.between_nodes(pickup, dropoff).expect("request cell");
            let direct = oracle.estimate(origin, destination);
            assert!((cell.distance_miles - direct.distance_miles).abs() < 1e-9);
            assert!((cell.duration_secs - direct.duration_secs).abs() < 1e-6);
        }
        // Depot row reaches every request node.
        for node in 1..=4 {
            let leg = oracle.between_nodes(TravelTimeMatrix::DEPOT, node).expect("depot cell");
            assert!(leg.is_finite() && !leg.is_unreachable());
            assert!(leg.distance_miles > 0.0);
        }
        assert_eq!(oracle.between_nodes(0, 5), None);
        assert_eq!(oracle.between_nodes(5, 0), None);
    }
}
