//! Node-indexed travel-time matrix.
//!
//! Node 0 is a synthetic depot at the centroid of every valid location; request `k`
//! (1-based) owns nodes `2k-1` (pickup) and `2k` (dropoff). The matrix is symmetric:
//! only the upper triangle is queried, in blocks that respect the backend's batch
//! limit, and mirrored.

use serde::{Deserialize, Serialize};

use super::{DistanceService, TravelEstimate, UNREACHABLE};
use crate::location::{centroid, Location};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelTimeMatrix {
    nodes: Vec<Location>,
    valid: Vec<bool>,
    distance_miles: Vec<f64>,
    duration_secs: Vec<f64>,
    batches: usize,
}

impl TravelTimeMatrix {
    pub const DEPOT: usize = 0;

    /// Node indices `(pickup, dropoff)` of the request at `request_index` (0-based).
    pub fn request_nodes(request_index: usize) -> (usize, usize) {
        let k = request_index + 1;
        (2 * k - 1, 2 * k)
    }

    pub fn build(legs: &[(Location, Location)], service: &dyn DistanceService) -> Self {
        let depot = centroid(legs.iter().flat_map(|(o, d)| [o, d]))
            .unwrap_or_else(|| Location::new(f64::NAN, f64::NAN));

        let mut nodes = Vec::with_capacity(2 * legs.len() + 1);
        nodes.push(depot);
        for (origin, destination) in legs {
            nodes.push(origin.clone());
            nodes.push(destination.clone());
        }
        let valid: Vec<bool> = nodes.iter().map(Location::is_valid).collect();

        let n = nodes.len();
        let mut matrix = Self {
            distance_miles: vec![UNREACHABLE; n * n],
            duration_secs: vec![UNREACHABLE; n * n],
            nodes,
            valid,
            batches: 0,
        };
        for i in 0..n {
            matrix.set(i, i, TravelEstimate::ZERO);
        }

        let valid_idx: Vec<usize> = (0..n).filter(|&i| matrix.valid[i]).collect();
        let skipped = n - valid_idx.len();
        if skipped > 0 {
            tracing::warn!(skipped, "travel-time matrix nodes with invalid coordinates");
        }

        // Square blocks keep rows * cols within the batch limit.
        let limit = service.max_elements().max(1);
        let block = ((limit as f64).sqrt().floor() as usize).max(1);

        let mut unresolved = 0usize;
        for (bi, rows) in valid_idx.chunks(block).enumerate() {
            for cols in valid_idx.chunks(block).skip(bi) {
                let origins: Vec<Location> = rows.iter().map(|&i| matrix.nodes[i].clone()).collect();
                let destinations: Vec<Location> =
                    cols.iter().map(|&j| matrix.nodes[j].clone()).collect();
                let answers = service.estimate_batch(&origins, &destinations);
                matrix.batches += 1;

                for (r, &i) in rows.iter().enumerate() {
                    for (c, &j) in cols.iter().enumerate() {
                        if i >= j {
                            continue;
                        }
                        let answer = answers.get(r).and_then(|row| row.get(c)).copied().flatten();
                        match answer {
                            Some(est) if est.is_finite() => {
                                matrix.set(i, j, est);
                                matrix.set(j, i, est);
                            }
                            _ => unresolved += 1,
                        }
                    }
                }
            }
        }
        if unresolved > 0 {
            tracing::warn!(unresolved, "travel-time pairs left at the unreachable sentinel");
        }
        tracing::debug!(nodes = n, batches = matrix.batches, "built travel-time matrix");
        matrix
    }

    fn set(&mut self, i: usize, j: usize, est: TravelEstimate) {
        let n = self.nodes.len();
        self.distance_miles[i * n + j] = est.distance_miles;
        self.duration_secs[i * n + j] = est.duration_secs;
    }

    pub fn get(&self, i: usize, j: usize) -> Option<TravelEstimate> {
        let n = self.nodes.len();
        if i >= n || j >= n {
            return None;
        }
        Some(TravelEstimate {
            distance_miles: self.distance_miles[i * n + j],
            duration_secs: self.duration_secs[i * n + j],
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, i: usize) -> Option<&Location> {
        self.nodes.get(i)
    }

    pub fn depot(&self) -> &Location {
        &self.nodes[Self::DEPOT]
    }

    /// Number of backend calls made while building.
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Whether node `i` was built for exactly this location.
    pub fn covers(&self, i: usize, location: &Location) -> bool {
        self.node(i)
            .is_some_and(|n| n.latitude == location.latitude && n.longitude == location.longitude)
    }

    /// Whether this matrix was built for exactly these request legs, in this order.
    pub fn matches_legs(&self, legs: &[(Location, Location)]) -> bool {
        self.len() == 2 * legs.len() + 1
            && legs.iter().enumerate().all(|(k, (origin, destination))| {
                let (pickup, dropoff) = Self::request_nodes(k);
                self.covers(pickup, origin) && self.covers(dropoff, destination)
            })
    }

    /// Sum of leg durations along a node sequence, sentinel legs included.
    pub fn route_duration_secs(&self, route: &[usize]) -> f64 {
        route
            .windows(2)
            .map(|w| self.get(w[0], w[1]).map_or(UNREACHABLE, |e| e.duration_secs))
            .sum()
    }
}

#[cfg(feature = "precomputed")]
impl TravelTimeMatrix {
    /// Load from a bincode-serialized file.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }

    /// Serialize the matrix to a file.
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        let data = bincode::serialize(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
