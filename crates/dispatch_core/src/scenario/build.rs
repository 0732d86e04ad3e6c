use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::environment::SimulationEnvironment;
use crate::error::DataError;
use crate::location::Location;
use crate::requests::{GeneratedRequests, Request};
use crate::scenario::params::HarnessConfig;
use crate::travel_time::{build_distance_service, TravelTimeOracle};
use crate::vehicle::{Vehicle, VehicleId};

/// Offsets the fleet rng from the request rng so both can share one seed.
const FLEET_SEED_OFFSET: u64 = 0x5eed_f1ee;

/// Places `config.num_vehicles` idle vehicles at pickup locations drawn (with
/// replacement) from `pickups`. After a shuffle, the first
/// `round(num_vehicles * wheelchair_ratio)` vehicles are wheelchair accessible.
/// Ids run from 1.
pub fn sample_fleet(config: &HarnessConfig, pickups: &[Location]) -> Result<Vec<Vehicle>, DataError> {
    let candidates: Vec<&Location> = pickups.iter().filter(|p| p.is_valid()).collect();
    if candidates.is_empty() {
        return Err(DataError::NoUsableTrips {
            skipped: pickups.len(),
        });
    }
    let mut rng = StdRng::seed_from_u64(config.seed ^ FLEET_SEED_OFFSET);

    let accessible =
        ((config.num_vehicles as f64 * config.wheelchair_ratio).round() as usize).min(config.num_vehicles);
    let mut flags: Vec<bool> = (0..config.num_vehicles).map(|i| i < accessible).collect();
    flags.shuffle(&mut rng);

    let fleet = flags
        .into_iter()
        .enumerate()
        .map(|(i, wheelchair)| {
            let start = candidates[rng.gen_range(0..candidates.len())].clone();
            Vehicle::new(
                VehicleId(i as u32 + 1),
                start,
                config.vehicle_capacity,
                wheelchair,
            )
        })
        .collect::<Vec<_>>();
    tracing::debug!(
        vehicles = fleet.len(),
        accessible,
        candidates = candidates.len(),
        "sampled fleet"
    );
    Ok(fleet)
}

/// Fleet, oracle and fares for one run over `generated`. The matrix, when enabled, is
/// indexed by position in `generated.requests`.
pub fn build_environment(
    config: &HarnessConfig,
    generated: &GeneratedRequests,
) -> Result<SimulationEnvironment, DataError> {
    let pickups: Vec<Location> = generated.requests.iter().map(|r| r.origin.clone()).collect();
    let fleet = sample_fleet(config, &pickups)?;

    let mut oracle = TravelTimeOracle::new(build_distance_service(
        &config.distance_backend,
        config.average_speed_mph,
    ));
    if config.precompute_matrix && !generated.requests.is_empty() {
        let legs: Vec<(Location, Location)> = generated.requests.iter().map(Request::leg).collect();
        prepare_matrix(config, &mut oracle, &legs)?;
    }

    Ok(SimulationEnvironment::new(
        fleet,
        oracle,
        config.fares,
        generated.epoch_ms,
    ))
}

fn prepare_matrix(
    config: &HarnessConfig,
    oracle: &mut TravelTimeOracle,
    legs: &[(Location, Location)],
) -> Result<(), DataError> {
    #[cfg(feature = "precomputed")]
    {
        if let Some(path) = config.matrix_path.as_deref() {
            return load_or_build_matrix(path, oracle, legs);
        }
    }
    #[cfg(not(feature = "precomputed"))]
    {
        if let Some(path) = &config.matrix_path {
            tracing::warn!(
                path = %path.display(),
                "matrix_path needs the `precomputed` feature; building in memory"
            );
        }
    }
    let matrix = oracle.build_matrix(legs);
    tracing::info!(nodes = matrix.len(), batches = matrix.batches(), "travel-time matrix ready");
    Ok(())
}

/// Reuses the matrix stored at `path` when it was built for `legs`; otherwise builds a
/// fresh one and overwrites the file. An unreadable file is rebuilt, a failed write is
/// an error.
#[cfg(feature = "precomputed")]
fn load_or_build_matrix(
    path: &std::path::Path,
    oracle: &mut TravelTimeOracle,
    legs: &[(Location, Location)],
) -> Result<(), DataError> {
    use crate::travel_time::TravelTimeMatrix;

    if path.exists() {
        match TravelTimeMatrix::load_from_file(path) {
            Ok(matrix) if matrix.matches_legs(legs) => {
                tracing::info!(path = %path.display(), nodes = matrix.len(), "travel-time matrix loaded");
                oracle.set_matrix(matrix);
                return Ok(());
            }
            Ok(matrix) => tracing::info!(
                path = %path.display(),
                nodes = matrix.len(),
                "stored travel-time matrix is for other requests, rebuilding"
            ),
            Err(err) => tracing::warn!(
                path = %path.display(),
                error = %err,
                "stored travel-time matrix unreadable, rebuilding"
            ),
        }
    }

    let matrix = oracle.build_matrix(legs);
    matrix
        .save_to_file(path)
        .map_err(|err| DataError::MatrixFile {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
    tracing::info!(
        path = %path.display(),
        nodes = matrix.len(),
        batches = matrix.batches(),
        "travel-time matrix built and stored"
    );
    Ok(())
}
