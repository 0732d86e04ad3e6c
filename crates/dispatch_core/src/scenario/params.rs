use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::clock::ONE_SEC_MS;
use crate::environment::RunOptions;
use crate::error::ConfigError;
use crate::evaluator::{Evaluator, ScoreWeights};
use crate::pricing::FareConfig;
use crate::requests::GeneratorParams;
use crate::travel_time::{DistanceBackend, DEFAULT_AVERAGE_SPEED_MPH};

/// Default sim time past the last request arrival before a run stops: 4 hours.
pub const DEFAULT_HORIZON_SECS: u64 = 4 * 60 * 60;

/// Parameters for one evaluation run. Loadable from JSON; missing fields take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub num_vehicles: usize,
    pub vehicle_capacity: u32,
    /// Share of the fleet that is wheelchair accessible (0.0–1.0).
    pub wheelchair_ratio: f64,
    pub num_requests: usize,
    /// Share of prompts written from fixed templates (0.0–1.0).
    pub template_ratio: f64,
    /// Jitter endpoints around zone centroids instead of using the centroid itself.
    pub augment_locations: bool,
    pub simulation_horizon_secs: u64,
    pub seed: u64,
    /// Wall-clock pause between agent calls, for rate-limited remote agents.
    pub inter_request_delay_ms: u64,
    pub idle_cost_per_mile: f64,
    pub average_speed_mph: f64,
    pub distance_backend: DistanceBackend,
    /// Precompute the travel-time matrix over all request legs before the run.
    pub precompute_matrix: bool,
    /// Where to keep the precomputed matrix between runs. Read only with the
    /// `precomputed` feature; reused when it was built for the same request legs.
    pub matrix_path: Option<PathBuf>,
    pub wheelchair_probability: f64,
    pub shared_ride_probability: f64,
    pub fares: FareConfig,
    pub weights: ScoreWeights,
    pub agent: AgentKind,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            num_vehicles: 20,
            vehicle_capacity: 4,
            wheelchair_ratio: 0.1,
            num_requests: 100,
            template_ratio: 1.0,
            augment_locations: false,
            simulation_horizon_secs: DEFAULT_HORIZON_SECS,
            seed: 42,
            inter_request_delay_ms: 0,
            idle_cost_per_mile: 0.60,
            average_speed_mph: DEFAULT_AVERAGE_SPEED_MPH,
            distance_backend: DistanceBackend::default(),
            precompute_matrix: true,
            matrix_path: None,
            wheelchair_probability: 0.05,
            shared_ride_probability: 0.3,
            fares: FareConfig::default(),
            weights: ScoreWeights::default(),
            agent: AgentKind::default(),
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_ratio(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is outside [0, 1]")))
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} must be a non-negative number")))
    }
}

impl HarnessConfig {
    /// Reads and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_vehicles == 0 {
            return Err(invalid("num_vehicles", "fleet must have at least one vehicle"));
        }
        if self.vehicle_capacity == 0 {
            return Err(invalid("vehicle_capacity", "must seat at least one passenger"));
        }
        if self.num_requests == 0 {
            return Err(invalid("num_requests", "must request at least one trip"));
        }
        check_ratio("wheelchair_ratio", self.wheelchair_ratio)?;
        check_ratio("template_ratio", self.template_ratio)?;
        check_ratio("wheelchair_probability", self.wheelchair_probability)?;
        check_ratio("shared_ride_probability", self.shared_ride_probability)?;
        check_non_negative("idle_cost_per_mile", self.idle_cost_per_mile)?;
        if !(self.average_speed_mph.is_finite() && self.average_speed_mph > 0.0) {
            return Err(invalid("average_speed_mph", "must be positive"));
        }
        let fares = &self.fares;
        check_non_negative("fares.base_fare", fares.base_fare)?;
        check_non_negative("fares.per_mile", fares.per_mile)?;
        check_non_negative("fares.per_minute", fares.per_minute)?;
        check_non_negative("fares.minimum_fare", fares.minimum_fare)?;
        let weights = &self.weights;
        check_non_negative("weights.parsing", weights.parsing)?;
        check_non_negative("weights.assignment", weights.assignment)?;
        check_non_negative("weights.efficiency", weights.efficiency)?;
        check_non_negative("weights.revenue", weights.revenue)?;
        if weights.total() <= 0.0 {
            return Err(invalid("weights", "at least one weight must be positive"));
        }
        if !(weights.revenue_per_mile_target.is_finite() && weights.revenue_per_mile_target > 0.0) {
            return Err(invalid("weights.revenue_per_mile_target", "must be positive"));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_num_vehicles(mut self, num_vehicles: usize) -> Self {
        self.num_vehicles = num_vehicles;
        self
    }

    pub fn with_num_requests(mut self, num_requests: usize) -> Self {
        self.num_requests = num_requests;
        self
    }

    pub fn with_wheelchair_ratio(mut self, ratio: f64) -> Self {
        self.wheelchair_ratio = ratio;
        self
    }

    pub fn with_template_ratio(mut self, ratio: f64) -> Self {
        self.template_ratio = ratio;
        self
    }

    pub fn with_augment_locations(mut self, augment: bool) -> Self {
        self.augment_locations = augment;
        self
    }

    /// Set the horizon in hours past the last request arrival.
    pub fn with_horizon_hours(mut self, hours: u64) -> Self {
        self.simulation_horizon_secs = hours * 60 * 60;
        self
    }

    pub fn with_inter_request_delay_ms(mut self, delay_ms: u64) -> Self {
        self.inter_request_delay_ms = delay_ms;
        self
    }

    pub fn with_distance_backend(mut self, backend: DistanceBackend) -> Self {
        self.distance_backend = backend;
        self
    }

    pub fn with_matrix_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.matrix_path = Some(path.into());
        self
    }

    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_fares(mut self, fares: FareConfig) -> Self {
        self.fares = fares;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Request generation settings. Passenger counts are capped at the vehicle capacity.
    pub fn generator_params(&self) -> GeneratorParams {
        GeneratorParams {
            num_requests: self.num_requests,
            template_ratio: self.template_ratio,
            augment_locations: self.augment_locations,
            wheelchair_probability: self.wheelchair_probability,
            shared_ride_probability: self.shared_ride_probability,
            max_passengers: self.vehicle_capacity,
            seed: self.seed,
            ..GeneratorParams::default()
        }
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            horizon_ms: self.simulation_horizon_secs.saturating_mul(ONE_SEC_MS),
            inter_request_delay: Duration::from_millis(self.inter_request_delay_ms),
        }
    }

    pub fn evaluator(&self) -> Evaluator {
        Evaluator::new(self.weights, self.idle_cost_per_mile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: HarnessConfig = serde_json::from_str(
            r#"{"num_vehicles": 5, "agent": {"kind": "random"}, "fares": {"per_mile": 3.0}}"#,
        )
        .expect("config");
        assert_eq!(config.num_vehicles, 5);
        assert_eq!(config.num_requests, 100);
        assert_eq!(config.fares.per_mile, 3.0);
        assert_eq!(config.fares.base_fare, 3.0);
        assert_eq!(config.matrix_path, None);
        assert_eq!(
            config.agent,
            AgentKind::Random {
                use_ground_truth: false
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let err = HarnessConfig::default()
            .with_wheelchair_ratio(1.5)
            .validate()
            .expect_err("ratio");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "wheelchair_ratio",
                ..
            }
        ));
        assert!(HarnessConfig::default().with_num_vehicles(0).validate().is_err());
        let mut config = HarnessConfig::default();
        config.average_speed_mph = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn matrix_path_reads_from_json() {
        let config: HarnessConfig =
            serde_json::from_str(r#"{"matrix_path": "cache/matrix.bin"}"#).expect("config");
        assert_eq!(config.matrix_path, Some(PathBuf::from("cache/matrix.bin")));
        assert_eq!(
            HarnessConfig::default().with_matrix_path("cache/matrix.bin"),
            config
        );
    }

    #[test]
    fn run_options_follow_config() {
        let options = HarnessConfig::default()
            .with_horizon_hours(1)
            .with_inter_request_delay_ms(250)
            .run_options();
        assert_eq!(options.horizon_ms, 3_600_000);
        assert_eq!(options.inter_request_delay, Duration::from_millis(250));
    }

    #[test]
    fn from_json_file_reads_and_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"seed": 7, "template_ratio": 0.5}"#).expect("write");
        let config = HarnessConfig::from_json_file(&path).expect("config");
        assert_eq!(config.seed, 7);
        assert_eq!(config.generator_params().template_ratio, 0.5);

        std::fs::write(&path, r#"{"template_ratio": 2.0}"#).expect("write");
        assert!(HarnessConfig::from_json_file(&path).is_err());
        assert!(matches!(
            HarnessConfig::from_json_file(dir.path().join("missing.json")),
            Err(ConfigError::Read { .. })
        ));
    }
}
