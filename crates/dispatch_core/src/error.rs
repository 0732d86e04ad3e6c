//! Error types for the dispatch harness.
//!
//! Each concern gets its own enum; [`HarnessError`] wraps them for callers that
//! only need a single error type at the run boundary.

use std::path::PathBuf;

use thiserror::Error;

use crate::vehicle::{VehicleId, VehicleStatus};

/// A status string that names no [`VehicleStatus`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown vehicle status `{0}`")]
pub struct UnknownStatus(pub String);

/// Rejected vehicle state transition. Mutators never partially apply.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VehicleError {
    #[error("vehicle {vehicle} cannot {action} while {status}")]
    InvalidTransition {
        vehicle: VehicleId,
        status: VehicleStatus,
        action: &'static str,
    },
    #[error("vehicle {vehicle} is assigned to {assigned:?}, not {requested}")]
    RequestMismatch {
        vehicle: VehicleId,
        assigned: Option<String>,
        requested: String,
    },
    #[error("vehicle {vehicle} cannot seat {requested} passengers (capacity {capacity}, onboard {onboard})")]
    CapacityExceeded {
        vehicle: VehicleId,
        capacity: u32,
        onboard: u32,
        requested: u32,
    },
    #[error("vehicle {vehicle} received invalid mileage {miles}")]
    InvalidMiles { vehicle: VehicleId, miles: f64 },
}

/// Failure reported by a dispatch agent.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent could not parse request {request_id}: {reason}")]
    Unparsable { request_id: String, reason: String },
    #[error("agent found no vehicle for request {request_id}")]
    NoVehicle { request_id: String },
    #[error("agent transport failed: {0}")]
    Transport(String),
    #[error("agent returned a malformed payload: {0}")]
    Malformed(String),
    #[error("agent setup failed: {0}")]
    Setup(String),
}

/// Problems reading source trip or zone data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("no usable trip records after filtering ({skipped} skipped)")]
    NoUsableTrips { skipped: usize },
    #[error("zone table is empty")]
    EmptyZoneTable,
    #[error("failed to store travel-time matrix at {path}: {reason}")]
    MatrixFile { path: PathBuf, reason: String },
}

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level error for a harness run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("export failed: {0}")]
    Export(String),
}
